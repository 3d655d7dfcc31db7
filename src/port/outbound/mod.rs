//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the storage the session ledger depends on.

pub mod report;
pub mod retention;
pub mod store;
