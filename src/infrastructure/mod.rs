//! Infrastructure layer.
//!
//! Technical concerns that support the ledger without containing domain
//! logic: configuration loading, validation, and logging setup.

pub mod config;
