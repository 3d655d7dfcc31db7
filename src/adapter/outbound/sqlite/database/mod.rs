//! SQLite database modules.
//!
//! Connection pooling and migrations, the Diesel schema of the five ledger
//! tables, and the row types mapped onto them.

pub mod connection;
pub mod model;
pub mod schema;
