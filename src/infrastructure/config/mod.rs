//! Infrastructure configuration modules.

pub mod database;
pub mod logging;
pub mod retention;
pub mod settings;
