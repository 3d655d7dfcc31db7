//! CLI module graph.

pub mod command;
pub mod config;
pub mod diagnostic;
pub mod dispatch;
pub mod init;
pub mod output;
pub mod paths;
pub mod performance;
pub mod purge;
pub mod sessions;
pub mod timeline;
