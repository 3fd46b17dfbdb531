//! SQLite-backed message log.

pub mod connection;
pub mod log;
pub mod queries;

pub use log::MessageLog;
