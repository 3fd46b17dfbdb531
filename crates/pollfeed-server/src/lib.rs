//! pollfeed-server library
//!
//! Exposes the message log, the query service and the HTTP surface for use
//! by the server binary and by integration tests.

pub mod api;
pub mod config;
pub mod db;
