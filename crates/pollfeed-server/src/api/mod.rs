//! Query service: request parsing, dispatch onto the log, and the HTTP
//! endpoint that carries it.

pub mod request;
pub mod server;
pub mod service;

pub use request::ApiRequest;
pub use service::QueryService;
