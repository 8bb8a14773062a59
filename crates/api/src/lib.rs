//! jobwire HTTP API.
//!
//! Exposes config, state, error handling, engines and routes so the binary
//! entrypoint and the integration tests build the exact same application.

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
