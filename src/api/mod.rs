//! HTTP API handlers and routes.

/// Request handlers.
pub mod handlers;
/// Router construction.
pub mod routes;

pub use routes::create_router;
