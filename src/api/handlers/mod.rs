//! API request handlers.

/// Service health probe.
pub mod health;
/// Streaming and synchronous research endpoints.
pub mod research;
