// Errors surfaced to callers of the coordinator.

use thiserror::Error;

/// Failure of a status query that callers must be able to tell apart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// Server answered with a non-success status code.
    #[error("status query failed: HTTP {0}")]
    Http(u16),
    /// Request never produced a response (connection refused, reset, ...).
    #[error("status query transport error: {0}")]
    Transport(String),
    /// Response body was not valid JSON.
    #[error("status query returned malformed body: {0}")]
    Decode(String),
}
