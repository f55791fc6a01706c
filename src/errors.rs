//! Error Types
//!
//! This module defines the crate-level error type covering transport failures,
//! serialization problems, and client-side call failures. Wire-level protocol
//! errors reported to peers live in [`crate::protocol::RpcError`]; this type is
//! for failures surfaced to the local caller.

use thiserror::Error;

/// The main error type for the ws-rpc library.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-related errors (handshake failures, broken connections)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The peer closed the connection
    #[error("Connection closed")]
    ConnectionClosed,

    /// A call did not receive a response within its deadline. Distinct from
    /// any protocol-level error the server might report.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// A response arrived whose request ID does not match the request that
    /// was sent. Guards against stale or misrouted responses.
    #[error("Correlation mismatch: expected request_id '{expected}', got {received:?}")]
    CorrelationMismatch {
        expected: String,
        received: Option<String>,
    },
}
