use crate::http::codec::HttpProtocolError;
use thiserror::Error;

/// Error types for the jsonecho library
#[derive(Error, Debug)]
pub enum EchoError {
    /// Socket errors (bind, accept, connect, read, write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unsupported HTTP traffic
    #[error("HTTP protocol error: {0}")]
    Protocol(#[from] HttpProtocolError),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// A response carried an unexpected status code
    #[error("Unexpected response status: {0}")]
    Status(::http::StatusCode),
}

/// Result type for the jsonecho library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod common;
pub mod http;

// Re-export main types for convenience
pub use common::EchoServerTrait;
pub use crate::http::{EchoResponse, HttpConfig, HttpEchoClient, HttpEchoServer};
