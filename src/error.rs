//! Error types for the readiness crate

use thiserror::Error;

/// Result type for readiness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for readiness operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error, e.g. a missing API key
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Page fetch error
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Document extraction error
    #[error("Document error: {0}")]
    Document(String),

    /// Embedding provider error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// A programme record that breaks its own invariants
    #[error("Invalid programme: {0}")]
    InvalidProgramme(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
