//! Error types for chosei-graph.

use thiserror::Error;

/// Errors from sign-in, the token cache, or Graph calls.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not signed in. Run `chosei login` first")]
    NotSignedIn,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Graph request failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response format: {0}")]
    UnexpectedFormat(String),

    #[error("Token cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for chosei-graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
