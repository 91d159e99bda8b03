//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache in this crate.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A required query or interpreter is missing or has the wrong shape
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A row interpreter produced something other than a key/value pair
    #[error("Row interpreter {interpreter} did not produce a KeyValue")]
    MissingKeyValue { interpreter: String },

    /// A pre/post initialization hook failed
    #[error("Cache initialization failed for {handler}: {message}")]
    Initialization { handler: String, message: String },

    /// A lookup-or-fail call found no value
    #[error("Key not found: {key} (lookup {lookup})")]
    KeyNotFound { key: String, lookup: String },

    /// Filesystem failure in the text cache
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache file carries a modification time in the future
    #[error("Negative age for {}: modified {ahead_ms} ms in the future", path.display())]
    NegativeAge { path: PathBuf, ahead_ms: u128 },

    /// A malformed admin request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A text type or id that cannot be mapped onto a file name
    #[error("Invalid text cache identifier: {0}")]
    InvalidTextType(String),

    /// The query service rejected a statement
    #[error("Database error running [{sql}]: {message}")]
    Database { sql: String, message: String },

    /// A row column was absent or of the wrong type
    #[error("Column error: {0}")]
    Column(String),

    /// A blocking cache operation panicked or was cancelled
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),

    /// Writing a cache dump to its sink failed
    #[error("Could not write cache contents: {0}")]
    Sink(#[source] std::io::Error),
}

impl CacheError {
    /// Wraps an I/O failure with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::KeyNotFound { .. } => StatusCode::NOT_FOUND,
            CacheError::InvalidTextType(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NegativeAge { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;
