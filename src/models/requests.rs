//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for storing an expiring object (PUT /objects)
///
/// # Fields
/// - `key`: The key to store the object under
/// - `value`: The object to store
/// - `lifetime`: Optional lifetime in seconds (uses the default if absent)
#[derive(Debug, Clone, Deserialize)]
pub struct PutObjectRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional lifetime in seconds
    #[serde(default)]
    pub lifetime: Option<u64>,
}

impl PutObjectRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /objects/:key/guarantee
#[derive(Debug, Clone, Deserialize)]
pub struct GuaranteeRequest {
    /// Minimum remaining lifetime in seconds
    pub min_lifetime: u64,
}
