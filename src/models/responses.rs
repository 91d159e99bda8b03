//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::text::HitCounts;

/// Response body for GET /objects/:key
#[derive(Debug, Clone, Serialize)]
pub struct ObjectResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
    /// Remaining lifetime in seconds
    pub ttl: Option<u64>,
}

/// Response body for PUT /objects
#[derive(Debug, Clone, Serialize)]
pub struct PutObjectResponse {
    /// Success message
    pub message: String,
    /// The key that was stored
    pub key: String,
}

impl PutObjectResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for POST /objects/:key/guarantee
#[derive(Debug, Clone, Serialize)]
pub struct GuaranteeResponse {
    pub key: String,
    /// False if the key was absent or already expired
    pub guaranteed: bool,
}

/// Response body for operations that remove entries
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Number of entries removed
    pub removed: usize,
}

/// Response body for GET /text/:text_type/:id
#[derive(Debug, Clone, Serialize)]
pub struct TextResponse {
    pub text_type: String,
    pub id: String,
    pub contents: String,
}

/// Response body for GET /text/:text_type/:id/age
#[derive(Debug, Clone, Serialize)]
pub struct TextAgeResponse {
    pub text_type: String,
    pub id: String,
    /// Seconds since the entry was written
    pub age_seconds: u64,
    /// Modification time in ISO 8601 format
    pub last_modified: Option<DateTime<Utc>>,
}

/// Response body for DELETE /text/:text_type
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub text_type: String,
    pub removed: usize,
}

/// Hit statistics of one text type
#[derive(Debug, Clone, Serialize)]
pub struct TextTypeStats {
    pub hits: u64,
    pub misses: u64,
    /// Percentage of gets that hit
    pub hit_rate: f64,
}

impl From<HitCounts> for TextTypeStats {
    fn from(counts: HitCounts) -> Self {
        Self {
            hits: counts.hits,
            misses: counts.misses,
            hit_rate: counts.hit_rate(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Stored expiring objects, expired ones not yet swept included
    pub objects: usize,
    /// Text entries held in memory
    pub text_memory_entries: usize,
    /// Text statistics across all types
    pub text_total: TextTypeStats,
    /// Text statistics per type
    pub text_types: BTreeMap<String, TextTypeStats>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_response_serialize() {
        let resp = PutObjectResponse::new("my_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_text_type_stats_from_counts() {
        let stats = TextTypeStats::from(HitCounts { hits: 3, misses: 1 });
        assert_eq!(stats.hit_rate, 75.0);
    }

    #[test]
    fn test_text_type_stats_no_requests() {
        let stats = TextTypeStats::from(HitCounts::default());
        assert_eq!(stats.hit_rate, 100.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
