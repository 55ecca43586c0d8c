//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Number of files added to the cache
    pub insertions: u64,
    /// Number of captures dropped without insertion
    pub discarded: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Bytes currently cached
    pub current_size: usize,
    /// Cache byte budget
    pub max_size: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            insertions: stats.insertions,
            discarded: stats.discarded,
            total_entries: stats.total_entries,
            current_size: stats.current_size,
            max_size: stats.max_size,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime_secs: u64,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(started_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            status: "healthy".to_string(),
            timestamp: now.to_rfc3339(),
            uptime_secs: (now - started_at).num_seconds().max(0) as u64,
        }
    }
}
