//! API response types

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,

    /// Seconds since the monitor started
    pub uptime_secs: u64,
}

/// Preformatted report lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinesResponse {
    pub lines: Vec<String>,
}
