//! Server behavior configuration types.

use super::defaults::{
    default_grace_period_secs, default_region_id, default_room_cleanup_interval_secs,
};
use serde::{Deserialize, Serialize};

/// Server configuration for room lifecycle management.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Idle time after which an abandoned seat becomes stealable (GRACE, spec.md §3).
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
    /// Interval for the background empty-room sweep (seconds).
    #[serde(default = "default_room_cleanup_interval_secs")]
    pub room_cleanup_interval_secs: u64,
    /// Identifier for the deployment region, surfaced in logs only.
    #[serde(default = "default_region_id")]
    pub region_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period_secs(),
            room_cleanup_interval_secs: default_room_cleanup_interval_secs(),
            region_id: default_region_id(),
        }
    }
}
