//! Default value functions for configuration fields.
//!
//! Organized by the config submodule that consumes them, matching the
//! `#[serde(default = "...")]` attributes they back.

use super::logging::LogFormat;

// =============================================================================
// Root
// =============================================================================

pub const fn default_port() -> u16 {
    3536
}

// =============================================================================
// Server
// =============================================================================

pub const fn default_grace_period_secs() -> u64 {
    180 // GRACE in spec.md §3: 3 minutes
}

pub const fn default_room_cleanup_interval_secs() -> u64 {
    60
}

pub fn default_region_id() -> String {
    "default".to_string()
}

// =============================================================================
// WebSocket
// =============================================================================

pub const fn default_room_channel_capacity() -> usize {
    64
}

pub const fn default_outbound_channel_capacity() -> usize {
    32
}

pub const fn default_max_message_bytes() -> usize {
    65536 // 64KB
}

// =============================================================================
// Logging
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
