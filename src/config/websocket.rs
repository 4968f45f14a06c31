//! WebSocket transport configuration types.

use super::defaults::{
    default_max_message_bytes, default_outbound_channel_capacity, default_room_channel_capacity,
};
use serde::{Deserialize, Serialize};

/// WebSocket configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebSocketConfig {
    /// Capacity of a room actor's inbound event channel.
    #[serde(default = "default_room_channel_capacity")]
    pub room_channel_capacity: usize,
    /// Capacity of a single connection's outbound broadcast channel.
    #[serde(default = "default_outbound_channel_capacity")]
    pub outbound_channel_capacity: usize,
    /// Maximum accepted size, in bytes, of a single inbound text frame.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            room_channel_capacity: default_room_channel_capacity(),
            outbound_channel_capacity: default_outbound_channel_capacity(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl WebSocketConfig {
    /// Validate WebSocket configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.room_channel_capacity == 0 {
            anyhow::bail!("websocket.room_channel_capacity must be at least 1");
        }
        if self.max_message_bytes == 0 {
            anyhow::bail!("websocket.max_message_bytes must be at least 1");
        }
        Ok(())
    }
}
