//! Shared harness for driving a room actor end-to-end through its public
//! channel API: registers fake clients against the room actor directly
//! rather than going through a real socket.

#![allow(dead_code)]

use room_server::broadcast::ConnId;
use room_server::metrics::ServerMetrics;
use room_server::room::{RoomHandle, RoomOutbound};
use room_server::store::InMemoryRoomStore;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const GRACE_SECS: u64 = 180;
pub const CHANNEL_CAPACITY: usize = 32;

pub fn fresh_metrics() -> Arc<ServerMetrics> {
    Arc::new(ServerMetrics::new())
}

pub fn fresh_store() -> Arc<InMemoryRoomStore> {
    Arc::new(InMemoryRoomStore::new())
}

/// One simulated attached socket: owns the outbound receiver a real
/// connection task would otherwise drain, and a monotonic conn id.
pub struct Client {
    pub conn_id: ConnId,
    rx: mpsc::UnboundedReceiver<RoomOutbound>,
    tx: mpsc::UnboundedSender<RoomOutbound>,
}

static NEXT_CONN_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn_id = NEXT_CONN_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Self { conn_id, rx, tx }
    }

    pub async fn join(&mut self, room: &RoomHandle, token: &str, want: &str) {
        room.open(self.conn_id, self.tx.clone(), token.to_string(), want.to_string()).await;
    }

    /// Waits for the next outbound message and parses it as JSON. Panics if
    /// the room closed this connection instead of sending a message.
    pub async fn recv_json(&mut self) -> Value {
        match self.rx.recv().await.expect("room dropped outbound sender") {
            RoomOutbound::Message(bytes) => serde_json::from_slice(&bytes).expect("valid JSON"),
            RoomOutbound::Close { code, reason } => {
                panic!("expected a message, got close({code}, {reason})")
            }
        }
    }

    /// Waits for the next outbound event and asserts it is a close, returning
    /// `(code, reason)`.
    pub async fn recv_close(&mut self) -> (u16, &'static str) {
        match self.rx.recv().await.expect("room dropped outbound sender") {
            RoomOutbound::Close { code, reason } => (code, reason),
            RoomOutbound::Message(_) => panic!("expected a close, got a message"),
        }
    }

    /// Drains the next message matching `predicate`, discarding any
    /// broadcasts (e.g. `presence`) that arrive first — ordering among
    /// distinct broadcast types is only guaranteed relative to the sender,
    /// not across all message kinds irrelevant to the assertion at hand.
    pub async fn recv_json_matching(&mut self, predicate: impl Fn(&Value) -> bool) -> Value {
        loop {
            let value = self.recv_json().await;
            if predicate(&value) {
                return value;
            }
        }
    }
}

pub fn msg_type(value: &Value) -> &str {
    value.get("type").and_then(Value::as_str).unwrap_or("")
}
