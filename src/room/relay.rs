//! Relay room actor (C4, spec.md §4.6). No persisted state, no authority,
//! no schema: any JSON in is broadcast verbatim to every attached socket,
//! including the sender.

use super::{RoomEvent, RoomHandle};
use crate::broadcast::ConnId;
use crate::metrics::ServerMetrics;
use crate::protocol::RelayMessage;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum RelayPresence {
    #[serde(rename = "presence")]
    Presence { n: usize },
}

struct ConnEntry {
    outbound: super::OutboundSender,
}

pub fn spawn(
    room_id: impl Into<Arc<str>>,
    metrics: Arc<ServerMetrics>,
    channel_capacity: usize,
) -> RoomHandle {
    let room_id = room_id.into();
    let (tx, rx) = mpsc::channel(channel_capacity);
    let handle = RoomHandle::new(room_id.clone(), tx);
    tokio::spawn(run(metrics, rx));
    handle
}

async fn run(metrics: Arc<ServerMetrics>, mut rx: mpsc::Receiver<RoomEvent>) {
    let mut conns: HashMap<ConnId, ConnEntry> = HashMap::new();
    metrics.increment_rooms_created();

    while let Some(event) = rx.recv().await {
        match event {
            RoomEvent::Open { conn_id, outbound, .. } => {
                conns.insert(conn_id, ConnEntry { outbound });
                metrics.record_connect();
                broadcast(&conns, &RelayPresence::Presence { n: conns.len() });
            }
            RoomEvent::Message { conn_id: _, raw } => {
                // No schema: forward any parseable JSON verbatim to every
                // attached socket. Unparseable frames are silently dropped.
                if let Ok(value) = serde_json::from_str::<RelayMessage>(&raw) {
                    broadcast(&conns, &value);
                }
            }
            RoomEvent::Close { conn_id } => {
                if conns.remove(&conn_id).is_some() {
                    metrics.record_disconnect();
                    broadcast(&conns, &RelayPresence::Presence { n: conns.len() });
                }
            }
        }
    }
}

fn broadcast<T: Serialize>(conns: &HashMap<ConnId, ConnEntry>, msg: &T) {
    let Ok(bytes) = serde_json::to_vec(msg) else {
        return;
    };
    let bytes = Arc::new(bytes::Bytes::from(bytes));
    for entry in conns.values() {
        let _ = entry.outbound.send(super::RoomOutbound::Message(bytes.clone()));
    }
}

