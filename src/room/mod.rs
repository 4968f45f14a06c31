//! Room actors (C4, spec.md §4.3): one dedicated task per room, processing
//! `open`/`message`/`close` events strictly in arrival order off an inbound
//! channel. That serialization is the whole of the single-writer-per-room
//! guarantee spec.md §5 asks for — cross-room parallelism falls out for free
//! since every room owns an independent task and channel.

pub mod gomoku;
pub mod relay;
pub mod xiangqi;

use crate::broadcast::{BroadcastMessage, ConnId};
use crate::protocol::SeatToken;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What a connection task does with a message coming back out of a room.
#[derive(Debug, Clone)]
pub enum RoomOutbound {
    Message(Arc<Bytes>),
    Close { code: u16, reason: &'static str },
}

pub type OutboundSender = mpsc::UnboundedSender<RoomOutbound>;

/// One attached socket's bookkeeping inside a room actor. `token` is the
/// bearer credential presented at open time; it never changes for the life
/// of the connection — authority is re-derived from it against the *current*
/// room record on every message, never cached (spec.md §4.3).
pub struct ConnEntry {
    pub outbound: OutboundSender,
    pub token: SeatToken,
}

/// Events a room actor's inbound channel carries. The channel is bounded
/// (spec.md §9 Design Notes): a slow actor applies backpressure to callers,
/// it does not drop events or reorder them.
pub enum RoomEvent {
    Open {
        conn_id: ConnId,
        outbound: OutboundSender,
        token: String,
        /// Raw `want` query value; each actor parses it against its own
        /// [`crate::protocol::RoomKind`] since the seat-A alias differs by game.
        want: String,
    },
    Message {
        conn_id: ConnId,
        raw: String,
    },
    Close {
        conn_id: ConnId,
    },
}

/// A handle callers use to hand events to a room actor task. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: Arc<str>,
    tx: mpsc::Sender<RoomEvent>,
}

impl RoomHandle {
    pub fn new(room_id: impl Into<Arc<str>>, tx: mpsc::Sender<RoomEvent>) -> Self {
        Self {
            room_id: room_id.into(),
            tx,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Backpressures the caller if the room's inbound channel is full rather
    /// than silently dropping the event.
    pub async fn open(&self, conn_id: ConnId, outbound: OutboundSender, token: String, want: String) {
        let _ = self
            .tx
            .send(RoomEvent::Open {
                conn_id,
                outbound,
                token,
                want,
            })
            .await;
    }

    pub async fn message(&self, conn_id: ConnId, raw: String) {
        let _ = self.tx.send(RoomEvent::Message { conn_id, raw }).await;
    }

    pub async fn close(&self, conn_id: ConnId) {
        let _ = self.tx.send(RoomEvent::Close { conn_id }).await;
    }
}

fn send_to(outbound: &OutboundSender, bytes: Arc<Bytes>) {
    let _ = outbound.send(RoomOutbound::Message(bytes));
}

fn send_close(outbound: &OutboundSender, code: u16, reason: &'static str) {
    let _ = outbound.send(RoomOutbound::Close { code, reason });
}

/// Serializes `msg` once and fans it out to every entry in `conns`.
pub(crate) fn broadcast_all<T: Serialize>(conns: &HashMap<ConnId, ConnEntry>, msg: &T) {
    let Ok(bytes) = serde_json::to_vec(msg) else {
        return;
    };
    let bytes = Arc::new(Bytes::from(bytes));
    for entry in conns.values() {
        send_to(&entry.outbound, bytes.clone());
    }
}

/// Same as [`broadcast_all`] but skips `except` — used nowhere in the
/// current message catalog (every broadcast targets the full room) but kept
/// as the general primitive C5 specifies.
#[allow(dead_code)]
pub(crate) fn broadcast_except<T: Serialize>(
    conns: &HashMap<ConnId, ConnEntry>,
    except: ConnId,
    msg: &T,
) {
    let Ok(bytes) = serde_json::to_vec(msg) else {
        return;
    };
    let bytes = Arc::new(Bytes::from(bytes));
    for (id, entry) in conns {
        if *id != except {
            send_to(&entry.outbound, bytes.clone());
        }
    }
}

pub(crate) fn send_direct<T: Serialize>(conns: &HashMap<ConnId, ConnEntry>, conn_id: ConnId, msg: &T) {
    if let Some(entry) = conns.get(&conn_id) {
        if let Ok(bytes) = serde_json::to_vec(msg) {
            send_to(&entry.outbound, Arc::new(Bytes::from(bytes)));
        }
    }
}

pub(crate) fn close_conn(conns: &HashMap<ConnId, ConnEntry>, conn_id: ConnId, code: u16, reason: &'static str) {
    if let Some(entry) = conns.get(&conn_id) {
        send_close(&entry.outbound, code, reason);
    }
}

/// Lets callers build a [`BroadcastMessage`] if they want the Arc-sharing
/// optimization explicitly (used by actors whose broadcast payload is also
/// read back locally, e.g. for logging).
#[allow(dead_code)]
pub(crate) fn wrap<T: Serialize>(msg: T) -> Option<BroadcastMessage<T>> {
    BroadcastMessage::new(msg).ok()
}
