//! Router (C6, spec.md §4.7): maps an inbound upgrade request's `(path,
//! query)` to a target room actor, spawning it lazily on first reference.
//! Room identity is the routing key; each identity resolves to exactly one
//! actor process-wide (spec.md §2), which is what the registry below gives us
//! — one [`RoomHandle`] per distinct key, reused for the life of the process.

use crate::metrics::ServerMetrics;
use crate::protocol::RoomKind;
use crate::room::{gomoku, relay, xiangqi, RoomHandle};
use crate::store::RoomStore;
use dashmap::DashMap;
use std::sync::Arc;

/// The outcome of resolving an inbound request's path and query string: which
/// kind of actor should handle it and under what registry/store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTarget {
    pub kind: RoomKind,
    /// Doubles as both the room-actor registry key and the persistence
    /// room id — for `/relay` this is `"{game}:{roomId}"` (spec.md §4.7), for
    /// `/ws` it is the bare `room` query value.
    pub key: String,
}

const DEFAULT_ROOM: &str = "default";

/// Resolves `(path, query)` per spec.md §4.7's route table. `query_room` and
/// `query_game` are the raw `room`/`game` query parameter values, if present.
/// Returns `None` for any path other than `/ws` or `/relay` — callers should
/// respond `200 "OK"` to those (spec.md §4.7 "Other paths").
pub fn resolve(path: &str, query_room: Option<&str>, query_game: Option<&str>) -> Option<RoomTarget> {
    let room_id = non_empty(query_room).unwrap_or(DEFAULT_ROOM);

    match path {
        "/ws" => Some(RoomTarget {
            kind: RoomKind::Gomoku,
            key: room_id.to_string(),
        }),
        "/relay" => {
            let game = non_empty(query_game).unwrap_or("relay");
            let kind = if game == "xq" { RoomKind::Xiangqi } else { RoomKind::Relay };
            Some(RoomTarget {
                kind,
                key: format!("{game}:{room_id}"),
            })
        }
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Process-wide registry of live room actors, keyed by [`RoomTarget::key`].
/// An entry is created lazily on first reference and never removed by the
/// core (spec.md §3 Lifecycle) — eviction of cold rooms, if any, is the
/// underlying store's concern, not the registry's.
pub struct RoomRegistry {
    store: Arc<dyn RoomStore>,
    metrics: Arc<ServerMetrics>,
    grace_period_secs: u64,
    room_channel_capacity: usize,
    rooms: DashMap<String, RoomHandle>,
}

impl RoomRegistry {
    pub fn new(
        store: Arc<dyn RoomStore>,
        metrics: Arc<ServerMetrics>,
        grace_period_secs: u64,
        room_channel_capacity: usize,
    ) -> Self {
        Self {
            store,
            metrics,
            grace_period_secs,
            room_channel_capacity,
            rooms: DashMap::new(),
        }
    }

    /// Returns the actor for `target`, spawning it on first reference.
    pub fn get_or_spawn(&self, target: &RoomTarget) -> RoomHandle {
        if let Some(existing) = self.rooms.get(&target.key) {
            return existing.clone();
        }

        // Spawn outside the entry API so the store/metrics clones aren't held
        // across a potential panic in `spawn`; duplicate spawns under a
        // concurrent race are resolved by `entry().or_insert_with`, which
        // holds the shard lock for the whole check-then-insert.
        self.rooms
            .entry(target.key.clone())
            .or_insert_with(|| match target.kind {
                RoomKind::Gomoku => gomoku::spawn(
                    target.key.clone(),
                    self.store.clone(),
                    self.metrics.clone(),
                    self.grace_period_secs,
                    self.room_channel_capacity,
                ),
                RoomKind::Xiangqi => xiangqi::spawn(
                    target.key.clone(),
                    self.store.clone(),
                    self.metrics.clone(),
                    self.grace_period_secs,
                    self.room_channel_capacity,
                ),
                RoomKind::Relay => relay::spawn(target.key.clone(), self.metrics.clone(), self.room_channel_capacity),
            })
            .clone()
    }
}
