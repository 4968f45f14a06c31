//! Persistence abstraction for room records (spec.md §3 Lifecycle, §7
//! Persistence fault handling). A room record is created lazily with
//! defaults on first load; `put` failures are retried (see [`crate::retry`])
//! and, if still failing, are fatal to the handler without corrupting the
//! in-memory record the caller already holds.

use crate::protocol::{GomokuRoom, XiangqiRoom};
use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoomStoreError {
    #[error("room store backend unavailable: {0}")]
    Unavailable(String),
}

/// The narrow load/put contract the room actors consume. Unknown fields are
/// tolerated on read (handled by `serde(default)` on the room types
/// themselves); a missing record resolves to `Default`, never an error.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn load_gomoku(&self, room_id: &str) -> Result<GomokuRoom, RoomStoreError>;
    async fn put_gomoku(&self, room_id: &str, room: &GomokuRoom) -> Result<(), RoomStoreError>;
    async fn load_xiangqi(&self, room_id: &str) -> Result<XiangqiRoom, RoomStoreError>;
    async fn put_xiangqi(&self, room_id: &str, room: &XiangqiRoom) -> Result<(), RoomStoreError>;
}

/// In-memory backing store keyed by room id, one map per room kind (`gm_room`
/// / `xq_room` in spec terms). Never fails; `put` is infallible here, but the
/// trait stays fallible so a real networked backend can be swapped in without
/// changing the room actors.
#[derive(Default)]
pub struct InMemoryRoomStore {
    gomoku: DashMap<String, GomokuRoom>,
    xiangqi: DashMap<String, XiangqiRoom>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn load_gomoku(&self, room_id: &str) -> Result<GomokuRoom, RoomStoreError> {
        Ok(self
            .gomoku
            .get(room_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn put_gomoku(&self, room_id: &str, room: &GomokuRoom) -> Result<(), RoomStoreError> {
        self.gomoku.insert(room_id.to_string(), room.clone());
        Ok(())
    }

    async fn load_xiangqi(&self, room_id: &str) -> Result<XiangqiRoom, RoomStoreError> {
        Ok(self
            .xiangqi
            .get(room_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn put_xiangqi(&self, room_id: &str, room: &XiangqiRoom) -> Result<(), RoomStoreError> {
        self.xiangqi.insert(room_id.to_string(), room.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Role;

    #[tokio::test]
    async fn missing_room_loads_as_default() {
        let store = InMemoryRoomStore::new();
        let room = store.load_gomoku("absent").await.unwrap();
        assert_eq!(room.seats.current, Role::A);
        assert!(room.moves.is_empty());
    }

    #[tokio::test]
    async fn put_then_load_round_trips() {
        let store = InMemoryRoomStore::new();
        let mut room = GomokuRoom::default();
        room.seats.set_token(Role::A, "tok-a".to_string());

        store.put_gomoku("r1", &room).await.unwrap();
        let loaded = store.load_gomoku("r1").await.unwrap();
        assert_eq!(loaded.seats.token_a, "tok-a");
    }
}
