//! Broadcast-optimized message wrapping: one JSON serialization shared across
//! every recipient of a room fan-out, instead of re-serializing per socket.

use bytes::Bytes;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies one live WebSocket connection within a room. Assigned by
/// [`next_conn_id`] when a socket is admitted.
pub type ConnId = u64;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_conn_id() -> ConnId {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Maximum number of connections to stack-allocate for a typical room
/// broadcast before a [`ConnIdList`] spills to the heap.
pub const TYPICAL_ROOM_SIZE: usize = 8;

pub type ConnIdList = SmallVec<[ConnId; TYPICAL_ROOM_SIZE]>;

/// An Arc-wrapped outbound message with its JSON encoding computed once and
/// shared across every recipient (zero-cost `Arc::clone` fan-out instead of
/// cloning or re-serializing the payload per socket).
#[derive(Debug)]
pub struct BroadcastMessage<T> {
    inner: Arc<T>,
    json: Arc<Bytes>,
}

impl<T: Serialize> BroadcastMessage<T> {
    pub fn new(message: T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(&message)?;
        Ok(Self {
            inner: Arc::new(message),
            json: Arc::new(Bytes::from(json)),
        })
    }

    pub fn message(&self) -> &T {
        &self.inner
    }

    pub fn json_bytes(&self) -> Arc<Bytes> {
        self.json.clone()
    }
}

impl<T> Clone for BroadcastMessage<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            json: self.json.clone(),
        }
    }
}

/// Broadcast target specification: everyone in the room, everyone but the
/// sender (used for the "relayed to everyone else" contract), or one socket.
#[derive(Debug, Clone)]
pub enum BroadcastTarget {
    Room { conns: ConnIdList },
    RoomExcept { conns: ConnIdList, except: ConnId },
    Conn(ConnId),
}

impl BroadcastTarget {
    pub fn room(conns: impl IntoIterator<Item = ConnId>) -> Self {
        Self::Room {
            conns: conns.into_iter().collect(),
        }
    }

    pub fn room_except(conns: impl IntoIterator<Item = ConnId>, except: ConnId) -> Self {
        Self::RoomExcept {
            conns: conns.into_iter().collect(),
            except,
        }
    }

    pub fn recipients(&self) -> impl Iterator<Item = ConnId> + '_ {
        let (conns, except) = match self {
            Self::Room { conns } => (conns.as_slice(), None),
            Self::RoomExcept { conns, except } => (conns.as_slice(), Some(*except)),
            Self::Conn(id) => return ConnIdIterator::Single(Some(*id)),
        };
        ConnIdIterator::Filtered {
            inner: conns.iter().copied(),
            except,
        }
    }
}

enum ConnIdIterator<'a> {
    Single(Option<ConnId>),
    Filtered {
        inner: std::iter::Copied<std::slice::Iter<'a, ConnId>>,
        except: Option<ConnId>,
    },
}

impl Iterator for ConnIdIterator<'_> {
    type Item = ConnId;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Single(id) => id.take(),
            Self::Filtered { inner, except } => loop {
                let id = inner.next()?;
                if Some(id) != *except {
                    return Some(id);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    struct Ping {
        n: u32,
    }

    #[test]
    fn json_is_computed_once_and_shared() {
        let msg = BroadcastMessage::new(Ping { n: 7 }).unwrap();
        let a = msg.json_bytes();
        let b = msg.json_bytes();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn room_except_skips_sender() {
        let target = BroadcastTarget::room_except([1, 2, 3], 2);
        let recipients: Vec<_> = target.recipients().collect();
        assert_eq!(recipients, vec![1, 3]);
    }

    #[test]
    fn conn_ids_are_unique() {
        let a = next_conn_id();
        let b = next_conn_id();
        assert_ne!(a, b);
    }
}
