//! HTTP/WebSocket front door (part of C6, spec.md §4.7/§6). Resolves each
//! inbound request to a room actor via [`crate::router`] and pumps frames
//! between the socket and that actor's [`crate::room::RoomHandle`].

mod connection;
mod handler;
mod routes;

pub use routes::{build_router, AppState};
