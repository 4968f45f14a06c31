#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Room Server
//!
//! Authoritative real-time game-room server for Gomoku, Xiangqi, and a
//! schema-free JSON relay mode, reached over persistent WebSocket streams.
//! Each room is owned by a single actor task so moves are always applied in
//! the order they arrive, with cross-room work running fully in parallel.

/// Optimized broadcast message handling: serialize once, fan out to many.
pub mod broadcast;

/// Server configuration and environment variables.
pub mod config;

/// Gomoku and Xiangqi rule engines.
pub mod engine;

/// Structured logging configuration.
pub mod logging;

/// Metrics collection and reporting.
pub mod metrics;

/// WebSocket message protocol and persisted room-state definitions.
pub mod protocol;

/// Retry logic utilities for the storage layer.
pub mod retry;

/// Room actors: one task per room, owning all mutation of its state.
pub mod room;

/// Maps inbound requests to room actors and spawns them lazily.
pub mod router;

/// Seat allocation algorithm (reconnect / assign / steal / spectate).
pub mod seat;

/// Room state persistence abstraction (in-memory implementation).
pub mod store;

/// WebSocket upgrade handling and HTTP routes.
pub mod websocket;
