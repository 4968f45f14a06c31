//! Upgrade handlers for `/ws` and `/relay` (spec.md §4.7, §6 URL surface).

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use super::connection::handle_socket;
use super::routes::AppState;
use crate::router;

#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    room: Option<String>,
    #[serde(default)]
    token: String,
    #[serde(default)]
    want: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct RelayQuery {
    room: Option<String>,
    game: Option<String>,
    #[serde(default)]
    token: String,
    #[serde(default)]
    want: String,
}

pub async fn ws_handler(State(state): State<AppState>, Query(query): Query<WsQuery>, ws: WebSocketUpgrade) -> Response {
    let target = router::resolve("/ws", query.room.as_deref(), None)
        .expect("router::resolve always matches a literal \"/ws\" path");
    upgrade(state, ws, target, query.token, query.want)
}

pub async fn relay_handler(State(state): State<AppState>, Query(query): Query<RelayQuery>, ws: WebSocketUpgrade) -> Response {
    let target = router::resolve("/relay", query.room.as_deref(), query.game.as_deref())
        .expect("router::resolve always matches a literal \"/relay\" path");
    upgrade(state, ws, target, query.token, query.want)
}

fn upgrade(state: AppState, ws: WebSocketUpgrade, target: router::RoomTarget, token: String, want: String) -> Response {
    let handle = state.registry.get_or_spawn(&target);
    let max_message_bytes = state.max_message_bytes;
    ws.on_upgrade(move |socket| handle_socket(socket, handle, token, want, max_message_bytes))
}
