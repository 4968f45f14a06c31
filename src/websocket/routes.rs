//! Axum `Router` assembly: route table, CORS, tracing, and the manual
//! upgrade-header check spec.md §4.7 asks for ahead of axum's own.

use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handler::{relay_handler, ws_handler};
use crate::metrics::ServerMetrics;
use crate::router::RoomRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub metrics: Arc<ServerMetrics>,
    pub max_message_bytes: usize,
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let upgrade_only = middleware::from_fn(require_websocket_upgrade);

    Router::new()
        .route("/ws", get(ws_handler).layer(upgrade_only.clone()))
        .route("/relay", get(relay_handler).layer(upgrade_only))
        .route("/metrics", get(metrics_handler))
        .fallback(fallback)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// axum's own `WebSocketUpgrade` extractor answers malformed upgrades with a
/// generic `400`; spec.md §4.7 wants a literal `426` instead, so that check
/// happens here, ahead of the extractor ever running.
async fn require_websocket_upgrade(req: Request<axum::body::Body>, next: Next) -> Response {
    let is_websocket = req
        .headers()
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"));

    if !is_websocket {
        return (StatusCode::UPGRADE_REQUIRED, "Upgrade Required").into_response();
    }

    next.run(req).await
}

async fn metrics_handler(State(state): State<AppState>) -> Json<crate::metrics::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn fallback() -> &'static str {
    "OK"
}
