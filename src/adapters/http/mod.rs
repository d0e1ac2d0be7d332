//! HTTP adapters - the service's public surface.
//!
//! - `GET /ws` - notification WebSocket (see [`crate::adapters::websocket`])
//! - `POST /internal/events` - message events from the API tier (see [`events`])
//! - `GET /health` - liveness plus local connection count

pub mod events;
pub mod middleware;

use axum::{
    extract::{FromRef, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, WebSocketState};

pub use events::EventIngress;

/// Shared state of the application router.
#[derive(Clone)]
pub struct AppState {
    pub websocket: WebSocketState,
    pub events: EventIngress,
}

impl FromRef<AppState> for WebSocketState {
    fn from_ref(state: &AppState) -> Self {
        state.websocket.clone()
    }
}

impl FromRef<AppState> for EventIngress {
    fn from_ref(state: &AppState) -> Self {
        state.events.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub instance_id: String,
    pub connections: usize,
}

pub async fn health(State(state): State<WebSocketState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        instance_id: state.lifecycle.instance_id().to_string(),
        connections: state.lifecycle.connections().len().await,
    })
}

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(websocket_router::<AppState>())
        .merge(events::event_routes::<AppState>())
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
