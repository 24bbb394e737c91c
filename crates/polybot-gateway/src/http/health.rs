use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /: plain liveness check.
pub async fn index_handler() -> &'static str {
    "Ok"
}

/// GET /health: server metadata and whether a message is in flight.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.mode.to_string(),
        "busy": state.handler.is_busy(),
    }))
}
