use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use polybot_core::config::BotMode;
use polybot_telegram::MessageHandler;

/// Shared state, passed as `Arc<AppState>` to all Axum handlers.
pub struct AppState {
    pub handler: Arc<dyn MessageHandler>,
    /// Bot token; also the secret path segment of the webhook URL.
    pub token: String,
    pub mode: BotMode,
}

impl AppState {
    pub fn new(handler: Arc<dyn MessageHandler>, token: String, mode: BotMode) -> Self {
        Self {
            handler,
            token,
            mode,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::http::health::index_handler))
        .route("/health", get(crate::http::health::health_handler))
        .route("/{token}/", post(crate::http::webhook::webhook_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
