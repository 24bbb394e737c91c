//! Telegram update ingress: POST /{token}/.
//!
//! The token path segment is the only authentication Telegram offers for
//! plain webhooks; a mismatch is answered with 404.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use teloxide::types::{Update, UpdateKind};
use tracing::{debug, warn};

use crate::app::AppState;

/// POST /{token}/
///
/// Parses the update and hands any message to the handler on its own task,
/// so Telegram gets its `Ok` without waiting for processing.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<&'static str, StatusCode> {
    if token != state.token {
        warn!("webhook called with an unknown token");
        return Err(StatusCode::NOT_FOUND);
    }

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, bytes = body.len(), "invalid Telegram update");
        StatusCode::BAD_REQUEST
    })?;

    match update.kind {
        UpdateKind::Message(ref msg) => {
            polybot_telegram::adapter::dispatch(msg, Arc::clone(&state.handler));
        }
        _ => debug!("ignoring non-message update"),
    }
    Ok("Ok")
}
