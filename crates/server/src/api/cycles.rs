//! Ingestion cycle API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use casemirror_core::RunnerStatus;

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Response to a trigger request
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub message: String,
    /// Whether the running loop was woken rather than a one-off cycle started.
    pub loop_woken: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get runner status and the most recent cycle report
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<RunnerStatus> {
    Json(state.runner().status().await)
}

/// Request a cycle now
///
/// The cycle runs in the background; its result shows up in the status.
pub async fn trigger(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let loop_woken = state.runner().trigger();
    let message = if loop_woken {
        "Cycle loop woken"
    } else {
        "One-off cycle started"
    };

    (
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            message: message.to_string(),
            loop_woken,
        }),
    )
}
