// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP control plane handlers.

pub mod lobby;
pub mod rooms;
pub mod session;

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sockets: usize,
}

/// Liveness probe
pub async fn health<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sockets: state.hub.socket_count(),
    })
}
