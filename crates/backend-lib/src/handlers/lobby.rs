//! Lobby presence endpoints.
//!
//! A lobby is resolved from the event id in the request. Joining records
//! the caller's presence, leaving deletes it; both require a session.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::metrics::{LOBBY_JOINED, LOBBY_LEFT};
use crate::storage::{Lobby, LobbyConnection, Storage};
use crate::validation::{validate_id, Validator};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyRequest {
    pub event_id: Option<String>,
}

impl LobbyRequest {
    fn event_id(&self) -> Result<String, AppError> {
        let mut validator = Validator::new();
        let event_id = validator.id("eventId", self.event_id.as_deref());
        validator.finish()?;
        Ok(event_id)
    }
}

#[derive(Debug, Serialize)]
pub struct LobbyConnectionResponse {
    pub status: &'static str,
    pub connection: LobbyConnection,
}

#[derive(Debug, Serialize)]
pub struct LobbyResponse {
    pub status: &'static str,
    pub lobby: Lobby,
}

#[derive(Debug, Serialize)]
pub struct LobbyDetailResponse {
    pub lobby: Lobby,
    pub connections: Vec<LobbyConnection>,
}

/// Resolve the lobby for an event or fail with 404
pub(crate) async fn find_lobby<S: Storage>(storage: &S, event_id: &str) -> Result<Lobby, AppError> {
    storage
        .find_lobby_by_event(event_id)
        .await?
        .ok_or_else(|| AppError::LobbyNotFound(event_id.to_string()))
}

/// `POST /lobby/create-lobby`
pub async fn create_lobby<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    payload: Result<Json<LobbyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LobbyResponse>), AppError> {
    let Json(body) = payload?;
    let event_id = body.event_id()?;

    let lobby = state.storage.create_lobby(&event_id).await?;
    tracing::info!(user_id = user.user_id(), event_id = %event_id, lobby_id = %lobby.id, "lobby ready");

    Ok((
        StatusCode::CREATED,
        Json(LobbyResponse {
            status: "created",
            lobby,
        }),
    ))
}

/// `POST /lobby/join-lobby`
pub async fn join_lobby<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    payload: Result<Json<LobbyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LobbyConnectionResponse>), AppError> {
    let Json(body) = payload?;
    let event_id = body.event_id()?;

    let lobby = find_lobby(&state.storage, &event_id).await?;
    let connection = state
        .storage
        .create_lobby_connection(&lobby, user.user_id())
        .await?;

    counter!(LOBBY_JOINED).increment(1);
    tracing::info!(user_id = user.user_id(), lobby_id = %lobby.id, "joined lobby");

    Ok((
        StatusCode::CREATED,
        Json(LobbyConnectionResponse {
            status: "joined",
            connection,
        }),
    ))
}

/// `POST /lobby/leave-lobby`
pub async fn leave_lobby<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    payload: Result<Json<LobbyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LobbyConnectionResponse>), AppError> {
    let Json(body) = payload?;
    let event_id = body.event_id()?;

    let lobby = find_lobby(&state.storage, &event_id).await?;
    let connection = state
        .storage
        .delete_lobby_connection(&lobby, user.user_id())
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "user {} is not in lobby {}",
                user.user_id(),
                lobby.id
            ))
        })?;

    counter!(LOBBY_LEFT).increment(1);
    tracing::info!(user_id = user.user_id(), lobby_id = %lobby.id, "left lobby");

    Ok((
        StatusCode::CREATED,
        Json(LobbyConnectionResponse {
            status: "left",
            connection,
        }),
    ))
}

/// `GET /lobby/get-lobby/{event_id}`
pub async fn get_lobby<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<Json<LobbyDetailResponse>, AppError> {
    let event_id = validate_id("eventId", &event_id)?;
    let lobby = find_lobby(&state.storage, &event_id).await?;
    let connections = state.storage.list_lobby_connections(&lobby).await?;
    Ok(Json(LobbyDetailResponse { lobby, connections }))
}
