//! Connection and room endpoints.
//!
//! These drive the in-memory registries ahead of signaling. They carry
//! no session requirement; identity is taken from the request body.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use talentlobby_common::{ConnectionRequest, Room};

use super::lobby::find_lobby;
use crate::error::AppError;
use crate::storage::Storage;
use crate::validation::{validate_id, Validator};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionRequest {
    pub applicant_id: Option<String>,
    pub recruiter_id: Option<String>,
    pub event_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub applicant_id: Option<String>,
    pub recruiter_id: Option<String>,
    pub lobby_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    pub connection_id: String,
    pub connection: ConnectionRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub room_id: String,
    pub room: Room,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfoResponse {
    pub connection_info: ConnectionRequest,
}

#[derive(Debug, Serialize)]
pub struct ConnectionListResponse {
    pub connections: Vec<ConnectionResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedRoomResponse {
    pub room_id: String,
    pub room: Room,
    pub connection: Option<ConnectionRequest>,
}

/// `POST /rooms/create-connection`
pub async fn create_connection<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateConnectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConnectionResponse>), AppError> {
    let Json(body) = payload?;
    let mut validator = Validator::new();
    let applicant_id = validator.id("applicantId", body.applicant_id.as_deref());
    let recruiter_id = validator.id("recruiterId", body.recruiter_id.as_deref());
    let event_id = validator.id("eventId", body.event_id.as_deref());
    validator.finish()?;

    let lobby = find_lobby(&state.storage, &event_id).await?;
    let connection = ConnectionRequest {
        applicant_id,
        recruiter_id,
        event_id,
        lobby_id: lobby.id.clone(),
    };
    state
        .connections
        .add_connection(&lobby.id, connection.clone())
        .await?;

    tracing::info!(
        lobby_id = %lobby.id,
        applicant_id = %connection.applicant_id,
        recruiter_id = %connection.recruiter_id,
        "connection requested"
    );

    Ok((
        StatusCode::CREATED,
        Json(ConnectionResponse {
            connection_id: lobby.id,
            connection,
        }),
    ))
}

/// `POST /rooms/create-room`
pub async fn create_room<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    let Json(body) = payload?;
    let mut validator = Validator::new();
    let applicant_id = validator.id("applicantId", body.applicant_id.as_deref());
    let recruiter_id = validator.id("recruiterId", body.recruiter_id.as_deref());
    let lobby_id = validator.id("lobbyId", body.lobby_id.as_deref());
    validator.finish()?;

    let room = Room {
        applicant_id,
        recruiter_id,
        lobby_id,
    };
    let room_id = state.rooms.create_room(room.clone()).await?;

    Ok((StatusCode::CREATED, Json(RoomResponse { room_id, room })))
}

/// `GET /rooms/get-room/{room_id}`
///
/// Resolves room → lobby id → pending connection request for that lobby.
pub async fn get_room<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(room_id): Path<String>,
) -> Result<(StatusCode, Json<RoomInfoResponse>), AppError> {
    let room = state
        .rooms
        .get_room(&room_id)
        .await?
        .ok_or_else(|| AppError::RoomNotFound(room_id.clone()))?;

    let connection_info = state
        .connections
        .get_connection(&room.lobby_id)
        .await?
        .ok_or_else(|| AppError::ConnectionNotFound(room.lobby_id.clone()))?;

    Ok((StatusCode::CREATED, Json(RoomInfoResponse { connection_info })))
}

/// `GET /rooms/get-connections`
pub async fn get_connections<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ConnectionListResponse>, AppError> {
    let mut connections: Vec<ConnectionResponse> = state
        .connections
        .all_connections()
        .await?
        .into_iter()
        .map(|(connection_id, connection)| ConnectionResponse {
            connection_id,
            connection,
        })
        .collect();
    connections.sort_by(|a, b| a.connection_id.cmp(&b.connection_id));

    Ok(Json(ConnectionListResponse { connections }))
}

/// `POST /rooms/close-room/{room_id}`
///
/// Removes the room and the pending request of its lobby. Sockets that
/// are still in the call room are left alone.
pub async fn close_room<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(room_id): Path<String>,
) -> Result<Json<ClosedRoomResponse>, AppError> {
    let room_id = validate_id("roomId", &room_id)?;
    let room = state
        .rooms
        .remove_room(&room_id)
        .await?
        .ok_or_else(|| AppError::RoomNotFound(room_id.clone()))?;
    let connection = state.connections.remove_connection(&room.lobby_id).await?;

    tracing::info!(room_id = %room_id, lobby_id = %room.lobby_id, "room closed");
    Ok(Json(ClosedRoomResponse {
        room_id,
        room,
        connection,
    }))
}
