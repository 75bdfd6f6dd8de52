//! Session issuing, standing in for the external identity provider.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, Session, UserRole, SESSION_COOKIE};
use crate::error::AppError;
use crate::validation::Validator;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user_id: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

impl SessionResponse {
    fn from_session(session: &Session, include_token: bool) -> Self {
        Self {
            token: include_token.then(|| session.token.clone()),
            user_id: session.user_id.clone(),
            role: session.role,
            expires_at: session.expires_at,
        }
    }
}

/// `POST /auth/session`
pub async fn create_session<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload?;

    let mut validator = Validator::new();
    let user_id = validator.id("userId", body.user_id.as_deref());
    let role = match body.role.as_deref().map(str::parse::<UserRole>) {
        Some(Ok(role)) => Some(role),
        Some(Err(message)) => {
            validator.error("role", message);
            None
        },
        None => {
            validator.error("role", "role is required");
            None
        },
    };
    validator.finish()?;
    let role = role.ok_or_else(|| AppError::Internal("role missing after validation".to_string()))?;

    let session = state.auth.new_session(user_id, role).await;
    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.token, state.settings.session_ttl_secs
    );

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse::from_session(&session, true)),
    )
        .into_response())
}

/// `GET /auth/session`
pub async fn current_session(user: AuthUser) -> Json<SessionResponse> {
    Json(SessionResponse::from_session(&user.0, false))
}

/// `DELETE /auth/session`
pub async fn end_session<S: Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> impl IntoResponse {
    state.auth.end_session(&user.0.token).await;
    tracing::debug!(user_id = user.user_id(), "session ended");
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0"))],
    )
}
