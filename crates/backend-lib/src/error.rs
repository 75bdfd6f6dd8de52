//! Error type shared by the HTTP handlers and the signaling socket.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every failure the control plane or gateway can report
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lobby not found for event {0}")]
    LobbyNotFound(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("No pending connection for lobby {0}")]
    ConnectionNotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_)
            | AppError::LobbyNotFound(_)
            | AppError::RoomNotFound(_)
            | AppError::ConnectionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) | AppError::Io(_) | AppError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "AUTH_001",
            AppError::Internal(_) => "INT_001",
            AppError::NotFound(_) => "NF_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
            AppError::LobbyNotFound(_) => "LOBBY_001",
            AppError::RoomNotFound(_) => "ROOM_001",
            AppError::ConnectionNotFound(_) => "CONN_001",
            AppError::RateLimitExceeded => "RATE_001",
            AppError::Validation(_) => "VAL_001",
            AppError::InvalidBody(_) => "VAL_002",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Auth(_) => "Authentication required".to_string(),
            AppError::Internal(_) | AppError::Io(_) | AppError::Json(_) => {
                "An internal server error occurred".to_string()
            },
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::LobbyNotFound(_) => "Lobby not found".to_string(),
            AppError::RoomNotFound(_) => "Room not found".to_string(),
            AppError::ConnectionNotFound(_) => "Connection not found".to_string(),
            AppError::RateLimitExceeded => {
                "Rate limit exceeded, please try again later".to_string()
            },
            AppError::Validation(_) => "Validation failed".to_string(),
            AppError::InvalidBody(_) => "Invalid request format".to_string(),
        }
    }

    /// Message shown to clients: full text in debug builds, sanitized otherwise
    pub fn public_message(&self) -> String {
        if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }

        let mut body = serde_json::json!({
            "success": false,
            "error": self.public_message(),
            "code": self.error_code(),
        });
        if let AppError::Validation(fields) = &self {
            body["details"] = serde_json::json!(fields);
        }

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}
