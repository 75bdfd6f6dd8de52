//! Router assembly.
use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, lobby, rooms, session};
use crate::middleware::rate_limit;
use crate::storage::Storage;
use crate::ws_router::ws_handler;
use crate::AppState;

/// Build the full application router: HTTP control plane plus `/ws`
pub fn create_router<S: Storage + 'static>(state: Arc<AppState<S>>) -> Router {
    let control_plane = Router::new()
        .route(
            "/auth/session",
            post(session::create_session::<S>)
                .get(session::current_session)
                .delete(session::end_session::<S>),
        )
        .route("/lobby/create-lobby", post(lobby::create_lobby::<S>))
        .route("/lobby/join-lobby", post(lobby::join_lobby::<S>))
        .route("/lobby/leave-lobby", post(lobby::leave_lobby::<S>))
        .route("/lobby/get-lobby/{event_id}", get(lobby::get_lobby::<S>))
        .route("/rooms/create-connection", post(rooms::create_connection::<S>))
        .route("/rooms/create-room", post(rooms::create_room::<S>))
        .route("/rooms/get-room/{room_id}", get(rooms::get_room::<S>))
        .route("/rooms/get-connections", get(rooms::get_connections::<S>))
        .route("/rooms/close-room/{room_id}", post(rooms::close_room::<S>))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::<S>,
        ));

    Router::new()
        .merge(control_plane)
        .route("/health", get(handlers::health::<S>))
        .route("/ws", get(ws_handler::<S>))
        .layer(cors_layer(state.settings.cors_allow_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}
