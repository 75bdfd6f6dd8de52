// ============================
// talentlobby-backend-lib/src/lib.rs
// ============================
//! Core backend functionality for the talent-lobby server: the HTTP
//! control plane, the WebSocket signaling gateway and the in-memory
//! connection/room registries they share.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod signaling;
pub mod storage;
pub mod validation;
pub mod websocket;
pub mod ws_router;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth, SessionManager};
use crate::config::Settings;
use crate::middleware::rate_limit::RateLimiter;
use crate::registry::{ConnectionRegistry, RoomRegistry};
use crate::signaling::SignalingHub;
use crate::storage::FlatFileStorage;

pub use routes::create_router;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Session manager backing `auth`
    pub sessions: SessionManager,
    /// Settings the server was started with
    pub settings: Arc<Settings>,
    /// Persistence backend for lobbies
    pub storage: S,
    /// Pending connection requests, keyed by lobby id
    pub connections: ConnectionRegistry,
    /// Accepted pairings, keyed by room id
    pub rooms: RoomRegistry,
    /// Realtime signaling hub
    pub hub: SignalingHub,
    /// HTTP rate limiter
    pub rate_limiter: Arc<RateLimiter>,
}

impl<S> AppState<S> {
    /// Create a new application state with process-local registries
    pub fn new(storage: S, config: &Settings) -> Self {
        Self::with_registries(
            storage,
            config,
            ConnectionRegistry::default(),
            RoomRegistry::default(),
        )
    }

    /// Create a new application state around externally provided registries
    pub fn with_registries(
        storage: S,
        config: &Settings,
        connections: ConnectionRegistry,
        rooms: RoomRegistry,
    ) -> Self {
        let sessions = SessionManager::new(config.session_ttl());
        let auth = Arc::new(DefaultAuth::new(sessions.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(
            std::time::Duration::from_secs(config.rate_limit.window_secs),
            config.rate_limit.max_requests,
        ));

        Self {
            auth,
            sessions,
            settings: Arc::new(config.clone()),
            storage,
            connections,
            rooms,
            hub: SignalingHub::new(),
            rate_limiter,
        }
    }
}

impl AppState<FlatFileStorage> {
    /// Create a new application state from settings, storing lobbies under `data_dir`
    pub fn from_settings(config: &Settings) -> anyhow::Result<Self> {
        let storage = FlatFileStorage::new(&config.data_dir)?;
        Ok(Self::new(storage, config))
    }
}
