// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_DISCONNECTION: &str = "ws.disconnection";
pub const WS_ACTIVE: &str = "ws.active";
pub const SIGNAL_RELAYED: &str = "signal.relayed";
pub const ROOM_CREATED: &str = "room.created";
pub const ROOM_CLOSED: &str = "room.closed";
pub const CONNECTION_REQUESTED: &str = "connection.requested";
pub const CONNECTION_OVERWRITTEN: &str = "connection.overwritten";
pub const CONNECTION_ACCEPTED: &str = "connection.accepted";
pub const LOBBY_JOINED: &str = "lobby.joined";
pub const LOBBY_LEFT: &str = "lobby.left";
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const SESSION_ACTIVE: &str = "session.active";
pub const RATE_LIMITED: &str = "http.rate_limited";
