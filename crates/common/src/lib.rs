// ================
// common/src/lib.rs
// ================
//! Common types shared by the talent-lobby server and its clients.
//! This module defines the WebSocket signaling protocol and the
//! connection/room records exchanged over both HTTP and WebSocket.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier the gateway assigns to each WebSocket connection
pub type SocketId = String;

/// An applicant's intent to connect with a recruiter inside an event lobby
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub applicant_id: String,
    pub recruiter_id: String,
    pub event_id: String,
    pub lobby_id: String,
}

/// An accepted 1:1 call pairing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub applicant_id: String,
    pub recruiter_id: String,
    pub lobby_id: String,
}

/// Messages sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Bind this socket to a user id so it can receive connection requests
    Register { user_id: String },
    /// Join a call room; `metadata` is forwarded to the other members
    JoinRoom {
        room_id: String,
        #[serde(default)]
        metadata: Value,
    },
    /// Leave the current call room
    LeaveRoom,
    /// WebRTC offer addressed to a single socket
    Offer { to: SocketId, sdp: Value },
    /// WebRTC answer addressed to a single socket
    Answer { to: SocketId, sdp: Value },
    /// ICE candidate addressed to a single socket
    IceCandidate { to: SocketId, candidate: Value },
    /// Announce presence in an event lobby
    #[serde(rename = "join_lobby")]
    JoinLobby { lobby_id: String, user_id: String },
    /// Withdraw presence from an event lobby
    #[serde(rename = "leave_lobby")]
    LeaveLobby { lobby_id: String },
    /// Notify a recruiter of an incoming connection request
    SendConnectionRequest {
        user: Value,
        connection: ConnectionRequest,
    },
    /// Recruiter accepted; move both parties into the room
    AcceptConnectionRequest { room_id: String, room_data: Room },
}

/// Messages sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// First frame on every socket, carries the id peers address it by
    Connected { socket_id: SocketId },
    /// Members already present in the room, sent to a new joiner only
    RoomPeers(Vec<SocketId>),
    PeerJoined { socket_id: SocketId, metadata: Value },
    PeerLeft { socket_id: SocketId },
    Offer { from: SocketId, sdp: Value },
    Answer { from: SocketId, sdp: Value },
    IceCandidate { from: SocketId, candidate: Value },
    #[serde(rename = "user_joined")]
    UserJoined(SocketId),
    #[serde(rename = "user_left")]
    UserLeft(SocketId),
    ReceiveConnectionRequest {
        connecting_user: Value,
        connection: ConnectionRequest,
    },
    ConnectionAccepted { room_id: String },
    /// Error response for malformed or rejected client events
    Error { code: String, message: String },
}

impl ServerEvent {
    /// Wire name of the event, handy for logging
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::RoomPeers(_) => "room-peers",
            ServerEvent::PeerJoined { .. } => "peer-joined",
            ServerEvent::PeerLeft { .. } => "peer-left",
            ServerEvent::Offer { .. } => "offer",
            ServerEvent::Answer { .. } => "answer",
            ServerEvent::IceCandidate { .. } => "ice-candidate",
            ServerEvent::UserJoined(_) => "user_joined",
            ServerEvent::UserLeft(_) => "user_left",
            ServerEvent::ReceiveConnectionRequest { .. } => "receive-connection-request",
            ServerEvent::ConnectionAccepted { .. } => "connection-accepted",
            ServerEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_event_uses_socket_style_names() {
        let raw = json!({
            "event": "join-room",
            "data": { "roomId": "r1", "metadata": { "name": "Ada" } }
        });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room_id: "r1".to_string(),
                metadata: json!({ "name": "Ada" }),
            }
        );

        let lobby: ClientEvent = serde_json::from_value(json!({
            "event": "join_lobby",
            "data": { "lobbyId": "l1", "userId": "u1" }
        }))
        .unwrap();
        assert!(matches!(lobby, ClientEvent::JoinLobby { .. }));
    }

    #[test]
    fn unit_and_defaulted_payloads() {
        let leave: ClientEvent = serde_json::from_value(json!({ "event": "leave-room" })).unwrap();
        assert_eq!(leave, ClientEvent::LeaveRoom);

        let join: ClientEvent = serde_json::from_value(json!({
            "event": "join-room",
            "data": { "roomId": "r1" }
        }))
        .unwrap();
        assert_eq!(
            join,
            ClientEvent::JoinRoom { room_id: "r1".to_string(), metadata: Value::Null }
        );
    }

    #[test]
    fn server_event_wire_shape() {
        let peers = serde_json::to_value(ServerEvent::RoomPeers(vec!["a".into()])).unwrap();
        assert_eq!(peers, json!({ "event": "room-peers", "data": ["a"] }));

        let joined = serde_json::to_value(ServerEvent::UserJoined("s1".into())).unwrap();
        assert_eq!(joined, json!({ "event": "user_joined", "data": "s1" }));

        let request = ServerEvent::ReceiveConnectionRequest {
            connecting_user: json!({ "id": "a1" }),
            connection: ConnectionRequest {
                applicant_id: "a1".into(),
                recruiter_id: "r1".into(),
                event_id: "e1".into(),
                lobby_id: "l1".into(),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["event"], "receive-connection-request");
        assert_eq!(value["data"]["connectingUser"]["id"], "a1");
        assert_eq!(value["data"]["connection"]["recruiterId"], "r1");
        assert_eq!(request.name(), "receive-connection-request");
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result = serde_json::from_value::<ClientEvent>(json!({ "event": "teleport" }));
        assert!(result.is_err());
    }
}
