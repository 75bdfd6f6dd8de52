// ==================
// crates/backend-lib/src/websocket.rs
// ==================
//! WebSocket Handler Module
//!
//! The `WebSocketHandler` is instantiated per connection. It turns each
//! decoded [`ClientEvent`] into an operation on the shared
//! [`SignalingHub`](crate::signaling::SignalingHub), consulting the room
//! registry where an event needs it. It keeps no state beyond the socket
//! id; membership lives in the hub.

use std::sync::Arc;

use talentlobby_common::{ClientEvent, ServerEvent, SocketId};

use crate::error::AppError;
use crate::signaling::SignalKind;
use crate::validation::validate_id;
use crate::AppState;

/// WebSocket handler for processing client events
pub struct WebSocketHandler<S> {
    state: Arc<AppState<S>>,
    socket_id: SocketId,
}

impl<S: Send + Sync + 'static> WebSocketHandler<S> {
    pub fn new(state: Arc<AppState<S>>, socket_id: SocketId) -> Self {
        Self { state, socket_id }
    }

    pub fn socket_id(&self) -> &str {
        &self.socket_id
    }

    /// Apply one client event
    pub async fn handle_event(&self, event: ClientEvent) -> Result<(), AppError> {
        let hub = &self.state.hub;
        let me = self.socket_id.as_str();

        match event {
            ClientEvent::Register { user_id } => {
                let user_id = validate_id("userId", &user_id)?;
                hub.register_user(me, &user_id);
            },
            ClientEvent::JoinRoom { room_id, metadata } => {
                let room_id = validate_id("roomId", &room_id)?;
                if !hub.join_room(me, &room_id, metadata) {
                    tracing::debug!(socket_id = me, room_id = %room_id, "duplicate join ignored");
                }
            },
            ClientEvent::LeaveRoom => {
                hub.leave_room(me);
            },
            ClientEvent::Offer { to, sdp } => {
                hub.relay(me, &to, SignalKind::Offer, sdp);
            },
            ClientEvent::Answer { to, sdp } => {
                hub.relay(me, &to, SignalKind::Answer, sdp);
            },
            ClientEvent::IceCandidate { to, candidate } => {
                hub.relay(me, &to, SignalKind::IceCandidate, candidate);
            },
            ClientEvent::JoinLobby { lobby_id, user_id } => {
                let lobby_id = validate_id("lobbyId", &lobby_id)?;
                let user_id = validate_id("userId", &user_id)?;
                hub.join_lobby(me, &lobby_id, &user_id);
            },
            ClientEvent::LeaveLobby { lobby_id } => {
                let lobby_id = validate_id("lobbyId", &lobby_id)?;
                hub.leave_lobby(me, &lobby_id);
            },
            ClientEvent::SendConnectionRequest { user, mut connection } => {
                // routed the same way `register` binds, trimmed
                connection.recruiter_id = validate_id("recruiterId", &connection.recruiter_id)?;
                hub.send_connection_request(user, connection);
            },
            ClientEvent::AcceptConnectionRequest { room_id, room_data } => {
                let room = self
                    .state
                    .rooms
                    .get_room(&room_id)
                    .await?
                    .ok_or_else(|| AppError::RoomNotFound(room_id.clone()))?;
                if room != room_data {
                    tracing::warn!(
                        socket_id = me,
                        room_id = %room_id,
                        "accept payload disagrees with registered room, using registry record"
                    );
                }
                hub.accept_connection(&room_id, &room);
            },
        }
        Ok(())
    }

    /// Report a failed event back to this socket only
    pub fn send_error(&self, code: &str, message: String) {
        self.state.hub.send_to(
            &self.socket_id,
            ServerEvent::Error {
                code: code.to_string(),
                message,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::storage::FlatFileStorage;
    use serde_json::{json, Value};
    use talentlobby_common::{ConnectionRequest, Room};
    use tempfile::TempDir;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    async fn setup() -> (Arc<AppState<FlatFileStorage>>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
        let state = Arc::new(AppState::new(storage, &Settings::default()));
        (state, temp_dir)
    }

    fn open(
        state: &Arc<AppState<FlatFileStorage>>,
    ) -> (WebSocketHandler<FlatFileStorage>, UnboundedReceiver<ServerEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let socket_id = state.hub.connect(tx);
        let _ = rx.try_recv();
        (WebSocketHandler::new(state.clone(), socket_id), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_accept_requires_registered_room() {
        let (state, _temp_dir) = setup().await;
        let (recruiter, _rx) = open(&state);

        let err = recruiter
            .handle_event(ClientEvent::AcceptConnectionRequest {
                room_id: "missing".to_string(),
                room_data: Room {
                    applicant_id: "a".to_string(),
                    recruiter_id: "r".to_string(),
                    lobby_id: "l".to_string(),
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn test_accept_uses_registry_record() {
        let (state, _temp_dir) = setup().await;
        let (recruiter, mut recruiter_rx) = open(&state);
        let (applicant, mut applicant_rx) = open(&state);

        recruiter
            .handle_event(ClientEvent::Register { user_id: "r1".to_string() })
            .await
            .unwrap();
        applicant
            .handle_event(ClientEvent::Register { user_id: "a1".to_string() })
            .await
            .unwrap();

        let stored = Room {
            applicant_id: "a1".to_string(),
            recruiter_id: "r1".to_string(),
            lobby_id: "l1".to_string(),
        };
        let room_id = state.rooms.create_room(stored).await.unwrap();

        // a tampered payload cannot redirect the room to someone else
        recruiter
            .handle_event(ClientEvent::AcceptConnectionRequest {
                room_id: room_id.clone(),
                room_data: Room {
                    applicant_id: "intruder".to_string(),
                    recruiter_id: "r1".to_string(),
                    lobby_id: "l1".to_string(),
                },
            })
            .await
            .unwrap();

        assert_eq!(drain(&mut recruiter_rx).len(), 2);
        assert_eq!(
            drain(&mut applicant_rx).last(),
            Some(&ServerEvent::ConnectionAccepted { room_id: room_id.clone() })
        );
        assert_eq!(state.hub.room_members(&room_id).len(), 2);
    }

    #[tokio::test]
    async fn test_signaling_round_trip_through_handlers() {
        let (state, _temp_dir) = setup().await;
        let (one, mut one_rx) = open(&state);
        let (two, mut two_rx) = open(&state);

        one.handle_event(ClientEvent::JoinRoom { room_id: "A".to_string(), metadata: Value::Null })
            .await
            .unwrap();
        two.handle_event(ClientEvent::JoinRoom { room_id: "A".to_string(), metadata: Value::Null })
            .await
            .unwrap();
        drain(&mut one_rx);
        drain(&mut two_rx);

        two.handle_event(ClientEvent::Offer {
            to: one.socket_id().to_string(),
            sdp: json!("offer-sdp"),
        })
        .await
        .unwrap();
        assert_eq!(
            drain(&mut one_rx),
            vec![ServerEvent::Offer {
                from: two.socket_id().to_string(),
                sdp: json!("offer-sdp"),
            }]
        );

        one.handle_event(ClientEvent::LeaveRoom).await.unwrap();
        assert_eq!(
            drain(&mut two_rx),
            vec![ServerEvent::PeerLeft { socket_id: one.socket_id().to_string() }]
        );
    }

    #[tokio::test]
    async fn test_padded_lobby_id_joins_and_leaves_same_lobby() {
        let (state, _temp_dir) = setup().await;
        let (member, _member_rx) = open(&state);
        let (watcher, mut watcher_rx) = open(&state);

        watcher
            .handle_event(ClientEvent::JoinLobby { lobby_id: "L".to_string(), user_id: "r1".to_string() })
            .await
            .unwrap();
        member
            .handle_event(ClientEvent::JoinLobby { lobby_id: " L ".to_string(), user_id: "a1".to_string() })
            .await
            .unwrap();
        member
            .handle_event(ClientEvent::LeaveLobby { lobby_id: " L ".to_string() })
            .await
            .unwrap();

        assert_eq!(state.hub.lobby_members("L"), vec![watcher.socket_id().to_string()]);
        assert_eq!(
            drain(&mut watcher_rx),
            vec![
                ServerEvent::UserJoined(member.socket_id().to_string()),
                ServerEvent::UserLeft(member.socket_id().to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_padded_recruiter_id_reaches_registered_socket() {
        let (state, _temp_dir) = setup().await;
        let (recruiter, mut recruiter_rx) = open(&state);
        let (applicant, _applicant_rx) = open(&state);

        recruiter
            .handle_event(ClientEvent::Register { user_id: " rec-1".to_string() })
            .await
            .unwrap();
        applicant
            .handle_event(ClientEvent::SendConnectionRequest {
                user: json!({ "name": "Ada" }),
                connection: ConnectionRequest {
                    applicant_id: "a1".to_string(),
                    recruiter_id: " rec-1".to_string(),
                    event_id: "e1".to_string(),
                    lobby_id: "l1".to_string(),
                },
            })
            .await
            .unwrap();

        match drain(&mut recruiter_rx).as_slice() {
            [ServerEvent::ReceiveConnectionRequest { connection, .. }] => {
                assert_eq!(connection.recruiter_id, "rec-1");
            },
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_room_id_is_rejected() {
        let (state, _temp_dir) = setup().await;
        let (socket, _rx) = open(&state);
        let err = socket
            .handle_event(ClientEvent::JoinRoom { room_id: String::new(), metadata: Value::Null })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
