// ============================
// talentlobby-backend-lib/src/signaling.rs
// ============================
//! Signaling hub shared by every WebSocket connection.
//!
//! The hub owns the socket table and three kinds of broadcast group:
//!
//! - call rooms, which scope WebRTC signaling (one per socket at most)
//! - lobbies, which carry presence notices (any number per socket)
//! - user groups, every socket bound to one user id
//!
//! Membership changes and the emissions they cause happen under a single
//! write lock. Outgoing events go into each socket's unbounded channel, so
//! a snapshot sent to a joiner always precedes the announcement other
//! members receive, even when several sockets join at once.
use std::collections::{HashMap, HashSet};

use metrics::{counter, gauge};
use parking_lot::RwLock;
use serde_json::Value;
use talentlobby_common::{ConnectionRequest, Room, ServerEvent, SocketId};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::metrics::{CONNECTION_ACCEPTED, SIGNAL_RELAYED, WS_ACTIVE, WS_CONNECTION, WS_DISCONNECTION};

/// Outgoing half of a socket
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// The three WebRTC message kinds relayed between peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    fn stamp(self, from: SocketId, payload: Value) -> ServerEvent {
        match self {
            SignalKind::Offer => ServerEvent::Offer { from, sdp: payload },
            SignalKind::Answer => ServerEvent::Answer { from, sdp: payload },
            SignalKind::IceCandidate => ServerEvent::IceCandidate {
                from,
                candidate: payload,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Call(String),
    Lobby(String),
    User(String),
}

struct Peer {
    tx: EventSender,
    user_id: Option<String>,
    /// CallRoomMembership: the single room used for WebRTC
    call_room: Option<String>,
    /// LobbyPresence: lobbies this socket announced itself in
    lobbies: HashSet<String>,
}

#[derive(Default)]
struct HubState {
    peers: HashMap<SocketId, Peer>,
    /// Members in join order
    groups: HashMap<GroupKey, Vec<SocketId>>,
}

impl HubState {
    fn send(&self, to: &str, event: ServerEvent) -> bool {
        match self.peers.get(to) {
            Some(peer) => peer.tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Emit to every member of `group` except `except`; returns deliveries
    fn broadcast(&self, group: &GroupKey, event: &ServerEvent, except: Option<&str>) -> usize {
        let Some(members) = self.groups.get(group) else {
            return 0;
        };
        members
            .iter()
            .filter(|id| Some(id.as_str()) != except)
            .filter(|id| self.send(id, event.clone()))
            .count()
    }

    fn members(&self, group: &GroupKey) -> Vec<SocketId> {
        self.groups.get(group).cloned().unwrap_or_default()
    }

    fn add_member(&mut self, group: GroupKey, socket_id: &str) {
        let members = self.groups.entry(group).or_default();
        if !members.iter().any(|id| id == socket_id) {
            members.push(socket_id.to_string());
        }
    }

    fn remove_member(&mut self, group: &GroupKey, socket_id: &str) {
        if let Some(members) = self.groups.get_mut(group) {
            members.retain(|id| id != socket_id);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    fn join_call_room(&mut self, socket_id: &str, room_id: &str, metadata: Value) -> bool {
        let previous = match self.peers.get(socket_id) {
            Some(peer) if peer.call_room.as_deref() == Some(room_id) => return false,
            Some(peer) => peer.call_room.clone(),
            None => return false,
        };
        if let Some(previous) = previous {
            self.leave_call_room(socket_id, &previous);
        }

        let group = GroupKey::Call(room_id.to_string());
        let existing = self.members(&group);
        self.add_member(group.clone(), socket_id);
        if let Some(peer) = self.peers.get_mut(socket_id) {
            peer.call_room = Some(room_id.to_string());
        }

        self.send(socket_id, ServerEvent::RoomPeers(existing));
        self.broadcast(
            &group,
            &ServerEvent::PeerJoined {
                socket_id: socket_id.to_string(),
                metadata,
            },
            Some(socket_id),
        );
        tracing::debug!(socket_id, room_id, "joined call room");
        true
    }

    fn leave_call_room(&mut self, socket_id: &str, room_id: &str) {
        let group = GroupKey::Call(room_id.to_string());
        self.broadcast(
            &group,
            &ServerEvent::PeerLeft {
                socket_id: socket_id.to_string(),
            },
            Some(socket_id),
        );
        self.remove_member(&group, socket_id);
        if let Some(peer) = self.peers.get_mut(socket_id) {
            peer.call_room = None;
        }
        tracing::debug!(socket_id, room_id, "left call room");
    }

    fn bind_user(&mut self, socket_id: &str, user_id: &str) {
        let previous = match self.peers.get_mut(socket_id) {
            Some(peer) => peer.user_id.replace(user_id.to_string()),
            None => return,
        };
        if let Some(previous) = previous.filter(|prev| prev != user_id) {
            self.remove_member(&GroupKey::User(previous), socket_id);
        }
        self.add_member(GroupKey::User(user_id.to_string()), socket_id);
    }
}

/// Realtime relay between sockets
#[derive(Default)]
pub struct SignalingHub {
    state: RwLock<HubState>,
}

impl SignalingHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new socket and greet it with its id
    pub fn connect(&self, tx: EventSender) -> SocketId {
        let socket_id = Uuid::new_v4().to_string();
        let _ = tx.send(ServerEvent::Connected {
            socket_id: socket_id.clone(),
        });

        let mut state = self.state.write();
        state.peers.insert(
            socket_id.clone(),
            Peer {
                tx,
                user_id: None,
                call_room: None,
                lobbies: HashSet::new(),
            },
        );

        counter!(WS_CONNECTION).increment(1);
        gauge!(WS_ACTIVE).set(state.peers.len() as f64);
        tracing::info!(socket_id = %socket_id, "socket connected");
        socket_id
    }

    /// Drop a socket. Its call room hears `peer-left`; lobby and user
    /// groups forget it silently. Registries are not touched.
    pub fn disconnect(&self, socket_id: &str) {
        let mut state = self.state.write();
        let Some(call_room) = state.peers.get(socket_id).map(|p| p.call_room.clone()) else {
            return;
        };
        if let Some(room_id) = call_room {
            state.leave_call_room(socket_id, &room_id);
        }

        let Some(peer) = state.peers.remove(socket_id) else {
            return;
        };
        for lobby_id in peer.lobbies {
            state.remove_member(&GroupKey::Lobby(lobby_id), socket_id);
        }
        if let Some(user_id) = peer.user_id {
            state.remove_member(&GroupKey::User(user_id), socket_id);
        }

        counter!(WS_DISCONNECTION).increment(1);
        gauge!(WS_ACTIVE).set(state.peers.len() as f64);
        tracing::info!(socket_id, "socket disconnected");
    }

    /// Send one event to one socket
    pub fn send_to(&self, socket_id: &str, event: ServerEvent) -> bool {
        self.state.read().send(socket_id, event)
    }

    /// Bind a socket to a user so user-targeted events reach it
    pub fn register_user(&self, socket_id: &str, user_id: &str) {
        self.state.write().bind_user(socket_id, user_id);
        tracing::debug!(socket_id, user_id, "socket bound to user");
    }

    /// Join a call room. Returns `false` when the socket is already in it.
    pub fn join_room(&self, socket_id: &str, room_id: &str, metadata: Value) -> bool {
        self.state.write().join_call_room(socket_id, room_id, metadata)
    }

    /// Leave the current call room. Returns `false` when not in one.
    pub fn leave_room(&self, socket_id: &str) -> bool {
        let mut state = self.state.write();
        let Some(room_id) = state.peers.get(socket_id).and_then(|p| p.call_room.clone()) else {
            return false;
        };
        state.leave_call_room(socket_id, &room_id);
        true
    }

    /// Forward a signaling payload to exactly `to`, stamped with the sender
    pub fn relay(&self, from: &str, to: &str, kind: SignalKind, payload: Value) -> bool {
        let delivered = self
            .state
            .read()
            .send(to, kind.stamp(from.to_string(), payload));
        if delivered {
            counter!(SIGNAL_RELAYED).increment(1);
        } else {
            tracing::debug!(from, to, ?kind, "relay target not connected");
        }
        delivered
    }

    /// Announce presence in a lobby. Returns `false` on a repeat join.
    pub fn join_lobby(&self, socket_id: &str, lobby_id: &str, user_id: &str) -> bool {
        let mut state = self.state.write();
        let newly_joined = match state.peers.get_mut(socket_id) {
            Some(peer) => peer.lobbies.insert(lobby_id.to_string()),
            None => return false,
        };
        state.bind_user(socket_id, user_id);
        if !newly_joined {
            return false;
        }

        let group = GroupKey::Lobby(lobby_id.to_string());
        state.add_member(group.clone(), socket_id);
        state.broadcast(
            &group,
            &ServerEvent::UserJoined(socket_id.to_string()),
            Some(socket_id),
        );
        tracing::debug!(socket_id, lobby_id, user_id, "joined lobby");
        true
    }

    /// Withdraw presence from a lobby. Returns `false` when not present.
    pub fn leave_lobby(&self, socket_id: &str, lobby_id: &str) -> bool {
        let mut state = self.state.write();
        let was_present = state
            .peers
            .get_mut(socket_id)
            .is_some_and(|peer| peer.lobbies.remove(lobby_id));
        if !was_present {
            return false;
        }

        let group = GroupKey::Lobby(lobby_id.to_string());
        state.broadcast(
            &group,
            &ServerEvent::UserLeft(socket_id.to_string()),
            Some(socket_id),
        );
        state.remove_member(&group, socket_id);
        tracing::debug!(socket_id, lobby_id, "left lobby");
        true
    }

    /// Notify every socket of the recruiter named in `connection`
    pub fn send_connection_request(&self, user: Value, connection: ConnectionRequest) -> usize {
        let group = GroupKey::User(connection.recruiter_id.clone());
        let recruiter_id = connection.recruiter_id.clone();
        let delivered = self.state.read().broadcast(
            &group,
            &ServerEvent::ReceiveConnectionRequest {
                connecting_user: user,
                connection,
            },
            None,
        );
        tracing::debug!(recruiter_id = %recruiter_id, delivered, "connection request forwarded");
        delivered
    }

    /// Put every socket of both parties into the call room, recruiter
    /// first, then tell the applicant which room to open.
    /// Returns how many sockets were admitted.
    pub fn accept_connection(&self, room_id: &str, room: &Room) -> usize {
        let mut state = self.state.write();
        let recruiter = state.members(&GroupKey::User(room.recruiter_id.clone()));
        let applicant = state.members(&GroupKey::User(room.applicant_id.clone()));

        for socket_id in recruiter.iter().chain(applicant.iter()) {
            state.join_call_room(socket_id, room_id, Value::Null);
        }

        state.broadcast(
            &GroupKey::User(room.applicant_id.clone()),
            &ServerEvent::ConnectionAccepted {
                room_id: room_id.to_string(),
            },
            None,
        );

        counter!(CONNECTION_ACCEPTED).increment(1);
        tracing::info!(
            room_id,
            applicant_id = %room.applicant_id,
            recruiter_id = %room.recruiter_id,
            "connection accepted"
        );
        recruiter.len() + applicant.len()
    }

    /// Current members of a call room in join order
    pub fn room_members(&self, room_id: &str) -> Vec<SocketId> {
        self.state.read().members(&GroupKey::Call(room_id.to_string()))
    }

    /// Current members of a lobby in join order
    pub fn lobby_members(&self, lobby_id: &str) -> Vec<SocketId> {
        self.state.read().members(&GroupKey::Lobby(lobby_id.to_string()))
    }

    pub fn current_room(&self, socket_id: &str) -> Option<String> {
        self.state
            .read()
            .peers
            .get(socket_id)
            .and_then(|peer| peer.call_room.clone())
    }

    pub fn socket_count(&self) -> usize {
        self.state.read().peers.len()
    }
}
