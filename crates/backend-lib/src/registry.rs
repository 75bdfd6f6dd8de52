// ============================
// talentlobby-backend-lib/src/registry.rs
// ============================
//! Connection and room registries.
//!
//! Both registries sit on a [`KeyValueStore`]. The default
//! [`InMemoryStore`] is process-local: entries do not survive a restart
//! and are not shared between instances. A deployment with several
//! instances supplies a shared store through the same trait.
//!
//! Nothing is evicted automatically. Entries leave only through the
//! explicit `remove_*` calls.
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use talentlobby_common::{ConnectionRequest, Room};
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics::{CONNECTION_OVERWRITTEN, CONNECTION_REQUESTED, ROOM_CLOSED, ROOM_CREATED};

/// Minimal key-value contract the registries need
#[async_trait]
pub trait KeyValueStore<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, AppError>;

    /// Store `value`, returning whatever was there before
    async fn set(&self, key: &str, value: V) -> Result<Option<V>, AppError>;

    /// Remove `key`, returning the removed value; absent keys are not an error
    async fn delete(&self, key: &str) -> Result<Option<V>, AppError>;

    /// Copy of every entry
    async fn entries(&self) -> Result<Vec<(String, V)>, AppError>;
}

/// Process-local store backed by a `DashMap`
pub struct InMemoryStore<V> {
    map: DashMap<String, V>,
}

impl<V> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self {
            map: DashMap::new(),
        }
    }
}

impl<V> InMemoryStore<V> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<V> KeyValueStore<V> for InMemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, AppError> {
        Ok(self.map.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: V) -> Result<Option<V>, AppError> {
        Ok(self.map.insert(key.to_string(), value))
    }

    async fn delete(&self, key: &str) -> Result<Option<V>, AppError> {
        Ok(self.map.remove(key).map(|(_, value)| value))
    }

    async fn entries(&self) -> Result<Vec<(String, V)>, AppError> {
        Ok(self
            .map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}

/// Pending applicant → recruiter requests, keyed by lobby id
#[derive(Clone)]
pub struct ConnectionRegistry {
    store: Arc<dyn KeyValueStore<ConnectionRequest>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}

impl ConnectionRegistry {
    pub fn new(store: Arc<dyn KeyValueStore<ConnectionRequest>>) -> Self {
        Self { store }
    }

    /// Store `data` under `id`. Last write wins: an existing entry is
    /// replaced and returned.
    pub async fn add_connection(
        &self,
        id: &str,
        data: ConnectionRequest,
    ) -> Result<Option<ConnectionRequest>, AppError> {
        let applicant_id = data.applicant_id.clone();
        let previous = self.store.set(id, data).await?;
        counter!(CONNECTION_REQUESTED).increment(1);

        if let Some(prev) = &previous {
            counter!(CONNECTION_OVERWRITTEN).increment(1);
            tracing::warn!(
                connection_id = id,
                previous_applicant = %prev.applicant_id,
                applicant = %applicant_id,
                "connection request overwritten"
            );
        }
        Ok(previous)
    }

    pub async fn remove_connection(&self, id: &str) -> Result<Option<ConnectionRequest>, AppError> {
        self.store.delete(id).await
    }

    pub async fn get_connection(&self, id: &str) -> Result<Option<ConnectionRequest>, AppError> {
        self.store.get(id).await
    }

    /// Snapshot of every pending request; mutating it does not touch the registry
    pub async fn all_connections(&self) -> Result<Vec<(String, ConnectionRequest)>, AppError> {
        self.store.entries().await
    }
}

/// Accepted pairings, keyed by a generated room id
#[derive(Clone)]
pub struct RoomRegistry {
    store: Arc<dyn KeyValueStore<Room>>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn KeyValueStore<Room>>) -> Self {
        Self { store }
    }

    /// Allocate a fresh room id and store `room` under it
    pub async fn create_room(&self, room: Room) -> Result<String, AppError> {
        let room_id = Uuid::new_v4().to_string();
        self.store.set(&room_id, room).await?;
        counter!(ROOM_CREATED).increment(1);
        tracing::info!(room_id = %room_id, "room created");
        Ok(room_id)
    }

    pub async fn get_room(&self, room_id: &str) -> Result<Option<Room>, AppError> {
        self.store.get(room_id).await
    }

    pub async fn remove_room(&self, room_id: &str) -> Result<Option<Room>, AppError> {
        let removed = self.store.delete(room_id).await?;
        if removed.is_some() {
            counter!(ROOM_CLOSED).increment(1);
        }
        Ok(removed)
    }

    pub async fn all_rooms(&self) -> Result<Vec<(String, Room)>, AppError> {
        self.store.entries().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn request(applicant: &str) -> ConnectionRequest {
        ConnectionRequest {
            applicant_id: applicant.to_string(),
            recruiter_id: "recruiter-1".to_string(),
            event_id: "event-1".to_string(),
            lobby_id: "lobby-1".to_string(),
        }
    }

    fn room() -> Room {
        Room {
            applicant_id: "applicant-1".to_string(),
            recruiter_id: "recruiter-1".to_string(),
            lobby_id: "lobby-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_connection_last_write_wins() {
        let registry = ConnectionRegistry::default();

        let first = registry.add_connection("lobby-1", request("a1")).await.unwrap();
        assert!(first.is_none());

        let replaced = registry.add_connection("lobby-1", request("a2")).await.unwrap();
        assert_eq!(replaced, Some(request("a1")));

        let current = registry.get_connection("lobby-1").await.unwrap().unwrap();
        assert_eq!(current.applicant_id, "a2");
        assert_eq!(registry.all_connections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_missing_connection_is_noop() {
        let registry = ConnectionRegistry::default();
        assert!(registry.remove_connection("nope").await.unwrap().is_none());
        assert!(registry.get_connection("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_connections_is_a_snapshot() {
        let registry = ConnectionRegistry::default();
        registry.add_connection("lobby-1", request("a1")).await.unwrap();

        let mut snapshot = registry.all_connections().await.unwrap();
        snapshot.clear();

        assert!(registry.get_connection("lobby-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_room_ids_are_unique() {
        let registry = RoomRegistry::default();
        let mut ids = HashSet::new();
        for _ in 0..50 {
            ids.insert(registry.create_room(room()).await.unwrap());
        }
        assert_eq!(ids.len(), 50);
        assert_eq!(registry.all_rooms().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_room_lookup_and_removal() {
        let registry = RoomRegistry::default();
        let room_id = registry.create_room(room()).await.unwrap();

        assert_eq!(registry.get_room(&room_id).await.unwrap(), Some(room()));
        assert_eq!(registry.remove_room(&room_id).await.unwrap(), Some(room()));
        assert!(registry.get_room(&room_id).await.unwrap().is_none());
        assert!(registry.remove_room(&room_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registries_share_an_injected_store() {
        let store: Arc<InMemoryStore<ConnectionRequest>> = Arc::new(InMemoryStore::new());
        let a = ConnectionRegistry::new(store.clone());
        let b = ConnectionRegistry::new(store);

        a.add_connection("lobby-1", request("a1")).await.unwrap();
        assert!(b.get_connection("lobby-1").await.unwrap().is_some());
    }
}
