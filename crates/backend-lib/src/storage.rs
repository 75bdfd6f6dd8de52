// ============================
// talentlobby-backend-lib/src/storage.rs
// ============================
//! Storage abstraction with flat-file implementation.
//!
//! Lobbies and lobby connections are the only durable records this
//! service owns. Each event gets one JSON document holding its lobby and
//! everyone currently present in it.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{fs as tokio_fs, sync::Mutex};
use uuid::Uuid;

use crate::error::AppError;

/// A per-event gathering space
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lobby {
    pub id: String,
    pub event_id: String,
    pub created_at: DateTime<Utc>,
}

/// Durable record of a user's presence in a lobby
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LobbyConnection {
    pub id: String,
    pub user_id: String,
    pub lobby_id: String,
    pub joined_at: DateTime<Utc>,
}

/// Trait for storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create the lobby for an event, returning the existing one if present
    async fn create_lobby(&self, event_id: &str) -> Result<Lobby, AppError>;

    /// Look up the lobby for an event
    async fn find_lobby_by_event(&self, event_id: &str) -> Result<Option<Lobby>, AppError>;

    /// Record a user's presence; at most one record per (user, lobby)
    async fn create_lobby_connection(
        &self,
        lobby: &Lobby,
        user_id: &str,
    ) -> Result<LobbyConnection, AppError>;

    /// Remove a user's presence record, returning it if it existed
    async fn delete_lobby_connection(
        &self,
        lobby: &Lobby,
        user_id: &str,
    ) -> Result<Option<LobbyConnection>, AppError>;

    /// Everyone currently present in a lobby
    async fn list_lobby_connections(&self, lobby: &Lobby) -> Result<Vec<LobbyConnection>, AppError>;
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LobbyDocument {
    lobby: Lobby,
    connections: Vec<LobbyConnection>,
}

/// Flat-file implementation of the Storage trait
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("lobbies"))?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn document_path(&self, event_id: &str) -> PathBuf {
        self.root.join("lobbies").join(format!("{event_id}.json"))
    }

    async fn read_document(&self, event_id: &str) -> Result<Option<LobbyDocument>, AppError> {
        let path = self.document_path(event_id);
        match tokio_fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file so readers never see a partial document
    async fn write_document(&self, doc: &LobbyDocument) -> Result<(), AppError> {
        let path = self.document_path(&doc.lobby.event_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(doc)?;
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn require_document(&self, lobby: &Lobby) -> Result<LobbyDocument, AppError> {
        self.read_document(&lobby.event_id)
            .await?
            .filter(|doc| doc.lobby.id == lobby.id)
            .ok_or_else(|| AppError::LobbyNotFound(lobby.event_id.clone()))
    }
}

#[async_trait]
impl Storage for FlatFileStorage {
    async fn create_lobby(&self, event_id: &str) -> Result<Lobby, AppError> {
        let _guard = self.write_lock.lock().await;
        if let Some(doc) = self.read_document(event_id).await? {
            return Ok(doc.lobby);
        }

        let doc = LobbyDocument {
            lobby: Lobby {
                id: Uuid::new_v4().to_string(),
                event_id: event_id.to_string(),
                created_at: Utc::now(),
            },
            connections: Vec::new(),
        };
        self.write_document(&doc).await?;
        tracing::info!(event_id, lobby_id = %doc.lobby.id, "lobby created");
        Ok(doc.lobby)
    }

    async fn find_lobby_by_event(&self, event_id: &str) -> Result<Option<Lobby>, AppError> {
        Ok(self.read_document(event_id).await?.map(|doc| doc.lobby))
    }

    async fn create_lobby_connection(
        &self,
        lobby: &Lobby,
        user_id: &str,
    ) -> Result<LobbyConnection, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.require_document(lobby).await?;

        if let Some(existing) = doc.connections.iter().find(|c| c.user_id == user_id) {
            return Ok(existing.clone());
        }

        let connection = LobbyConnection {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            lobby_id: lobby.id.clone(),
            joined_at: Utc::now(),
        };
        doc.connections.push(connection.clone());
        self.write_document(&doc).await?;
        Ok(connection)
    }

    async fn delete_lobby_connection(
        &self,
        lobby: &Lobby,
        user_id: &str,
    ) -> Result<Option<LobbyConnection>, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.require_document(lobby).await?;

        let Some(pos) = doc.connections.iter().position(|c| c.user_id == user_id) else {
            return Ok(None);
        };
        let removed = doc.connections.remove(pos);
        self.write_document(&doc).await?;
        Ok(Some(removed))
    }

    async fn list_lobby_connections(&self, lobby: &Lobby) -> Result<Vec<LobbyConnection>, AppError> {
        Ok(self.require_document(lobby).await?.connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (FlatFileStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
        (storage, temp_dir)
    }

    #[tokio::test]
    async fn test_create_lobby_is_idempotent() {
        let (storage, _temp_dir) = setup();
        let first = storage.create_lobby("event-1").await.unwrap();
        let second = storage.create_lobby("event-1").await.unwrap();
        assert_eq!(first, second);

        let found = storage.find_lobby_by_event("event-1").await.unwrap();
        assert_eq!(found, Some(first));
        assert!(storage.find_lobby_by_event("event-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lobby_connection_unique_per_user() {
        let (storage, _temp_dir) = setup();
        let lobby = storage.create_lobby("event-1").await.unwrap();

        let first = storage.create_lobby_connection(&lobby, "user-1").await.unwrap();
        let again = storage.create_lobby_connection(&lobby, "user-1").await.unwrap();
        storage.create_lobby_connection(&lobby, "user-2").await.unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(storage.list_lobby_connections(&lobby).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_join_then_leave_leaves_no_record() {
        let (storage, _temp_dir) = setup();
        let lobby = storage.create_lobby("event-1").await.unwrap();
        storage.create_lobby_connection(&lobby, "user-1").await.unwrap();

        let removed = storage.delete_lobby_connection(&lobby, "user-1").await.unwrap();
        assert_eq!(removed.map(|c| c.user_id), Some("user-1".to_string()));
        assert!(storage.list_lobby_connections(&lobby).await.unwrap().is_empty());

        // deleting again is not an error
        assert!(storage
            .delete_lobby_connection(&lobby, "user-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_lobby_is_not_found() {
        let (storage, _temp_dir) = setup();
        let ghost = Lobby {
            id: "ghost".to_string(),
            event_id: "nowhere".to_string(),
            created_at: Utc::now(),
        };
        let err = storage.create_lobby_connection(&ghost, "user-1").await.unwrap_err();
        assert!(matches!(err, AppError::LobbyNotFound(_)));
    }

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let lobby = {
            let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
            let lobby = storage.create_lobby("event-1").await.unwrap();
            storage.create_lobby_connection(&lobby, "user-1").await.unwrap();
            lobby
        };

        let reopened = FlatFileStorage::new(temp_dir.path()).unwrap();
        let connections = reopened.list_lobby_connections(&lobby).await.unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].lobby_id, lobby.id);
    }
}
