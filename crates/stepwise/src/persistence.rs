//! Storage backends for wizard form data.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stepwise_core::{PersistenceAdapter, PersistenceError, Snapshot};
use tokio::sync::RwLock;

fn check_revision(
    key: &str,
    incoming: &Snapshot,
    stored: Option<u64>,
) -> Result<(), PersistenceError> {
    match stored {
        Some(stored) if incoming.revision <= stored => Err(PersistenceError::StaleRevision {
            key: key.to_string(),
            revision: incoming.revision,
            stored,
        }),
        _ => Ok(()),
    }
}

/// In-process store shared by every clone.
///
/// Cloning the store and building a second wizard from the clone behaves like
/// a page reload against the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<RwLock<HashMap<String, Snapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryStore {
    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let mut slots = self.slots.write().await;
        check_revision(key, snapshot, slots.get(key).map(|s| s.revision))?;
        slots.insert(key.to_string(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Snapshot>, PersistenceError> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.slots.write().await.remove(key);
        Ok(())
    }
}

/// Durable store writing one JSON document per key into a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a crash
/// never leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    async fn read(path: &Path) -> Result<Option<Snapshot>, PersistenceError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PersistenceAdapter for JsonFileStore {
    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        let stored = match Self::read(&path).await {
            Ok(existing) => existing.map(|s| s.revision),
            // An unreadable document is replaced rather than blocking every write.
            Err(PersistenceError::Serialization(_)) => None,
            Err(e) => return Err(e),
        };
        check_revision(key, snapshot, stored)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let body = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Snapshot>, PersistenceError> {
        let path = self.path_for(key)?;
        Self::read(&path).await
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
