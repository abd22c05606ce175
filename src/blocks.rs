//! Local block list: the set of user ids the viewer has chosen to hide.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum BlockStoreError {
    #[error("block list io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("block list is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn is_user_blocked(&self, id: &str) -> Result<bool, BlockStoreError>;
    async fn add_user_block(&self, id: &str) -> Result<(), BlockStoreError>;
    async fn remove_user_block(&self, id: &str) -> Result<(), BlockStoreError>;
    async fn list_blocks(&self) -> Result<Vec<String>, BlockStoreError>;
}

pub fn default_block_list_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config/chattertui/blocks.json")
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Block list persisted as a JSON array of user ids.
///
/// The file is read lazily on first access and rewritten on every change.
pub struct FileBlockStore {
    path: PathBuf,
    ids: Mutex<Option<BTreeSet<String>>>,
}

impl FileBlockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: Mutex::new(None),
        }
    }

    async fn read_file(path: &Path) -> Result<BTreeSet<String>, BlockStoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) if json.trim().is_empty() => Ok(BTreeSet::new()),
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeSet::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, ids: &BTreeSet<String>) -> Result<(), BlockStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(ids)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Apply `change` to the loaded set and persist it if anything changed.
    async fn update(
        &self,
        change: impl FnOnce(&mut BTreeSet<String>) -> bool,
    ) -> Result<(), BlockStoreError> {
        let mut guard = self.ids.lock().await;
        let mut ids = match guard.take() {
            Some(ids) => ids,
            None => Self::read_file(&self.path).await?,
        };
        if change(&mut ids) {
            // Leave the cache empty on failure so the next access rereads disk.
            self.write_file(&ids).await?;
        }
        *guard = Some(ids);
        Ok(())
    }

    async fn snapshot(&self) -> Result<BTreeSet<String>, BlockStoreError> {
        let mut guard = self.ids.lock().await;
        if let Some(ids) = guard.as_ref() {
            return Ok(ids.clone());
        }
        let ids = Self::read_file(&self.path).await?;
        *guard = Some(ids.clone());
        Ok(ids)
    }
}

#[async_trait]
impl BlockStore for FileBlockStore {
    async fn is_user_blocked(&self, id: &str) -> Result<bool, BlockStoreError> {
        Ok(self.snapshot().await?.contains(id))
    }

    async fn add_user_block(&self, id: &str) -> Result<(), BlockStoreError> {
        tracing::debug!(user_id = id, path = %self.path.display(), "adding local block");
        self.update(|ids| ids.insert(id.to_string())).await
    }

    async fn remove_user_block(&self, id: &str) -> Result<(), BlockStoreError> {
        tracing::debug!(user_id = id, path = %self.path.display(), "removing local block");
        self.update(|ids| ids.remove(id)).await
    }

    async fn list_blocks(&self) -> Result<Vec<String>, BlockStoreError> {
        Ok(self.snapshot().await?.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Non-persistent store, used when no block list file is wanted.
#[derive(Default)]
pub struct MemoryBlockStore {
    ids: Mutex<BTreeSet<String>>,
}

impl MemoryBlockStore {
    pub fn with_blocked<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Mutex::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn is_user_blocked(&self, id: &str) -> Result<bool, BlockStoreError> {
        Ok(self.ids.lock().await.contains(id))
    }

    async fn add_user_block(&self, id: &str) -> Result<(), BlockStoreError> {
        self.ids.lock().await.insert(id.to_string());
        Ok(())
    }

    async fn remove_user_block(&self, id: &str) -> Result<(), BlockStoreError> {
        self.ids.lock().await.remove(id);
        Ok(())
    }

    async fn list_blocks(&self) -> Result<Vec<String>, BlockStoreError> {
        Ok(self.ids.lock().await.iter().cloned().collect())
    }
}
