use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::models::{Article, PendingArticle, User};

/// Catalog
///
/// The complete persisted state: one ordered collection per record type.
/// Order matters, since edits replace articles in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub pending_articles: Vec<PendingArticle>,
}

/// StorageError
///
/// Failures of the persistence backend. These never reach clients verbatim.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// 1. StorageService Contract
/// StorageService
///
/// Defines the abstract contract for the persistence layer. The repository reads the
/// catalog once at startup and writes a whole snapshot after every mutation, so a
/// backend only needs to make `save` all-or-nothing.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Reads the stored catalog. A backend with nothing stored yet returns an empty one.
    async fn load(&self) -> Result<Catalog, StorageError>;

    /// Replaces the stored catalog with `catalog`.
    async fn save(&self, catalog: &Catalog) -> Result<(), StorageError>;
}

// 2. The Real Implementation (JSON document on disk)
/// JsonFileStorage
///
/// Persists the catalog as a single pretty-printed JSON document. Writes go to a
/// sibling temp file that is then renamed over the target, so a crash mid-write
/// leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists the rename itself. Not every platform can open a directory for
    /// syncing, so a failure here is logged rather than returned.
    async fn sync_parent_dir(&self) {
        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        let synced = match tokio::fs::File::open(&dir).await {
            Ok(handle) => handle.sync_all().await,
            Err(e) => Err(e),
        };
        if let Err(e) = synced {
            tracing::debug!(dir = %dir.display(), "could not sync catalog directory: {}", e);
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StorageService for JsonFileStorage {
    async fn load(&self) -> Result<Catalog, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no catalog found, starting empty");
                Ok(Catalog::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, catalog: &Catalog) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(catalog)?;
        let temp = self.temp_path();

        // The temp file must be on disk before the rename makes it the catalog.
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp, &self.path).await?;
        self.sync_parent_dir().await;
        Ok(())
    }
}

// 3. The In-Memory Implementation (tests, STORAGE_BACKEND=memory)
/// MemoryStorage
///
/// Keeps the last saved catalog in process memory. Can be flipped into a failing
/// mode to simulate persistence faults from tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    catalog: Mutex<Catalog>,
    /// When true, all operations return a simulated failure.
    should_fail: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn new_failing() -> Self {
        let storage = Self::default();
        storage.set_failing(true);
        storage
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// The catalog as last saved.
    pub async fn snapshot(&self) -> Catalog {
        self.catalog.lock().await.clone()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory storage set to fail".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageService for MemoryStorage {
    async fn load(&self) -> Result<Catalog, StorageError> {
        self.check()?;
        Ok(self.catalog.lock().await.clone())
    }

    async fn save(&self, catalog: &Catalog) -> Result<(), StorageError> {
        self.check()?;
        *self.catalog.lock().await = catalog.clone();
        Ok(())
    }
}

/// StorageState
///
/// The concrete type used to share the storage backend.
pub type StorageState = Arc<dyn StorageService>;
