use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::model::Identity;
use crate::error::{IdentityError, IdentityResult};

/// Local persisted-identity store. Only the reconciler writes to it.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn save(&self, identity: &Identity) -> IdentityResult<()>;
    async fn find(&self) -> IdentityResult<Option<Identity>>;
    /// Idempotent: clearing an empty store succeeds.
    async fn clear(&self) -> IdentityResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    slot: Mutex<Option<Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self { Self::default() }

    pub fn seeded(identity: Identity) -> Self {
        Self { slot: Mutex::new(Some(identity)) }
    }

    pub fn peek(&self) -> Option<Identity> { self.slot.lock().clone() }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn save(&self, identity: &Identity) -> IdentityResult<()> {
        *self.slot.lock() = Some(identity.clone());
        Ok(())
    }

    async fn find(&self) -> IdentityResult<Option<Identity>> {
        Ok(self.slot.lock().clone())
    }

    async fn clear(&self) -> IdentityResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// Single JSON document on disk. Writes go to a sibling temp file and are
/// renamed into place so a crash never leaves a half-written identity.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl IdentityStore for FileIdentityStore {
    async fn save(&self, identity: &Identity) -> IdentityResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(identity).map_err(|e| IdentityError::storage(e.to_string()))?;
        let tmp = self.temp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(target: "purplebeats::store", "identity {} saved to {}", identity.id, self.path.display());
        Ok(())
    }

    async fn find(&self) -> IdentityResult<Option<Identity>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let identity: Identity = serde_json::from_slice(&bytes)
            .map_err(|e| IdentityError::storage(format!("corrupt identity file {}: {}", self.path.display(), e)))?;
        Ok(Some(identity))
    }

    async fn clear(&self) -> IdentityResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
