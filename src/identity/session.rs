use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::model::Identity;
use crate::backend::SessionBackend;
use crate::error::IdentityResult;

#[derive(Debug, Clone)]
struct CachedSession {
    identity: Option<Identity>,
    fetched_at: Instant,
}

/// Cached `/api/me` query. Concurrent readers share one in-flight fetch;
/// errors are never cached.
pub struct SessionQuery {
    backend: Arc<dyn SessionBackend>,
    stale_after: Duration,
    cached: Mutex<Option<CachedSession>>,
}

impl SessionQuery {
    pub fn new(backend: Arc<dyn SessionBackend>, stale_after: Duration) -> Self {
        Self { backend, stale_after, cached: Mutex::new(None) }
    }

    pub fn backend(&self) -> &Arc<dyn SessionBackend> { &self.backend }

    pub async fn get(&self, user_id: Option<&str>) -> IdentityResult<Option<Identity>> {
        let mut cached = self.cached.lock().await;
        if let Some(c) = cached.as_ref() {
            if c.fetched_at.elapsed() < self.stale_after {
                return Ok(c.identity.clone());
            }
        }
        let identity = self.backend.fetch_session(user_id).await?;
        debug!(target: "purplebeats::session", "session fetched: present={}", identity.is_some());
        *cached = Some(CachedSession { identity: identity.clone(), fetched_at: Instant::now() });
        Ok(identity)
    }

    /// Drop the cached value so the next `get` goes to the backend.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
        debug!(target: "purplebeats::session", "session cache invalidated");
    }

    pub async fn is_cached(&self) -> bool {
        self.cached.lock().await.is_some()
    }
}
