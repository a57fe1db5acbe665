//! Wiring for the whole identity core from a `ClientConfig`.

use std::sync::Arc;

use tracing::info;

use crate::backend::{HttpBackend, SessionBackend};
use crate::config::ClientConfig;
use crate::error::IdentityResult;
use crate::identity::{FileIdentityStore, IdentityReconciler, IdentityStore, MemoryIdentityStore, SessionQuery};
use crate::sdk::auth::AuthAdapter;
use crate::sdk::poller::ReadinessPoller;
use crate::sdk::{init, SdkSlot};

pub struct IdentityCore {
    pub config: ClientConfig,
    pub sdk: SdkSlot,
    pub poller: ReadinessPoller,
    pub sessions: Arc<SessionQuery>,
    pub reconciler: Arc<IdentityReconciler>,
}

impl IdentityCore {
    /// Build against the HTTP backend named in the config.
    pub fn from_config(config: ClientConfig, sdk: SdkSlot) -> IdentityResult<Self> {
        let backend: Arc<dyn SessionBackend> = Arc::new(HttpBackend::new(&config.api_base)?);
        let store: Arc<dyn IdentityStore> = match &config.identity_file {
            Some(path) => Arc::new(FileIdentityStore::new(path.clone())),
            None => Arc::new(MemoryIdentityStore::new()),
        };
        Ok(Self::with_parts(config, sdk, backend, store))
    }

    pub fn with_parts(config: ClientConfig, sdk: SdkSlot, backend: Arc<dyn SessionBackend>, store: Arc<dyn IdentityStore>) -> Self {
        let sessions = Arc::new(SessionQuery::new(backend, config.session_stale()));
        let auth = AuthAdapter::new(sdk.clone());
        let reconciler = Arc::new(IdentityReconciler::new(sessions.clone(), auth, store).with_scopes(config.scopes.clone()));
        let poller = ReadinessPoller::for_slot(sdk.clone(), config.poll);
        info!(target: "purplebeats::client", "identity core ready (api_base={}, poll={}x{}ms)",
            config.api_base, config.poll.max_attempts, config.poll.interval_ms);
        Self { config, sdk, poller, sessions, reconciler }
    }

    /// Direct initialization path: wait for the SDK under the hard deadline and call `init`.
    pub async fn initialize_sdk(&self) -> IdentityResult<()> {
        init::initialize(&self.sdk, &self.config.sdk, self.config.init_deadline(), self.config.init_interval()).await
    }
}
