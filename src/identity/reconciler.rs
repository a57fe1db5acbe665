//! Effective current identity: `server session ?? recovered guest ?? fresh guest`.
//!
//! `resolve()` walks SessionLoading -> SessionResolved, or SessionLoading ->
//! GuestRecovering -> GuestReady. A guest is never adopted or minted before the
//! session query has answered, and every pass ends with a current identity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use super::bridge::SessionBridge;
use super::model::Identity;
use super::session::SessionQuery;
use super::store::IdentityStore;
use crate::error::{IdentityError, IdentityResult};
use crate::sdk::auth::{default_scopes, AuthAdapter};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePhase {
    SessionLoading,
    SessionResolved,
    GuestRecovering,
    GuestReady,
}

#[derive(Debug)]
struct ReconcilerState {
    phase: ReconcilePhase,
    server: Option<Identity>,
    guest: Option<Identity>,
}

/// Resets the in-flight flag however `login()` exits, including when its future is dropped.
struct LoginFlag<'a>(&'a AtomicBool);

impl Drop for LoginFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct IdentityReconciler {
    sessions: Arc<SessionQuery>,
    bridge: SessionBridge,
    auth: AuthAdapter,
    store: Arc<dyn IdentityStore>,
    scopes: Vec<String>,
    state: Mutex<ReconcilerState>,
    resolving: tokio::sync::Mutex<()>,
    current_tx: watch::Sender<Option<Identity>>,
    login_in_flight: AtomicBool,
}

impl IdentityReconciler {
    pub fn new(sessions: Arc<SessionQuery>, auth: AuthAdapter, store: Arc<dyn IdentityStore>) -> Self {
        let (current_tx, _rx) = watch::channel(None);
        Self {
            bridge: SessionBridge::new(sessions.clone()),
            sessions,
            auth,
            store,
            scopes: default_scopes(),
            state: Mutex::new(ReconcilerState { phase: ReconcilePhase::SessionLoading, server: None, guest: None }),
            resolving: tokio::sync::Mutex::new(()),
            current_tx,
            login_in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn phase(&self) -> ReconcilePhase { self.state.lock().phase }

    pub fn is_loading(&self) -> bool { self.phase() == ReconcilePhase::SessionLoading }

    pub fn is_authenticated(&self) -> bool { self.state.lock().server.is_some() }

    pub fn current(&self) -> Option<Identity> {
        let s = self.state.lock();
        s.server.clone().or_else(|| s.guest.clone())
    }

    pub fn current_user_id(&self) -> Option<String> { self.current().map(|i| i.id) }

    pub fn guest(&self) -> Option<Identity> { self.state.lock().guest.clone() }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> { self.current_tx.subscribe() }

    pub fn is_login_in_flight(&self) -> bool { self.login_in_flight.load(Ordering::Acquire) }

    fn publish(&self) {
        self.current_tx.send_replace(self.current());
    }

    /// Run one reconciliation pass and return the resulting current identity.
    pub async fn resolve(&self) -> Identity {
        let _serial = self.resolving.lock().await;
        let hint = self.current_user_id();
        self.resolve_locked(hint.as_deref(), true).await
    }

    /// Caller holds `resolving`. The previous identity stays current until the
    /// replacement is swapped in with a single publish.
    async fn resolve_locked(&self, hint: Option<&str>, keep_guest: bool) -> Identity {
        self.state.lock().phase = ReconcilePhase::SessionLoading;

        match self.sessions.get(hint).await {
            Ok(Some(identity)) => {
                {
                    let mut s = self.state.lock();
                    s.server = Some(identity.clone());
                    if !keep_guest {
                        s.guest = None;
                    }
                    s.phase = ReconcilePhase::SessionResolved;
                }
                self.publish();
                info!(target: "purplebeats::reconciler", "server session for {}", identity.id);
                return identity;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(target: "purplebeats::reconciler", "session query failed, continuing as guest: {}", e);
            }
        }

        self.state.lock().phase = ReconcilePhase::GuestRecovering;

        let guest = match self.store.find().await {
            Ok(Some(found)) => {
                info!(target: "purplebeats::reconciler", "recovered persisted identity {}", found.id);
                found.into_ephemeral()
            }
            Ok(None) => self.mint_guest().await,
            Err(e) => {
                warn!(target: "purplebeats::reconciler", "could not read persisted identity: {}", e);
                self.mint_guest().await
            }
        };

        {
            let mut s = self.state.lock();
            s.server = None;
            s.guest = Some(guest.clone());
            s.phase = ReconcilePhase::GuestReady;
        }
        self.publish();
        guest
    }

    async fn mint_guest(&self) -> Identity {
        let guest = Identity::fresh_guest();
        if let Err(e) = self.store.save(&guest).await {
            warn!(target: "purplebeats::reconciler", "guest {} not persisted: {}", guest.id, e);
        }
        info!(target: "purplebeats::reconciler", "minted guest identity {}", guest.id);
        guest
    }

    /// Pi login. On any failure the previous guest stays current (and persisted).
    pub async fn login(&self) -> IdentityResult<Identity> {
        if self.login_in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(IdentityError::LoginInProgress);
        }
        let _flag = LoginFlag(&self.login_in_flight);

        let credential = self.auth.authenticate(&self.scopes).await?;

        let prior_guest = self.guest();
        let hint = self.current_user_id();
        let identity = credential.identity();
        if let Err(e) = self.store.save(&identity).await {
            warn!(target: "purplebeats::reconciler", "could not persist identity {}: {}", identity.id, e);
        }

        match self.bridge.establish_session(credential, hint.as_deref()).await {
            Ok(_) => Ok(self.resolve().await),
            Err(e) => {
                let restored = match &prior_guest {
                    Some(g) => self.store.save(g).await,
                    None => self.store.clear().await,
                };
                if let Err(se) = restored {
                    warn!(target: "purplebeats::reconciler", "could not restore guest record: {}", se);
                }
                Err(e)
            }
        }
    }

    /// The persisted identity is always cleared and a fresh identity replaces
    /// the old one; a backend failure is returned afterwards. The old identity
    /// stays current until then.
    pub async fn logout(&self) -> IdentityResult<()> {
        let _serial = self.resolving.lock().await;
        let hint = self.current_user_id();
        if let Err(e) = self.store.clear().await {
            warn!(target: "purplebeats::reconciler", "could not clear persisted identity: {}", e);
        }

        let result = self.sessions.backend().logout(hint.as_deref()).await;
        self.sessions.invalidate().await;
        match &result {
            Ok(()) => info!(target: "purplebeats::reconciler", "logged out"),
            Err(e) => warn!(target: "purplebeats::reconciler", "backend logout failed: {}", e),
        }

        self.resolve_locked(None, false).await;
        result
    }

    /// Forget the guest, locally and on disk. The server session is untouched.
    pub async fn clear_guest_profile(&self) -> IdentityResult<()> {
        self.state.lock().guest = None;
        self.publish();
        self.store.clear().await
    }
}
