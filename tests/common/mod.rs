//! Fakes for the SDK, the backend and the identity store shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use purplebeats::backend::SessionBackend;
use purplebeats::config::SdkInitConfig;
use purplebeats::identity::{AuthCredential, Identity, IdentityStore, SessionQuery};
use purplebeats::sdk::{AuthResult, HandleProbe, IncompletePaymentHandler, PaymentDto, PiSdk, SdkRejection};
use purplebeats::{IdentityError, IdentityResult};

// ---- SDK ---------------------------------------------------------------

pub struct FakeSdk {
    pub outcome: Mutex<Result<AuthResult, SdkRejection>>,
    pub pending_payments: Mutex<Vec<PaymentDto>>,
    pub has_authenticate: bool,
    pub initialized: AtomicBool,
    pub calls: AtomicUsize,
    /// When set, `authenticate` parks until the gate is notified.
    pub gate: Option<Arc<Notify>>,
}

impl FakeSdk {
    pub fn ok(uid: &str, username: &str, token: &str) -> Self {
        Self::with_outcome(Ok(AuthResult::new(token, uid, username)))
    }

    pub fn rejecting(message: &str) -> Self {
        Self::with_outcome(Err(SdkRejection::new(message)))
    }

    pub fn with_outcome(outcome: Result<AuthResult, SdkRejection>) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            pending_payments: Mutex::new(Vec::new()),
            has_authenticate: true,
            initialized: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn without_authenticate(mut self) -> Self {
        self.has_authenticate = false;
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl PiSdk for FakeSdk {
    async fn authenticate(&self, _scopes: &[String], on_incomplete_payment: IncompletePaymentHandler) -> Result<AuthResult, SdkRejection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for p in self.pending_payments.lock().drain(..) {
            on_incomplete_payment(p);
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcome.lock().clone()
    }

    fn init(&self, _config: &SdkInitConfig) -> IdentityResult<()> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_initialized(&self) -> bool { self.initialized.load(Ordering::SeqCst) }

    fn supports_authenticate(&self) -> bool { self.has_authenticate }
}

/// Probe that counts checks and reports present from check number `appears_at` on.
pub struct CountingProbe {
    pub checks: AtomicUsize,
    pub appears_at: Option<usize>,
}

impl CountingProbe {
    pub fn never() -> Arc<Self> { Arc::new(Self { checks: AtomicUsize::new(0), appears_at: None }) }
    pub fn at(k: usize) -> Arc<Self> { Arc::new(Self { checks: AtomicUsize::new(0), appears_at: Some(k) }) }
    pub fn checks(&self) -> usize { self.checks.load(Ordering::SeqCst) }
}

impl HandleProbe for CountingProbe {
    fn probe(&self) -> bool {
        let n = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        matches!(self.appears_at, Some(k) if n >= k)
    }
}

// ---- backend -----------------------------------------------------------

#[derive(Default)]
pub struct FakeBackend {
    pub session: Mutex<Option<Identity>>,
    pub session_fails: AtomicBool,
    pub login_rejects_with: Mutex<Option<u16>>,
    pub logout_fails: AtomicBool,
    pub logout_gate: Mutex<Option<Arc<Notify>>>,
    pub fetches: AtomicUsize,
    pub logins: AtomicUsize,
    pub logouts: AtomicUsize,
    pub last_login_token: Mutex<Option<String>>,
    pub hints: Mutex<Vec<Option<String>>>,
}

impl FakeBackend {
    pub fn anonymous() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn with_session(identity: Identity) -> Arc<Self> {
        let b = Self::default();
        *b.session.lock() = Some(identity);
        Arc::new(b)
    }

    pub fn fetches(&self) -> usize { self.fetches.load(Ordering::SeqCst) }
    pub fn logins(&self) -> usize { self.logins.load(Ordering::SeqCst) }
}

#[async_trait]
impl SessionBackend for FakeBackend {
    async fn fetch_session(&self, user_id: Option<&str>) -> IdentityResult<Option<Identity>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.hints.lock().push(user_id.map(|s| s.to_string()));
        if self.session_fails.load(Ordering::SeqCst) {
            return Err(IdentityError::network("connection refused"));
        }
        Ok(self.session.lock().clone())
    }

    async fn logout(&self, _user_id: Option<&str>) -> IdentityResult<()> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        let gate = self.logout_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(IdentityError::rejected(500, "500: logout exploded"));
        }
        *self.session.lock() = None;
        Ok(())
    }

    async fn pi_login(&self, credential: &AuthCredential, _user_id: Option<&str>) -> IdentityResult<serde_json::Value> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        *self.last_login_token.lock() = Some(credential.token().to_string());
        if let Some(status) = *self.login_rejects_with.lock() {
            return Err(IdentityError::rejected(status, format!("{}: rejected", status)));
        }
        *self.session.lock() = Some(credential.identity());
        Ok(serde_json::json!({ "status": "ok" }))
    }
}

pub fn session_query(backend: Arc<FakeBackend>) -> Arc<SessionQuery> {
    Arc::new(SessionQuery::new(backend, std::time::Duration::from_secs(300)))
}

// ---- store -------------------------------------------------------------

/// Store whose every operation fails, as when storage is disabled.
pub struct BrokenStore;

#[async_trait]
impl IdentityStore for BrokenStore {
    async fn save(&self, _identity: &Identity) -> IdentityResult<()> { Err(IdentityError::storage("quota exceeded")) }
    async fn find(&self) -> IdentityResult<Option<Identity>> { Err(IdentityError::storage("storage disabled")) }
    async fn clear(&self) -> IdentityResult<()> { Err(IdentityError::storage("storage disabled")) }
}
