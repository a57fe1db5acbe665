//! Pi SDK capability as seen by the identity core.
//! The SDK is an externally injected handle; the core only probes for it and
//! calls into it. `SdkSlot` stands in for the global the browser script fills.

pub mod auth;
pub mod environment;
pub mod init;
pub mod poller;
mod types;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::SdkInitConfig;
use crate::error::IdentityResult;

pub use types::{AuthResult, AuthResultUser, PaymentDirection, PaymentDto, PaymentStatus, PaymentTransaction, SdkRejection};

/// Callback the SDK invokes when it finds a payment the user never completed.
pub type IncompletePaymentHandler = Arc<dyn Fn(PaymentDto) + Send + Sync>;

#[async_trait]
pub trait PiSdk: Send + Sync {
    async fn authenticate(
        &self,
        scopes: &[String],
        on_incomplete_payment: IncompletePaymentHandler,
    ) -> Result<AuthResult, SdkRejection>;

    fn init(&self, config: &SdkInitConfig) -> IdentityResult<()>;

    fn is_initialized(&self) -> bool { false }

    /// Whether the loaded script exposes `authenticate`. Partially loaded
    /// handles report false and are treated as not ready.
    fn supports_authenticate(&self) -> bool { true }
}

/// Anything that can answer "is the SDK handle there right now".
pub trait HandleProbe: Send + Sync {
    fn probe(&self) -> bool;
}

/// Shared, swappable reference to the injected SDK handle.
#[derive(Clone, Default)]
pub struct SdkSlot {
    inner: Arc<RwLock<Option<Arc<dyn PiSdk>>>>,
}

impl SdkSlot {
    pub fn new() -> Self { Self::default() }

    pub fn with_handle(handle: Arc<dyn PiSdk>) -> Self {
        let slot = Self::new();
        slot.install(handle);
        slot
    }

    pub fn install(&self, handle: Arc<dyn PiSdk>) {
        *self.inner.write() = Some(handle);
    }

    pub fn remove(&self) -> Option<Arc<dyn PiSdk>> {
        self.inner.write().take()
    }

    pub fn current(&self) -> Option<Arc<dyn PiSdk>> {
        self.inner.read().clone()
    }

    pub fn is_present(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl HandleProbe for SdkSlot {
    fn probe(&self) -> bool { self.is_present() }
}

impl std::fmt::Debug for SdkSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkSlot").field("present", &self.is_present()).finish()
    }
}
