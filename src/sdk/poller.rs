//! Bounded, cancellable check for the injected SDK handle.
//!
//! A `ReadinessPoller` owns at most one poll cycle at a time. Each cycle runs
//! as a tokio task that probes the handle immediately and then every
//! `interval`, up to `max_attempts` probes, and publishes the outcome through a
//! `watch` channel (plus an optional observer callback).
//!
//! Transitions and cancellation are serialized through a per-cycle guard:
//! once `cancel()` (or `retry()`, or `Drop`) returns, the cancelled cycle can
//! no longer publish anything.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{HandleProbe, SdkSlot};
use crate::config::PollPolicy;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SdkReadinessState {
    Pending,
    Ready,
    TimedOut,
}

impl SdkReadinessState {
    #[inline]
    pub fn is_resolved(self) -> bool { !matches!(self, SdkReadinessState::Pending) }

    /// The blocking "Pi Browser required" notice is shown only after a timeout.
    #[inline]
    pub fn shows_fallback(self) -> bool { matches!(self, SdkReadinessState::TimedOut) }
}

/// Observer invoked on every published state. It runs while the cycle guard
/// is held, so it must not call back into the poller.
pub type StateObserver = Arc<dyn Fn(SdkReadinessState) + Send + Sync>;

struct CycleGuard {
    cancelled: Mutex<bool>,
    state_tx: Arc<watch::Sender<SdkReadinessState>>,
    observer: Option<StateObserver>,
}

impl CycleGuard {
    fn publish(&self, next: SdkReadinessState) -> bool {
        let cancelled = self.cancelled.lock();
        if *cancelled {
            return false;
        }
        self.state_tx.send_replace(next);
        if let Some(observer) = &self.observer {
            observer(next);
        }
        true
    }

    fn cancel(&self) {
        *self.cancelled.lock() = true;
    }
}

struct PollCycle {
    id: u64,
    guard: Arc<CycleGuard>,
    task: JoinHandle<()>,
}

impl PollCycle {
    fn cancel(self) {
        self.guard.cancel();
        self.task.abort();
        debug!(target: "purplebeats::poller", "cycle {} cancelled", self.id);
    }
}

pub struct ReadinessPoller {
    probe: Arc<dyn HandleProbe>,
    policy: PollPolicy,
    state_tx: Arc<watch::Sender<SdkReadinessState>>,
    observer: Option<StateObserver>,
    current: Mutex<Option<PollCycle>>,
    cycles: AtomicU64,
}

impl ReadinessPoller {
    pub fn new(probe: Arc<dyn HandleProbe>, policy: PollPolicy) -> Self {
        let (tx, _rx) = watch::channel(SdkReadinessState::Pending);
        Self {
            probe,
            policy,
            state_tx: Arc::new(tx),
            observer: None,
            current: Mutex::new(None),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn for_slot(slot: SdkSlot, policy: PollPolicy) -> Self {
        Self::new(Arc::new(slot), policy)
    }

    pub fn with_observer(mut self, observer: StateObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn policy(&self) -> PollPolicy { self.policy }

    pub fn state(&self) -> SdkReadinessState { *self.state_tx.borrow() }

    pub fn subscribe(&self) -> watch::Receiver<SdkReadinessState> { self.state_tx.subscribe() }

    /// Start a poll cycle. Any cycle already running is cancelled first.
    pub fn start(&self) {
        let mut current = self.current.lock();
        if let Some(old) = current.take() {
            old.cancel();
        }
        let id = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let guard = Arc::new(CycleGuard {
            cancelled: Mutex::new(false),
            state_tx: self.state_tx.clone(),
            observer: self.observer.clone(),
        });
        guard.publish(SdkReadinessState::Pending);
        let task = tokio::spawn(run_cycle(id, self.probe.clone(), self.policy, guard.clone()));
        *current = Some(PollCycle { id, guard, task });
    }

    /// Manual retry after a timeout: reset to Pending and run a fresh cycle.
    pub fn retry(&self) {
        info!(target: "purplebeats::poller", "retrying Pi SDK detection");
        self.start();
    }

    /// Stop the running cycle, if any. No transition fires after this returns.
    pub fn cancel(&self) {
        if let Some(cycle) = self.current.lock().take() {
            cycle.cancel();
        }
    }

    /// Wait until the current cycle resolves. Never completes for a cycle
    /// that was cancelled while still pending.
    pub async fn wait_resolved(&self) -> SdkReadinessState {
        let mut rx = self.state_tx.subscribe();
        let resolved = rx.wait_for(|s| s.is_resolved()).await.map(|state| *state);
        resolved.unwrap_or_else(|_| *self.state_tx.borrow())
    }
}

impl Drop for ReadinessPoller {
    fn drop(&mut self) {
        if let Some(cycle) = self.current.get_mut().take() {
            cycle.cancel();
        }
    }
}

async fn run_cycle(id: u64, probe: Arc<dyn HandleProbe>, policy: PollPolicy, guard: Arc<CycleGuard>) {
    let max = policy.attempts();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        debug!(target: "purplebeats::poller", "cycle {}: checking Pi SDK availability (attempt {}/{})", id, attempts, max);
        if probe.probe() {
            if guard.publish(SdkReadinessState::Ready) {
                info!(target: "purplebeats::poller", "Pi SDK is available after {} check(s)", attempts);
            }
            return;
        }
        if attempts >= max {
            if guard.publish(SdkReadinessState::TimedOut) {
                warn!(target: "purplebeats::poller", "Pi SDK not found after {} attempts", max);
            }
            return;
        }
        tokio::time::sleep(policy.interval()).await;
    }
}
