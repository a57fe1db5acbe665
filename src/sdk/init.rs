use std::time::Duration;

use tracing::{debug, info, warn};

use super::{HandleProbe, SdkSlot};
use crate::config::SdkInitConfig;
use crate::error::{IdentityError, IdentityResult};

/// Wait for the SDK handle with a hard deadline. Unlike the readiness poller
/// this path has no degraded state: it either finds the handle or fails.
pub async fn wait_for_sdk(probe: &dyn HandleProbe, deadline: Duration, interval: Duration) -> IdentityResult<()> {
    let wait = async {
        loop {
            if probe.probe() {
                return;
            }
            tokio::time::sleep(interval).await;
        }
    };
    match tokio::time::timeout(deadline, wait).await {
        Ok(()) => {
            debug!(target: "purplebeats::init", "Pi SDK loaded");
            Ok(())
        }
        Err(_) => {
            warn!(target: "purplebeats::init", "Pi SDK did not load within {}ms", deadline.as_millis());
            Err(IdentityError::SdkTimeout)
        }
    }
}

/// Wait for the handle, then call `Pi.init` with the given settings.
pub async fn initialize(slot: &SdkSlot, config: &SdkInitConfig, deadline: Duration, interval: Duration) -> IdentityResult<()> {
    wait_for_sdk(slot, deadline, interval).await?;
    // The handle can be pulled between the probe and here; treat that as not ready.
    let handle = slot.current().ok_or(IdentityError::SdkNotReady)?;
    if handle.is_initialized() {
        debug!(target: "purplebeats::init", "Pi SDK already initialized");
        return Ok(());
    }
    handle.init(config)?;
    info!(target: "purplebeats::init", "Pi SDK initialized (version={}, sandbox={})", config.version, config.sandbox);
    Ok(())
}
