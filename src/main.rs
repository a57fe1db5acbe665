use tracing_subscriber::{EnvFilter, fmt};
use tracing::{info, warn};

use purplebeats::config::ClientConfig;
use purplebeats::sdk::SdkSlot;
use purplebeats::IdentityCore;

/// Diagnostic probe: resolve the current identity against the configured
/// backend once and print it as JSON.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let cfg = ClientConfig::from_env();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "purplebeats",
        "PurpleBeats identity probe starting: RUST_LOG='{}', api_base={}, identity_file={:?}",
        rust_log, cfg.api_base, cfg.identity_file
    );

    // No browser shell here, so the SDK slot stays empty.
    let core = IdentityCore::from_config(cfg, SdkSlot::new())?;
    core.poller.start();
    let readiness = core.poller.wait_resolved().await;
    if readiness.shows_fallback() {
        warn!(target: "purplebeats", "Pi SDK unavailable; continuing with guest identity");
    }

    let identity = core.reconciler.resolve().await;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "identity": identity,
        "authenticated": core.reconciler.is_authenticated(),
        "sdk": readiness,
    }))?);
    Ok(())
}
