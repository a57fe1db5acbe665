use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Bounded polling policy for the SDK readiness check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        // 10 x 500ms = 5s before the "Pi Browser required" notice
        Self { max_attempts: 10, interval_ms: 500 }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval_ms: interval.as_millis() as u64 }
    }

    #[inline]
    pub fn interval(&self) -> Duration { Duration::from_millis(self.interval_ms) }

    /// A cycle always performs at least one check.
    #[inline]
    pub fn attempts(&self) -> u32 { self.max_attempts.max(1) }
}

/// Settings passed to `Pi.init`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SdkInitConfig {
    pub version: String,
    pub sandbox: bool,
    pub app_id: String,
}

impl Default for SdkInitConfig {
    fn default() -> Self {
        Self { version: "2.0".to_string(), sandbox: true, app_id: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the backend serving /api/me and /api/auth/*
    pub api_base: String,
    pub sdk: SdkInitConfig,
    pub poll: PollPolicy,
    /// One-shot deadline used by the direct initialization path.
    pub init_deadline_ms: u64,
    pub init_interval_ms: u64,
    /// How long a fetched session stays fresh before /api/me is queried again.
    pub session_stale_ms: u64,
    /// Where the guest identity is persisted; in-memory when unset.
    pub identity_file: Option<PathBuf>,
    pub scopes: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5000".to_string(),
            sdk: SdkInitConfig::default(),
            poll: PollPolicy::default(),
            init_deadline_ms: 10_000,
            init_interval_ms: 100,
            session_stale_ms: 5 * 60 * 1000,
            identity_file: None,
            scopes: crate::sdk::auth::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    /// Build a config from `PURPLEBEATS_*` environment variables on top of the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` but with an injectable lookup so tests do not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("PURPLEBEATS_API_BASE") {
            cfg.api_base = v;
        }
        if let Some(v) = lookup("PURPLEBEATS_PI_APP_ID") {
            cfg.sdk.app_id = v;
        }
        if let Some(v) = lookup("PURPLEBEATS_PI_SANDBOX") {
            cfg.sdk.sandbox = !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        cfg.poll.max_attempts = parse_or(&lookup, "PURPLEBEATS_SDK_POLL_ATTEMPTS", cfg.poll.max_attempts);
        cfg.poll.interval_ms = parse_or(&lookup, "PURPLEBEATS_SDK_POLL_INTERVAL_MS", cfg.poll.interval_ms);
        cfg.init_deadline_ms = parse_or(&lookup, "PURPLEBEATS_SDK_INIT_DEADLINE_MS", cfg.init_deadline_ms);
        cfg.init_interval_ms = parse_or(&lookup, "PURPLEBEATS_SDK_INIT_INTERVAL_MS", cfg.init_interval_ms);
        cfg.session_stale_ms = parse_or(&lookup, "PURPLEBEATS_SESSION_STALE_MS", cfg.session_stale_ms);
        if let Some(v) = lookup("PURPLEBEATS_IDENTITY_FILE") {
            if !v.trim().is_empty() {
                cfg.identity_file = Some(PathBuf::from(v));
            }
        }
        cfg
    }

    #[inline]
    pub fn init_deadline(&self) -> Duration { Duration::from_millis(self.init_deadline_ms) }

    #[inline]
    pub fn init_interval(&self) -> Duration { Duration::from_millis(self.init_interval_ms) }

    #[inline]
    pub fn session_stale(&self) -> Duration { Duration::from_millis(self.session_stale_ms) }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!(target: "purplebeats::config", "ignoring invalid {}='{}', using {}", key, raw, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_observed_policy() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.poll.max_attempts, 10);
        assert_eq!(cfg.poll.interval(), Duration::from_millis(500));
        assert_eq!(cfg.init_deadline(), Duration::from_secs(10));
        assert_eq!(cfg.session_stale(), Duration::from_secs(300));
        assert_eq!(cfg.scopes, vec!["username".to_string(), "payments".to_string()]);
        assert!(cfg.sdk.sandbox);
        assert_eq!(cfg.sdk.version, "2.0");
    }

    #[test]
    fn env_overrides_and_bad_numbers_fall_back() {
        let mut env = HashMap::new();
        env.insert("PURPLEBEATS_API_BASE", "https://beats.example");
        env.insert("PURPLEBEATS_PI_SANDBOX", "false");
        env.insert("PURPLEBEATS_SDK_POLL_ATTEMPTS", "3");
        env.insert("PURPLEBEATS_SDK_POLL_INTERVAL_MS", "not-a-number");
        env.insert("PURPLEBEATS_IDENTITY_FILE", "/tmp/guest.json");
        let cfg = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api_base, "https://beats.example");
        assert!(!cfg.sdk.sandbox);
        assert_eq!(cfg.poll.max_attempts, 3);
        assert_eq!(cfg.poll.interval_ms, 500);
        assert_eq!(cfg.identity_file, Some(PathBuf::from("/tmp/guest.json")));
    }

    #[test]
    fn zero_attempts_still_checks_once() {
        assert_eq!(PollPolicy::new(0, Duration::from_millis(10)).attempts(), 1);
    }
}
