use serde::{Deserialize, Serialize};

use super::SdkSlot;

/// Paths that render without the SDK and never show the environment banner.
const NON_PI_PATHS: &[&str] = &["/landing", "/legal", "/not-found"];

pub fn is_pi_browser(user_agent: &str) -> bool {
    user_agent.contains("PiBrowser") || user_agent.contains("Pi Network")
}

/// Snapshot of the hosting environment used for the status banner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentStatus {
    pub is_loaded: bool,
    pub is_pi_browser: bool,
    pub is_initialized: bool,
    pub error: Option<String>,
}

impl EnvironmentStatus {
    pub fn evaluate(user_agent: &str, slot: &SdkSlot) -> Self {
        let is_pi_browser = is_pi_browser(user_agent);
        let handle = slot.current();
        let is_loaded = handle.is_some();
        let is_initialized = handle.map(|h| h.is_initialized()).unwrap_or(false);

        let error = if !is_pi_browser && !is_loaded {
            Some("This app requires the Pi Browser for full functionality. Please open it from the Pi Network app.".to_string())
        } else if !is_loaded {
            Some("Pi SDK failed to load. Some features may not work properly.".to_string())
        } else {
            None
        };

        Self { is_loaded, is_pi_browser, is_initialized, error }
    }

    /// Everything works: SDK present inside the Pi Browser.
    pub fn is_fully_ready(&self) -> bool { self.is_loaded && self.is_pi_browser }
}

pub fn should_show_warning(path: &str) -> bool {
    !NON_PI_PATHS.iter().any(|p| path.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pi_browser_user_agents() {
        assert!(is_pi_browser("Mozilla/5.0 (Linux; Android 13) PiBrowser/2.1"));
        assert!(is_pi_browser("Pi Network/1.0"));
        assert!(!is_pi_browser("Mozilla/5.0 (X11; Linux x86_64) Firefox/131.0"));
    }

    #[test]
    fn missing_sdk_outside_pi_browser_asks_for_pi_browser() {
        let status = EnvironmentStatus::evaluate("Firefox/131.0", &SdkSlot::new());
        assert!(!status.is_loaded);
        assert!(status.error.as_deref().unwrap().contains("requires the Pi Browser"));
    }

    #[test]
    fn missing_sdk_inside_pi_browser_reports_load_failure() {
        let status = EnvironmentStatus::evaluate("PiBrowser/2.1", &SdkSlot::new());
        assert!(status.is_pi_browser);
        assert!(status.error.as_deref().unwrap().starts_with("Pi SDK failed to load"));
        assert!(!status.is_fully_ready());
    }

    #[test]
    fn static_pages_skip_the_banner() {
        assert!(!should_show_warning("/legal/terms"));
        assert!(!should_show_warning("/landing"));
        assert!(should_show_warning("/library"));
    }
}
