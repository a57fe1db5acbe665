//! Identity error model and mapping helpers.
//! One enum covers the SDK, the authentication exchange, the backend session
//! endpoints and the local identity store, so callers of `login()` and friends
//! handle a single type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentence shown to the user for any transport-level failure.
pub const NETWORK_UNREACHABLE_MESSAGE: &str =
    "Network error: Unable to connect to server. Please check your internet connection or try again later.";

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdentityError {
    #[error("Pi SDK not ready - authenticate missing")]
    SdkNotReady,
    #[error("Pi SDK timeout")]
    SdkTimeout,
    #[error("Pi authentication failed - missing user or token")]
    MalformedAuthResult,
    #[error("{reason}")]
    AuthExchangeFailed { reason: String },
    #[error("{message}")]
    BackendRejected { status: u16, message: String },
    #[error("identity storage unavailable: {message}")]
    StorageUnavailable { message: String },
    #[error("network unreachable: {message}")]
    NetworkUnreachable { message: String },
    #[error("a login is already in progress")]
    LoginInProgress,
}

impl IdentityError {
    pub fn auth_failed<S: Into<String>>(reason: S) -> Self { IdentityError::AuthExchangeFailed { reason: reason.into() } }
    pub fn rejected<S: Into<String>>(status: u16, message: S) -> Self { IdentityError::BackendRejected { status, message: message.into() } }
    pub fn storage<S: Into<String>>(message: S) -> Self { IdentityError::StorageUnavailable { message: message.into() } }
    pub fn network<S: Into<String>>(message: S) -> Self { IdentityError::NetworkUnreachable { message: message.into() } }

    pub fn code_str(&self) -> &'static str {
        match self {
            IdentityError::SdkNotReady => "sdk_not_ready",
            IdentityError::SdkTimeout => "sdk_timeout",
            IdentityError::MalformedAuthResult => "malformed_auth_result",
            IdentityError::AuthExchangeFailed { .. } => "auth_exchange_failed",
            IdentityError::BackendRejected { .. } => "backend_rejected",
            IdentityError::StorageUnavailable { .. } => "storage_unavailable",
            IdentityError::NetworkUnreachable { .. } => "network_unreachable",
            IdentityError::LoginInProgress => "login_in_progress",
        }
    }

    /// Map to the HTTP status a server would use for the same failure.
    pub fn http_status(&self) -> u16 {
        match self {
            IdentityError::SdkNotReady | IdentityError::SdkTimeout => 503,
            IdentityError::MalformedAuthResult => 502,
            IdentityError::AuthExchangeFailed { .. } => 401,
            IdentityError::BackendRejected { status, .. } => *status,
            IdentityError::StorageUnavailable { .. } => 507,
            IdentityError::NetworkUnreachable { .. } => 503,
            IdentityError::LoginInProgress => 409,
        }
    }

    /// Text suitable for a user-facing notice. Transport failures all collapse
    /// into one sentence so they read differently from HTTP-status errors.
    pub fn user_message(&self) -> String {
        match self {
            IdentityError::NetworkUnreachable { .. } => NETWORK_UNREACHABLE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures that only a manual retry can recover from.
    pub fn is_terminal_for_cycle(&self) -> bool {
        matches!(self, IdentityError::SdkTimeout)
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => IdentityError::rejected(status.as_u16(), format!("{}: {}", status.as_u16(), err)),
            None if err.is_decode() => IdentityError::rejected(200, format!("invalid response body: {}", err)),
            None => IdentityError::network(err.to_string()),
        }
    }
}

impl From<std::io::Error> for IdentityError {
    fn from(err: std::io::Error) -> Self {
        IdentityError::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(IdentityError::SdkNotReady.http_status(), 503);
        assert_eq!(IdentityError::SdkTimeout.http_status(), 503);
        assert_eq!(IdentityError::MalformedAuthResult.http_status(), 502);
        assert_eq!(IdentityError::auth_failed("user cancelled").http_status(), 401);
        assert_eq!(IdentityError::rejected(403, "403: forbidden").http_status(), 403);
        assert_eq!(IdentityError::storage("disk").http_status(), 507);
        assert_eq!(IdentityError::LoginInProgress.http_status(), 409);
    }

    #[test]
    fn auth_failure_displays_reason_verbatim() {
        let e = IdentityError::auth_failed("user cancelled");
        assert_eq!(e.to_string(), "user cancelled");
        assert_eq!(e.code_str(), "auth_exchange_failed");
    }

    #[test]
    fn network_errors_share_one_user_message() {
        let a = IdentityError::network("connection refused");
        let b = IdentityError::network("dns failure");
        assert_eq!(a.user_message(), b.user_message());
        assert_eq!(a.user_message(), NETWORK_UNREACHABLE_MESSAGE);
        // status errors keep their own text
        let r = IdentityError::rejected(500, "500: boom");
        assert_eq!(r.user_message(), "500: boom");
    }

    #[test]
    fn only_timeout_is_terminal() {
        assert!(IdentityError::SdkTimeout.is_terminal_for_cycle());
        assert!(!IdentityError::SdkNotReady.is_terminal_for_cycle());
        assert!(!IdentityError::MalformedAuthResult.is_terminal_for_cycle());
    }

    #[test]
    fn serializes_with_type_tag() {
        let v = serde_json::to_value(IdentityError::rejected(401, "401: nope")).unwrap();
        assert_eq!(v["type"], "backend_rejected");
        assert_eq!(v["status"], 401);
    }
}
