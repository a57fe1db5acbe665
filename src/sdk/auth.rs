//! Authentication against the Pi SDK.
//!
//! `AuthAdapter::authenticate` is the single implementation; the callback form
//! spawns the same future, so both surfaces validate identically.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{AuthResult, IncompletePaymentHandler, PaymentDto, SdkRejection, SdkSlot};
use crate::error::{IdentityError, IdentityResult};
use crate::identity::AuthCredential;

pub const DEFAULT_SCOPES: &[&str] = &["username", "payments"];

pub fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

#[derive(Clone)]
pub struct AuthAdapter {
    sdk: SdkSlot,
    payments: Option<mpsc::UnboundedSender<PaymentDto>>,
}

impl AuthAdapter {
    pub fn new(sdk: SdkSlot) -> Self {
        Self { sdk, payments: None }
    }

    /// Forward incomplete payments reported during authentication to `tx`
    /// in addition to logging them.
    pub fn with_payment_forwarding(mut self, tx: mpsc::UnboundedSender<PaymentDto>) -> Self {
        self.payments = Some(tx);
        self
    }

    fn incomplete_payment_handler(&self) -> IncompletePaymentHandler {
        let forward = self.payments.clone();
        Arc::new(move |payment: PaymentDto| {
            info!(target: "purplebeats::auth", "incomplete payment found: id={} amount={} memo='{}'",
                payment.identifier, payment.amount, payment.memo);
            if let Some(tx) = &forward {
                if tx.send(payment).is_err() {
                    error!(target: "purplebeats::auth", "incomplete payment receiver dropped");
                }
            }
        })
    }

    pub async fn authenticate(&self, scopes: &[String]) -> IdentityResult<AuthCredential> {
        let handle = match self.sdk.current() {
            Some(h) if h.supports_authenticate() => h,
            _ => return Err(IdentityError::SdkNotReady),
        };
        info!(target: "purplebeats::auth", "starting Pi authentication with scopes {:?}", scopes);

        let result = handle
            .authenticate(scopes, self.incomplete_payment_handler())
            .await
            .map_err(|rejection| {
                let err = rejection_to_error(rejection);
                error!(target: "purplebeats::auth", "Pi.authenticate failed: {}", err);
                err
            })?;

        let credential = validate(result)?;
        info!(target: "purplebeats::auth", "Pi authentication successful for {}", credential.display_name);
        Ok(credential)
    }

    /// Callback surface over `authenticate`. A missing SDK is reported
    /// synchronously through `on_error` and no task is spawned.
    pub fn authenticate_with_callbacks<S, E>(&self, scopes: Vec<String>, on_success: S, on_error: E) -> Option<JoinHandle<()>>
    where
        S: FnOnce(AuthCredential) + Send + 'static,
        E: FnOnce(IdentityError) + Send + 'static,
    {
        if !self.sdk.current().map(|h| h.supports_authenticate()).unwrap_or(false) {
            on_error(IdentityError::SdkNotReady);
            return None;
        }
        let adapter = self.clone();
        Some(tokio::spawn(async move {
            match adapter.authenticate(&scopes).await {
                Ok(credential) => on_success(credential),
                Err(e) => on_error(e),
            }
        }))
    }
}

fn rejection_to_error(rejection: SdkRejection) -> IdentityError {
    match rejection.message {
        Some(m) if !m.trim().is_empty() => IdentityError::auth_failed(m),
        _ => IdentityError::auth_failed("Authentication failed"),
    }
}

fn validate(result: AuthResult) -> IdentityResult<AuthCredential> {
    let token = result.access_token.filter(|t| !t.is_empty());
    let user = result.user.unwrap_or_default();
    let uid = user.uid.filter(|u| !u.is_empty());
    match (token, uid) {
        (Some(token), Some(uid)) => {
            let display_name = user.username.filter(|n| !n.is_empty()).unwrap_or_else(|| uid.clone());
            Ok(AuthCredential::new(uid, display_name, token))
        }
        _ => {
            error!(target: "purplebeats::auth", "Pi auth result missing user id or token");
            Err(IdentityError::MalformedAuthResult)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::AuthResultUser;

    #[test]
    fn validation_requires_token_and_uid() {
        assert!(validate(AuthResult::new("tok", "u1", "alice")).is_ok());
        assert_eq!(validate(AuthResult::new("", "u1", "alice")).unwrap_err(), IdentityError::MalformedAuthResult);
        assert_eq!(validate(AuthResult::new("tok", "", "alice")).unwrap_err(), IdentityError::MalformedAuthResult);
        let no_user = AuthResult { access_token: Some("tok".into()), user: None };
        assert_eq!(validate(no_user).unwrap_err(), IdentityError::MalformedAuthResult);
    }

    #[test]
    fn missing_username_falls_back_to_uid() {
        let r = AuthResult {
            access_token: Some("tok".into()),
            user: Some(AuthResultUser { uid: Some("u1".into()), username: None }),
        };
        let c = validate(r).unwrap();
        assert_eq!(c.display_name, "u1");
    }

    #[test]
    fn opaque_rejection_gets_generic_message() {
        assert_eq!(rejection_to_error(SdkRejection::opaque()).to_string(), "Authentication failed");
        assert_eq!(rejection_to_error(SdkRejection::new("user cancelled")).to_string(), "user cancelled");
    }
}
