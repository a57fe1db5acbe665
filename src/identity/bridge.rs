use std::sync::Arc;

use tracing::{info, warn};

use super::model::AuthCredential;
use super::session::SessionQuery;
use crate::error::IdentityResult;

/// Turns a validated Pi credential into a backend session.
#[derive(Clone)]
pub struct SessionBridge {
    sessions: Arc<SessionQuery>,
}

impl SessionBridge {
    pub fn new(sessions: Arc<SessionQuery>) -> Self { Self { sessions } }

    /// Takes the credential by value; it is dropped when this returns. The
    /// session cache is invalidated only after the backend accepted it, and a
    /// rejection is never retried here.
    pub async fn establish_session(&self, credential: AuthCredential, user_id: Option<&str>) -> IdentityResult<serde_json::Value> {
        let who = credential.identity_id.clone();
        match self.sessions.backend().pi_login(&credential, user_id).await {
            Ok(body) => {
                self.sessions.invalidate().await;
                info!(target: "purplebeats::bridge", "server session established for {}", who);
                Ok(body)
            }
            Err(e) => {
                warn!(target: "purplebeats::bridge", "pi-login rejected for {}: {}", who, e);
                Err(e)
            }
        }
    }
}
