//!
//! Backend session client
//! ----------------------
//! The REST endpoints the identity core consumes:
//! - `GET /api/me` for the current server session (401 means "no session").
//! - `POST /api/auth/logout` to drop the server session.
//! - `POST /api/auth/pi-login` to turn a validated Pi credential into a session.
//!
//! `HttpBackend` keeps a cookie store so the session cookie set by pi-login is
//! sent back on later calls, and attaches `x-user-id` when the caller knows it.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::{debug, error, warn};

use crate::error::{IdentityError, IdentityResult};
use crate::identity::{user_headers, AuthCredential, Identity};

#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// `Ok(None)` when the backend answers 401.
    async fn fetch_session(&self, user_id: Option<&str>) -> IdentityResult<Option<Identity>>;

    async fn logout(&self, user_id: Option<&str>) -> IdentityResult<()>;

    async fn pi_login(&self, credential: &AuthCredential, user_id: Option<&str>) -> IdentityResult<serde_json::Value>;
}

#[derive(Clone)]
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base: &str) -> IdentityResult<Self> {
        let mut base = Url::parse(base).map_err(|e| IdentityError::network(format!("invalid base URL '{}': {}", base, e)))?;
        // endpoint paths are joined relative to the base, so it must end in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| IdentityError::network(e.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url { &self.base }

    fn url(&self, path: &str) -> IdentityResult<Url> {
        self.base.join(path).map_err(|e| IdentityError::network(format!("invalid path '{}': {}", path, e)))
    }
}

/// Turn a non-success response into `BackendRejected` with "<status>: <body>".
async fn rejection(resp: reqwest::Response) -> IdentityError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let text = if text.is_empty() { status.canonical_reason().unwrap_or("").to_string() } else { text };
    let message = format!("{}: {}", status.as_u16(), text);
    if status.is_server_error() {
        error!(target: "purplebeats::backend", "server error: {}", message);
    } else if status == StatusCode::NOT_FOUND {
        warn!(target: "purplebeats::backend", "resource not found: {}", message);
    } else if status == StatusCode::UNAUTHORIZED {
        warn!(target: "purplebeats::backend", "unauthorized request: {}", message);
    }
    IdentityError::rejected(status.as_u16(), message)
}

fn transport(err: reqwest::Error) -> IdentityError {
    error!(target: "purplebeats::backend", "network error - backend may be down: {}", err);
    IdentityError::network(err.to_string())
}

#[async_trait]
impl SessionBackend for HttpBackend {
    async fn fetch_session(&self, user_id: Option<&str>) -> IdentityResult<Option<Identity>> {
        let resp = self.client
            .get(self.url("api/me")?)
            .headers(user_headers(user_id))
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            debug!(target: "purplebeats::backend", "no server session");
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }
        let body: serde_json::Value = resp.json().await?;
        if body.is_null() {
            return Ok(None);
        }
        let identity: Identity = serde_json::from_value(body)
            .map_err(|e| IdentityError::rejected(200, format!("malformed session body: {}", e)))?;
        Ok(Some(identity))
    }

    async fn logout(&self, user_id: Option<&str>) -> IdentityResult<()> {
        let resp = self.client
            .post(self.url("api/auth/logout")?)
            .headers(user_headers(user_id))
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }
        Ok(())
    }

    async fn pi_login(&self, credential: &AuthCredential, user_id: Option<&str>) -> IdentityResult<serde_json::Value> {
        let resp = self.client
            .post(self.url("api/auth/pi-login")?)
            .headers(user_headers(user_id))
            .json(&credential.login_payload())
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            return Err(rejection(resp).await);
        }
        // an empty 2xx body is still a success
        let text = resp.text().await.map_err(transport)?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| IdentityError::rejected(200, format!("malformed pi-login body: {}", e)))
    }
}
