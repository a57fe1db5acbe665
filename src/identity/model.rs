use serde::{Deserialize, Serialize};

pub const GUEST_DISPLAY_NAME: &str = "Guest User";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(alias = "uid")]
    pub id: String,
    #[serde(default = "guest_display_name", alias = "username")]
    pub display_name: String,
    #[serde(default, alias = "isGuest")]
    pub is_ephemeral: bool,
}

fn guest_display_name() -> String { GUEST_DISPLAY_NAME.to_string() }

impl Identity {
    pub fn new<S: Into<String>>(id: S, display_name: S) -> Self {
        Self { id: id.into(), display_name: display_name.into(), is_ephemeral: false }
    }

    /// Mint a throwaway guest: `guest-<random>-<unix millis>`.
    pub fn fresh_guest() -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("guest-{}-{}", &random[..11], chrono::Utc::now().timestamp_millis());
        Self { id, display_name: GUEST_DISPLAY_NAME.to_string(), is_ephemeral: true }
    }

    pub fn into_ephemeral(mut self) -> Self {
        self.is_ephemeral = true;
        self
    }

    pub fn is_guest_id(&self) -> bool { self.id.starts_with("guest-") }
}

/// Validated output of a Pi authentication exchange. The token never appears
/// in `Debug` output and the type is deliberately not `Serialize`; the only way
/// out is the login payload built for the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredential {
    pub identity_id: String,
    pub display_name: String,
    token: String,
}

impl AuthCredential {
    pub fn new<S: Into<String>>(identity_id: S, display_name: S, token: S) -> Self {
        Self { identity_id: identity_id.into(), display_name: display_name.into(), token: token.into() }
    }

    pub fn token(&self) -> &str { &self.token }

    /// The identity this credential speaks for, as stored locally (no token).
    pub fn identity(&self) -> Identity {
        Identity::new(self.identity_id.clone(), self.display_name.clone())
    }

    /// Body for `POST /api/auth/pi-login`.
    pub fn login_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "authResult": {
                "accessToken": self.token,
                "user": { "uid": self.identity_id, "username": self.display_name }
            }
        })
    }
}

impl std::fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCredential")
            .field("identity_id", &self.identity_id)
            .field("display_name", &self.display_name)
            .field("token", &"<redacted>")
            .finish()
    }
}
