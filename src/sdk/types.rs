use serde::{Deserialize, Serialize};

/// Raw result of `Pi.authenticate`. Every field is optional so that a
/// malformed result can still be represented and rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthResultUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResultUser {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl AuthResult {
    pub fn new<S: Into<String>>(access_token: S, uid: S, username: S) -> Self {
        Self {
            access_token: Some(access_token.into()),
            user: Some(AuthResultUser { uid: Some(uid.into()), username: Some(username.into()) }),
        }
    }
}

/// Rejection raised by the SDK promise. `message` is absent when the SDK
/// rejected with something that is not an Error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkRejection {
    pub message: Option<String>,
}

impl SdkRejection {
    pub fn new<S: Into<String>>(message: S) -> Self { Self { message: Some(message.into()) } }
    pub fn opaque() -> Self { Self { message: None } }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    UserToApp,
    AppToUser,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentStatus {
    pub developer_approved: bool,
    pub transaction_verified: bool,
    pub developer_completed: bool,
    pub cancelled: bool,
    pub user_cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentTransaction {
    pub txid: String,
    pub verified: bool,
    #[serde(rename = "_link")]
    pub link: String,
}

/// Payment record handed to the incomplete-payment callback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentDto {
    pub identifier: String,
    pub user_uid: String,
    pub amount: f64,
    pub memo: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub from_address: String,
    pub to_address: String,
    pub direction: PaymentDirection,
    pub network: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction: Option<PaymentTransaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_result_tolerates_missing_fields() {
        let r: AuthResult = serde_json::from_str(r#"{"user":{"username":"alice"}}"#).unwrap();
        assert!(r.access_token.is_none());
        assert_eq!(r.user.as_ref().and_then(|u| u.uid.clone()), None);
    }

    #[test]
    fn payment_dto_reads_sdk_shape() {
        let raw = r#"{
            "identifier": "pay-1", "user_uid": "u1", "amount": 1.5, "memo": "tip",
            "metadata": {"track": "retro-lounge"}, "from_address": "a", "to_address": "b",
            "direction": "user_to_app", "network": "Pi Testnet",
            "status": {"developer_approved": true, "transaction_verified": false,
                       "developer_completed": false, "cancelled": false, "user_cancelled": false},
            "transaction": {"txid": "tx9", "verified": false, "_link": "https://example/tx9"}
        }"#;
        let p: PaymentDto = serde_json::from_str(raw).unwrap();
        assert_eq!(p.direction, PaymentDirection::UserToApp);
        assert!(p.status.developer_approved);
        assert_eq!(p.transaction.unwrap().link, "https://example/tx9");
    }
}
