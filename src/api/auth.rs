//! Login and signup endpoints.
//!
//! PINs never travel in the clear: they are hashed client-side before
//! submission, as the original client does.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::adapter::{Action, Outcome};
use crate::api::{required_field, ApiClient};
use crate::error::{ErrorCode, Failure};
use crate::store::AuthStore;
use crate::wizard::fields::{digits_only, FieldMap};

/// SHA256 hex digest of a PIN for submission.
pub(crate) fn hash_pin(pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginByPhoneBody {
    phone_number: String,
}

/// `isUsed` distinguishes returning partners (straight to PIN) from new
/// ones (OTP verification first); the login wizard branches on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginByPhoneResponse {
    pub is_used: bool,
}

/// Start a login by phone number.
pub struct LoginByPhone {
    client: Arc<ApiClient>,
}

impl LoginByPhone {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for LoginByPhone {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let phone = match required_field(&input, "phone") {
            Ok(value) => digits_only(value),
            Err(failure) => return failure.into(),
        };
        let body = LoginByPhoneBody { phone_number: phone };
        match self
            .client
            .post_json::<_, LoginByPhoneResponse>(
                "/auth/login/phone",
                &body,
                false,
                "Sign-in failed.",
            )
            .await
        {
            Ok(response) => Outcome::success_from(&response),
            Err(failure) => failure.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifyPhoneCodeBody {
    code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPhoneCodeResponse {
    pub phone_auth_token: String,
}

/// Verify the OTP sent to a new partner's phone.
pub struct VerifyPhoneCode {
    client: Arc<ApiClient>,
}

impl VerifyPhoneCode {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for VerifyPhoneCode {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let code = match required_field(&input, "otp") {
            Ok(value) => value.to_string(),
            Err(failure) => return failure.into(),
        };
        match self
            .client
            .post_json::<_, VerifyPhoneCodeResponse>(
                "/auth/verify/code",
                &VerifyPhoneCodeBody { code },
                false,
                "Verification failed.",
            )
            .await
        {
            Ok(response) => Outcome::success_from(&response),
            Err(failure) => failure.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalizePinLoginBody {
    phone_number: String,
    pin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizePinLoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Complete a returning partner's login with their PIN.
pub struct FinalizePinLogin {
    client: Arc<ApiClient>,
}

impl FinalizePinLogin {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for FinalizePinLogin {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let phone = match required_field(&input, "phone") {
            Ok(value) => digits_only(value),
            Err(failure) => return failure.into(),
        };
        let pin = match required_field(&input, "pin") {
            Ok(value) => hash_pin(value),
            Err(failure) => return failure.into(),
        };
        let body = FinalizePinLoginBody {
            phone_number: phone,
            pin,
        };
        match self
            .client
            .post_json::<_, FinalizePinLoginResponse>(
                "/auth/login/pin",
                &body,
                false,
                "Sign-in failed.",
            )
            .await
        {
            Ok(response) => Outcome::success_from(&response),
            Err(failure) => failure.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPartnerBody {
    phone_auth_token: String,
    user_name: String,
    partner_name: String,
    pin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPartnerResponse {
    pub access_token: String,
}

/// Register a new partner. The phone-auth token captured during OTP
/// verification comes from the auth store, not from wizard fields.
pub struct RegisterPartner {
    client: Arc<ApiClient>,
    auth: Arc<AuthStore>,
}

impl RegisterPartner {
    pub fn new(client: Arc<ApiClient>, auth: Arc<AuthStore>) -> Self {
        Self { client, auth }
    }
}

#[async_trait]
impl Action for RegisterPartner {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let Some(phone_auth_token) = self.auth.phone_auth_token() else {
            return Failure::new(ErrorCode::Auth, "Phone verification required.").into();
        };
        let user_name = match required_field(&input, "user_name") {
            Ok(value) => value.to_string(),
            Err(failure) => return failure.into(),
        };
        let partner_name = match required_field(&input, "partner_name") {
            Ok(value) => value.to_string(),
            Err(failure) => return failure.into(),
        };
        let pin = match required_field(&input, "pin") {
            Ok(value) => hash_pin(value),
            Err(failure) => return failure.into(),
        };

        let body = RegisterPartnerBody {
            phone_auth_token,
            user_name,
            partner_name,
            pin,
        };
        match self
            .client
            .post_json::<_, RegisterPartnerResponse>(
                "/auth/join/partner",
                &body,
                false,
                "Registration failed.",
            )
            .await
        {
            Ok(response) => Outcome::success_from(&response),
            Err(failure) => failure.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_pin_is_stable_hex() {
        let digest = hash_pin("123456");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, hash_pin("123456"));
        assert_ne!(digest, hash_pin("654321"));
    }

    #[test]
    fn test_response_decoding() {
        let response: LoginByPhoneResponse =
            serde_json::from_str(r#"{"isUsed": true}"#).unwrap();
        assert!(response.is_used);

        let response: FinalizePinLoginResponse =
            serde_json::from_str(r#"{"accessToken": "tok", "name": null}"#).unwrap();
        assert_eq!(response.access_token, "tok");
        assert!(response.name.is_none());
    }
}
