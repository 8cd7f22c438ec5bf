//! Concrete wizard flows and their adapter wiring.
//!
//! Each submodule builds one [`WizardDefinition`] mirroring a screen flow of
//! the partner app. The registries map the action and effect ids those
//! definitions name onto live API adapters and store writers.
//!
//! [`WizardDefinition`]: crate::wizard::WizardDefinition

pub mod issue;
pub mod login;
pub mod pin_change;
pub mod redeem;
pub mod signup;

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::adapter::{ActionRegistry, EffectRegistry, SideEffect};
use crate::api::auth::{FinalizePinLogin, LoginByPhone, RegisterPartner, VerifyPhoneCode};
use crate::api::coupon::{ConfirmPaymentTransaction, ResolvePaymentTransaction};
use crate::api::issue::{CreateSelfIssue, DecideIssueCoupons};
use crate::api::setting::ChangePin;
use crate::api::ApiClient;
use crate::store::AuthStore;

/// Store the `accessToken` of a success payload, plus the user's name when
/// the backend sends one along.
pub struct StoreAccessToken {
    auth: Arc<AuthStore>,
}

impl StoreAccessToken {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }
}

impl SideEffect for StoreAccessToken {
    fn apply(&self, payload: &Value) {
        match payload.get("accessToken").and_then(Value::as_str) {
            Some(token) => self.auth.set_access_token(token),
            None => warn!("success payload carried no access token"),
        }
        if let Some(name) = payload.get("name").and_then(Value::as_str) {
            self.auth.set_user_name(name);
        }
    }
}

/// Store the short-lived `phoneAuthToken` issued after OTP verification.
pub struct StorePhoneAuthToken {
    auth: Arc<AuthStore>,
}

impl StorePhoneAuthToken {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }
}

impl SideEffect for StorePhoneAuthToken {
    fn apply(&self, payload: &Value) {
        match payload.get("phoneAuthToken").and_then(Value::as_str) {
            Some(token) => self.auth.set_phone_auth_token(token),
            None => warn!("success payload carried no phone auth token"),
        }
    }
}

/// Every action id the bundled flow definitions reference.
pub fn action_registry(client: &Arc<ApiClient>, auth: &Arc<AuthStore>) -> ActionRegistry {
    let mut actions: ActionRegistry = ActionRegistry::new();
    actions.insert(
        "login_by_phone".into(),
        Arc::new(LoginByPhone::new(client.clone())),
    );
    actions.insert(
        "verify_phone_code".into(),
        Arc::new(VerifyPhoneCode::new(client.clone())),
    );
    actions.insert(
        "finalize_pin_login".into(),
        Arc::new(FinalizePinLogin::new(client.clone())),
    );
    actions.insert(
        "register_partner".into(),
        Arc::new(RegisterPartner::new(client.clone(), auth.clone())),
    );
    actions.insert("change_pin".into(), Arc::new(ChangePin::new(client.clone())));
    actions.insert(
        "resolve_payment".into(),
        Arc::new(ResolvePaymentTransaction::new(client.clone())),
    );
    actions.insert(
        "confirm_payment".into(),
        Arc::new(ConfirmPaymentTransaction::new(client.clone())),
    );
    actions.insert(
        "create_self_issue".into(),
        Arc::new(CreateSelfIssue::new(client.clone())),
    );
    actions.insert(
        "decide_issue".into(),
        Arc::new(DecideIssueCoupons::new(client.clone())),
    );
    actions
}

/// Every effect id the bundled flow definitions reference.
pub fn effect_registry(auth: &Arc<AuthStore>) -> EffectRegistry {
    let mut effects: EffectRegistry = EffectRegistry::new();
    effects.insert(
        "store_access_token".into(),
        Arc::new(StoreAccessToken::new(auth.clone())),
    );
    effects.insert(
        "store_phone_auth_token".into(),
        Arc::new(StorePhoneAuthToken::new(auth.clone())),
    );
    effects
}
