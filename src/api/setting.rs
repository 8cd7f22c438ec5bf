//! Account settings endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::{Action, Outcome};
use crate::api::auth::hash_pin;
use crate::api::{required_field, ApiClient};
use crate::wizard::fields::FieldMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePinBody {
    prev_pin: String,
    new_pin: String,
}

/// The backend rotates the session on a PIN change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePinResponse {
    pub access_token: String,
}

/// Replace the partner's PIN. Both PINs are hashed before leaving the
/// device; a wrong current PIN comes back as 401 + `ERR-IVD-VALUE`.
pub struct ChangePin {
    client: Arc<ApiClient>,
}

impl ChangePin {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for ChangePin {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let prev_pin = match required_field(&input, "prev_pin") {
            Ok(value) => hash_pin(value),
            Err(failure) => return failure.into(),
        };
        let new_pin = match required_field(&input, "new_pin") {
            Ok(value) => hash_pin(value),
            Err(failure) => return failure.into(),
        };
        let body = ChangePinBody { prev_pin, new_pin };
        match self
            .client
            .post_json::<_, ChangePinResponse>("/users/pin", &body, true, "PIN change failed.")
            .await
        {
            Ok(response) => Outcome::success_from(&response),
            Err(failure) => failure.into(),
        }
    }
}
