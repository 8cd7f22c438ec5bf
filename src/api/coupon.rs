//! Payment-code redemption endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::{Action, Outcome};
use crate::api::{required_field, ApiClient};
use crate::wizard::fields::FieldMap;

#[derive(Debug, Serialize)]
struct TransactionBody {
    code: String,
}

/// Coupon details shown to the operator before confirming redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransactionResponse {
    pub coupon_id: u64,
    pub product_name: String,
    pub vendor_name: String,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

/// Look up the coupon behind a scanned payment code.
pub struct ResolvePaymentTransaction {
    client: Arc<ApiClient>,
}

impl ResolvePaymentTransaction {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for ResolvePaymentTransaction {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let code = match required_field(&input, "code") {
            Ok(value) => value.to_string(),
            Err(failure) => return failure.into(),
        };
        match self
            .client
            .post_json::<_, PaymentTransactionResponse>(
                "/payments/transaction",
                &TransactionBody { code },
                true,
                "Payment code lookup failed.",
            )
            .await
        {
            Ok(response) => Outcome::success_from(&response),
            Err(failure) => failure.into(),
        }
    }
}

/// Mark the coupon behind a payment code as used.
pub struct ConfirmPaymentTransaction {
    client: Arc<ApiClient>,
}

impl ConfirmPaymentTransaction {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for ConfirmPaymentTransaction {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let code = match required_field(&input, "code") {
            Ok(value) => value.to_string(),
            Err(failure) => return failure.into(),
        };
        match self
            .client
            .post_unit(
                "/payments/transaction/confirm",
                &TransactionBody { code },
                true,
                "Payment confirmation failed.",
            )
            .await
        {
            Ok(()) => Outcome::success_empty(),
            Err(failure) => failure.into(),
        }
    }
}
