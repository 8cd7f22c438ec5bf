//! Coupon issue endpoints: self-issue requests and approve/reject decisions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::{Action, Outcome};
use crate::api::{required_field, ApiClient};
use crate::error::Failure;
use crate::wizard::fields::FieldMap;

/// One product line on an issue. `is_new` distinguishes a catalogued product
/// (referenced by id) from a free-form one (named inline).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueProduct {
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSelfIssueBody {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<Vec<IssueProduct>>,
}

/// Product lines arrive through a single wizard field as a JSON array; the
/// builder screen assembles it before the step submits.
fn parse_products(input: &FieldMap) -> Result<Option<Vec<IssueProduct>>, Failure> {
    match input.get("products").filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|err| Failure::unknown(format!("malformed product list ({err})"))),
        None => Ok(None),
    }
}

/// Submit a partner-initiated coupon issue.
pub struct CreateSelfIssue {
    client: Arc<ApiClient>,
}

impl CreateSelfIssue {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for CreateSelfIssue {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let title = match required_field(&input, "title") {
            Ok(value) => value.to_string(),
            Err(failure) => return failure.into(),
        };
        let products = match parse_products(&input) {
            Ok(products) => products,
            Err(failure) => return failure.into(),
        };
        let body = CreateSelfIssueBody { title, products };
        match self
            .client
            .post_unit("/issues/coupons/self", &body, true, "Coupon issue failed.")
            .await
        {
            Ok(()) => Outcome::success_empty(),
            Err(failure) => failure.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DecideIssueBody {
    issue_id: u64,
    is_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<Vec<IssueProduct>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Approve or reject a pending issue. Products accompany approvals, the
/// rejection reason accompanies rejections; the backend ignores the rest.
pub struct DecideIssueCoupons {
    client: Arc<ApiClient>,
}

impl DecideIssueCoupons {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Action for DecideIssueCoupons {
    async fn execute(&self, input: FieldMap) -> Outcome {
        let issue_id = match required_field(&input, "issue_id") {
            Ok(value) => match value.parse::<u64>() {
                Ok(id) => id,
                Err(_) => {
                    return Failure::unknown(format!("bad issue id '{value}'")).into();
                }
            },
            Err(failure) => return failure.into(),
        };
        let is_approved = match required_field(&input, "approved") {
            Ok(value) => value == "true",
            Err(failure) => return failure.into(),
        };
        let products = match parse_products(&input) {
            Ok(products) => products,
            Err(failure) => return failure.into(),
        };
        let reason = input
            .get("reason")
            .filter(|r| !r.trim().is_empty())
            .cloned();

        let body = DecideIssueBody {
            issue_id,
            is_approved,
            products: if is_approved { products } else { None },
            reason: if is_approved { None } else { reason },
        };
        match self
            .client
            .post_unit("/issues/coupons", &body, true, "Issue decision failed.")
            .await
        {
            Ok(()) => Outcome::success_empty(),
            Err(failure) => failure.into(),
        }
    }
}
