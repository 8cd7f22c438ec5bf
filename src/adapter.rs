//! Async action seam between wizard steps and the outside world.
//!
//! An action is single-shot: one invocation, exactly one outcome, no retries.
//! Actions never touch wizard state directly — everything flows back through
//! the returned [`Outcome`]. The engine's pending flag already guarantees at
//! most one in-flight action per wizard instance, so implementations only
//! need to be idempotent-safe across deliberate resubmission (a repeat call
//! with the same input either succeeds identically or reports a well-defined
//! `DUPLICATE`/`ALREADY_DECIDED` failure).

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Failure;
use crate::wizard::fields::FieldMap;

/// Result of one adapter call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Success payload as loosely-typed JSON; typed bodies live at the API
    /// boundary and are serialized into this at the seam.
    Success(Value),
    Failure(Failure),
}

impl Outcome {
    /// Success with an empty payload, for endpoints that return no body.
    pub fn success_empty() -> Self {
        Outcome::Success(Value::Null)
    }

    /// Serialize a typed response into a success outcome.
    ///
    /// Serialization of a plain response body does not fail in practice; if
    /// it somehow does, the caller sees an `UNKNOWN` failure rather than a
    /// panic.
    pub fn success_from<T: serde::Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(payload) => Outcome::Success(payload),
            Err(err) => Outcome::Failure(Failure::unknown(format!(
                "failed to encode response: {err}"
            ))),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Outcome::Failure(failure)
    }
}

/// One backend call a wizard step can perform on submit.
///
/// The input is the merged field map of the wizard (earlier steps first), so
/// an action can read values captured on previous steps — the PIN login call
/// needs the phone number entered two steps earlier.
#[async_trait]
pub trait Action: Send + Sync {
    async fn execute(&self, input: FieldMap) -> Outcome;
}

/// Side effect applied to a success payload, e.g. writing a returned token
/// into the auth store. Effects receive the payload only; they cannot reach
/// back into the wizard.
pub trait SideEffect: Send + Sync {
    fn apply(&self, payload: &Value);
}

/// Action ids (as named by step definitions) to adapters.
pub type ActionRegistry = HashMap<String, Arc<dyn Action>>;

/// Side effect ids (as named by step definitions) to handlers.
pub type EffectRegistry = HashMap<String, Arc<dyn SideEffect>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct LoginResponse {
        #[serde(rename = "isUsed")]
        is_used: bool,
    }

    #[test]
    fn test_success_from_typed_body() {
        let outcome = Outcome::success_from(&LoginResponse { is_used: true });
        match outcome {
            Outcome::Success(payload) => {
                assert_eq!(payload["isUsed"], Value::Bool(true));
            }
            Outcome::Failure(_) => panic!("expected success"),
        }
    }

    #[test]
    fn test_empty_success() {
        assert!(Outcome::success_empty().is_success());
    }
}
