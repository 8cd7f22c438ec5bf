//! Declarative wizard and step definitions.
//!
//! A definition is data, not behavior: steps name their fields, the action
//! and side effect to run on submit, where to go next, and how each error
//! code translates into a transition. Definitions parse from JSON and are
//! validated for dangling references before an engine will accept them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DefinitionError, ErrorCode};
use crate::wizard::fields::{FieldMap, FieldRule};

/// What to do when an adapter reports a given error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    /// Stay on the current step and surface the message.
    Stay,
    /// Return to an earlier step, optionally clearing field values of every
    /// step from `clear_from` onward.
    JumpTo {
        step: String,
        #[serde(default)]
        clear_from: Option<String>,
    },
    /// Abandon the wizard and hand control to the result router.
    Exit { reason: String },
}

/// Error table entry: a directive plus an optional message override.
///
/// The screens this generalizes map each backend code to their own wording
/// ("Current PIN does not match.") rather than surfacing the transport
/// message verbatim; when no override is set the failure's message is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRule {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub directive: Directive,
}

impl ErrorRule {
    pub fn new(directive: Directive) -> Self {
        Self {
            message: None,
            directive,
        }
    }

    pub fn with_message(directive: Directive, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            directive,
        }
    }
}

/// Success-payload branch that overrides a step's `next` route.
///
/// The login flow routes returning users (`isUsed: true`) to the PIN step
/// and new users to the OTP step; this expresses that as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRule {
    /// Boolean field of the success payload that selects the route.
    pub field: String,
    pub when_true: String,
    pub when_false: String,
}

/// Delayed one-shot jump scheduled after a step becomes active.
///
/// The redemption flow's completion screen returns to the scanner after a
/// fixed delay; the runner owns the timer and cancels it on teardown or when
/// the active step changes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoReset {
    /// Delay before the jump fires, in milliseconds.
    pub after_ms: u64,
    /// Step to jump back to when the timer fires.
    pub goto: String,
    /// Clear field values of every step from `goto` onward.
    #[serde(default)]
    pub clear: bool,
}

/// One step of a wizard: fields, gates, and routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Step identifier, unique within the wizard.
    pub id: String,
    /// Validation rules for this step's fields.
    #[serde(default)]
    pub fields: Vec<FieldRule>,
    /// Action id resolved against the runner's adapter registry. A step
    /// without an action performs a pure local transition.
    #[serde(default)]
    pub action: Option<String>,
    /// Side effect id applied to the success payload (e.g. storing a token).
    #[serde(default)]
    pub on_success: Option<String>,
    /// Next step on success. `None` on the last step completes the wizard.
    #[serde(default)]
    pub next: Option<String>,
    /// Success-payload branch that overrides `next`.
    #[serde(default)]
    pub branch: Option<BranchRule>,
    /// Error code to transition rule. Unlisted codes fall back to the
    /// `UNKNOWN` entry, or to staying put with the failure's message.
    #[serde(default)]
    pub error_table: BTreeMap<ErrorCode, ErrorRule>,
    /// Message surfaced when local validation fails.
    #[serde(default)]
    pub invalid_message: Option<String>,
    /// Delayed jump scheduled when this step becomes active.
    #[serde(default)]
    pub auto_reset: Option<AutoReset>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
            action: None,
            on_success: None,
            next: None,
            branch: None,
            error_table: BTreeMap::new(),
            invalid_message: None,
            auto_reset: None,
        }
    }

    pub fn with_field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_on_success(mut self, effect: impl Into<String>) -> Self {
        self.on_success = Some(effect.into());
        self
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_branch(mut self, branch: BranchRule) -> Self {
        self.branch = Some(branch);
        self
    }

    pub fn with_error(mut self, code: ErrorCode, directive: Directive) -> Self {
        self.error_table.insert(code, ErrorRule::new(directive));
        self
    }

    pub fn with_error_message(
        mut self,
        code: ErrorCode,
        directive: Directive,
        message: impl Into<String>,
    ) -> Self {
        self.error_table
            .insert(code, ErrorRule::with_message(directive, message));
        self
    }

    pub fn with_invalid_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = Some(message.into());
        self
    }

    pub fn with_auto_reset(mut self, auto_reset: AutoReset) -> Self {
        self.auto_reset = Some(auto_reset);
        self
    }

    /// Pure validity predicate over the step's current fields.
    pub fn is_valid(&self, fields: &FieldMap) -> bool {
        self.fields.iter().all(|rule| rule.accepts(fields))
    }

    /// Rule for an adapter-reported code, with the `UNKNOWN` fallback.
    pub fn error_rule_for(&self, code: ErrorCode) -> ErrorRule {
        self.error_table
            .get(&code)
            .or_else(|| self.error_table.get(&ErrorCode::Unknown))
            .cloned()
            .unwrap_or_else(|| ErrorRule::new(Directive::Stay))
    }
}

/// A complete wizard: ordered steps plus flow-level policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardDefinition {
    /// Wizard name, used in logs and snapshots.
    pub name: String,
    /// Whether completed steps may be revisited for edit-in-place.
    #[serde(default)]
    pub allow_revisit: bool,
    /// Steps in sequence order; the first is the entry point.
    pub steps: Vec<StepDefinition>,
}

impl WizardDefinition {
    pub fn new(name: impl Into<String>, steps: Vec<StepDefinition>) -> Self {
        Self {
            name: name.into(),
            allow_revisit: false,
            steps,
        }
    }

    pub fn with_revisit(mut self) -> Self {
        self.allow_revisit = true;
        self
    }

    /// Parse a wizard definition from JSON.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the definition for consistency.
    ///
    /// Rejects empty wizards, duplicate step ids, and any reference to an
    /// unknown step (next routes, branch targets, jump and clear-from
    /// targets, auto-reset targets).
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.steps.is_empty() {
            errors.push("wizard has no steps".to_string());
        }

        let ids: Vec<&str> = self.steps.iter().map(|s| s.id.as_str()).collect();
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                errors.push(format!("duplicate step id '{id}'"));
            }
        }

        let known = |target: &str| ids.contains(&target);
        for step in &self.steps {
            let mut check = |target: &str, context: &str| {
                if !known(target) {
                    errors.push(format!(
                        "step '{}' references unknown step '{}' in {}",
                        step.id, target, context
                    ));
                }
            };

            if let Some(ref next) = step.next {
                check(next, "next");
            }
            if let Some(ref branch) = step.branch {
                check(&branch.when_true, "branch");
                check(&branch.when_false, "branch");
            }
            for rule in step.error_table.values() {
                if let Directive::JumpTo { step: target, clear_from } = &rule.directive {
                    check(target, "error_table");
                    if let Some(clear) = clear_from {
                        check(clear, "error_table clear_from");
                    }
                }
            }
            if let Some(ref auto_reset) = step.auto_reset {
                check(&auto_reset.goto, "auto_reset");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and wrap parse/consistency problems into one error type.
    pub fn checked(self) -> Result<Self, DefinitionError> {
        self.validate().map_err(DefinitionError::Invalid)?;
        Ok(self)
    }

    pub fn get_step(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn first_step(&self) -> Option<&StepDefinition> {
        self.steps.first()
    }

    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Ids of every step at or after `from`, in sequence order.
    pub fn steps_from(&self, from: &str) -> Vec<String> {
        match self.step_index(from) {
            Some(idx) => self.steps[idx..].iter().map(|s| s.id.clone()).collect(),
            None => Vec::new(),
        }
    }
}
