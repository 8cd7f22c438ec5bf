//! The wizard engine: a single-flight state machine over a declarative
//! definition.
//!
//! The engine is pure and synchronous. `advance()` never blocks: a step with
//! an async action yields a [`Command`] for the caller (normally the runner)
//! to dispatch, and the adapter's result comes back through
//! [`WizardEngine::apply_outcome`] guarded by a dispatch sequence number.
//! Because at most one action is in flight per instance, outcomes always
//! apply in call order and there is no supersession to untangle.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapter::Outcome;
use crate::error::{DefinitionError, Failure};
use crate::wizard::definition::{Directive, StepDefinition, WizardDefinition};
use crate::wizard::fields::FieldMap;
use crate::wizard::state::{Phase, StepRecord, WizardSnapshot};

/// Fallback message when a step declares no invalid-input wording.
const GENERIC_INVALID: &str = "Please check your input.";

/// Dispatch request produced by [`WizardEngine::advance`] for a step with an
/// async action. The runner resolves `action` against its registry, awaits
/// the adapter, and hands the outcome back with the same `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Sequence number guarding against stale outcome delivery.
    pub seq: u64,
    /// Step that dispatched the action.
    pub step: String,
    /// Action id from the step definition.
    pub action: String,
    /// Merged field values of all steps, in sequence order.
    pub input: FieldMap,
}

/// What `advance()` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Pending, terminal, or exited — state unchanged.
    Ignored,
    /// Local validation failed; the error message is set.
    Invalid,
    /// Pure local transition to the next step.
    Moved,
    /// Final step completed; the wizard is terminal.
    Completed,
    /// Action dispatched; `pending` is now set.
    Dispatched(Command),
}

/// What `apply_outcome()` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Outcome arrived after teardown or under a mismatched sequence number;
    /// dropped without touching state.
    Stale,
    /// Success; moved to the next step.
    Moved,
    /// Success on the final step; the wizard is terminal.
    Completed,
    /// Failure handled by the step's error table (stay or jump).
    Failed,
    /// Failure directive abandoned the wizard.
    Exited,
}

#[derive(Debug)]
struct PendingAction {
    seq: u64,
    step: String,
}

/// A live wizard instance. One instance owns its state exclusively; nothing
/// is shared across instances.
#[derive(Debug)]
pub struct WizardEngine {
    id: Uuid,
    definition: Arc<WizardDefinition>,
    active: String,
    history: Vec<String>,
    records: std::collections::BTreeMap<String, StepRecord>,
    error_message: Option<String>,
    pending: Option<PendingAction>,
    phase: Phase,
    next_seq: u64,
    torn_down: bool,
    last_payload: Option<Value>,
}

impl WizardEngine {
    /// Create an engine at the definition's first step.
    pub fn new(definition: Arc<WizardDefinition>) -> Result<Self, DefinitionError> {
        definition.validate().map_err(DefinitionError::Invalid)?;
        let first = definition
            .first_step()
            .map(|s| s.id.clone())
            .ok_or_else(|| DefinitionError::Invalid(vec!["wizard has no steps".to_string()]))?;
        let records = definition
            .steps
            .iter()
            .map(|s| (s.id.clone(), StepRecord::default()))
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            definition,
            active: first,
            history: Vec::new(),
            records,
            error_message: None,
            pending: None,
            phase: Phase::Active,
            next_seq: 0,
            torn_down: false,
            last_payload: None,
        })
    }

    /// Resume an engine from a saved snapshot of the same wizard.
    pub fn resume(
        definition: Arc<WizardDefinition>,
        snapshot: WizardSnapshot,
    ) -> Result<Self, DefinitionError> {
        if snapshot.wizard != definition.name {
            return Err(DefinitionError::SnapshotMismatch {
                snapshot: snapshot.wizard,
                definition: definition.name.clone(),
            });
        }
        let mut engine = Self::new(definition)?;
        if engine.definition.get_step(&snapshot.active).is_none() {
            return Err(DefinitionError::UnknownSnapshotStep(snapshot.active));
        }
        for step in &snapshot.history {
            if engine.definition.get_step(step).is_none() {
                return Err(DefinitionError::UnknownSnapshotStep(step.clone()));
            }
        }
        engine.id = snapshot.id;
        engine.active = snapshot.active;
        engine.history = snapshot.history;
        engine.phase = snapshot.phase;
        for (id, record) in snapshot.records {
            if engine.records.contains_key(&id) {
                engine.records.insert(id, record);
            }
        }
        Ok(engine)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    pub fn active_step(&self) -> &str {
        &self.active
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Terminal)
    }

    /// Exit reason, if a directive abandoned the wizard.
    pub fn exit_signal(&self) -> Option<&str> {
        match &self.phase {
            Phase::Exited { reason } => Some(reason),
            _ => None,
        }
    }

    /// Field values of one step.
    pub fn fields(&self, step: &str) -> Option<&FieldMap> {
        self.records.get(step).map(|r| &r.fields)
    }

    pub fn is_step_done(&self, step: &str) -> bool {
        self.records.get(step).map(|r| r.done).unwrap_or(false)
    }

    /// Validity of the active step's current fields.
    pub fn active_step_valid(&self) -> bool {
        self.active_def()
            .map(|def| {
                let empty = FieldMap::new();
                let fields = self
                    .records
                    .get(&self.active)
                    .map(|r| &r.fields)
                    .unwrap_or(&empty);
                def.is_valid(fields)
            })
            .unwrap_or(false)
    }

    /// Payload of the most recent successful action, for the router.
    pub fn last_payload(&self) -> Option<&Value> {
        self.last_payload.as_ref()
    }

    /// Whether an outcome delivered under `seq` would be accepted right now.
    ///
    /// Lets the runner decide effect application and outcome delivery under
    /// one lock acquisition, so a stale outcome is a whole no-op.
    pub fn accepts_outcome(&self, seq: u64) -> bool {
        !self.torn_down && matches!(&self.pending, Some(p) if p.seq == seq)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Auto-reset rule of the active step, if any. The runner schedules it.
    pub fn active_auto_reset(&self) -> Option<crate::wizard::definition::AutoReset> {
        self.active_def().and_then(|s| s.auto_reset.clone())
    }

    fn active_def(&self) -> Option<&StepDefinition> {
        self.definition.get_step(&self.active)
    }

    /// Update a field value. Always clears the error message — an edit
    /// implicitly dismisses the last failure. No-op once the wizard has
    /// reached a terminal or exited phase, or for an unknown/locked step.
    pub fn set_field(&mut self, step: &str, name: &str, value: &str) -> bool {
        if self.torn_down || !self.phase.is_active() {
            return false;
        }
        let Some(step_idx) = self.definition.step_index(step) else {
            return false;
        };
        let active_idx = self.definition.step_index(&self.active).unwrap_or(0);
        // Sequential unlock: only the active step and strictly-earlier
        // (already reachable) steps accept edits.
        if step_idx > active_idx {
            return false;
        }
        if let Some(record) = self.records.get_mut(step) {
            record
                .fields
                .insert(name.to_string(), value.to_string());
            self.error_message = None;
            true
        } else {
            false
        }
    }

    /// Submit the active step.
    pub fn advance(&mut self) -> Advance {
        if self.torn_down || !self.phase.is_active() || self.pending.is_some() {
            debug!(wizard = %self.definition.name, step = %self.active, "advance ignored");
            return Advance::Ignored;
        }
        let Some(step) = self.active_def().cloned() else {
            return Advance::Ignored;
        };

        let empty = FieldMap::new();
        let fields = self
            .records
            .get(&self.active)
            .map(|r| &r.fields)
            .unwrap_or(&empty);
        if !step.is_valid(fields) {
            self.error_message = Some(
                step.invalid_message
                    .clone()
                    .unwrap_or_else(|| GENERIC_INVALID.to_string()),
            );
            debug!(wizard = %self.definition.name, step = %step.id, "validation failed");
            return Advance::Invalid;
        }

        match step.action {
            Some(ref action) => {
                self.next_seq += 1;
                let command = Command {
                    seq: self.next_seq,
                    step: step.id.clone(),
                    action: action.clone(),
                    input: self.merged_input(),
                };
                self.pending = Some(PendingAction {
                    seq: command.seq,
                    step: step.id.clone(),
                });
                debug!(
                    wizard = %self.definition.name,
                    step = %step.id,
                    action = %action,
                    seq = command.seq,
                    "action dispatched"
                );
                Advance::Dispatched(command)
            }
            None => {
                // Pure local transition: same bookkeeping, no adapter call.
                self.complete_active(&step, None)
            }
        }
    }

    /// Apply the outcome of a dispatched action.
    pub fn apply_outcome(&mut self, seq: u64, outcome: Outcome) -> Applied {
        if self.torn_down {
            debug!(wizard = %self.definition.name, seq, "outcome after teardown dropped");
            return Applied::Stale;
        }
        let step_id = match &self.pending {
            Some(pending) if pending.seq == seq => pending.step.clone(),
            _ => {
                warn!(wizard = %self.definition.name, seq, "stale outcome dropped");
                return Applied::Stale;
            }
        };
        self.pending = None;

        let Some(step) = self.definition.get_step(&step_id).cloned() else {
            return Applied::Stale;
        };

        match outcome {
            Outcome::Success(payload) => {
                info!(wizard = %self.definition.name, step = %step_id, "step succeeded");
                match self.complete_active(&step, Some(payload)) {
                    Advance::Completed => Applied::Completed,
                    _ => Applied::Moved,
                }
            }
            Outcome::Failure(failure) => self.apply_failure(&step, &failure),
        }
    }

    /// Navigate to the previously active step, preserving its field values.
    pub fn go_back(&mut self) -> bool {
        if self.torn_down || !self.phase.is_active() || self.pending.is_some() {
            return false;
        }
        let Some(previous) = self.history.pop() else {
            return false;
        };
        debug!(wizard = %self.definition.name, from = %self.active, to = %previous, "back");
        self.active = previous;
        self.error_message = None;
        true
    }

    /// Reactivate a completed step for edit-in-place. Only permitted when
    /// the definition opts in via `allow_revisit`.
    pub fn revisit(&mut self, step: &str) -> bool {
        if self.torn_down || !self.phase.is_active() || self.pending.is_some() {
            return false;
        }
        if !self.definition.allow_revisit || !self.is_step_done(step) || step == self.active {
            return false;
        }
        debug!(wizard = %self.definition.name, from = %self.active, to = %step, "revisit");
        self.history.push(self.active.clone());
        self.active = step.to_string();
        self.error_message = None;
        true
    }

    /// Fire a scheduled auto-reset jump. No-op unless the wizard is still on
    /// `expected_active` with that step's auto-reset rule intact.
    pub fn auto_jump(&mut self, expected_active: &str) -> bool {
        if self.torn_down || !self.phase.is_active() || self.pending.is_some() {
            return false;
        }
        if self.active != expected_active {
            return false;
        }
        let Some(rule) = self.active_auto_reset() else {
            return false;
        };
        info!(
            wizard = %self.definition.name,
            from = %self.active,
            to = %rule.goto,
            "auto reset"
        );
        if rule.clear {
            self.clear_from(&rule.goto);
        }
        self.jump_history(&rule.goto);
        self.active = rule.goto;
        self.error_message = None;
        self.last_payload = None;
        true
    }

    /// Stop accepting operations and drop any outcome delivered later.
    pub fn teardown(&mut self) {
        debug!(wizard = %self.definition.name, "teardown");
        self.torn_down = true;
    }

    /// External reset after an exit: fresh records at the first step.
    pub fn reset(&mut self) {
        if let Some(first) = self.definition.first_step() {
            self.active = first.id.clone();
        }
        for record in self.records.values_mut() {
            record.clear();
        }
        self.history.clear();
        self.error_message = None;
        self.pending = None;
        self.phase = Phase::Active;
        self.last_payload = None;
        self.torn_down = false;
    }

    /// Snapshot the instance for collaborator-requested persistence.
    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            id: self.id,
            wizard: self.definition.name.clone(),
            active: self.active.clone(),
            history: self.history.clone(),
            phase: self.phase.clone(),
            records: self.records.clone(),
            saved_at: chrono::Utc::now(),
        }
    }

    fn merged_input(&self) -> FieldMap {
        let mut merged = FieldMap::new();
        for step in &self.definition.steps {
            if let Some(record) = self.records.get(&step.id) {
                for (name, value) in &record.fields {
                    merged.insert(name.clone(), value.clone());
                }
            }
        }
        merged
    }

    /// Mark the active step done and route to its successor.
    fn complete_active(&mut self, step: &StepDefinition, payload: Option<Value>) -> Advance {
        if let Some(record) = self.records.get_mut(&step.id) {
            record.done = true;
            record.completed_at = Some(chrono::Utc::now());
        }

        let next = self.route_after(step, payload.as_ref());
        self.last_payload = payload;
        self.error_message = None;

        match next {
            Some(next_id) => {
                self.history.push(self.active.clone());
                debug!(wizard = %self.definition.name, from = %self.active, to = %next_id, "advance");
                self.active = next_id;
                Advance::Moved
            }
            None => {
                info!(wizard = %self.definition.name, step = %step.id, "wizard completed");
                self.phase = Phase::Terminal;
                Advance::Completed
            }
        }
    }

    /// Pick the successor step: payload branch first, then the static route.
    fn route_after(&self, step: &StepDefinition, payload: Option<&Value>) -> Option<String> {
        if let (Some(branch), Some(payload)) = (&step.branch, payload) {
            match payload.get(&branch.field).and_then(Value::as_bool) {
                Some(true) => return Some(branch.when_true.clone()),
                Some(false) => return Some(branch.when_false.clone()),
                None => {
                    warn!(
                        wizard = %self.definition.name,
                        step = %step.id,
                        field = %branch.field,
                        "branch field missing from payload, using static route"
                    );
                }
            }
        }
        step.next.clone()
    }

    fn apply_failure(&mut self, step: &StepDefinition, failure: &Failure) -> Applied {
        let rule = step.error_rule_for(failure.code);
        let message = rule
            .message
            .clone()
            .unwrap_or_else(|| failure.message.clone());
        info!(
            wizard = %self.definition.name,
            step = %step.id,
            code = ?failure.code,
            "step failed"
        );

        match rule.directive {
            Directive::Stay => {
                self.error_message = Some(message);
                Applied::Failed
            }
            Directive::JumpTo {
                step: target,
                clear_from,
            } => {
                if let Some(clear) = clear_from {
                    self.clear_from(&clear);
                }
                self.jump_history(&target);
                self.active = target;
                self.error_message = Some(message);
                Applied::Failed
            }
            Directive::Exit { reason } => {
                self.error_message = Some(message);
                self.phase = Phase::Exited { reason };
                Applied::Exited
            }
        }
    }

    /// Clear field values and completion for every step from `from` onward.
    fn clear_from(&mut self, from: &str) {
        for id in self.definition.steps_from(from) {
            if let Some(record) = self.records.get_mut(&id) {
                record.clear();
            }
        }
    }

    /// Rewind history so `go_back` from the jump target stays consistent:
    /// drop the target and everything after it if it was visited, otherwise
    /// keep only entries that precede it in sequence order.
    fn jump_history(&mut self, target: &str) {
        if let Some(pos) = self.history.iter().position(|h| h == target) {
            self.history.truncate(pos);
        } else {
            let target_idx = self.definition.step_index(target).unwrap_or(0);
            self.history
                .retain(|h| self.definition.step_index(h).unwrap_or(usize::MAX) < target_idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, Failure};
    use crate::wizard::definition::{AutoReset, BranchRule, StepDefinition, WizardDefinition};
    use crate::wizard::fields::{FieldPattern, FieldRule};
    use serde_json::json;

    /// Phone → OTP/PIN → done, the shape of the login screen.
    fn login_definition() -> Arc<WizardDefinition> {
        Arc::new(WizardDefinition::new(
            "login",
            vec![
                StepDefinition::new("phone")
                    .with_field(FieldRule::new("phone", FieldPattern::Phone))
                    .with_action("login_by_phone")
                    .with_branch(BranchRule {
                        field: "isUsed".to_string(),
                        when_true: "pin".to_string(),
                        when_false: "otp".to_string(),
                    })
                    .with_invalid_message("Invalid format (010-XXXX-XXXX)"),
                StepDefinition::new("otp")
                    .with_field(FieldRule::new("otp", FieldPattern::Code))
                    .with_action("verify_phone_code"),
                StepDefinition::new("pin")
                    .with_field(FieldRule::new("pin", FieldPattern::Code))
                    .with_action("finalize_pin_login")
                    .with_error(
                        ErrorCode::InvalidValue,
                        Directive::JumpTo {
                            step: "phone".to_string(),
                            clear_from: Some("phone".to_string()),
                        },
                    )
                    .with_error(
                        ErrorCode::Auth,
                        Directive::Exit {
                            reason: "reauth".to_string(),
                        },
                    ),
            ],
        ))
    }

    fn engine_at_phone() -> WizardEngine {
        let mut engine = WizardEngine::new(login_definition()).unwrap();
        assert!(engine.set_field("phone", "phone", "010-1234-5678"));
        engine
    }

    #[test]
    fn test_invalid_fields_set_error_without_moving() {
        let mut engine = WizardEngine::new(login_definition()).unwrap();
        engine.set_field("phone", "phone", "not-a-phone");
        assert_eq!(engine.advance(), Advance::Invalid);
        assert_eq!(engine.active_step(), "phone");
        assert_eq!(
            engine.error_message(),
            Some("Invalid format (010-XXXX-XXXX)")
        );
    }

    #[test]
    fn test_edit_clears_error() {
        let mut engine = WizardEngine::new(login_definition()).unwrap();
        engine.set_field("phone", "phone", "bad");
        engine.advance();
        assert!(engine.error_message().is_some());
        engine.set_field("phone", "phone", "010-1");
        assert!(engine.error_message().is_none());
    }

    #[test]
    fn test_advance_dispatches_action_and_sets_pending() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(command) = engine.advance() else {
            panic!("expected dispatch");
        };
        assert_eq!(command.step, "phone");
        assert_eq!(command.action, "login_by_phone");
        assert_eq!(command.input["phone"], "010-1234-5678");
        assert!(engine.is_pending());
    }

    #[test]
    fn test_single_flight_advance_while_pending_is_noop() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(first) = engine.advance() else {
            panic!("expected dispatch");
        };
        // Rapid resubmission: no second command, no state change.
        assert_eq!(engine.advance(), Advance::Ignored);
        assert_eq!(engine.advance(), Advance::Ignored);
        assert!(engine.is_pending());
        assert!(!engine.go_back());

        engine.apply_outcome(first.seq, Outcome::Success(json!({"isUsed": false})));
        assert!(!engine.is_pending());
    }

    #[test]
    fn test_branch_routes_new_user_to_otp() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        let applied = engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": false})));
        assert_eq!(applied, Applied::Moved);
        assert_eq!(engine.active_step(), "otp");
        assert!(engine.is_step_done("phone"));
    }

    #[test]
    fn test_branch_routes_returning_user_to_pin() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": true})));
        assert_eq!(engine.active_step(), "pin");
    }

    #[test]
    fn test_pin_mismatch_jumps_back_and_clears() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": true})));
        engine.set_field("pin", "pin", "123456");

        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        let applied = engine.apply_outcome(
            cmd.seq,
            Outcome::Failure(Failure::new(ErrorCode::InvalidValue, "PIN mismatch")),
        );
        assert_eq!(applied, Applied::Failed);
        assert_eq!(engine.active_step(), "phone");
        assert!(engine.fields("phone").unwrap().is_empty());
        assert!(engine.fields("pin").unwrap().is_empty());
        assert!(!engine.is_step_done("phone"));
        assert_eq!(engine.error_message(), Some("PIN mismatch"));
    }

    #[test]
    fn test_auth_failure_exits_and_locks() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": true})));
        engine.set_field("pin", "pin", "123456");
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        let applied = engine.apply_outcome(
            cmd.seq,
            Outcome::Failure(Failure::new(ErrorCode::Auth, "Session expired.")),
        );
        assert_eq!(applied, Applied::Exited);
        assert_eq!(engine.exit_signal(), Some("reauth"));

        // Locked until externally reset.
        assert!(!engine.set_field("pin", "pin", "654321"));
        assert_eq!(engine.advance(), Advance::Ignored);
        assert!(!engine.go_back());

        engine.reset();
        assert_eq!(engine.active_step(), "phone");
        assert!(engine.phase().is_active());
    }

    #[test]
    fn test_unrecognized_code_stays_with_message() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        let applied = engine.apply_outcome(
            cmd.seq,
            Outcome::Failure(Failure::new(ErrorCode::RateLimited, "Too many attempts.")),
        );
        assert_eq!(applied, Applied::Failed);
        assert_eq!(engine.active_step(), "phone");
        assert_eq!(engine.error_message(), Some("Too many attempts."));
        // Fields survive an unhandled failure.
        assert_eq!(engine.fields("phone").unwrap()["phone"], "010-1234-5678");
    }

    #[test]
    fn test_terminal_lock() {
        let def = Arc::new(WizardDefinition::new(
            "one_shot",
            vec![StepDefinition::new("only")
                .with_field(FieldRule::required_text("title"))],
        ));
        let mut engine = WizardEngine::new(def).unwrap();
        engine.set_field("only", "title", "hello");
        assert_eq!(engine.advance(), Advance::Completed);
        assert!(engine.is_terminal());

        // Every operation is an accepted no-op; nothing panics.
        assert!(!engine.set_field("only", "title", "changed"));
        assert_eq!(engine.advance(), Advance::Ignored);
        assert!(!engine.go_back());
        assert_eq!(engine.fields("only").unwrap()["title"], "hello");
    }

    #[test]
    fn test_go_back_preserves_fields_and_readvance_matches() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": false})));
        engine.set_field("otp", "otp", "111222");

        assert!(engine.go_back());
        assert_eq!(engine.active_step(), "phone");
        // No data loss on back-navigation.
        assert_eq!(engine.fields("phone").unwrap()["phone"], "010-1234-5678");
        assert_eq!(engine.fields("otp").unwrap()["otp"], "111222");

        // Re-advancing with identical fields reproduces the original route.
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": false})));
        assert_eq!(engine.active_step(), "otp");
    }

    #[test]
    fn test_stale_outcome_after_teardown_ignored() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.teardown();
        let applied = engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": true})));
        assert_eq!(applied, Applied::Stale);
        assert_eq!(engine.active_step(), "phone");
    }

    #[test]
    fn test_accepts_outcome_gating() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        assert!(engine.accepts_outcome(cmd.seq));
        assert!(!engine.accepts_outcome(cmd.seq + 1));
        engine.teardown();
        assert!(!engine.accepts_outcome(cmd.seq));
    }

    #[test]
    fn test_mismatched_seq_ignored() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        assert_eq!(
            engine.apply_outcome(cmd.seq + 7, Outcome::success_empty()),
            Applied::Stale
        );
        assert!(engine.is_pending());
    }

    #[test]
    fn test_cannot_edit_locked_later_step() {
        let mut engine = WizardEngine::new(login_definition()).unwrap();
        // pin is two steps ahead and not unlocked yet.
        assert!(!engine.set_field("pin", "pin", "123456"));
    }

    #[test]
    fn test_revisit_requires_opt_in() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": false})));
        // login does not allow edit-in-place.
        assert!(!engine.revisit("phone"));
    }

    #[test]
    fn test_revisit_done_step_when_allowed() {
        let def = Arc::new(
            WizardDefinition::new(
                "signup",
                vec![
                    StepDefinition::new("name")
                        .with_field(FieldRule::required_text("user_name"))
                        .with_next("store"),
                    StepDefinition::new("store")
                        .with_field(FieldRule::required_text("partner_name"))
                        .with_next("pin"),
                    StepDefinition::new("pin")
                        .with_field(FieldRule::new("pin", FieldPattern::Code)),
                ],
            )
            .with_revisit(),
        );
        let mut engine = WizardEngine::new(def).unwrap();
        engine.set_field("name", "user_name", "Hoshi");
        assert_eq!(engine.advance(), Advance::Moved);
        engine.set_field("store", "partner_name", "Hoshi Takoyaki");
        assert_eq!(engine.advance(), Advance::Moved);

        // Edit-in-place: jump back to the first answered question.
        assert!(engine.revisit("name"));
        assert_eq!(engine.active_step(), "name");
        engine.set_field("name", "user_name", "Hoshino");
        assert_eq!(engine.advance(), Advance::Moved);
        assert_eq!(engine.active_step(), "store");

        // Undone steps are never reachable by revisit.
        assert!(!engine.revisit("pin"));
    }

    #[test]
    fn test_auto_jump_resets_flow() {
        let def = Arc::new(WizardDefinition::new(
            "redeem",
            vec![
                StepDefinition::new("scan")
                    .with_field(FieldRule::required_text("code"))
                    .with_action("resolve_payment")
                    .with_next("confirm"),
                StepDefinition::new("confirm")
                    .with_action("confirm_payment")
                    .with_next("complete"),
                StepDefinition::new("complete").with_auto_reset(AutoReset {
                    after_ms: 3000,
                    goto: "scan".to_string(),
                    clear: true,
                }),
            ],
        ));
        let mut engine = WizardEngine::new(def).unwrap();
        engine.set_field("scan", "code", "PAY-123");
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::Success(json!({"productName": "Takoyaki"})));
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::success_empty());
        assert_eq!(engine.active_step(), "complete");

        // Timer fired for the step we are still on.
        assert!(engine.auto_jump("complete"));
        assert_eq!(engine.active_step(), "scan");
        assert!(engine.fields("scan").unwrap().is_empty());
        assert!(engine.history.is_empty());

        // A timer for a step we already left does nothing.
        assert!(!engine.auto_jump("complete"));
    }

    #[test]
    fn test_snapshot_resume_round_trip() {
        let mut engine = engine_at_phone();
        let Advance::Dispatched(cmd) = engine.advance() else {
            panic!("expected dispatch");
        };
        engine.apply_outcome(cmd.seq, Outcome::Success(json!({"isUsed": true})));
        engine.set_field("pin", "pin", "987654");

        let snapshot = engine.snapshot();
        let resumed = WizardEngine::resume(login_definition(), snapshot).unwrap();
        assert_eq!(resumed.active_step(), "pin");
        assert_eq!(resumed.fields("pin").unwrap()["pin"], "987654");
        assert!(resumed.is_step_done("phone"));
    }

    #[test]
    fn test_resume_rejects_wrong_wizard() {
        let engine = engine_at_phone();
        let mut snapshot = engine.snapshot();
        snapshot.wizard = "signup".to_string();
        let err = WizardEngine::resume(login_definition(), snapshot).unwrap_err();
        assert!(matches!(err, DefinitionError::SnapshotMismatch { .. }));
    }
}
