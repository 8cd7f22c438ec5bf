//! Async driver for a wizard instance.
//!
//! The runner owns what the pure engine cannot: resolving action ids to
//! adapters, awaiting adapter calls, applying declared success side effects,
//! notifying the result router on terminal/exit, and scheduling the
//! cancellable auto-reset timer. All engine access goes through one mutex;
//! the lock is never held across an await.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::adapter::{ActionRegistry, EffectRegistry, Outcome};
use crate::error::Failure;
use crate::router::ResultRouter;
use crate::wizard::definition::WizardDefinition;
use crate::wizard::engine::{Advance, Applied, Command, WizardEngine};

/// Result of driving one submission through the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    /// Pending, terminal, or exited — nothing happened.
    Ignored,
    /// Local validation failed.
    Invalid,
    /// Moved to the next step.
    Moved,
    /// The wizard reached its terminal state.
    Completed,
    /// The adapter failed; the error table kept the wizard on a step.
    Failed,
    /// The adapter failed; the error table abandoned the wizard.
    Exited,
}

/// Drives one wizard instance. Must be created and used inside a tokio
/// runtime: auto-reset timers are spawned tasks.
pub struct WizardRunner {
    engine: Arc<Mutex<WizardEngine>>,
    definition: Arc<WizardDefinition>,
    actions: ActionRegistry,
    effects: EffectRegistry,
    router: Arc<dyn ResultRouter>,
    timer: Mutex<Option<JoinHandle<()>>>,
    routed: AtomicBool,
}

impl WizardRunner {
    pub fn new(
        engine: WizardEngine,
        definition: Arc<WizardDefinition>,
        actions: ActionRegistry,
        effects: EffectRegistry,
        router: Arc<dyn ResultRouter>,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine: Arc::new(Mutex::new(engine)),
            definition,
            actions,
            effects,
            router,
            timer: Mutex::new(None),
            routed: AtomicBool::new(false),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WizardEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit the active step and drive any dispatched action to completion.
    pub async fn advance(self: &Arc<Self>) -> Submit {
        let advanced = self.lock().advance();
        let result = match advanced {
            Advance::Ignored => Submit::Ignored,
            Advance::Invalid => Submit::Invalid,
            Advance::Moved => Submit::Moved,
            Advance::Completed => Submit::Completed,
            Advance::Dispatched(command) => self.run_action(command).await,
        };
        self.after_change();
        result
    }

    async fn run_action(self: &Arc<Self>, command: Command) -> Submit {
        let outcome = match self.actions.get(&command.action) {
            Some(action) => action.execute(command.input.clone()).await,
            None => {
                error!(action = %command.action, "no adapter registered");
                Outcome::Failure(Failure::unknown(format!(
                    "no adapter registered for action '{}'",
                    command.action
                )))
            }
        };

        // Effect and transition are decided under one lock acquisition: a
        // declared side effect runs only for an outcome the engine will
        // accept, and before the transition lands — so a stored token is
        // visible the moment the next step activates, and a stale or
        // post-teardown outcome is a whole no-op.
        let mut engine = self.lock();
        if let Outcome::Success(ref payload) = outcome {
            if engine.accepts_outcome(command.seq) {
                if let Some(step) = self.definition.get_step(&command.step) {
                    if let Some(ref effect_id) = step.on_success {
                        match self.effects.get(effect_id) {
                            Some(effect) => effect.apply(payload),
                            None => warn!(effect = %effect_id, "no side effect registered"),
                        }
                    }
                }
            }
        }

        match engine.apply_outcome(command.seq, outcome) {
            Applied::Stale => Submit::Ignored,
            Applied::Moved => Submit::Moved,
            Applied::Completed => Submit::Completed,
            Applied::Failed => Submit::Failed,
            Applied::Exited => Submit::Exited,
        }
    }

    /// Update a field value on a step.
    pub fn set_field(&self, step: &str, name: &str, value: &str) -> bool {
        self.lock().set_field(step, name, value)
    }

    /// Navigate back to the previously active step.
    pub fn go_back(self: &Arc<Self>) -> bool {
        let moved = self.lock().go_back();
        if moved {
            self.after_change();
        }
        moved
    }

    /// Reactivate a completed step for edit-in-place.
    pub fn revisit(self: &Arc<Self>, step: &str) -> bool {
        let moved = self.lock().revisit(step);
        if moved {
            self.after_change();
        }
        moved
    }

    /// Stop the instance: the engine ignores any late outcome and the
    /// auto-reset timer is cancelled.
    pub fn teardown(&self) {
        self.lock().teardown();
        if let Some(handle) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    pub fn active_step(&self) -> String {
        self.lock().active_step().to_string()
    }

    pub fn error_message(&self) -> Option<String> {
        self.lock().error_message().map(str::to_string)
    }

    pub fn is_terminal(&self) -> bool {
        self.lock().is_terminal()
    }

    pub fn exit_signal(&self) -> Option<String> {
        self.lock().exit_signal().map(str::to_string)
    }

    /// Read engine state under the lock.
    pub fn with_engine<R>(&self, f: impl FnOnce(&WizardEngine) -> R) -> R {
        f(&self.lock())
    }

    /// Post-transition bookkeeping: router notification and timer upkeep.
    /// No-op once torn down — teardown must not be followed by a respawned
    /// timer.
    fn after_change(self: &Arc<Self>) {
        let (torn_down, terminal, exit, payload, active) = {
            let engine = self.lock();
            (
                engine.is_torn_down(),
                engine.is_terminal(),
                engine.exit_signal().map(str::to_string),
                engine.last_payload().cloned(),
                engine.active_step().to_string(),
            )
        };
        if torn_down {
            return;
        }

        if terminal || exit.is_some() {
            // Signal the router exactly once per instance.
            if !self.routed.swap(true, Ordering::SeqCst) {
                match exit {
                    Some(reason) => self.router.on_exit(&self.definition.name, &reason),
                    None => self.router.on_terminal(&self.definition.name, payload.as_ref()),
                }
            }
            return;
        }

        self.schedule_auto_reset(&active);
    }

    /// Replace the pending timer with one for the newly active step, if that
    /// step declares an auto-reset.
    fn schedule_auto_reset(self: &Arc<Self>, active: &str) {
        let mut slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }

        let Some(rule) = self
            .definition
            .get_step(active)
            .and_then(|s| s.auto_reset.clone())
        else {
            return;
        };

        let runner = Arc::clone(self);
        let expected = active.to_string();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(rule.after_ms)).await;
            let jumped = runner.lock().auto_jump(&expected);
            if jumped {
                runner.after_change();
            }
        }));
    }
}

impl Drop for WizardRunner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
