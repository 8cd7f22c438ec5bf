//! Result router seam.
//!
//! The engine never navigates: when a wizard completes or a directive exits
//! it, the runner hands the signal to a [`ResultRouter`] which decides what
//! happens outside the wizard (screen change, store writes, forced re-auth).

use serde_json::Value;
use tracing::debug;

/// Consumer of terminal and exit signals from a wizard instance.
pub trait ResultRouter: Send + Sync {
    /// The wizard reached its terminal state. `payload` is the success
    /// payload of the final step, when that step performed an action.
    fn on_terminal(&self, wizard: &str, payload: Option<&Value>);

    /// A step directive abandoned the wizard with the given reason.
    fn on_exit(&self, wizard: &str, reason: &str);
}

/// Router that only logs; useful for flows whose completion needs no
/// external navigation and as a default in tests.
pub struct NullRouter;

impl ResultRouter for NullRouter {
    fn on_terminal(&self, wizard: &str, _payload: Option<&Value>) {
        debug!(wizard, "wizard terminal");
    }

    fn on_exit(&self, wizard: &str, reason: &str) {
        debug!(wizard, reason, "wizard exited");
    }
}
