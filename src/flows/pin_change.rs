//! PIN change flow: current PIN, then the replacement.
//!
//! The backend only checks the current PIN when the change is submitted, so
//! a mismatch reported on the second step jumps back to the first with its
//! value cleared. A session failure exits for re-authentication.

use crate::error::ErrorCode;
use crate::wizard::{Directive, FieldPattern, FieldRule, StepDefinition, WizardDefinition};

pub const EXIT_REAUTH: &str = "reauth";

pub fn definition() -> WizardDefinition {
    WizardDefinition::new(
        "pin_change",
        vec![
            StepDefinition::new("prev_pin")
                .with_field(FieldRule::new("prev_pin", FieldPattern::Code))
                .with_next("new_pin")
                .with_invalid_message("Enter your current six-digit PIN."),
            StepDefinition::new("new_pin")
                .with_field(FieldRule::new("new_pin", FieldPattern::Code))
                .with_action("change_pin")
                .with_on_success("store_access_token")
                .with_invalid_message("Choose a new six-digit PIN.")
                .with_error_message(
                    ErrorCode::InvalidValue,
                    Directive::JumpTo {
                        step: "prev_pin".to_string(),
                        clear_from: Some("prev_pin".to_string()),
                    },
                    "Current PIN does not match.",
                )
                .with_error_message(
                    ErrorCode::Auth,
                    Directive::Exit {
                        reason: EXIT_REAUTH.to_string(),
                    },
                    "Session expired. Sign in again.",
                )
                .with_error_message(ErrorCode::Unknown, Directive::Stay, "PIN change failed."),
        ],
    )
}
