//! Payment-code redemption flow: scan, confirm, done, repeat.
//!
//! The completion step holds for three seconds and then snaps back to the
//! scanner with the code cleared, ready for the next customer. The flow
//! never completes on its own; it loops until the screen tears it down.

use crate::error::ErrorCode;
use crate::wizard::{AutoReset, Directive, FieldRule, StepDefinition, WizardDefinition};

pub const EXIT_REAUTH: &str = "reauth";

/// Delay before the completion screen returns to the scanner.
pub const RESET_DELAY_MS: u64 = 3_000;

pub fn definition() -> WizardDefinition {
    WizardDefinition::new(
        "redeem",
        vec![
            StepDefinition::new("scan")
                .with_field(FieldRule::required_text("code"))
                .with_action("resolve_payment")
                .with_next("confirm")
                .with_invalid_message("Scan a payment code.")
                .with_error_message(
                    ErrorCode::InvalidValue,
                    Directive::Stay,
                    "Invalid payment code.",
                )
                .with_error_message(
                    ErrorCode::AlreadyDecided,
                    Directive::Stay,
                    "This coupon was already used.",
                )
                .with_error_message(
                    ErrorCode::Auth,
                    Directive::Exit {
                        reason: EXIT_REAUTH.to_string(),
                    },
                    "Session expired. Sign in again.",
                )
                .with_error_message(ErrorCode::Unknown, Directive::Stay, "Lookup failed."),
            StepDefinition::new("confirm")
                .with_action("confirm_payment")
                .with_next("complete")
                .with_error_message(
                    ErrorCode::AlreadyDecided,
                    Directive::JumpTo {
                        step: "scan".to_string(),
                        clear_from: Some("scan".to_string()),
                    },
                    "This coupon was already used.",
                )
                .with_error_message(
                    ErrorCode::Auth,
                    Directive::Exit {
                        reason: EXIT_REAUTH.to_string(),
                    },
                    "Session expired. Sign in again.",
                )
                .with_error_message(ErrorCode::Unknown, Directive::Stay, "Confirmation failed."),
            StepDefinition::new("complete").with_auto_reset(AutoReset {
                after_ms: RESET_DELAY_MS,
                goto: "scan".to_string(),
                clear: true,
            }),
        ],
    )
}
