//! Coupon issue flows: partner-initiated self-issues and approve/reject
//! decisions on pending issues.

use crate::error::ErrorCode;
use crate::wizard::{Directive, FieldPattern, FieldRule, StepDefinition, WizardDefinition};

pub const EXIT_REAUTH: &str = "reauth";

/// Self-issue: name the batch, optionally attach product lines, submit.
pub fn self_issue_definition() -> WizardDefinition {
    WizardDefinition::new(
        "self_issue",
        vec![
            StepDefinition::new("title")
                .with_field(FieldRule::required_text("title"))
                .with_next("products")
                .with_invalid_message("Name this issue."),
            StepDefinition::new("products")
                .with_field(FieldRule::required_text("products").optional())
                .with_action("create_self_issue")
                .with_error_message(
                    ErrorCode::InvalidValue,
                    Directive::Stay,
                    "Invalid issue request.",
                )
                .with_error_message(
                    ErrorCode::Auth,
                    Directive::Exit {
                        reason: EXIT_REAUTH.to_string(),
                    },
                    "Session expired. Sign in again.",
                )
                .with_error_message(ErrorCode::Unknown, Directive::Stay, "Coupon issue failed."),
        ],
    )
}

/// Decide a pending issue. Single step: the screen fills in the issue id and
/// the approve/reject choice, then submits once.
pub fn decide_definition() -> WizardDefinition {
    WizardDefinition::new(
        "decide_issue",
        vec![StepDefinition::new("decision")
            .with_field(FieldRule::new("issue_id", FieldPattern::Digits))
            .with_field(FieldRule::required_text("approved"))
            .with_field(FieldRule::required_text("reason").optional())
            .with_field(FieldRule::required_text("products").optional())
            .with_action("decide_issue")
            .with_invalid_message("Pick an issue and a decision.")
            .with_error_message(
                ErrorCode::AlreadyDecided,
                Directive::Stay,
                "This issue was already decided.",
            )
            .with_error_message(
                ErrorCode::InvalidValue,
                Directive::Stay,
                "Invalid issue record.",
            )
            .with_error_message(
                ErrorCode::Auth,
                Directive::Exit {
                    reason: EXIT_REAUTH.to_string(),
                },
                "Session expired. Sign in again.",
            )
            .with_error_message(ErrorCode::Unknown, Directive::Stay, "Decision failed.")],
    )
}
