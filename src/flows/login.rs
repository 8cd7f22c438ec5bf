//! Login flow: phone number, then OTP for new partners or PIN for
//! returning ones.
//!
//! The phone step branches on the `isUsed` flag of the lookup response.
//! Completing the OTP step leaves a phone-auth token behind for partner
//! registration; completing the PIN step signs the session in. The router
//! tells the two apart by which token the terminal payload carries.

use crate::error::ErrorCode;
use crate::wizard::{BranchRule, Directive, FieldPattern, FieldRule, StepDefinition, WizardDefinition};

pub fn definition() -> WizardDefinition {
    WizardDefinition::new(
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
                .with_invalid_message("Enter a valid phone number.")
                .with_error_message(
                    ErrorCode::RateLimited,
                    Directive::Stay,
                    "Too many attempts. Try again later.",
                )
                .with_error_message(ErrorCode::Unknown, Directive::Stay, "Sign-in failed."),
            StepDefinition::new("otp")
                .with_field(FieldRule::new("otp", FieldPattern::Code))
                .with_action("verify_phone_code")
                .with_on_success("store_phone_auth_token")
                .with_invalid_message("Enter the six-digit verification code.")
                .with_error_message(
                    ErrorCode::InvalidValue,
                    Directive::Stay,
                    "Verification code does not match.",
                )
                .with_error_message(
                    ErrorCode::RateLimited,
                    Directive::JumpTo {
                        step: "phone".to_string(),
                        clear_from: Some("phone".to_string()),
                    },
                    "Too many attempts. Start over from your phone number.",
                ),
            StepDefinition::new("pin")
                .with_field(FieldRule::new("pin", FieldPattern::Code))
                .with_action("finalize_pin_login")
                .with_on_success("store_access_token")
                .with_invalid_message("Enter your six-digit PIN.")
                .with_error_message(ErrorCode::InvalidValue, Directive::Stay, "PIN does not match.")
                .with_error_message(
                    ErrorCode::RateLimited,
                    Directive::JumpTo {
                        step: "phone".to_string(),
                        clear_from: Some("phone".to_string()),
                    },
                    "Too many attempts. Start over from your phone number.",
                ),
        ],
    )
}
