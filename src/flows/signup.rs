//! Partner signup flow: name, store name, then a PIN to finish.
//!
//! Revisit is allowed so a partner can step back and fix an earlier answer
//! without losing the rest. A duplicate registration exits straight to the
//! login flow.

use crate::error::ErrorCode;
use crate::wizard::{Directive, FieldPattern, FieldRule, StepDefinition, WizardDefinition};

pub const EXIT_ALREADY_REGISTERED: &str = "already_registered";

pub fn definition() -> WizardDefinition {
    WizardDefinition::new(
        "signup",
        vec![
            StepDefinition::new("user_name")
                .with_field(FieldRule::required_text("user_name"))
                .with_next("partner_name")
                .with_invalid_message("Enter your name."),
            StepDefinition::new("partner_name")
                .with_field(FieldRule::required_text("partner_name"))
                .with_next("pin")
                .with_invalid_message("Enter your store name."),
            StepDefinition::new("pin")
                .with_field(FieldRule::new("pin", FieldPattern::Code))
                .with_action("register_partner")
                .with_on_success("store_access_token")
                .with_invalid_message("Choose a six-digit PIN.")
                .with_error_message(
                    ErrorCode::Duplicate,
                    Directive::Exit {
                        reason: EXIT_ALREADY_REGISTERED.to_string(),
                    },
                    "This number is already registered. Please sign in.",
                )
                .with_error_message(
                    ErrorCode::Auth,
                    Directive::Exit {
                        reason: "reauth".to_string(),
                    },
                    "Phone verification expired. Start over.",
                )
                .with_error_message(ErrorCode::Unknown, Directive::Stay, "Registration failed."),
        ],
    )
    .with_revisit()
}
