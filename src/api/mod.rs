//! REST adapters for the partner backend.
//!
//! Each submodule wraps one feature area of the API as [`Action`]
//! implementations over a shared [`ApiClient`]. Transport concerns stop
//! here: wizard code only ever sees [`Outcome`] values.
//!
//! [`Action`]: crate::adapter::Action
//! [`Outcome`]: crate::adapter::Outcome

mod client;

pub mod auth;
pub mod coupon;
pub mod issue;
pub mod setting;

pub use client::ApiClient;

use crate::error::Failure;
use crate::wizard::fields::FieldMap;

/// Fetch a field the step schema marks required. Validation runs before
/// dispatch, so a miss here is a wiring bug rather than user error.
pub(crate) fn required_field<'a>(input: &'a FieldMap, name: &str) -> Result<&'a str, Failure> {
    input
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Failure::unknown(format!("missing field '{name}'")))
}
