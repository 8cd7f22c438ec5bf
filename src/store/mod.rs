//! Process-wide stores with explicit lifecycle.
//!
//! Initialized at application start, written only through named setters,
//! read via subscription. Wizard code never reaches into these directly —
//! they are injected collaborators of success side effects and the result
//! router.

mod auth;
mod ui;

pub use auth::{AuthSession, AuthStore};
pub use ui::{LayoutMode, UiState, UiStore};
