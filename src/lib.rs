//! couponflow - guarded multi-step wizard engine for the partner coupon app
//!
//! A wizard is a declarative sequence of steps, each gated by field
//! validation and a single-flight submit. The pure [`wizard::WizardEngine`]
//! decides transitions; the async [`runner::WizardRunner`] drives adapters,
//! timers, and routing around it. The bundled [`flows`] reproduce the login,
//! signup, PIN change, redemption, and coupon issue screens.

pub mod adapter;
pub mod api;
pub mod error;
pub mod flows;
pub mod router;
pub mod runner;
pub mod store;
pub mod wizard;

pub use adapter::{Action, ActionRegistry, EffectRegistry, Outcome, SideEffect};
pub use error::{DefinitionError, ErrorCode, Failure};
pub use router::{NullRouter, ResultRouter};
pub use runner::{Submit, WizardRunner};
pub use wizard::{WizardDefinition, WizardEngine};
