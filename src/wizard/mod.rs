//! The step wizard: declarative definitions, field validation, the state
//! machine itself, and snapshot persistence.

pub mod definition;
pub mod engine;
pub mod fields;
pub mod state;

pub use definition::{AutoReset, BranchRule, Directive, ErrorRule, StepDefinition, WizardDefinition};
pub use engine::{Advance, Applied, Command, WizardEngine};
pub use fields::{FieldMap, FieldPattern, FieldRule};
pub use state::{Phase, StepRecord, WizardSnapshot};
