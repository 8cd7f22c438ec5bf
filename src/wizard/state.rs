//! Runtime state records and snapshot persistence for wizard instances.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::wizard::fields::FieldMap;

/// Lifecycle phase of a wizard instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Phase {
    /// Accepting operations on the active step.
    Active,
    /// Last step completed; no further operations accepted.
    Terminal,
    /// A step directive abandoned the wizard; the reason is for the router.
    Exited { reason: String },
}

impl Phase {
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Active)
    }
}

/// Per-step runtime record: current field values and completion.
///
/// `done` is distinct from validity — a step can hold valid fields whose
/// submission has not yet succeeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepRecord {
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    pub fn clear(&mut self) {
        self.fields.clear();
        self.done = false;
        self.completed_at = None;
    }
}

/// Serializable snapshot of a wizard instance, for collaborator-requested
/// resume across sessions. Nothing is persisted unless a caller asks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSnapshot {
    pub id: Uuid,
    /// Name of the wizard definition this snapshot belongs to.
    pub wizard: String,
    pub active: String,
    pub history: Vec<String>,
    pub phase: Phase,
    pub records: BTreeMap<String, StepRecord>,
    pub saved_at: DateTime<Utc>,
}

impl WizardSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create snapshot directory")?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        Ok(())
    }
}
