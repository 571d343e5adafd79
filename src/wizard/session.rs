// ABOUTME: WizardSession - the single owned aggregate behind one wizard flow
// Mutated exclusively through controller operations

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::step::{ErrorMap, FormData};

/// Where the flow currently is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardPhase {
    /// Normal editing and navigation
    Editing,
    /// A submission POST is in flight
    Submitting,
    /// Terminal: the listing was accepted and the draft cleared
    Submitted,
    /// The last submission failed; data intact, retry allowed
    SubmitFailed,
}

/// The accumulated state of one wizard flow
#[derive(Debug)]
pub struct WizardSession {
    pub draft_id: Uuid,
    pub form_data: FormData,
    pub current_index: usize,
    /// step id -> field -> message, populated by blocked transitions
    pub errors: HashMap<String, ErrorMap>,
    /// Ids of steps whose validation has passed at least once
    pub completed_steps: BTreeSet<String>,
    pub phase: WizardPhase,
}

impl WizardSession {
    /// Fresh session starting at step 0 with a new draft id
    pub fn new() -> Self {
        Self::with_draft_id(Uuid::new_v4())
    }

    pub fn with_draft_id(draft_id: Uuid) -> Self {
        Self {
            draft_id,
            form_data: FormData::new(),
            current_index: 0,
            errors: HashMap::new(),
            completed_steps: BTreeSet::new(),
            phase: WizardPhase::Editing,
        }
    }

    /// Rebuild a session from a persisted draft
    pub fn from_record(record: DraftRecord) -> Self {
        Self {
            draft_id: record.draft_id,
            form_data: record.form_data,
            current_index: record.current_index,
            errors: HashMap::new(),
            completed_steps: record.completed_steps,
            phase: WizardPhase::Editing,
        }
    }

    /// Snapshot the persisted subset of this session
    pub fn snapshot(&self) -> DraftRecord {
        DraftRecord {
            draft_id: self.draft_id,
            form_data: self.form_data.clone(),
            current_index: self.current_index,
            completed_steps: self.completed_steps.clone(),
            saved_at: Utc::now(),
        }
    }

    pub fn set_field(&mut self, key: &str, value: Value) {
        self.form_data.insert(key.to_string(), value);
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.form_data.get(key)
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Persisted snapshot of an in-progress session, keyed by `draft_id`
///
/// Errors and phase are deliberately not part of the snapshot: a restored
/// session always re-enters `Editing` with a clean error map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRecord {
    pub draft_id: Uuid,
    pub form_data: FormData,
    pub current_index: usize,
    pub completed_steps: BTreeSet<String>,
    pub saved_at: DateTime<Utc>,
}
