//! Lot and work instance data models
//!
//! A Lot is the unit of work an inspection checklist is attached to (e.g.
//! a chainage range of a road). Assigning a template creates exactly one
//! WorkInstance, which owns the frozen snapshot and every completion record
//! made against it. Lot lifecycle status is derived from completion state
//! by the progression engine and cached on the document so lists stay cheap
//! to render; the conformance gate never trusts the cached field for the
//! terminal transition.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::completion::Completion;
use super::snapshot::ChecklistSnapshot;

/// Lot lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    NotStarted,
    InProgress,
    /// All non-test items done, at least one test item outstanding
    AwaitingTest,
    /// Every checklist item done
    Completed,
    /// Terminal declaration that the work meets specification
    Conformed,
    /// Claimed for payment
    Claimed,
    /// A non-conformance report was raised against this lot
    NcrRaised,
}

impl LotStatus {
    pub fn name(&self) -> &'static str {
        match self {
            LotStatus::NotStarted => "not_started",
            LotStatus::InProgress => "in_progress",
            LotStatus::AwaitingTest => "awaiting_test",
            LotStatus::Completed => "completed",
            LotStatus::Conformed => "conformed",
            LotStatus::Claimed => "claimed",
            LotStatus::NcrRaised => "ncr_raised",
        }
    }

    /// Statuses the progression engine must never overwrite. These are
    /// administrative branches (conformance granted, payment claimed, NCR
    /// raised) that routine item completions must not revert.
    pub fn is_frozen(&self) -> bool {
        matches!(self, LotStatus::Conformed | LotStatus::Claimed | LotStatus::NcrRaised)
    }
}

/// The binding of one checklist snapshot to one lot; one-to-one with the
/// lot. Owns the snapshot and all completion records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkInstance {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Source template id, kept for the legacy no-snapshot fallback
    pub template_id: String,

    /// Frozen copy of the template taken at assignment time. Optional only
    /// for legacy instances created before snapshotting existed; status
    /// logic must prefer this over the live template whenever present.
    #[serde(default)]
    pub snapshot: Option<ChecklistSnapshot>,

    /// Whether subcontractor submissions on this assignment need
    /// head-contractor verification before counting as complete
    #[serde(default = "default_requires_verification")]
    pub requires_verification: bool,

    /// Completion records keyed by checklist item id
    #[serde(default)]
    pub completions: HashMap<String, Completion>,

    pub assigned_at: DateTime<Utc>,
}

fn default_requires_verification() -> bool {
    true
}

impl WorkInstance {
    pub fn new(template_id: impl Into<String>, snapshot: ChecklistSnapshot) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            template_id: template_id.into(),
            snapshot: Some(snapshot),
            requires_verification: true,
            completions: HashMap::new(),
            assigned_at: Utc::now(),
        }
    }

    pub fn completion_for_item(&self, item_id: &str) -> Option<&Completion> {
        self.completions.get(item_id)
    }

    pub fn completion_by_id(&self, completion_id: &str) -> Option<&Completion> {
        self.completions.values().find(|c| c.id == completion_id)
    }

    pub fn completion_by_id_mut(&mut self, completion_id: &str) -> Option<&mut Completion> {
        self.completions.values_mut().find(|c| c.id == completion_id)
    }

    /// Whether the item has a completion that counts as done
    pub fn item_is_complete(&self, item_id: &str) -> bool {
        self.completions
            .get(item_id)
            .map_or(false, |c| c.status.counts_as_complete())
    }
}

/// The unit of work a checklist is attached to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Human lot number (e.g. "LOT-014")
    pub number: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Chainage identity, start/end in metres
    #[serde(default)]
    pub chainage_from: Option<f64>,
    #[serde(default)]
    pub chainage_to: Option<f64>,

    pub status: LotStatus,

    /// When the progression engine last changed the status
    #[serde(default)]
    pub status_updated_at: Option<DateTime<Utc>>,

    /// At most one work instance, exclusively owned by this lot
    #[serde(default)]
    pub instance: Option<WorkInstance>,

    /// Attribution for the terminal conformance declaration
    #[serde(default)]
    pub conformed_by: Option<String>,
    #[serde(default)]
    pub conformed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    /// Last-modified stamp, compared at write time to detect lost updates
    pub updated_at: DateTime<Utc>,
}

impl Lot {
    pub fn new(number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            number: number.into(),
            description: None,
            chainage_from: None,
            chainage_to: None,
            status: LotStatus::NotStarted,
            status_updated_at: None,
            instance: None,
            conformed_by: None,
            conformed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_chainage(mut self, from: f64, to: f64) -> Self {
        self.chainage_from = Some(from);
        self.chainage_to = Some(to);
        self
    }

    /// Update the derived status and stamp when it changed
    pub fn set_status(&mut self, status: LotStatus) {
        if self.status != status {
            self.status = status;
            self.status_updated_at = Some(Utc::now());
        }
    }
}
