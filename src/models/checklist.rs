//! Checklist template data models
//!
//! An ITP (Inspection and Test Plan) is modelled as a ChecklistTemplate
//! owned by a project, holding an ordered list of ChecklistItems. Templates
//! stay editable; the frozen copy bound to a lot lives in
//! [`crate::models::snapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved evidence-requirement value meaning "requires a lab test result"
pub const EVIDENCE_TEST: &str = "test";

/// Inspection point type of a checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
    /// Ordinary checklist item, no external coordination
    Standard,
    /// Requires advance notice to an external party, does not block work
    Witness,
    /// Blocks further work until an authorized party releases it
    Hold,
}

impl PointType {
    pub fn name(&self) -> &'static str {
        match self {
            PointType::Standard => "standard",
            PointType::Witness => "witness",
            PointType::Hold => "hold",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(PointType::Standard),
            "witness" => Some(PointType::Witness),
            "hold" => Some(PointType::Hold),
            _ => None,
        }
    }
}

/// Party responsible for completing a checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsibleParty {
    Contractor,
    Subcontractor,
    Superintendent,
}

impl ResponsibleParty {
    pub fn name(&self) -> &'static str {
        match self {
            ResponsibleParty::Contractor => "contractor",
            ResponsibleParty::Subcontractor => "subcontractor",
            ResponsibleParty::Superintendent => "superintendent",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "contractor" => Some(ResponsibleParty::Contractor),
            "subcontractor" => Some(ResponsibleParty::Subcontractor),
            "superintendent" => Some(ResponsibleParty::Superintendent),
            _ => None,
        }
    }
}

/// A single inspection item within a checklist template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Position within the template; unique per template, defines order
    pub sequence: u32,

    /// What is being inspected
    pub description: String,

    /// Inspection point type
    #[serde(default = "default_point_type")]
    pub point_type: PointType,

    /// Who completes this item
    #[serde(default = "default_responsible_party")]
    pub responsible_party: ResponsibleParty,

    /// Free-form evidence requirement; `"test"` is reserved and means a
    /// lab test result is required
    #[serde(default)]
    pub evidence_requirement: Option<String>,

    /// Acceptance criteria reference
    #[serde(default)]
    pub acceptance_criteria: Option<String>,

    /// Test type reference (e.g. a lab test method code)
    #[serde(default)]
    pub test_type: Option<String>,
}

fn default_point_type() -> PointType {
    PointType::Standard
}

fn default_responsible_party() -> ResponsibleParty {
    ResponsibleParty::Contractor
}

impl ChecklistItem {
    pub fn new(sequence: u32, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sequence,
            description: description.into(),
            point_type: PointType::Standard,
            responsible_party: ResponsibleParty::Contractor,
            evidence_requirement: None,
            acceptance_criteria: None,
            test_type: None,
        }
    }

    pub fn with_point_type(mut self, point_type: PointType) -> Self {
        self.point_type = point_type;
        self
    }

    pub fn with_responsible_party(mut self, party: ResponsibleParty) -> Self {
        self.responsible_party = party;
        self
    }

    pub fn with_evidence(mut self, requirement: impl Into<String>) -> Self {
        self.evidence_requirement = Some(requirement.into());
        self
    }

    pub fn with_test_type(mut self, test_type: impl Into<String>) -> Self {
        self.test_type = Some(test_type.into());
        self
    }

    /// Whether this item requires a lab test result before it counts as a
    /// test item for lot progression
    pub fn is_test_item(&self) -> bool {
        self.test_type.is_some()
            || self
                .evidence_requirement
                .as_deref()
                .map_or(false, |e| e.eq_ignore_ascii_case(EVIDENCE_TEST))
    }
}

/// An ordered inspection checklist for an activity type. Mutable; owned by
/// a project. Assigning it to a lot freezes a snapshot copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Template name (e.g. "Subgrade Preparation ITP")
    pub name: String,

    /// Longer description
    #[serde(default)]
    pub description: Option<String>,

    /// Activity type this checklist covers (e.g. "earthworks")
    #[serde(default)]
    pub activity_type: Option<String>,

    /// Ordered checklist items
    pub items: Vec<ChecklistItem>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChecklistTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            activity_type: None,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append an item and keep the list ordered by sequence
    pub fn add_item(&mut self, item: ChecklistItem) {
        self.items.push(item);
        self.items.sort_by_key(|i| i.sequence);
        self.updated_at = Utc::now();
    }

    /// Find an item by its sequence number
    pub fn item_by_sequence(&self, sequence: u32) -> Option<&ChecklistItem> {
        self.items.iter().find(|i| i.sequence == sequence)
    }

    /// Items ordered by sequence number
    pub fn ordered_items(&self) -> Vec<ChecklistItem> {
        let mut items = self.items.clone();
        items.sort_by_key(|i| i.sequence);
        items
    }
}
