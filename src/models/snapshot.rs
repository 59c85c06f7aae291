//! Checklist snapshot - the frozen copy of a template
//!
//! When a template is assigned to a lot, a deep point-in-time copy of the
//! template and its ordered items is taken and stored inline on the work
//! instance. The snapshot is self-contained (not a foreign-key reference)
//! so it survives template edits and even template deletion. Once written
//! it is treated as read-only for the lifetime of the instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checklist::{ChecklistItem, ChecklistTemplate};

/// Immutable point-in-time copy of a checklist template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistSnapshot {
    /// Id of the source template at capture time
    pub template_id: String,

    /// Template name at capture time
    pub template_name: String,

    #[serde(default)]
    pub template_description: Option<String>,

    #[serde(default)]
    pub activity_type: Option<String>,

    /// Deep copy of the template's items, ordered by sequence
    pub items: Vec<ChecklistItem>,

    /// When the snapshot was captured
    pub captured_at: DateTime<Utc>,
}

impl ChecklistSnapshot {
    /// Capture a snapshot from a fully-loaded template. Pure: callers
    /// persist the result on the work instance.
    pub fn capture(template: &ChecklistTemplate) -> Self {
        Self {
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            template_description: template.description.clone(),
            activity_type: template.activity_type.clone(),
            items: template.ordered_items(),
            captured_at: Utc::now(),
        }
    }

    /// Number of items frozen into this snapshot
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checklist::ChecklistItem;

    #[test]
    fn test_capture_copies_items() {
        let mut template = ChecklistTemplate::new("Pavement ITP");
        template.add_item(ChecklistItem::new(1, "Set out"));
        template.add_item(ChecklistItem::new(2, "Proof roll"));

        let snapshot = ChecklistSnapshot::capture(&template);
        assert_eq!(snapshot.template_name, "Pavement ITP");
        assert_eq!(snapshot.item_count(), 2);
        assert_eq!(snapshot.items[0].description, "Set out");
    }

    #[test]
    fn test_snapshot_survives_template_edits() {
        let mut template = ChecklistTemplate::new("Pavement ITP");
        template.add_item(ChecklistItem::new(1, "Set out"));

        let snapshot = ChecklistSnapshot::capture(&template);

        template.add_item(ChecklistItem::new(2, "Added later"));
        template.items[0].description = "Renamed".to_string();

        assert_eq!(snapshot.item_count(), 1);
        assert_eq!(snapshot.items[0].description, "Set out");
    }
}
