//! Snapshot manager
//!
//! Freezes a checklist template at assignment time and owns the one item
//! resolution path every downstream component uses. The progression
//! engine, the conformance gate and the hold/witness protocol all count
//! items through [`resolve_items`]; resolving anywhere else would let
//! their item arithmetic disagree.

use crate::models::{ChecklistItem, ChecklistSnapshot, ChecklistTemplate, Lot, WorkInstance};
use crate::state::ProjectStore;

use super::{WorkflowError, WorkflowResult};

/// Capture an immutable copy of a fully-loaded template. Pure; callers
/// persist the result on the work instance.
pub fn create_snapshot(template: &ChecklistTemplate) -> ChecklistSnapshot {
    ChecklistSnapshot::capture(template)
}

/// Resolve the checklist items governing a work instance, ordered by
/// sequence. Prefers the stored snapshot; falls back to the live
/// template's current items only for legacy instances that predate
/// snapshotting.
pub fn resolve_items(
    instance: &WorkInstance,
    store: &ProjectStore,
) -> WorkflowResult<Vec<ChecklistItem>> {
    if let Some(snapshot) = &instance.snapshot {
        let mut items = snapshot.items.clone();
        items.sort_by_key(|i| i.sequence);
        return Ok(items);
    }
    let template = store.load_template(&instance.template_id)?;
    Ok(template.ordered_items())
}

/// Assign a template to a lot: freezes a snapshot and binds the resulting
/// work instance one-to-one with the lot.
pub fn assign_template(
    store: &ProjectStore,
    lot_key: &str,
    template_id: &str,
    requires_verification: bool,
) -> WorkflowResult<Lot> {
    let mut lot = store.find_lot(lot_key)?;
    if lot.instance.is_some() {
        return Err(WorkflowError::AlreadyAssigned(lot.number.clone()));
    }

    let template = store.load_template(template_id)?;
    let mut instance = WorkInstance::new(&template.id, create_snapshot(&template));
    instance.requires_verification = requires_verification;
    lot.instance = Some(instance);

    store.save_lot(&mut lot)?;
    Ok(lot)
}
