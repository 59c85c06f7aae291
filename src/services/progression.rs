//! Lot progression engine
//!
//! Derives a lot's lifecycle status from the completion state of its
//! resolved checklist, and caches the result on the lot document so list
//! views stay cheap. Deriving from counts means the status cannot silently
//! diverge from the checklist during normal operation; the administrative
//! statuses (conformed, claimed, ncr_raised) are an explicit escape hatch
//! the engine never overwrites.
//!
//! Re-evaluation is advisory: it is idempotent, derives state fresh on
//! every call, and never fails its caller. The conformance gate, not this
//! cached status, is authoritative for the terminal transition.

use crate::models::{ChecklistItem, LotStatus, WorkInstance};
use crate::state::ProjectStore;

use super::{advisory, resolve_items, WorkflowResult};

/// Re-derive and persist the lot's status. Failures are logged and
/// swallowed; status refresh must never abort the action that triggered it.
pub fn reevaluate(store: &ProjectStore, lot_id: &str) {
    advisory("lot status re-evaluation", try_reevaluate(store, lot_id));
}

fn try_reevaluate(store: &ProjectStore, lot_id: &str) -> WorkflowResult<()> {
    let mut lot = store.load_lot(lot_id)?;

    // Administrative branches are sticky
    if lot.status.is_frozen() {
        return Ok(());
    }

    let Some(instance) = &lot.instance else {
        return Ok(());
    };

    let items = resolve_items(instance, store)?;
    if items.is_empty() {
        return Ok(());
    }

    if let Some(next) = derive_status(lot.status, &items, instance) {
        lot.set_status(next);
        store.save_lot(&mut lot)?;
    }
    Ok(())
}

/// Pure transition function. Returns the new status, or None when nothing
/// applies.
///
/// Test items (evidence requirement `test`, or a test-type reference) gate
/// the final step: a lot with outstanding test items parks in
/// `awaiting_test` once everything else is done, while a lot with no test
/// items jumps straight to `completed`.
pub fn derive_status(
    current: LotStatus,
    items: &[ChecklistItem],
    instance: &WorkInstance,
) -> Option<LotStatus> {
    let completed_count = items
        .iter()
        .filter(|i| instance.item_is_complete(&i.id))
        .count();

    let all_non_test_complete = items
        .iter()
        .filter(|i| !i.is_test_item())
        .all(|i| instance.item_is_complete(&i.id));

    let incomplete_test_count = items
        .iter()
        .filter(|i| i.is_test_item() && !instance.item_is_complete(&i.id))
        .count();

    let from_active = matches!(current, LotStatus::NotStarted | LotStatus::InProgress);

    if all_non_test_complete && incomplete_test_count > 0 && from_active {
        return Some(LotStatus::AwaitingTest);
    }

    if all_non_test_complete
        && incomplete_test_count == 0
        && (from_active || current == LotStatus::AwaitingTest)
    {
        return Some(LotStatus::Completed);
    }

    if current == LotStatus::NotStarted && completed_count > 0 {
        return Some(LotStatus::InProgress);
    }

    None
}
