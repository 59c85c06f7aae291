//! Completion tracker
//!
//! Records per-item completion and verification outcomes. Subcontractor
//! submissions on verification-required assignments land in
//! `pending_verification` and wait for a head-contractor decision; a
//! rejection counts the item as incomplete everywhere downstream until it
//! is resubmitted.
//!
//! The completion write is the authoritative action. The witness-point
//! look-ahead, the progression re-evaluation and every notification are
//! advisory side effects run after the write; their failures are logged
//! and never roll the completion back.

use crate::models::{
    Completion, CompletionOutcome, CompletionStatus, Notification, NotificationType,
    ProjectConfig, ResponsibleParty, VerifyDecision,
};
use crate::state::ProjectStore;

use super::{
    advisory, holdpoint, progression, resolve_items, NotificationSink, WorkflowError,
    WorkflowResult,
};

/// Record (or resubmit) a completion for one checklist item
pub fn record_completion(
    store: &ProjectStore,
    sink: &dyn NotificationSink,
    config: &ProjectConfig,
    lot_key: &str,
    item_id: &str,
    actor_id: &str,
    outcome: CompletionOutcome,
    notes: Option<String>,
) -> WorkflowResult<Completion> {
    let mut lot = store.find_lot(lot_key)?;
    let instance = lot
        .instance
        .as_ref()
        .ok_or_else(|| WorkflowError::NoInstance(lot.number.clone()))?;

    let items = resolve_items(instance, store)?;
    let item = items
        .iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| WorkflowError::ItemNotInChecklist(item_id.to_string()))?
        .clone();

    // Subcontractor work on a verification-required assignment is not
    // complete until the head contractor signs it off
    let needs_verification = item.responsible_party == ResponsibleParty::Subcontractor
        && instance.requires_verification;
    let status = if needs_verification {
        CompletionStatus::PendingVerification
    } else {
        match outcome {
            CompletionOutcome::Completed => CompletionStatus::Completed,
            CompletionOutcome::NotApplicable => CompletionStatus::NotApplicable,
        }
    };

    let instance = lot
        .instance
        .as_mut()
        .ok_or_else(|| WorkflowError::NoInstance(lot_key.to_string()))?;
    let completion = match instance.completions.get_mut(&item.id) {
        Some(existing) => {
            existing.resubmit(actor_id, status, notes);
            existing.clone()
        }
        None => {
            let mut fresh = Completion::new(&item.id, actor_id, status);
            fresh.notes = notes;
            instance.completions.insert(item.id.clone(), fresh.clone());
            fresh
        }
    };

    store.save_lot(&mut lot)?;

    // Best-effort hooks; the completion stands whatever happens here
    advisory(
        "witness point look-ahead",
        holdpoint::witness_look_ahead(store, sink, config, &lot, &item.id),
    );
    progression::reevaluate(store, &lot.id);

    Ok(completion)
}

/// Decide on a completion awaiting verification
pub fn verify_completion(
    store: &ProjectStore,
    sink: &dyn NotificationSink,
    lot_key: &str,
    completion_id: &str,
    actor_id: &str,
    decision: VerifyDecision,
    reason: Option<String>,
) -> WorkflowResult<Completion> {
    let mut lot = store.find_lot(lot_key)?;
    let instance = lot
        .instance
        .as_mut()
        .ok_or_else(|| WorkflowError::NoInstance(lot_key.to_string()))?;

    let completion = instance
        .completion_by_id_mut(completion_id)
        .ok_or_else(|| WorkflowError::CompletionNotFound(completion_id.to_string()))?;

    if completion.status != CompletionStatus::PendingVerification {
        return Err(WorkflowError::NotPendingVerification {
            completion_id: completion_id.to_string(),
            status: completion.status.name(),
        });
    }

    let submitter = completion.actor_id.clone();
    let item_id = completion.item_id.clone();

    match decision {
        VerifyDecision::Accept => completion.accept(actor_id),
        VerifyDecision::Reject => {
            let reason = reason.ok_or(WorkflowError::ReasonRequired)?;
            completion.reject(actor_id, reason);
        }
    }
    let result = completion.clone();

    store.save_lot(&mut lot)?;

    if decision == VerifyDecision::Reject {
        let rejection_reason = result
            .rejection_reason
            .clone()
            .unwrap_or_else(|| "no reason given".to_string());
        let notification = Notification::new(
            &submitter,
            NotificationType::CompletionRejected,
            format!("Checklist item rejected on {}", lot.number),
            format!("Your submission was rejected: {}", rejection_reason),
        )
        .with_reference(&item_id);
        advisory("rejection notification", sink.notify(&notification));
    }

    progression::reevaluate(store, &lot.id);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChecklistItem, ChecklistTemplate, Lot, LotStatus,
    };
    use crate::services::{assign_template, FileNotificationSink};
    use tempfile::TempDir;

    fn setup() -> (TempDir, ProjectStore, ProjectConfig, Lot, ChecklistTemplate) {
        let temp = TempDir::new().unwrap();
        let store = ProjectStore::new(temp.path());
        store.init().unwrap();

        let mut template = ChecklistTemplate::new("Drainage ITP");
        template.add_item(ChecklistItem::new(1, "Excavate trench"));
        template.add_item(
            ChecklistItem::new(2, "Lay bedding")
                .with_responsible_party(ResponsibleParty::Subcontractor),
        );
        store.save_template(&template).unwrap();

        let mut lot = Lot::new("LOT-001");
        store.save_lot(&mut lot).unwrap();
        let lot = assign_template(&store, "LOT-001", &template.id, true).unwrap();

        (temp, store, ProjectConfig::default(), lot, template)
    }

    fn item_id(template: &ChecklistTemplate, sequence: u32) -> String {
        template.item_by_sequence(sequence).unwrap().id.clone()
    }

    #[test]
    fn test_contractor_completion_is_immediate() {
        let (_temp, store, config, _lot, template) = setup();
        let sink = FileNotificationSink::new(&store);

        let completion = record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            &item_id(&template, 1),
            "foreman",
            CompletionOutcome::Completed,
            None,
        )
        .unwrap();

        assert_eq!(completion.status, CompletionStatus::Completed);

        // Progression hook ran: first completion starts progress
        let lot = store.find_lot("LOT-001").unwrap();
        assert_eq!(lot.status, LotStatus::InProgress);
    }

    #[test]
    fn test_subcontractor_completion_waits_for_verification() {
        let (_temp, store, config, _lot, template) = setup();
        let sink = FileNotificationSink::new(&store);

        let completion = record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            &item_id(&template, 2),
            "sub-crew",
            CompletionOutcome::Completed,
            None,
        )
        .unwrap();

        assert_eq!(completion.status, CompletionStatus::PendingVerification);

        // A pending submission does not advance the lot
        let lot = store.find_lot("LOT-001").unwrap();
        assert_eq!(lot.status, LotStatus::NotStarted);
    }

    #[test]
    fn test_unknown_item_is_rejected() {
        let (_temp, store, config, _lot, _template) = setup();
        let sink = FileNotificationSink::new(&store);

        let err = record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            "not-an-item",
            "foreman",
            CompletionOutcome::Completed,
            None,
        )
        .unwrap_err();

        assert!(matches!(err, WorkflowError::ItemNotInChecklist(_)));
    }

    #[test]
    fn test_accept_completes_the_item() {
        let (_temp, store, config, _lot, template) = setup();
        let sink = FileNotificationSink::new(&store);

        let pending = record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            &item_id(&template, 2),
            "sub-crew",
            CompletionOutcome::Completed,
            None,
        )
        .unwrap();

        let verified = verify_completion(
            &store,
            &sink,
            "LOT-001",
            &pending.id,
            "engineer",
            VerifyDecision::Accept,
            None,
        )
        .unwrap();

        assert_eq!(verified.status, CompletionStatus::Completed);
        assert_eq!(verified.verified_by.as_deref(), Some("engineer"));
    }

    #[test]
    fn test_reject_requires_reason_and_notifies_submitter() {
        let (_temp, store, config, _lot, template) = setup();
        let sink = FileNotificationSink::new(&store);

        let pending = record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            &item_id(&template, 2),
            "sub-crew",
            CompletionOutcome::Completed,
            None,
        )
        .unwrap();

        let err = verify_completion(
            &store,
            &sink,
            "LOT-001",
            &pending.id,
            "engineer",
            VerifyDecision::Reject,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::ReasonRequired));

        let rejected = verify_completion(
            &store,
            &sink,
            "LOT-001",
            &pending.id,
            "engineer",
            VerifyDecision::Reject,
            Some("compaction photos missing".to_string()),
        )
        .unwrap();
        assert_eq!(rejected.status, CompletionStatus::Rejected);

        let notifications = store.list_notifications().unwrap();
        assert!(notifications
            .iter()
            .any(|n| n.kind == NotificationType::CompletionRejected && n.user_id == "sub-crew"));
    }

    #[test]
    fn test_verify_twice_fails() {
        let (_temp, store, config, _lot, template) = setup();
        let sink = FileNotificationSink::new(&store);

        let pending = record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            &item_id(&template, 2),
            "sub-crew",
            CompletionOutcome::Completed,
            None,
        )
        .unwrap();

        verify_completion(
            &store,
            &sink,
            "LOT-001",
            &pending.id,
            "engineer",
            VerifyDecision::Accept,
            None,
        )
        .unwrap();

        let err = verify_completion(
            &store,
            &sink,
            "LOT-001",
            &pending.id,
            "engineer",
            VerifyDecision::Accept,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::NotPendingVerification { .. }));
    }

    #[test]
    fn test_rejected_then_resubmitted_and_accepted_counts_complete() {
        let (_temp, store, config, _lot, template) = setup();
        let sink = FileNotificationSink::new(&store);

        // Contractor item done
        record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            &item_id(&template, 1),
            "foreman",
            CompletionOutcome::Completed,
            None,
        )
        .unwrap();

        // Subcontractor item: submit, reject, resubmit, accept
        let pending = record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            &item_id(&template, 2),
            "sub-crew",
            CompletionOutcome::Completed,
            None,
        )
        .unwrap();
        verify_completion(
            &store,
            &sink,
            "LOT-001",
            &pending.id,
            "engineer",
            VerifyDecision::Reject,
            Some("redo".to_string()),
        )
        .unwrap();

        let resubmitted = record_completion(
            &store,
            &sink,
            &config,
            "LOT-001",
            &item_id(&template, 2),
            "sub-crew",
            CompletionOutcome::Completed,
            Some("fixed".to_string()),
        )
        .unwrap();
        assert_eq!(resubmitted.status, CompletionStatus::PendingVerification);
        assert_eq!(resubmitted.id, pending.id); // same row, updated

        verify_completion(
            &store,
            &sink,
            "LOT-001",
            &resubmitted.id,
            "engineer",
            VerifyDecision::Accept,
            None,
        )
        .unwrap();

        let lot = store.find_lot("LOT-001").unwrap();
        assert_eq!(lot.status, LotStatus::Completed);
    }
}
