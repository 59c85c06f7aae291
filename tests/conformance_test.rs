//! Integration tests for the conformance gate
//!
//! The gate is independent of the cached lot status: it re-derives every
//! prerequisite from source facts at the moment of the attempt.

use siteqa::models::{
    ChecklistItem, ChecklistTemplate, CompletionOutcome, Lot, LotStatus, NcrRecord, NcrStatus,
    ProjectConfig, TestOutcome, TestResultRecord, TestVerification,
};
use siteqa::services::{
    assign_template, conform, evaluate_conformance, record_completion, FileNcrSource,
    FileNotificationSink, FileTestResultSource, WorkflowError,
};
use siteqa::state::ProjectStore;
use tempfile::TempDir;

fn project() -> (TempDir, ProjectStore, ProjectConfig, ChecklistTemplate) {
    let temp = TempDir::new().unwrap();
    let store = ProjectStore::new(temp.path());
    store.init().unwrap();

    let mut template = ChecklistTemplate::new("Pavement ITP");
    template.add_item(ChecklistItem::new(1, "Trim and compact subgrade"));
    template.add_item(ChecklistItem::new(2, "Benkelman beam test").with_evidence("test"));
    store.save_template(&template).unwrap();

    let mut lot = Lot::new("LOT-001");
    store.save_lot(&mut lot).unwrap();
    assign_template(&store, "LOT-001", &template.id, false).unwrap();

    (temp, store, ProjectConfig::default(), template)
}

fn complete_item(
    store: &ProjectStore,
    config: &ProjectConfig,
    item_id: &str,
    outcome: CompletionOutcome,
) {
    let sink = FileNotificationSink::new(store);
    record_completion(
        store,
        &sink,
        config,
        "LOT-001",
        item_id,
        "foreman",
        outcome,
        None,
    )
    .unwrap();
}

fn verified_pass(store: &ProjectStore) {
    let lot = store.find_lot("LOT-001").unwrap();
    store
        .save_test_results(
            &lot.id,
            &[TestResultRecord::new(
                &lot.id,
                TestOutcome::Pass,
                TestVerification::Verified,
            )],
        )
        .unwrap();
}

#[test]
fn test_completed_status_alone_is_not_enough() {
    let (_temp, store, config, template) = project();
    for item in &template.items {
        complete_item(&store, &config, &item.id, CompletionOutcome::Completed);
    }
    assert_eq!(store.find_lot("LOT-001").unwrap().status, LotStatus::Completed);

    // No verified test result: the gate still refuses
    let tests = FileTestResultSource::new(&store);
    let ncrs = FileNcrSource::new(&store);
    let err = conform(&store, &tests, &ncrs, "LOT-001", "engineer").unwrap_err();
    match err {
        WorkflowError::PrerequisitesNotMet { reasons } => {
            assert_eq!(reasons.len(), 1);
            assert!(reasons[0].contains("test result"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_multiple_blockers_reported_at_once() {
    let (_temp, store, config, template) = project();
    complete_item(&store, &config, &template.items[0].id, CompletionOutcome::Completed);

    let lot = store.find_lot("LOT-001").unwrap();
    store
        .save_ncrs(&lot.id, &[NcrRecord::new("NCR-007", &lot.id, NcrStatus::InReview)])
        .unwrap();

    let tests = FileTestResultSource::new(&store);
    let ncrs = FileNcrSource::new(&store);
    let report = evaluate_conformance(&store, &tests, &ncrs, "LOT-001").unwrap();

    // Incomplete checklist + no test result + open NCR, all in one report
    assert!(!report.can_conform);
    assert_eq!(report.blocking_reasons.len(), 3);
    assert!(report.blocking_reasons.iter().any(|r| r.contains("NCR-007")));
}

#[test]
fn test_not_applicable_satisfies_the_checklist() {
    let (_temp, store, config, template) = project();
    complete_item(&store, &config, &template.items[0].id, CompletionOutcome::Completed);
    complete_item(
        &store,
        &config,
        &template.items[1].id,
        CompletionOutcome::NotApplicable,
    );
    verified_pass(&store);

    let tests = FileTestResultSource::new(&store);
    let ncrs = FileNcrSource::new(&store);
    let conformed = conform(&store, &tests, &ncrs, "LOT-001", "engineer").unwrap();
    assert_eq!(conformed.status, LotStatus::Conformed);
}

#[test]
fn test_closed_ncr_does_not_block() {
    let (_temp, store, config, template) = project();
    for item in &template.items {
        complete_item(&store, &config, &item.id, CompletionOutcome::Completed);
    }
    verified_pass(&store);

    let lot = store.find_lot("LOT-001").unwrap();
    store
        .save_ncrs(
            &lot.id,
            &[
                NcrRecord::new("NCR-001", &lot.id, NcrStatus::Closed),
                NcrRecord::new("NCR-002", &lot.id, NcrStatus::ClosedConcession),
            ],
        )
        .unwrap();

    let tests = FileTestResultSource::new(&store);
    let ncrs = FileNcrSource::new(&store);
    let conformed = conform(&store, &tests, &ncrs, "LOT-001", "engineer").unwrap();
    assert_eq!(conformed.status, LotStatus::Conformed);
    assert_eq!(conformed.conformed_by.as_deref(), Some("engineer"));
    assert!(conformed.conformed_at.is_some());
}

#[test]
fn test_failed_or_unverified_results_do_not_count() {
    let (_temp, store, config, template) = project();
    for item in &template.items {
        complete_item(&store, &config, &item.id, CompletionOutcome::Completed);
    }

    let lot = store.find_lot("LOT-001").unwrap();
    store
        .save_test_results(
            &lot.id,
            &[
                TestResultRecord::new(&lot.id, TestOutcome::Fail, TestVerification::Verified),
                TestResultRecord::new(&lot.id, TestOutcome::Pass, TestVerification::Unverified),
            ],
        )
        .unwrap();

    let tests = FileTestResultSource::new(&store);
    let ncrs = FileNcrSource::new(&store);
    let report = evaluate_conformance(&store, &tests, &ncrs, "LOT-001").unwrap();
    assert!(!report.can_conform);
}

#[test]
fn test_conformed_lot_is_frozen_for_progression() {
    let (_temp, store, config, template) = project();
    for item in &template.items {
        complete_item(&store, &config, &item.id, CompletionOutcome::Completed);
    }
    verified_pass(&store);

    let tests = FileTestResultSource::new(&store);
    let ncrs = FileNcrSource::new(&store);
    conform(&store, &tests, &ncrs, "LOT-001", "engineer").unwrap();

    // A later completion write must not disturb the conformed status
    siteqa::services::reevaluate(&store, &store.find_lot("LOT-001").unwrap().id);
    assert_eq!(store.find_lot("LOT-001").unwrap().status, LotStatus::Conformed);
}
