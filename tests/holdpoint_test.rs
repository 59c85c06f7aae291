//! Integration tests for the hold/witness point protocol
//!
//! Exercises the notify, chase, schedule and tokenized release lifecycle
//! end to end against a file-backed project.

use chrono::{Datelike, Duration, TimeZone, Utc, Weekday};
use siteqa::models::{
    AlertSeverity, ChecklistItem, ChecklistTemplate, CompletionOutcome, HoldPointStatus,
    LookAhead, Lot, NotificationType, PointType, ProjectConfig, ReleaseChannel,
};
use siteqa::services::{
    adjust_to_working_hours, assign_template, chase, record_completion, release_by_token,
    request_release, scan, schedule_inspection, view_by_token, FileNotificationSink,
    ReleaseRequest, WorkflowError,
};
use siteqa::state::ProjectStore;
use tempfile::TempDir;

fn project() -> (TempDir, ProjectStore, ProjectConfig, ChecklistTemplate) {
    let temp = TempDir::new().unwrap();
    let store = ProjectStore::new(temp.path());
    store.init().unwrap();

    let mut template = ChecklistTemplate::new("Structures ITP");
    template.add_item(ChecklistItem::new(1, "Formwork and falsework check"));
    template.add_item(
        ChecklistItem::new(2, "Reinforcement inspection").with_point_type(PointType::Witness),
    );
    template.add_item(
        ChecklistItem::new(3, "Pre-pour hold").with_point_type(PointType::Hold),
    );
    store.save_template(&template).unwrap();

    let mut lot = Lot::new("LOT-001");
    store.save_lot(&mut lot).unwrap();
    assign_template(&store, "LOT-001", &template.id, false).unwrap();

    let mut config = ProjectConfig::default();
    config.witness_recipients = vec!["pm-1".to_string(), "super-1".to_string()];
    (temp, store, config, template)
}

fn seq_id(template: &ChecklistTemplate, sequence: u32) -> String {
    template.item_by_sequence(sequence).unwrap().id.clone()
}

fn release_form(name: &str) -> ReleaseRequest {
    ReleaseRequest {
        releaser_name: name.to_string(),
        releaser_org: Some("Principal".to_string()),
        notes: None,
        signature: None,
    }
}

fn secret_from_link(link: &str) -> String {
    link.rsplit('/').next().unwrap().to_string()
}

#[test]
fn test_witness_notice_goes_to_every_recipient_once() {
    let (_temp, store, config, template) = project();
    let sink = FileNotificationSink::new(&store);

    record_completion(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 1),
        "foreman",
        CompletionOutcome::Completed,
        None,
    )
    .unwrap();

    let notices: Vec<_> = store
        .list_notifications()
        .unwrap()
        .into_iter()
        .filter(|n| n.kind == NotificationType::WitnessUpcoming)
        .collect();
    assert_eq!(notices.len(), 2);
    let mut users: Vec<_> = notices.iter().map(|n| n.user_id.clone()).collect();
    users.sort();
    assert_eq!(users, vec!["pm-1", "super-1"]);

    // Completing again (e.g. correcting notes) does not re-notify
    record_completion(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 1),
        "foreman",
        CompletionOutcome::Completed,
        Some("updated".to_string()),
    )
    .unwrap();
    let count = store
        .list_notifications()
        .unwrap()
        .iter()
        .filter(|n| n.kind == NotificationType::WitnessUpcoming)
        .count();
    assert_eq!(count, 2);
}

#[test]
fn test_look_ahead_window_controls_reach() {
    let (_temp, store, mut config, template) = project();
    let sink = FileNotificationSink::new(&store);
    config.witness_look_ahead = LookAhead::Next;

    // Item 2 (witness) already complete, item 3 is a hold point: nothing to
    // notify within the window after completing item 1
    record_completion(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 2),
        "foreman",
        CompletionOutcome::Completed,
        None,
    )
    .unwrap();
    let before = store.list_notifications().unwrap().len();
    record_completion(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 1),
        "foreman",
        CompletionOutcome::Completed,
        None,
    )
    .unwrap();
    assert_eq!(store.list_notifications().unwrap().len(), before);
}

#[test]
fn test_chase_counter_climbs_with_timestamps() {
    let (_temp, store, config, template) = project();
    let sink = FileNotificationSink::new(&store);
    let hold_id = seq_id(&template, 3);

    schedule_inspection(
        &store,
        &sink,
        &config,
        "LOT-001",
        &hold_id,
        Utc::now() + Duration::days(2),
    )
    .unwrap();

    let first = chase(&store, "LOT-001", &hold_id).unwrap();
    let second = chase(&store, "LOT-001", &hold_id).unwrap();
    assert_eq!(second.chase_count, 2);
    assert!(second.last_chased_at.unwrap() >= first.last_chased_at.unwrap());
}

#[test]
fn test_token_lifecycle_view_release_replay() {
    let (_temp, store, config, template) = project();
    let sink = FileNotificationSink::new(&store);

    // Evidence for the release page
    record_completion(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 1),
        "foreman",
        CompletionOutcome::Completed,
        None,
    )
    .unwrap();

    let issued = request_release(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 3),
        "pm-1",
        &["inspector@principal.example".to_string()],
    )
    .unwrap();
    assert_eq!(issued.len(), 1);
    let secret = secret_from_link(&issued[0].link);

    // Viewing shows evidence and does not consume
    let view = view_by_token(&store, &secret).unwrap();
    assert_eq!(view.lot_number, "LOT-001");
    assert!(!view.evidence.is_empty());
    view_by_token(&store, &secret).unwrap();

    // First release wins
    let point = release_by_token(&store, &sink, &secret, release_form("J. Inspector")).unwrap();
    assert_eq!(point.status, HoldPointStatus::Released);
    assert_eq!(point.release_channel, Some(ReleaseChannel::Token));

    // Replay is inert
    let err = release_by_token(&store, &sink, &secret, release_form("J. Inspector")).unwrap_err();
    assert!(matches!(err, WorkflowError::TokenUsed));

    // Requester and releaser both got a confirmation
    let released: Vec<_> = store
        .list_notifications()
        .unwrap()
        .into_iter()
        .filter(|n| n.kind == NotificationType::HoldReleased)
        .collect();
    assert_eq!(released.len(), 2);
    assert!(released.iter().any(|n| n.user_id == "pm-1"));
    assert!(released
        .iter()
        .any(|n| n.user_id == "inspector@principal.example"));
}

#[test]
fn test_sibling_token_cannot_release_twice() {
    let (_temp, store, config, template) = project();
    let sink = FileNotificationSink::new(&store);

    let issued = request_release(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 3),
        "pm-1",
        &["a@example.com".to_string(), "b@example.com".to_string()],
    )
    .unwrap();
    assert_eq!(issued.len(), 2);

    release_by_token(
        &store,
        &sink,
        &secret_from_link(&issued[0].link),
        release_form("A"),
    )
    .unwrap();

    let err = release_by_token(
        &store,
        &sink,
        &secret_from_link(&issued[1].link),
        release_form("B"),
    )
    .unwrap_err();
    assert!(matches!(err, WorkflowError::AlreadyReleased));
}

#[test]
fn test_scan_severity_grades_by_overdue_hours() {
    let (_temp, store, config, template) = project();
    let sink = FileNotificationSink::new(&store);

    schedule_inspection(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 3),
        Utc::now() - Duration::hours(60),
    )
    .unwrap();

    let report = scan(&store, Utc::now()).unwrap();
    assert_eq!(report.stale.len(), 1);
    assert_eq!(report.stale[0].severity, AlertSeverity::Critical);

    // Released points drop out of the scan
    let issued = request_release(
        &store,
        &sink,
        &config,
        "LOT-001",
        &seq_id(&template, 3),
        "pm-1",
        &["a@example.com".to_string()],
    )
    .unwrap();
    release_by_token(
        &store,
        &sink,
        &secret_from_link(&issued[0].link),
        release_form("A"),
    )
    .unwrap();
    let report = scan(&store, Utc::now()).unwrap();
    assert!(report.stale.is_empty());
}

#[test]
fn test_weekend_notice_lands_monday_morning() {
    let hours = ProjectConfig::default().working_hours;

    // Saturday 10:00
    let requested = Utc.with_ymd_and_hms(2024, 6, 8, 10, 0, 0).unwrap();
    assert_eq!(requested.weekday(), Weekday::Sat);

    let adjustment = adjust_to_working_hours(requested, &hours);
    assert!(adjustment.adjusted);
    assert_eq!(adjustment.send_at.weekday(), Weekday::Mon);
    assert_eq!(
        adjustment.send_at,
        Utc.with_ymd_and_hms(2024, 6, 10, 7, 0, 0).unwrap()
    );
}
