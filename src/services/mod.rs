//! Service layer for siteqa
//!
//! The quality workflow engine lives here, shared by the CLI commands and
//! the public release server:
//! - snapshot: freeze templates and resolve the item set for an instance
//! - completion: record / verify / reject item completions
//! - progression: derive lot status from completion state
//! - conformance: gate the terminal "conformant" transition
//! - holdpoint: witness look-ahead, chasing, token release, stale scan
//! - schedule: working-hours-aware notification timing
//!
//! Failures split into two classes. Authoritative failures (invalid input,
//! policy violation) surface as [`WorkflowError`] to the caller.
//! Advisory failures (status refresh, look-ahead, notification dispatch)
//! are best-effort side effects of a primary action: they are run through
//! [`advisory`], which logs and swallows, and can never roll the primary
//! action back.

pub mod completion;
pub mod conformance;
pub mod holdpoint;
pub mod progression;
pub mod schedule;
pub mod snapshot;

use std::fmt::Display;

use crate::models::{NcrRecord, Notification, TestResultRecord};
use crate::state::{ProjectStore, StoreError};

pub use completion::{record_completion, verify_completion};
pub use conformance::{conform, evaluate_conformance};
pub use holdpoint::{
    chase, release_by_token, release_internal, request_release, scan, schedule_inspection,
    view_by_token, witness_look_ahead, EvidenceEntry, IssuedRelease, ReleaseRequest, ScanReport,
    StaleHoldPoint, TokenView,
};
pub use progression::reevaluate;
pub use schedule::{adjust_to_working_hours, ScheduleAdjustment};
pub use snapshot::{assign_template, create_snapshot, resolve_items};

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Authoritative workflow failures, reported synchronously to the caller
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Lot '{0}' has no ITP assigned")]
    NoInstance(String),

    #[error("Lot '{0}' already has an ITP assigned")]
    AlreadyAssigned(String),

    #[error("Item '{0}' is not part of this lot's checklist")]
    ItemNotInChecklist(String),

    #[error("Completion '{0}' not found on this lot")]
    CompletionNotFound(String),

    #[error("Completion '{completion_id}' is not awaiting verification (status: {status})")]
    NotPendingVerification {
        completion_id: String,
        status: &'static str,
    },

    #[error("A rejection reason is required")]
    ReasonRequired,

    #[error("Releaser name is required")]
    NameRequired,

    #[error("Release link is not recognized")]
    TokenUnknown,

    #[error("Release link has expired")]
    TokenExpired,

    #[error("Release link has already been used")]
    TokenUsed,

    #[error("Hold point has already been released")]
    AlreadyReleased,

    #[error("Conformance prerequisites not met: {}", reasons.join("; "))]
    PrerequisitesNotMet { reasons: Vec<String> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run a best-effort side effect: log the failure, keep the primary action.
/// A notification outage must not block site inspection work.
pub fn advisory<T, E: Display>(label: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("Warning: {}: {}", label, e);
            None
        }
    }
}

// =============================================================================
// Collaborator seams
// =============================================================================

/// Notification dispatch collaborator. Fire-and-forget from the workflow's
/// point of view; callers wrap every dispatch in [`advisory`].
pub trait NotificationSink {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Read-only view of the external test-result store
pub trait TestResultSource {
    fn results_for_lot(&self, lot_id: &str) -> anyhow::Result<Vec<TestResultRecord>>;
}

/// Read-only view of the external NCR store
pub trait NcrSource {
    fn ncrs_for_lot(&self, lot_id: &str) -> anyhow::Result<Vec<NcrRecord>>;
}

/// Resolves actor ids to display names for message text
pub trait UserDirectory {
    fn display_name(&self, user_id: &str) -> String;
}

/// Default sink: appends notification records under `siteqa/notifications/`.
/// The persisted records double as the witness-point dedup source.
pub struct FileNotificationSink<'a> {
    store: &'a ProjectStore,
}

impl<'a> FileNotificationSink<'a> {
    pub fn new(store: &'a ProjectStore) -> Self {
        Self { store }
    }
}

impl NotificationSink for FileNotificationSink<'_> {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.store.save_notification(notification)?;
        Ok(())
    }
}

/// Default test-result source: reads `siteqa/test_results/<lot>.yaml`
pub struct FileTestResultSource<'a> {
    store: &'a ProjectStore,
}

impl<'a> FileTestResultSource<'a> {
    pub fn new(store: &'a ProjectStore) -> Self {
        Self { store }
    }
}

impl TestResultSource for FileTestResultSource<'_> {
    fn results_for_lot(&self, lot_id: &str) -> anyhow::Result<Vec<TestResultRecord>> {
        Ok(self.store.load_test_results(lot_id)?)
    }
}

/// Default NCR source: reads `siteqa/ncrs/<lot>.yaml`
pub struct FileNcrSource<'a> {
    store: &'a ProjectStore,
}

impl<'a> FileNcrSource<'a> {
    pub fn new(store: &'a ProjectStore) -> Self {
        Self { store }
    }
}

impl NcrSource for FileNcrSource<'_> {
    fn ncrs_for_lot(&self, lot_id: &str) -> anyhow::Result<Vec<NcrRecord>> {
        Ok(self.store.load_ncrs(lot_id)?)
    }
}

/// Default directory: `siteqa/users.yaml` map, raw id as fallback
pub struct FileUserDirectory<'a> {
    store: &'a ProjectStore,
}

impl<'a> FileUserDirectory<'a> {
    pub fn new(store: &'a ProjectStore) -> Self {
        Self { store }
    }
}

impl UserDirectory for FileUserDirectory<'_> {
    fn display_name(&self, user_id: &str) -> String {
        self.store
            .load_users()
            .ok()
            .and_then(|users| users.get(user_id).cloned())
            .unwrap_or_else(|| user_id.to_string())
    }
}
