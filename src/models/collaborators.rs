//! Record shapes for external collaborators
//!
//! Test results, NCRs and the user directory have their own lifecycles
//! outside this engine; the workflow only reads their terminal state. The
//! notification record is what the dispatch sink receives, and doubles as
//! the dedup source for witness-point look-ahead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pass/fail outcome of an externally-recorded lab test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Pass,
    Fail,
}

/// Verification state of a test result in the external store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestVerification {
    Unverified,
    Verified,
}

/// A lab test result linked to a lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultRecord {
    pub id: String,
    pub lot_id: String,
    #[serde(default)]
    pub test_type: Option<String>,
    pub outcome: TestOutcome,
    pub verification: TestVerification,
    pub recorded_at: DateTime<Utc>,
}

impl TestResultRecord {
    pub fn new(lot_id: impl Into<String>, outcome: TestOutcome, verification: TestVerification) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lot_id: lot_id.into(),
            test_type: None,
            outcome,
            verification,
            recorded_at: Utc::now(),
        }
    }

    /// Whether this result satisfies the conformance gate
    pub fn is_verified_pass(&self) -> bool {
        self.outcome == TestOutcome::Pass && self.verification == TestVerification::Verified
    }
}

/// Non-conformance report status in the external store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NcrStatus {
    Open,
    InReview,
    Closed,
    /// Closed by accepting the non-conformance under concession
    ClosedConcession,
}

impl NcrStatus {
    /// Statuses that no longer block conformance
    pub fn is_closed(&self) -> bool {
        matches!(self, NcrStatus::Closed | NcrStatus::ClosedConcession)
    }
}

/// A non-conformance report linked to a lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NcrRecord {
    pub id: String,
    /// Human NCR number (e.g. "NCR-012")
    pub number: String,
    pub lot_id: String,
    pub status: NcrStatus,
    #[serde(default)]
    pub description: Option<String>,
    pub raised_at: DateTime<Utc>,
}

impl NcrRecord {
    pub fn new(number: impl Into<String>, lot_id: impl Into<String>, status: NcrStatus) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            number: number.into(),
            lot_id: lot_id.into(),
            status,
            description: None,
            raised_at: Utc::now(),
        }
    }
}

/// Kind of internal notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    WitnessUpcoming,
    HoldReleaseRequested,
    HoldReleased,
    CompletionRejected,
}

/// A message handed to the notification dispatch collaborator.
/// Fire-and-forget: dispatch failures never abort the triggering step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Entity this notification refers to (witness item id, hold point id);
    /// used to suppress duplicate witness notifications
    #[serde(default)]
    pub reference: Option<String>,
    /// Cleared notifications no longer suppress duplicates
    #[serde(default)]
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
            reference: None,
            consumed: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_pass() {
        let result = TestResultRecord::new("lot-1", TestOutcome::Pass, TestVerification::Verified);
        assert!(result.is_verified_pass());

        let unverified =
            TestResultRecord::new("lot-1", TestOutcome::Pass, TestVerification::Unverified);
        assert!(!unverified.is_verified_pass());

        let failed = TestResultRecord::new("lot-1", TestOutcome::Fail, TestVerification::Verified);
        assert!(!failed.is_verified_pass());
    }

    #[test]
    fn test_ncr_closed_set() {
        assert!(NcrStatus::Closed.is_closed());
        assert!(NcrStatus::ClosedConcession.is_closed());
        assert!(!NcrStatus::Open.is_closed());
        assert!(!NcrStatus::InReview.is_closed());
    }
}
