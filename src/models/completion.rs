//! Per-item completion records
//!
//! One Completion exists per (work instance, checklist item) pair that has
//! been acted upon. It is created on the first action and updated on every
//! later one; it is never deleted. The status machine:
//!
//! `(none) -> pending_verification -> {completed | rejected} ->
//! pending_verification (resubmission)`, or `(none) -> completed` directly
//! when no verification is required. Rejected and completed rows can be
//! resubmitted, which re-runs all downstream hooks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a completion record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    NotApplicable,
    /// Submitted by a subcontractor, waiting on head-contractor review
    PendingVerification,
    Rejected,
}

impl CompletionStatus {
    pub fn name(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::NotApplicable => "not_applicable",
            CompletionStatus::PendingVerification => "pending_verification",
            CompletionStatus::Rejected => "rejected",
        }
    }

    /// Whether this record counts as done for lot progression
    pub fn counts_as_complete(&self) -> bool {
        matches!(self, CompletionStatus::Completed | CompletionStatus::NotApplicable)
    }
}

/// Outcome submitted by the acting party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Completed,
    NotApplicable,
}

/// Head-contractor decision on a pending-verification completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyDecision {
    Accept,
    Reject,
}

/// A completion record for one checklist item on one work instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Checklist item this record belongs to (snapshot item id)
    pub item_id: String,

    pub status: CompletionStatus,

    /// Who submitted the most recent action
    pub actor_id: String,

    #[serde(default)]
    pub notes: Option<String>,

    /// Required when status is `rejected`
    #[serde(default)]
    pub rejection_reason: Option<String>,

    /// Who verified (accepted or rejected) the submission
    #[serde(default)]
    pub verified_by: Option<String>,

    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,

    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Completion {
    pub fn new(item_id: impl Into<String>, actor_id: impl Into<String>, status: CompletionStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.into(),
            status,
            actor_id: actor_id.into(),
            notes: None,
            rejection_reason: None,
            verified_by: None,
            verified_at: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// Re-enter the state machine with a fresh submission. Clears any
    /// previous verification outcome.
    pub fn resubmit(&mut self, actor_id: impl Into<String>, status: CompletionStatus, notes: Option<String>) {
        let now = Utc::now();
        self.actor_id = actor_id.into();
        self.status = status;
        self.notes = notes;
        self.rejection_reason = None;
        self.verified_by = None;
        self.verified_at = None;
        self.submitted_at = now;
        self.updated_at = now;
    }

    /// Accept a pending submission
    pub fn accept(&mut self, verifier_id: impl Into<String>) {
        let now = Utc::now();
        self.status = CompletionStatus::Completed;
        self.verified_by = Some(verifier_id.into());
        self.verified_at = Some(now);
        self.updated_at = now;
    }

    /// Reject a pending submission with a reason
    pub fn reject(&mut self, verifier_id: impl Into<String>, reason: impl Into<String>) {
        let now = Utc::now();
        self.status = CompletionStatus::Rejected;
        self.rejection_reason = Some(reason.into());
        self.verified_by = Some(verifier_id.into());
        self.verified_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_as_complete() {
        assert!(CompletionStatus::Completed.counts_as_complete());
        assert!(CompletionStatus::NotApplicable.counts_as_complete());
        assert!(!CompletionStatus::PendingVerification.counts_as_complete());
        assert!(!CompletionStatus::Rejected.counts_as_complete());
    }

    #[test]
    fn test_reject_then_resubmit_clears_verification() {
        let mut completion =
            Completion::new("item-1", "sub-crew", CompletionStatus::PendingVerification);
        completion.reject("engineer", "photo missing");
        assert_eq!(completion.status, CompletionStatus::Rejected);
        assert_eq!(completion.rejection_reason.as_deref(), Some("photo missing"));

        completion.resubmit("sub-crew", CompletionStatus::PendingVerification, None);
        assert_eq!(completion.status, CompletionStatus::PendingVerification);
        assert!(completion.rejection_reason.is_none());
        assert!(completion.verified_by.is_none());
    }

    #[test]
    fn test_accept_stamps_verifier() {
        let mut completion =
            Completion::new("item-1", "sub-crew", CompletionStatus::PendingVerification);
        completion.accept("engineer");
        assert_eq!(completion.status, CompletionStatus::Completed);
        assert_eq!(completion.verified_by.as_deref(), Some("engineer"));
        assert!(completion.verified_at.is_some());
    }
}
