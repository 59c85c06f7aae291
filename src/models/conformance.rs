//! Conformance prerequisite report types
//!
//! The conformance gate evaluates four independent checks and reports each
//! one separately, so an operator sees every blocking reason at once
//! instead of fixing them one at a time. Nothing here is persisted; the
//! report is computed on demand from source facts.

use serde::{Deserialize, Serialize};

/// A single prerequisite check with its own pass flag and detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prerequisite {
    /// Stable key (e.g. "itp_assigned")
    pub key: String,
    /// Human label for display
    pub label: String,
    pub passed: bool,
    /// Why it failed, or supporting detail when it passed
    #[serde(default)]
    pub detail: Option<String>,
}

impl Prerequisite {
    pub fn passed(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            passed: true,
            detail: None,
        }
    }

    pub fn failed(
        key: impl Into<String>,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Checklist completion arithmetic backing the "ITP complete" prerequisite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItpProgress {
    pub total_items: usize,
    pub completed_items: usize,
    /// Descriptions of items still outstanding
    pub outstanding: Vec<String>,
}

/// Result of evaluating every conformance prerequisite for a lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceReport {
    pub lot_id: String,
    pub prerequisites: Vec<Prerequisite>,
    /// Logical AND of every prerequisite
    pub can_conform: bool,
    /// One entry per failing prerequisite; always a list because more than
    /// one can fail at the same time
    pub blocking_reasons: Vec<String>,
    #[serde(default)]
    pub itp_progress: Option<ItpProgress>,
}

impl ConformanceReport {
    /// Assemble a report from individual checks
    pub fn new(
        lot_id: impl Into<String>,
        prerequisites: Vec<Prerequisite>,
        itp_progress: Option<ItpProgress>,
    ) -> Self {
        let can_conform = prerequisites.iter().all(|p| p.passed);
        let blocking_reasons = prerequisites
            .iter()
            .filter(|p| !p.passed)
            .map(|p| match &p.detail {
                Some(detail) => format!("{}: {}", p.label, detail),
                None => p.label.clone(),
            })
            .collect();
        Self {
            lot_id: lot_id.into(),
            prerequisites,
            can_conform,
            blocking_reasons,
            itp_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_passed_can_conform() {
        let report = ConformanceReport::new(
            "lot-1",
            vec![
                Prerequisite::passed("a", "A"),
                Prerequisite::passed("b", "B"),
            ],
            None,
        );
        assert!(report.can_conform);
        assert!(report.blocking_reasons.is_empty());
    }

    #[test]
    fn test_every_failure_is_reported() {
        let report = ConformanceReport::new(
            "lot-1",
            vec![
                Prerequisite::failed("a", "ITP complete", "3 of 5 items outstanding"),
                Prerequisite::passed("b", "Verified passing test result"),
                Prerequisite::failed("c", "No open NCRs", "NCR-002 is open"),
            ],
            None,
        );
        assert!(!report.can_conform);
        assert_eq!(report.blocking_reasons.len(), 2);
        assert!(report.blocking_reasons[0].contains("outstanding"));
        assert!(report.blocking_reasons[1].contains("NCR-002"));
    }
}
