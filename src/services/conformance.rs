//! Conformance gate
//!
//! The terminal quality transition. A lot may only be marked conformant
//! when four independent prerequisites hold at the moment of the attempt:
//! an ITP is assigned, its checklist is fully complete, a verified passing
//! test result exists, and no NCR against the lot is still open. The gate
//! re-derives every check from source facts rather than trusting the
//! cached lot status, so a lot showing `completed` in a list view can
//! still be refused here.

use chrono::Utc;

use crate::models::{
    ConformanceReport, ItpProgress, Lot, LotStatus, Prerequisite,
};
use crate::state::ProjectStore;

use super::{resolve_items, NcrSource, TestResultSource, WorkflowError, WorkflowResult};

/// Evaluate every conformance prerequisite for a lot without changing
/// anything. The report lists each check and every blocking reason.
pub fn evaluate_conformance(
    store: &ProjectStore,
    tests: &dyn TestResultSource,
    ncrs: &dyn NcrSource,
    lot_key: &str,
) -> WorkflowResult<ConformanceReport> {
    let lot = store.find_lot(lot_key)?;

    let mut prerequisites = Vec::new();
    let mut progress = None;

    match &lot.instance {
        Some(instance) => {
            prerequisites.push(Prerequisite::passed("itp_assigned", "ITP assigned"));

            let items = resolve_items(instance, store)?;
            let outstanding: Vec<String> = items
                .iter()
                .filter(|i| !instance.item_is_complete(&i.id))
                .map(|i| i.description.clone())
                .collect();
            let itp = ItpProgress {
                total_items: items.len(),
                completed_items: items.len() - outstanding.len(),
                outstanding: outstanding.clone(),
            };

            // An empty checklist can never be complete; the gate needs at
            // least one resolved item with a completion against it
            if items.is_empty() {
                prerequisites.push(Prerequisite::failed(
                    "itp_complete",
                    "ITP checklist complete",
                    "checklist has no items",
                ));
            } else if outstanding.is_empty() {
                prerequisites.push(Prerequisite::passed("itp_complete", "ITP checklist complete"));
            } else {
                prerequisites.push(Prerequisite::failed(
                    "itp_complete",
                    "ITP checklist complete",
                    format!(
                        "{} of {} items outstanding",
                        outstanding.len(),
                        items.len()
                    ),
                ));
            }
            progress = Some(itp);
        }
        None => {
            prerequisites.push(Prerequisite::failed(
                "itp_assigned",
                "ITP assigned",
                "no ITP has been assigned to this lot",
            ));
            prerequisites.push(Prerequisite::failed(
                "itp_complete",
                "ITP checklist complete",
                "no checklist to complete",
            ));
        }
    }

    prerequisites.push(test_result_check(tests, &lot));
    prerequisites.push(ncr_check(ncrs, &lot));

    Ok(ConformanceReport::new(lot.id, prerequisites, progress))
}

fn test_result_check(tests: &dyn TestResultSource, lot: &Lot) -> Prerequisite {
    let key = "test_result";
    let label = "Verified passing test result";
    match tests.results_for_lot(&lot.id) {
        Ok(results) => {
            if results.iter().any(|r| r.is_verified_pass()) {
                Prerequisite::passed(key, label)
            } else if results.is_empty() {
                Prerequisite::failed(key, label, "no test results recorded for this lot")
            } else {
                Prerequisite::failed(
                    key,
                    label,
                    "no recorded result is both passing and verified",
                )
            }
        }
        // An unreachable source cannot prove the prerequisite; fail closed
        Err(e) => Prerequisite::failed(key, label, format!("test result source unavailable: {}", e)),
    }
}

fn ncr_check(ncrs: &dyn NcrSource, lot: &Lot) -> Prerequisite {
    let key = "no_open_ncrs";
    let label = "No open NCRs";
    match ncrs.ncrs_for_lot(&lot.id) {
        Ok(records) => {
            let open: Vec<&str> = records
                .iter()
                .filter(|n| !n.status.is_closed())
                .map(|n| n.number.as_str())
                .collect();
            if open.is_empty() {
                Prerequisite::passed(key, label)
            } else {
                Prerequisite::failed(key, label, format!("{} still open", open.join(", ")))
            }
        }
        Err(e) => Prerequisite::failed(key, label, format!("NCR source unavailable: {}", e)),
    }
}

/// Attempt the terminal transition. Re-evaluates the full gate and either
/// marks the lot conformant with attribution or refuses with every
/// blocking reason.
pub fn conform(
    store: &ProjectStore,
    tests: &dyn TestResultSource,
    ncrs: &dyn NcrSource,
    lot_key: &str,
    actor_id: &str,
) -> WorkflowResult<Lot> {
    let report = evaluate_conformance(store, tests, ncrs, lot_key)?;
    if !report.can_conform {
        return Err(WorkflowError::PrerequisitesNotMet {
            reasons: report.blocking_reasons,
        });
    }

    let mut lot = store.find_lot(lot_key)?;
    lot.set_status(LotStatus::Conformed);
    lot.conformed_by = Some(actor_id.to_string());
    lot.conformed_at = Some(Utc::now());
    store.save_lot(&mut lot)?;
    Ok(lot)
}
