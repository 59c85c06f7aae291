use crate::models::VerifyDecision;
use crate::services::{verify_completion, FileNotificationSink};
use crate::Result;
use colored::Colorize;

pub fn run(
    lot: &str,
    completion_id: &str,
    reject: bool,
    reason: Option<String>,
    actor: Option<String>,
) -> Result<()> {
    let store = super::open_store()?;
    let sink = FileNotificationSink::new(&store);
    let actor = super::actor_id(actor);

    let decision = if reject {
        VerifyDecision::Reject
    } else {
        VerifyDecision::Accept
    };

    let completion = verify_completion(&store, &sink, lot, completion_id, &actor, decision, reason)?;

    if reject {
        println!("{}", "✗ Rejected submission".red());
        if let Some(reason) = &completion.rejection_reason {
            println!("   Reason: {}", reason);
        }
        println!("   The submitter has been notified and can resubmit.");
    } else {
        println!("{}", "✓ Verified and accepted".green());
    }

    let refreshed = store.find_lot(lot)?;
    println!("   Lot status: {}", refreshed.status.name());

    Ok(())
}
