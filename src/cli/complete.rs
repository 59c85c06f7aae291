use crate::models::{CompletionOutcome, CompletionStatus, ProjectConfig};
use crate::services::{record_completion, FileNotificationSink};
use crate::Result;
use colored::Colorize;
use std::env;

pub fn run(
    lot: &str,
    sequence: u32,
    not_applicable: bool,
    notes: Option<String>,
    actor: Option<String>,
) -> Result<()> {
    let store = super::open_store()?;
    let config = ProjectConfig::load(&env::current_dir()?)?;
    let sink = FileNotificationSink::new(&store);

    let found = store.find_lot(lot)?;
    let item = super::item_by_sequence(&store, &found, sequence)?;
    let actor = super::actor_id(actor);

    let outcome = if not_applicable {
        CompletionOutcome::NotApplicable
    } else {
        CompletionOutcome::Completed
    };

    let completion = record_completion(
        &store,
        &sink,
        &config,
        lot,
        &item.id,
        &actor,
        outcome,
        notes,
    )?;

    match completion.status {
        CompletionStatus::PendingVerification => {
            println!(
                "{}",
                format!("⏳ Submitted '{}' for verification", item.description).yellow()
            );
            println!("   Completion id: {}", completion.id);
        }
        CompletionStatus::NotApplicable => {
            println!(
                "{}",
                format!("✓ Marked '{}' not applicable", item.description).green()
            );
        }
        _ => {
            println!("{}", format!("✓ Completed '{}'", item.description).green());
        }
    }

    let refreshed = store.find_lot(lot)?;
    println!("   Lot status: {}", refreshed.status.name());

    Ok(())
}
