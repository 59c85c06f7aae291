use crate::services::{evaluate_conformance, FileNcrSource, FileTestResultSource};
use crate::Result;
use colored::Colorize;

pub fn run(lot: &str, json: bool) -> Result<()> {
    let store = super::open_store()?;
    let tests = FileTestResultSource::new(&store);
    let ncrs = FileNcrSource::new(&store);

    let report = evaluate_conformance(&store, &tests, &ncrs, lot)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", format!("Conformance check for {}", lot).cyan().bold());
    println!();
    for prerequisite in &report.prerequisites {
        if prerequisite.passed {
            println!("   {} {}", "✓".green(), prerequisite.label);
        } else {
            let detail = prerequisite.detail.as_deref().unwrap_or("failed");
            println!("   {} {}: {}", "✗".red(), prerequisite.label, detail);
        }
    }

    if let Some(progress) = &report.itp_progress {
        println!();
        println!(
            "   Checklist: {}/{} items complete",
            progress.completed_items, progress.total_items
        );
        for outstanding in &progress.outstanding {
            println!("      - {}", outstanding);
        }
    }

    println!();
    if report.can_conform {
        println!("{}", "Ready to conform. Run 'siteqa conform'.".green().bold());
    } else {
        println!(
            "{}",
            format!("{} prerequisite(s) blocking.", report.blocking_reasons.len()).red()
        );
    }

    Ok(())
}
