use crate::services;
use crate::Result;
use chrono::Utc;
use colored::Colorize;

pub fn run(json: bool) -> Result<()> {
    let store = super::open_store()?;
    let report = services::scan(&store, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "🔍 Scanning for stale work...".cyan());
    println!();

    if report.stale.is_empty() {
        println!("{}", "No stale hold points.".green());
    } else {
        println!("{}", format!("{} stale hold point(s):", report.stale.len()).red().bold());
        for stale in &report.stale {
            println!(
                "   {} {} {} on {}: \"{}\" ({}h overdue, chased {}x)",
                stale.severity.symbol(),
                stale.severity.name(),
                stale.point.status.name(),
                stale.lot_number,
                stale.point.item_description,
                stale.overdue_hours,
                stale.point.chase_count,
            );
        }
    }

    println!();
    if report.awaiting_test.is_empty() {
        println!("{}", "No lots waiting on test results.".green());
    } else {
        println!(
            "{}",
            format!("{} lot(s) awaiting test results:", report.awaiting_test.len()).yellow()
        );
        for lot in &report.awaiting_test {
            println!("   🧪 {}", lot.number);
        }
    }

    Ok(())
}
