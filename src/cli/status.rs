use crate::models::{CompletionStatus, LotStatus, PointType};
use crate::services::resolve_items;
use crate::Result;
use colored::Colorize;

pub fn run(lot: &str, json: bool) -> Result<()> {
    let store = super::open_store()?;
    let found = store.find_lot(lot)?;

    if json {
        let items: Vec<serde_json::Value> = match &found.instance {
            Some(instance) => resolve_items(instance, &store)?
                .iter()
                .map(|item| {
                    let completion = instance.completion_for_item(&item.id);
                    serde_json::json!({
                        "sequence": item.sequence,
                        "description": item.description,
                        "point_type": item.point_type.name(),
                        "status": completion.map(|c| c.status.name()),
                        "completion_id": completion.map(|c| c.id.clone()),
                    })
                })
                .collect(),
            None => Vec::new(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "number": found.number,
                "status": found.status.name(),
                "conformed_by": found.conformed_by,
                "items": items,
            }))?
        );
        return Ok(());
    }

    println!("{}", format!("Lot {}", found.number).cyan().bold());
    if let Some(description) = &found.description {
        println!("   {}", description);
    }

    let status_icon = match found.status {
        LotStatus::NotStarted => "⚪",
        LotStatus::InProgress => "🔵",
        LotStatus::AwaitingTest => "🧪",
        LotStatus::Completed => "✅",
        LotStatus::Conformed => "🏁",
        LotStatus::Claimed => "💰",
        LotStatus::NcrRaised => "⛔",
    };
    println!("   Status: {} {}", status_icon, found.status.name());
    if let Some(by) = &found.conformed_by {
        println!("   Conformed by: {}", by);
    }

    let Some(instance) = &found.instance else {
        println!("\n{}", "No ITP assigned. Run 'siteqa assign'.".yellow());
        return Ok(());
    };

    println!();
    for item in resolve_items(instance, &store)? {
        let mark = match instance.completion_for_item(&item.id).map(|c| c.status) {
            Some(CompletionStatus::Completed) => "✓".green().to_string(),
            Some(CompletionStatus::NotApplicable) => "-".green().to_string(),
            Some(CompletionStatus::PendingVerification) => "?".yellow().to_string(),
            Some(CompletionStatus::Rejected) => "✗".red().to_string(),
            None => " ".to_string(),
        };
        let point = match item.point_type {
            PointType::Hold => " [HOLD]".red().bold().to_string(),
            PointType::Witness => " [WITNESS]".yellow().to_string(),
            PointType::Standard => String::new(),
        };
        println!("   [{}] {:>3}. {}{}", mark, item.sequence, item.description, point);
    }

    Ok(())
}
