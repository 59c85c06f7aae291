use crate::models::LotStatus;
use crate::Result;
use colored::Colorize;

pub fn run(json: bool) -> Result<()> {
    let store = super::open_store()?;
    let lots = store.list_lots()?;

    if json {
        let rows: Vec<serde_json::Value> = lots
            .iter()
            .map(|lot| {
                serde_json::json!({
                    "number": lot.number,
                    "status": lot.status.name(),
                    "description": lot.description,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if lots.is_empty() {
        println!("{}", "No lots yet. Run 'siteqa lot add <number>'.".yellow());
        return Ok(());
    }

    println!("{}", "Lots:".green().bold());
    for lot in lots {
        let status = match lot.status {
            LotStatus::NotStarted => lot.status.name().bright_black(),
            LotStatus::InProgress => lot.status.name().blue(),
            LotStatus::AwaitingTest => lot.status.name().yellow(),
            LotStatus::Completed => lot.status.name().green(),
            LotStatus::Conformed => lot.status.name().green().bold(),
            LotStatus::Claimed => lot.status.name().cyan(),
            LotStatus::NcrRaised => lot.status.name().red(),
        };
        let description = lot.description.as_deref().unwrap_or("");
        println!("   • {:<12} {:<14} {}", lot.number, status, description);
    }

    Ok(())
}
