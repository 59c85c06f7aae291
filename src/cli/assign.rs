use crate::services::assign_template;
use crate::Result;
use colored::Colorize;

pub fn run(lot: &str, template: &str, no_verification: bool) -> Result<()> {
    let store = super::open_store()?;
    let found = super::template::find_template(&store, template)?;

    let lot = assign_template(&store, lot, &found.id, !no_verification)?;
    let instance = lot
        .instance
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("assignment did not create a work instance"))?;
    let item_count = instance
        .snapshot
        .as_ref()
        .map(|s| s.item_count())
        .unwrap_or(0);

    println!(
        "{}",
        format!("✓ Assigned '{}' to {}", found.name, lot.number).green()
    );
    println!("   Snapshot: {} items frozen", item_count);
    if no_verification {
        println!("   Subcontractor completions will not require verification");
    }

    Ok(())
}
