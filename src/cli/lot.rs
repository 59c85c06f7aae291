//! Lot CLI commands

use crate::models::Lot;
use crate::Result;
use clap::Subcommand;
use colored::Colorize;

#[derive(Subcommand)]
pub enum LotCommands {
    /// Register a new lot
    Add {
        /// Human lot number (e.g. "LOT-014")
        number: String,

        /// Description of the work
        #[arg(short, long)]
        description: Option<String>,

        /// Chainage start in metres
        #[arg(long)]
        chainage_from: Option<f64>,

        /// Chainage end in metres
        #[arg(long)]
        chainage_to: Option<f64>,
    },
}

pub fn run(cmd: LotCommands) -> Result<()> {
    let store = super::open_store()?;

    match cmd {
        LotCommands::Add {
            number,
            description,
            chainage_from,
            chainage_to,
        } => {
            if store.find_lot(&number).is_ok() {
                anyhow::bail!("Lot '{}' already exists", number);
            }

            let mut lot = Lot::new(&number);
            lot.description = description;
            lot.chainage_from = chainage_from;
            lot.chainage_to = chainage_to;
            store.save_lot(&mut lot)?;

            println!("{}", format!("✓ Added lot {}", number).green());
            if let (Some(from), Some(to)) = (chainage_from, chainage_to) {
                println!("   Chainage: {:.0}m to {:.0}m", from, to);
            }
        }
    }

    Ok(())
}
