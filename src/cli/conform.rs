use crate::services::{conform, FileNcrSource, FileTestResultSource, WorkflowError};
use crate::Result;
use colored::Colorize;

pub fn run(lot: &str, actor: Option<String>) -> Result<()> {
    let store = super::open_store()?;
    let tests = FileTestResultSource::new(&store);
    let ncrs = FileNcrSource::new(&store);
    let actor = super::actor_id(actor);

    match conform(&store, &tests, &ncrs, lot, &actor) {
        Ok(lot) => {
            println!("{}", format!("🏁 Lot {} conformed", lot.number).green().bold());
            println!("   By: {}", actor);
            if let Some(at) = lot.conformed_at {
                println!("   At: {}", at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        Err(WorkflowError::PrerequisitesNotMet { reasons }) => {
            println!("{}", "✗ Cannot conform yet:".red().bold());
            for reason in reasons {
                println!("   • {}", reason);
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
