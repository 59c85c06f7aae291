//! CLI command implementations
//!
//! One file per subcommand. Commands open the store for the current
//! directory, call into the service layer and render colored output;
//! anything with a `--json` flag prints machine-readable output instead.

pub mod assign;
pub mod complete;
pub mod conform;
pub mod conformance;
pub mod holdpoint;
pub mod init;
pub mod list;
pub mod lot;
pub mod scan;
pub mod serve;
pub mod status;
pub mod template;
pub mod verify;

use std::env;

use crate::models::{ChecklistItem, Lot};
use crate::services::resolve_items;
use crate::state::ProjectStore;
use crate::Result;

/// Open the store for the current directory; fails when the project has
/// not been initialized
pub(crate) fn open_store() -> Result<ProjectStore> {
    let root = env::current_dir()?;
    let store = ProjectStore::new(&root);
    if !store.is_initialized() {
        anyhow::bail!("No siteqa project in this directory. Run 'siteqa init' first.");
    }
    Ok(store)
}

/// Resolve the acting user id: explicit flag wins, then $USER
pub(crate) fn actor_id(actor: Option<String>) -> String {
    actor
        .or_else(|| env::var("USER").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Look an item up by its checklist sequence number on a lot
pub(crate) fn item_by_sequence(
    store: &ProjectStore,
    lot: &Lot,
    sequence: u32,
) -> Result<ChecklistItem> {
    let instance = lot
        .instance
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Lot '{}' has no ITP assigned", lot.number))?;
    resolve_items(instance, store)?
        .into_iter()
        .find(|i| i.sequence == sequence)
        .ok_or_else(|| {
            anyhow::anyhow!("No item with sequence {} on lot '{}'", sequence, lot.number)
        })
}
