//! Hold point CLI commands

use crate::models::ProjectConfig;
use crate::services::{
    self, FileNotificationSink, FileUserDirectory,
};
use crate::Result;
use chrono::{NaiveDateTime, Utc};
use clap::Subcommand;
use colored::Colorize;
use std::env;

#[derive(Subcommand)]
pub enum HoldPointCommands {
    /// Request release and issue single-use links to external recipients
    RequestRelease {
        /// Lot id or number
        lot: String,

        /// Checklist item sequence number
        sequence: u32,

        /// External recipient (repeatable)
        #[arg(short, long = "recipient", required = true)]
        recipients: Vec<String>,

        /// Acting user id (defaults to $USER)
        #[arg(long)]
        actor: Option<String>,
    },

    /// Record a manual follow-up on a point awaiting release
    Chase {
        /// Lot id or number
        lot: String,

        /// Checklist item sequence number
        sequence: u32,
    },

    /// Queue an inspection for a pre-set time
    Schedule {
        /// Lot id or number
        lot: String,

        /// Checklist item sequence number
        sequence: u32,

        /// Inspection time, "YYYY-MM-DD HH:MM" (UTC)
        when: String,
    },

    /// Release a hold point as a logged-in user
    Release {
        /// Lot id or number
        lot: String,

        /// Checklist item sequence number
        sequence: u32,

        /// Release notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Acting user id (defaults to $USER)
        #[arg(long)]
        actor: Option<String>,
    },
}

pub fn run(cmd: HoldPointCommands) -> Result<()> {
    let store = super::open_store()?;
    let config = ProjectConfig::load(&env::current_dir()?)?;
    let sink = FileNotificationSink::new(&store);

    match cmd {
        HoldPointCommands::RequestRelease {
            lot,
            sequence,
            recipients,
            actor,
        } => {
            let found = store.find_lot(&lot)?;
            let item = super::item_by_sequence(&store, &found, sequence)?;
            let actor = super::actor_id(actor);

            let issued = services::request_release(
                &store, &sink, &config, &lot, &item.id, &actor, &recipients,
            )?;

            println!(
                "{}",
                format!("✓ Release requested for '{}'", item.description).green()
            );
            for release in issued {
                println!("   {} → {}", release.recipient, release.link);
                println!(
                    "      expires {}",
                    release.expires_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
            println!("{}", "Links are single-use. Share them over a private channel.".yellow());
        }

        HoldPointCommands::Chase { lot, sequence } => {
            let found = store.find_lot(&lot)?;
            let item = super::item_by_sequence(&store, &found, sequence)?;

            let point = services::chase(&store, &lot, &item.id)?;
            println!(
                "{}",
                format!("✓ Chase recorded for '{}'", item.description).green()
            );
            println!("   Chase count: {}", point.chase_count);
        }

        HoldPointCommands::Schedule {
            lot,
            sequence,
            when,
        } => {
            let found = store.find_lot(&lot)?;
            let item = super::item_by_sequence(&store, &found, sequence)?;
            let inspection_at = NaiveDateTime::parse_from_str(&when, "%Y-%m-%d %H:%M")
                .map_err(|_| anyhow::anyhow!("Expected \"YYYY-MM-DD HH:MM\", got '{}'", when))?
                .and_utc();
            if inspection_at < Utc::now() {
                println!("{}", "Warning: scheduling an inspection in the past".yellow());
            }

            let (point, adjustment) = services::schedule_inspection(
                &store, &sink, &config, &lot, &item.id, inspection_at,
            )?;
            println!(
                "{}",
                format!("✓ Inspection scheduled for '{}'", point.item_description).green()
            );
            println!("   At: {}", inspection_at.format("%Y-%m-%d %H:%M UTC"));
            if adjustment.adjusted {
                println!(
                    "   Reminder moved to {} ({})",
                    adjustment.send_at.format("%Y-%m-%d %H:%M UTC"),
                    adjustment.reason.as_deref().unwrap_or("working hours")
                );
            }
        }

        HoldPointCommands::Release {
            lot,
            sequence,
            notes,
            actor,
        } => {
            let found = store.find_lot(&lot)?;
            let item = super::item_by_sequence(&store, &found, sequence)?;
            let directory = FileUserDirectory::new(&store);
            let actor = super::actor_id(actor);

            let point = services::release_internal(
                &store, &sink, &directory, &lot, &item.id, &actor, notes,
            )?;
            println!(
                "{}",
                format!("✓ Released '{}'", point.item_description).green().bold()
            );
            if let Some(release) = &point.release {
                println!("   By: {}", release.releaser_name);
            }
        }
    }

    Ok(())
}
