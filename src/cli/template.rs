//! Template CLI commands

use crate::models::{ChecklistItem, ChecklistTemplate, PointType, ResponsibleParty};
use crate::Result;
use clap::Subcommand;
use colored::Colorize;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Load a checklist template from an authored YAML file
    Add {
        /// Path to the template YAML
        file: PathBuf,
    },

    /// List all templates
    List,

    /// Show one template with its items
    Show {
        /// Template id or name
        template: String,
    },
}

/// Authoring format for `template add`. Ids and timestamps are generated
/// on import; authors only write the content.
#[derive(Debug, Deserialize)]
struct TemplateFile {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    activity_type: Option<String>,
    items: Vec<TemplateItemFile>,
}

#[derive(Debug, Deserialize)]
struct TemplateItemFile {
    sequence: u32,
    description: String,
    #[serde(default)]
    point_type: Option<String>,
    #[serde(default)]
    responsible_party: Option<String>,
    #[serde(default)]
    evidence_requirement: Option<String>,
    #[serde(default)]
    acceptance_criteria: Option<String>,
    #[serde(default)]
    test_type: Option<String>,
}

pub fn run(cmd: TemplateCommands) -> Result<()> {
    let store = super::open_store()?;

    match cmd {
        TemplateCommands::Add { file } => {
            let content = std::fs::read_to_string(&file)?;
            let authored: TemplateFile = serde_yaml::from_str(&content)?;
            let template = build_template(authored)?;
            store.save_template(&template)?;

            println!(
                "{}",
                format!("✓ Added template '{}' ({} items)", template.name, template.items.len())
                    .green()
            );
            println!("   Id: {}", template.id);
        }

        TemplateCommands::List => {
            let templates = store.list_templates()?;
            if templates.is_empty() {
                println!("{}", "No templates yet. Run 'siteqa template add <file>'.".yellow());
                return Ok(());
            }
            println!("{}", "Templates:".green().bold());
            for template in templates {
                println!(
                    "   • {} ({} items)  {}",
                    template.name,
                    template.items.len(),
                    template.id.bright_black()
                );
            }
        }

        TemplateCommands::Show { template } => {
            let found = find_template(&store, &template)?;
            println!("{}", found.name.cyan().bold());
            if let Some(description) = &found.description {
                println!("   {}", description);
            }
            if let Some(activity) = &found.activity_type {
                println!("   Activity: {}", activity);
            }
            println!();
            for item in found.ordered_items() {
                let marker = match item.point_type {
                    PointType::Hold => "H".red().bold().to_string(),
                    PointType::Witness => "W".yellow().bold().to_string(),
                    PointType::Standard => " ".to_string(),
                };
                println!(
                    "   {:>3}. [{}] {} ({})",
                    item.sequence,
                    marker,
                    item.description,
                    item.responsible_party.name()
                );
            }
        }
    }

    Ok(())
}

fn build_template(authored: TemplateFile) -> Result<ChecklistTemplate> {
    let mut template = ChecklistTemplate::new(authored.name);
    template.description = authored.description;
    template.activity_type = authored.activity_type;

    for entry in authored.items {
        let mut item = ChecklistItem::new(entry.sequence, entry.description);
        if let Some(point_type) = entry.point_type {
            item.point_type = PointType::from_str(&point_type)
                .ok_or_else(|| anyhow::anyhow!("Unknown point type '{}'", point_type))?;
        }
        if let Some(party) = entry.responsible_party {
            item.responsible_party = ResponsibleParty::from_str(&party)
                .ok_or_else(|| anyhow::anyhow!("Unknown responsible party '{}'", party))?;
        }
        item.evidence_requirement = entry.evidence_requirement;
        item.acceptance_criteria = entry.acceptance_criteria;
        item.test_type = entry.test_type;
        template.add_item(item);
    }

    if template.items.is_empty() {
        anyhow::bail!("Template '{}' has no items", template.name);
    }
    Ok(template)
}

/// Resolve a template by id or name
pub(crate) fn find_template(
    store: &crate::state::ProjectStore,
    key: &str,
) -> Result<ChecklistTemplate> {
    if let Ok(template) = store.load_template(key) {
        return Ok(template);
    }
    store
        .list_templates()?
        .into_iter()
        .find(|t| t.name == key)
        .ok_or_else(|| anyhow::anyhow!("Template '{}' not found", key))
}
