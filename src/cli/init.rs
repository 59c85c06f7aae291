use crate::models::ProjectConfig;
use crate::state::ProjectStore;
use crate::Result;
use colored::Colorize;
use std::env;

pub async fn run(name: Option<&str>) -> Result<()> {
    let project_root = env::current_dir()?;
    let store = ProjectStore::new(&project_root);

    if store.is_initialized() {
        println!("{}", "Project is already initialized.".yellow());
        return Ok(());
    }

    store.init()?;

    let mut config = ProjectConfig::default();
    if let Some(name) = name {
        config.project_name = name.to_string();
    }
    config.save(&project_root)?;

    println!("{}", "✓ Initialized siteqa project".green());
    println!("   Data:   {}", project_root.join("siteqa").display());
    println!("   Config: {}", project_root.join("siteqa/config.toml").display());
    println!();
    println!("Next steps:");
    println!("   siteqa template add <file.yaml>");
    println!("   siteqa lot add <number>");
    println!("   siteqa assign <lot> <template>");

    Ok(())
}
