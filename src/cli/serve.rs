use crate::models::ProjectConfig;
use crate::server;
use crate::Result;
use colored::Colorize;
use std::env;

pub async fn run(port: Option<u16>) -> Result<()> {
    let project_root = env::current_dir()?;
    super::open_store()?;

    let config = ProjectConfig::load(&project_root)?;
    let port = port.unwrap_or(config.server_port);

    println!("{}", "🚀 Starting release server...".cyan());
    println!("   Project: {}", config.project_name);
    server::start_server(project_root, port).await
}
