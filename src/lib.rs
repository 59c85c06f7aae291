// Siteqa - Construction Quality Workflow Engine
// Checklist-driven lot conformance tracking for civil works projects

pub mod cli;
pub mod models;
pub mod server;
pub mod services;
pub mod state;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use models::{ChecklistTemplate, HoldPoint, Lot, LotStatus, ProjectConfig};
pub use state::{ProjectStore, StoreError};
