//! Project configuration
//!
//! Loaded from `<project>/siteqa/config.toml`. Missing file means defaults;
//! every field has a default so partial configs stay valid.

use std::path::Path;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Witness-point look-ahead window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookAhead {
    /// Only the very next item triggers advance notice
    Next,
    /// The next two items trigger advance notice
    TwoAhead,
}

impl LookAhead {
    /// Number of upcoming items inspected after each completion
    pub fn window(&self) -> u32 {
        match self {
            LookAhead::Next => 1,
            LookAhead::TwoAhead => 2,
        }
    }
}

/// Site working hours and working days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHoursConfig {
    /// Start of the working day, "HH:MM"
    #[serde(default = "default_start")]
    pub start: String,

    /// End of the working day, "HH:MM"
    #[serde(default = "default_end")]
    pub end: String,

    /// Working days, lowercase three-letter names
    #[serde(default = "default_days")]
    pub days: Vec<String>,
}

fn default_start() -> String {
    "07:00".to_string()
}

fn default_end() -> String {
    "17:00".to_string()
}

fn default_days() -> Vec<String> {
    ["mon", "tue", "wed", "thu", "fri"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

impl Default for WorkingHoursConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            days: default_days(),
        }
    }
}

impl WorkingHoursConfig {
    pub fn start_time(&self) -> NaiveTime {
        parse_time(&self.start).unwrap_or_else(|| NaiveTime::from_hms_opt(7, 0, 0).unwrap())
    }

    pub fn end_time(&self) -> NaiveTime {
        parse_time(&self.end).unwrap_or_else(|| NaiveTime::from_hms_opt(17, 0, 0).unwrap())
    }

    pub fn is_working_day(&self, weekday: Weekday) -> bool {
        self.days.iter().any(|d| day_from_str(d) == Some(weekday))
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

fn day_from_str(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name for messages
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default)]
    pub working_hours: WorkingHoursConfig,

    /// How far ahead completions look for upcoming witness points
    #[serde(default = "default_look_ahead")]
    pub witness_look_ahead: LookAhead,

    /// User ids notified about upcoming witness points (project managers,
    /// superintendents)
    #[serde(default)]
    pub witness_recipients: Vec<String>,

    /// Release token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    /// Public release server port
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Base URL used when building release links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_project_name() -> String {
    "Unnamed Project".to_string()
}

fn default_look_ahead() -> LookAhead {
    LookAhead::Next
}

fn default_token_ttl_hours() -> i64 {
    48
}

fn default_server_port() -> u16 {
    4780
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:4780".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            working_hours: WorkingHoursConfig::default(),
            witness_look_ahead: default_look_ahead(),
            witness_recipients: Vec::new(),
            token_ttl_hours: default_token_ttl_hours(),
            server_port: default_server_port(),
            public_base_url: default_public_base_url(),
        }
    }
}

impl ProjectConfig {
    /// Load config from `<project>/siteqa/config.toml`, defaults if absent
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let config_path = project_root.join("siteqa/config.toml");
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: ProjectConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to `<project>/siteqa/config.toml`
    pub fn save(&self, project_root: &Path) -> anyhow::Result<()> {
        let config_path = project_root.join("siteqa/config.toml");
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.working_hours.start, "07:00");
        assert_eq!(config.working_hours.end, "17:00");
        assert_eq!(config.witness_look_ahead, LookAhead::Next);
        assert_eq!(config.token_ttl_hours, 48);
        assert!(config.working_hours.is_working_day(Weekday::Mon));
        assert!(!config.working_hours.is_working_day(Weekday::Sat));
    }

    #[test]
    fn test_load_missing_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::load(temp.path()).unwrap();
        assert_eq!(config.token_ttl_hours, 48);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();

        let mut config = ProjectConfig::default();
        config.project_name = "Ring Road Stage 2".to_string();
        config.witness_look_ahead = LookAhead::TwoAhead;
        config.working_hours.days.push("sat".to_string());
        config.save(temp.path()).unwrap();

        let loaded = ProjectConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.project_name, "Ring Road Stage 2");
        assert_eq!(loaded.witness_look_ahead, LookAhead::TwoAhead);
        assert!(loaded.working_hours.is_working_day(Weekday::Sat));
    }

    #[test]
    fn test_partial_config_uses_field_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("siteqa")).unwrap();
        std::fs::write(
            temp.path().join("siteqa/config.toml"),
            "project_name = \"Bypass\"\n",
        )
        .unwrap();

        let config = ProjectConfig::load(temp.path()).unwrap();
        assert_eq!(config.project_name, "Bypass");
        assert_eq!(config.server_port, 4780);
        assert_eq!(config.working_hours.days.len(), 5);
    }
}
