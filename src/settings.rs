//! CLI settings.
//!
//! Loaded from an optional JSON file; flags and environment variables are
//! applied on top by `main`.

use std::path::Path;

use anyhow::{Context, Result};
use nodeforge_orchestrator::OrchestratorConfig;
use nodeforge_processor::{LlmConfig, MediaConfig};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DATABASE_FILE: &str = "nodeforge.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Recorded as the acting user of stored runs.
  pub user_id: String,
  pub orchestrator: OrchestratorConfig,
  pub llm: LlmConfig,
  pub media: MediaConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      user_id: "local".to_string(),
      orchestrator: OrchestratorConfig::default(),
      llm: LlmConfig::default(),
      media: MediaConfig::default(),
    }
  }
}

impl Settings {
  /// Load settings from `explicit`, or from `data_dir/settings.json` when it
  /// exists, or fall back to defaults.
  pub fn load(explicit: Option<&Path>, data_dir: &Path) -> Result<Self> {
    let default_path = data_dir.join(SETTINGS_FILE);
    let path = match explicit {
      Some(path) => path,
      None if default_path.exists() => default_path.as_path(),
      None => return Ok(Self::default()),
    };

    let content = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read settings file: {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse settings file: {}", path.display()))
  }
}
