//! Detector configuration.
//!
//! Uses `figment` for layered configuration: defaults -> user config ->
//! workspace config -> environment.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Process-level settings. Everything that shapes a prediction lives in the
/// model bundle, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Path to the model bundle file.
    #[serde(default = "default_bundle_path")]
    pub bundle_path: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            bundle_path: default_bundle_path(),
        }
    }
}

fn default_bundle_path() -> PathBuf {
    PathBuf::from("models").join("model_bundle.json")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `FIRSAT_`)
/// 2. Workspace-local config (`.firsat/config.toml`)
/// 3. User config (`~/.config/firsat/config.toml`)
/// 4. Built-in defaults
pub fn load_config(workspace: Option<&Path>) -> Result<DetectorConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(DetectorConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "firsat", "firsat") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".firsat").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment = figment.merge(Env::prefixed("FIRSAT_"));

    figment.extract().map_err(Box::new)
}
