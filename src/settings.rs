use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::Permissions;
use crate::error::AppError;
use crate::persist::{read_json, write_json};

/// Permission that unlocks the `settings.*` commands.
pub const SETTINGS_CHANGE: &str = "settings/change";

const SETTINGS_VERSION: u32 = 1;

// ── Hub settings ─────────────────────────────────────────────────

/// Application-level settings stored in the OS config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-export", ts(export))]
pub struct HubSettings {
    pub version: u32,
    #[serde(default = "default_true")]
    pub toolbar_visible: bool,
    #[serde(default = "default_permissions")]
    pub permissions: Vec<String>,
    /// Hosted mode: connections are preconfigured.
    #[serde(default)]
    pub run_as_portal: bool,
    /// `tracing` filter directive, e.g. `"command_hub=debug"`. `RUST_LOG` wins.
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Fixed port for the HTTP bridge. None = pick a free port.
    #[serde(default)]
    pub api_port: Option<u16>,
}

fn default_true() -> bool {
    true
}

fn default_permissions() -> Vec<String> {
    vec![SETTINGS_CHANGE.to_string()]
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            toolbar_visible: true,
            permissions: default_permissions(),
            run_as_portal: false,
            log_filter: None,
            api_port: None,
        }
    }
}

impl HubSettings {
    pub fn permission_set(&self) -> Permissions {
        self.permissions.iter().cloned().collect()
    }
}

/// Load settings from the app config directory. Returns None if no settings file exists.
pub fn load_settings(app_config_dir: &Path) -> Result<Option<HubSettings>, AppError> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return Ok(None);
    }
    read_json(&path).map(Some)
}

/// Load settings, falling back to defaults when the file is missing.
pub fn load_or_default(app_config_dir: &Path) -> Result<HubSettings, AppError> {
    Ok(load_settings(app_config_dir)?.unwrap_or_default())
}

/// Save settings to the app config directory.
pub fn save_settings(app_config_dir: &Path, settings: &HubSettings) -> Result<(), AppError> {
    std::fs::create_dir_all(app_config_dir).map_err(|e| AppError::Settings {
        message: e.to_string(),
    })?;
    write_json(&crate::paths::settings_path(app_config_dir), settings).map_err(|e| {
        AppError::Settings {
            message: e.to_string(),
        }
    })
}
