//! Centralized path definitions for the hub's configuration files.
//!
//! Functions accept `&Path` so they work for both the CLI and embedding hosts.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_ID: &str = "com.commandhub.app";

// ── Leaf filenames ───────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";
/// Written by `serve` so local hosts can find the HTTP bridge.
pub const API_PORT_FILE: &str = ".api-port";

// ── Config-dir functions (take app_config_dir) ───────────────────

pub fn settings_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(SETTINGS_FILE)
}

pub fn api_port_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(API_PORT_FILE)
}

/// `<OS config dir>/com.commandhub.app`, resolved from the environment.
pub fn default_config_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA").map_or_else(|_| PathBuf::from("."), PathBuf::from)
    } else if cfg!(target_os = "macos") {
        std::env::var("HOME").map_or_else(
            |_| PathBuf::from("."),
            |h| PathBuf::from(h).join("Library").join("Application Support"),
        )
    } else {
        std::env::var("XDG_CONFIG_HOME").map_or_else(
            |_| {
                std::env::var("HOME")
                    .map_or_else(|_| PathBuf::from("."), |h| PathBuf::from(h).join(".config"))
            },
            PathBuf::from,
        )
    };
    base.join(APP_ID)
}
