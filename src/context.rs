//! The read-only ambient state every predicate and action receives.
//!
//! Nothing here is owned by the dispatch core. [`crate::state::AppState`]
//! assembles a fresh `CommandContext` for each dispatch or listing, so the
//! outcome of a dispatch is a function of the registry, the context, and the id.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::editor::Editor;
use crate::workbench::{HostWindow, Workbench};

// ── Database ────────────────────────────────────────────────────

/// Storage model an engine supports; drives which `new.*` commands apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    Sql,
    Document,
    KeyValue,
}

impl std::str::FromStr for EngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "document" => Ok(Self::Document),
            "keyvalue" | "key-value" => Ok(Self::KeyValue),
            other => Err(format!("Unknown engine type \"{other}\"")),
        }
    }
}

/// The currently selected database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseRef {
    pub connection_id: String,
    pub name: String,
    pub engine_types: Vec<EngineType>,
}

impl DatabaseRef {
    pub fn supports(&self, engine_type: EngineType) -> bool {
        self.engine_types.contains(&engine_type)
    }
}

// ── Config / permissions ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Hosted "portal" mode: connections are preconfigured and cannot be added.
    pub run_as_portal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    pub fn has(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ── Extensions ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeInfo {
    pub name: String,
    pub class_name: String,
}

/// Installed extensions. Changes at runtime, which is why sub-commands are
/// recomputed on every query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extensions {
    pub themes: Vec<ThemeInfo>,
    pub default_file_format: Option<String>,
}

// ── CommandContext ──────────────────────────────────────────────

#[derive(Clone)]
pub struct CommandContext {
    pub editor: Option<Arc<dyn Editor>>,
    pub database: Option<DatabaseRef>,
    pub config: RuntimeConfig,
    pub permissions: Permissions,
    pub toolbar_visible: bool,
    pub extensions: Arc<Extensions>,
    /// Present only inside a desktop host.
    pub host: Option<Arc<dyn HostWindow>>,
    pub workbench: Arc<dyn Workbench>,
}

impl CommandContext {
    pub fn new(workbench: Arc<dyn Workbench>) -> Self {
        Self {
            editor: None,
            database: None,
            config: RuntimeConfig::default(),
            permissions: Permissions::default(),
            toolbar_visible: true,
            extensions: Arc::new(Extensions::default()),
            host: None,
            workbench,
        }
    }

    pub fn with_editor(mut self, editor: Arc<dyn Editor>) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn without_editor(mut self) -> Self {
        self.editor = None;
        self
    }

    pub fn with_database(mut self, database: DatabaseRef) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_toolbar_visible(mut self, visible: bool) -> Self {
        self.toolbar_visible = visible;
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = Arc::new(extensions);
        self
    }

    pub fn with_themes(mut self, themes: Vec<ThemeInfo>) -> Self {
        let mut extensions = (*self.extensions).clone();
        extensions.themes = themes;
        self.extensions = Arc::new(extensions);
        self
    }

    pub fn with_host(mut self, host: Arc<dyn HostWindow>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn is_desktop(&self) -> bool {
        self.host.is_some()
    }

    pub fn database_supports(&self, engine_type: EngineType) -> bool {
        self.database.as_ref().is_some_and(|db| db.supports(engine_type))
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("editor", &self.editor.as_ref().map(|e| e.kind().to_string()))
            .field("database", &self.database)
            .field("config", &self.config)
            .field("permissions", &self.permissions)
            .field("toolbar_visible", &self.toolbar_visible)
            .field("desktop", &self.is_desktop())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn test_engine_support() {
        let ctx = demo::context();
        assert!(!ctx.database_supports(EngineType::Sql));

        let ctx = ctx.with_database(demo::database(&[EngineType::Sql]));
        assert!(ctx.database_supports(EngineType::Sql));
        assert!(!ctx.database_supports(EngineType::Document));
    }

    #[test]
    fn test_permissions_and_engine_parsing() {
        let perms: Permissions = ["settings/change"].into_iter().collect();
        assert!(perms.has("settings/change"));
        assert!(!perms.has("admin"));

        let ctx = demo::context().with_permissions(perms);
        assert!(ctx.permissions.has("settings/change"));

        assert_eq!("Key-Value".parse::<EngineType>().unwrap(), EngineType::KeyValue);
        assert!("graph".parse::<EngineType>().is_err());
    }
}
