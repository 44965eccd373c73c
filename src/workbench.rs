//! Collaborators that commands drive but that live outside the dispatch core:
//! the UI shell (modals, tabs, notifications, backend API) and the optional
//! desktop host window.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::ActionFuture;
use crate::editor::{Editor, SaveMode, SaveTarget};
use crate::error::AppError;

// ── Modals ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "modal", rename_all = "camelCase")]
pub enum Modal {
    Connection,
    About,
    #[serde(rename_all = "camelCase")]
    Settings {
        selected_tab: Option<usize>,
    },
    #[serde(rename_all = "camelCase")]
    AddDbKey {
        connection_id: String,
        database: String,
    },
    #[serde(rename_all = "camelCase")]
    ImportExport {
        import_to_current_target: bool,
        source_storage_type: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SqlGenerator {
        connection_id: String,
        database: String,
    },
}

/// A single-line text prompt. The workbench resolves it with the entered value,
/// or `None` when the user cancels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPrompt {
    pub header: String,
    pub label: String,
    pub value: String,
}

impl TextPrompt {
    pub fn new(header: &str, label: &str, value: &str) -> Self {
        Self {
            header: header.to_string(),
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

// ── Tabs ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSpec {
    pub title: String,
    pub icon: String,
    pub tab_component: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub props: Value,
    /// Initial editor content, if the tab starts with a document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<Value>,
    pub force_new_tab: bool,
}

impl TabSpec {
    pub fn new(title: &str, icon: &str, tab_component: &str) -> Self {
        Self {
            title: title.to_string(),
            icon: icon.to_string(),
            tab_component: tab_component.to_string(),
            props: Value::Null,
            editor: None,
            force_new_tab: false,
        }
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    pub fn with_editor(mut self, editor: Value) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn force_new_tab(mut self) -> Self {
        self.force_new_tab = true;
        self
    }
}

// ── Backend API ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiCall {
    pub route: String,
    pub body: Value,
}

impl ApiCall {
    pub fn new(route: &str, body: Value) -> Self {
        Self {
            route: route.to_string(),
            body,
        }
    }
}

// ── Host window ──────────────────────────────────────────────────

/// Window-level requests understood by the desktop host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowAction {
    #[serde(rename = "minimize")]
    Minimize,
    #[serde(rename = "fullscreen-on")]
    FullscreenOn,
    #[serde(rename = "fullscreen-off")]
    FullscreenOff,
    #[serde(rename = "devtools")]
    DevTools,
    #[serde(rename = "reload")]
    Reload,
    #[serde(rename = "zoomin")]
    ZoomIn,
    #[serde(rename = "zoomout")]
    ZoomOut,
    #[serde(rename = "zoomreset")]
    ZoomReset,
}

/// The desktop host process. Absent when running in a browser.
pub trait HostWindow: Send + Sync {
    fn window_action(&self, action: WindowAction);

    fn close_window(&self);

    /// Show the native open-file dialog and open the chosen files.
    fn open_file(&self) -> ActionFuture;

    /// Show the native folder picker and open it as an archive/model folder.
    fn open_archive_folder(&self) -> ActionFuture;
}

/// The UI shell that commands act upon.
pub trait Workbench: Send + Sync {
    fn show_modal(&self, modal: Modal);

    fn prompt_text(&self, prompt: TextPrompt) -> BoxFuture<'static, Option<String>>;

    fn open_tab(&self, tab: TabSpec);

    fn set_toolbar_visible(&self, visible: bool);

    fn set_theme(&self, theme_class: &str);

    fn open_web_link(&self, url: &str);

    fn remove_local_storage(&self, key: &str);

    fn notify_success(&self, message: &str);

    fn api_call(&self, call: ApiCall) -> BoxFuture<'static, Result<Value, AppError>>;

    /// Make `connection` / `database` the current database selection.
    fn set_current_database(&self, connection: Value, database: &str);

    /// Persist a tab's document according to `mode`.
    fn save_tab_file(
        &self,
        editor: Arc<dyn Editor>,
        mode: SaveMode,
        target: SaveTarget,
    ) -> ActionFuture;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_window_action_wire_names() {
        assert_eq!(
            serde_json::to_value(WindowAction::FullscreenOn).unwrap(),
            "fullscreen-on"
        );
        assert_eq!(serde_json::to_value(WindowAction::ZoomIn).unwrap(), "zoomin");
        let back: WindowAction = serde_json::from_str("\"devtools\"").unwrap();
        assert_eq!(back, WindowAction::DevTools);
    }

    #[test]
    fn test_modal_serialization() {
        let json = serde_json::to_value(Modal::Settings {
            selected_tab: Some(1),
        })
        .unwrap();
        assert_eq!(json["modal"], "settings");
        assert_eq!(json["selectedTab"], 1);
    }

    #[test]
    fn test_tab_spec_skips_empty_fields() {
        let json = serde_json::to_value(TabSpec::new("Shell #", "img shell", "ShellTab")).unwrap();
        assert_eq!(json["tabComponent"], "ShellTab");
        assert!(json.get("props").is_none());
        assert!(json.get("editor").is_none());
    }
}
