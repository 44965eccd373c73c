//! In-memory collaborators: an editor, a workbench and a host window that
//! record what commands asked of them. Used by the CLI and by tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::info;

use crate::context::{CommandContext, DatabaseRef, EngineType, ThemeInfo};
use crate::descriptor::{done, ActionFuture};
use crate::editor::{unsupported, Capability, Editor, SaveMode, SaveTarget};
use crate::error::AppError;
use crate::events;
use crate::registry::contrib::{register_file_commands, FileCommandsConfig};
use crate::registry::CommandRegistry;
use crate::workbench::{ApiCall, HostWindow, Modal, TabSpec, TextPrompt, Workbench, WindowAction};

// ── Editor ──────────────────────────────────────────────────────

pub struct DemoEditor {
    kind: String,
    capabilities: Vec<Capability>,
    busy: AtomicBool,
    can_undo: AtomicBool,
    can_redo: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl DemoEditor {
    pub fn new(kind: &str, capabilities: &[Capability]) -> Self {
        Self {
            kind: kind.to_string(),
            capabilities: capabilities.to_vec(),
            busy: AtomicBool::new(false),
            can_undo: AtomicBool::new(false),
            can_redo: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_can_undo(&self, on: bool) {
        self.can_undo.store(on, Ordering::SeqCst);
    }

    pub fn set_can_redo(&self, on: bool) {
        self.can_redo.store(on, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn perform(&self, capability: Capability) -> ActionFuture {
        if !self.supports(capability) {
            return unsupported(capability);
        }
        info!(editor = %self.kind, %capability, "Editor operation");
        self.calls.lock().push(capability.to_string());
        done()
    }
}

impl Editor for DemoEditor {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn execute(&self) -> ActionFuture {
        let result = self.perform(Capability::Execute);
        if self.supports(Capability::Execute) {
            self.busy.store(true, Ordering::SeqCst);
        }
        result
    }

    fn kill(&self) -> ActionFuture {
        let result = self.perform(Capability::Kill);
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn can_kill(&self) -> bool {
        self.supports(Capability::Kill) && self.is_busy()
    }

    fn toggle_comment(&self) -> ActionFuture {
        self.perform(Capability::ToggleComment)
    }

    fn find(&self) -> ActionFuture {
        self.perform(Capability::Find)
    }

    fn replace(&self) -> ActionFuture {
        self.perform(Capability::Replace)
    }

    fn undo(&self) -> ActionFuture {
        self.perform(Capability::Undo)
    }

    fn redo(&self) -> ActionFuture {
        self.perform(Capability::Redo)
    }

    fn can_undo(&self) -> bool {
        self.supports(Capability::Undo) && self.can_undo.load(Ordering::SeqCst)
    }

    fn can_redo(&self) -> bool {
        self.supports(Capability::Redo) && self.can_redo.load(Ordering::SeqCst)
    }
}

// ── Workbench ───────────────────────────────────────────────────

/// Records every request as a short `"operation:detail"` line. Backend API
/// calls are answered from an in-memory settings object.
pub struct RecordingWorkbench {
    calls: Mutex<Vec<String>>,
    prompt_answer: Mutex<Option<String>>,
    settings: Arc<Mutex<Value>>,
    failing_routes: Mutex<Vec<String>>,
}

impl Default for RecordingWorkbench {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            prompt_answer: Mutex::new(None),
            settings: Arc::new(Mutex::new(json!({}))),
            failing_routes: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingWorkbench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Value the next text prompts resolve with. `None` simulates cancel.
    pub fn answer_prompts_with(&self, answer: Option<&str>) {
        *self.prompt_answer.lock() = answer.map(str::to_string);
    }

    /// Make backend calls to `route` fail from now on.
    pub fn fail_route(&self, route: &str) {
        self.failing_routes.lock().push(route.to_string());
    }

    pub fn backend_settings(&self) -> Value {
        self.settings.lock().clone()
    }

    fn record(&self, line: String) {
        info!(call = %line, "Workbench");
        self.calls.lock().push(line);
    }
}

fn modal_name(modal: &Modal) -> String {
    serde_json::to_value(modal)
        .ok()
        .and_then(|v| v.get("modal").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

fn save_mode_name(mode: SaveMode) -> String {
    serde_json::to_value(mode)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

impl Workbench for RecordingWorkbench {
    fn show_modal(&self, modal: Modal) {
        self.record(format!("show_modal:{}", modal_name(&modal)));
    }

    fn prompt_text(&self, prompt: TextPrompt) -> BoxFuture<'static, Option<String>> {
        self.record(format!("prompt_text:{}", prompt.header));
        let answer = self.prompt_answer.lock().clone();
        futures_util::future::ready(answer).boxed()
    }

    fn open_tab(&self, tab: TabSpec) {
        self.record(format!("open_tab:{}", tab.tab_component));
    }

    fn set_toolbar_visible(&self, visible: bool) {
        self.record(format!("set_toolbar_visible:{visible}"));
    }

    fn set_theme(&self, theme_class: &str) {
        self.record(format!("set_theme:{theme_class}"));
    }

    fn open_web_link(&self, url: &str) {
        self.record(format!("open_web_link:{url}"));
    }

    fn remove_local_storage(&self, key: &str) {
        self.record(format!("remove_local_storage:{key}"));
    }

    fn notify_success(&self, message: &str) {
        self.record(format!("notify_success:{message}"));
    }

    fn api_call(&self, call: ApiCall) -> BoxFuture<'static, Result<Value, AppError>> {
        self.record(format!("api_call:{}", call.route));
        if self.failing_routes.lock().contains(&call.route) {
            let err = AppError::Api {
                message: format!("{} failed", call.route),
            };
            return futures_util::future::ready(Err(err)).boxed();
        }
        let settings = Arc::clone(&self.settings);
        async move {
            match call.route.as_str() {
                "config/get-settings" => Ok(settings.lock().clone()),
                "config/update-settings" => {
                    let mut current = settings.lock();
                    if let (Some(target), Some(patch)) = (current.as_object_mut(), call.body.as_object()) {
                        for (k, v) in patch {
                            target.insert(k.clone(), v.clone());
                        }
                    }
                    Ok(Value::Bool(true))
                }
                _ => Ok(json!({ "route": call.route, "body": call.body })),
            }
        }
        .boxed()
    }

    fn set_current_database(&self, _connection: Value, database: &str) {
        self.record(format!("set_current_database:{database}"));
    }

    fn save_tab_file(
        &self,
        editor: Arc<dyn Editor>,
        mode: SaveMode,
        _target: SaveTarget,
    ) -> ActionFuture {
        self.record(format!("save_tab_file:{}:{}", editor.kind(), save_mode_name(mode)));
        done()
    }
}

// ── Host window ─────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, line: String) {
        info!(call = %line, "Host window");
        self.calls.lock().push(line);
    }
}

impl HostWindow for RecordingHost {
    fn window_action(&self, action: WindowAction) {
        let name = serde_json::to_value(action)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        self.record(format!("{}:{name}", events::WINDOW_ACTION));
    }

    fn close_window(&self) {
        self.record(events::CLOSE_WINDOW.to_string());
    }

    fn open_file(&self) -> ActionFuture {
        self.record("open-file".to_string());
        done()
    }

    fn open_archive_folder(&self) -> ActionFuture {
        self.record("open-archive-folder".to_string());
        done()
    }
}

// ── Builders ────────────────────────────────────────────────────

/// Browser-like context backed by a fresh [`RecordingWorkbench`].
pub fn context() -> CommandContext {
    CommandContext::new(Arc::new(RecordingWorkbench::new()))
}

/// Like [`context`], keeping a handle on the workbench to inspect calls.
pub fn recording_context() -> (Arc<RecordingWorkbench>, CommandContext) {
    let workbench = Arc::new(RecordingWorkbench::new());
    let ctx = CommandContext::new(workbench.clone());
    (workbench, ctx)
}

/// An editor of `kind` with every capability.
pub fn editor(kind: &str) -> Arc<dyn Editor> {
    Arc::new(DemoEditor::new(kind, Capability::all()))
}

pub fn host() -> Arc<dyn HostWindow> {
    Arc::new(RecordingHost::default())
}

pub fn theme(name: &str, class_name: &str) -> ThemeInfo {
    ThemeInfo {
        name: name.to_string(),
        class_name: class_name.to_string(),
    }
}

pub fn database(engine_types: &[EngineType]) -> DatabaseRef {
    DatabaseRef {
        connection_id: "demo-connection".to_string(),
        name: "demo".to_string(),
        engine_types: engine_types.to_vec(),
    }
}

/// Editor-hosting features of the demo application: a SQL query editor and
/// a JavaScript shell.
pub fn register_demo_features(registry: &CommandRegistry) -> Result<Vec<String>, AppError> {
    let mut ids = register_file_commands(
        registry,
        &FileCommandsConfig::new("query", "Query")
            .editor_kind("query")
            .folder("sql")
            .format("text")
            .file_extension("sql")
            .execute(true)
            .toggle_comment(true)
            .find_replace(true)
            .undo_redo(true),
    )?;
    ids.extend(register_file_commands(
        registry,
        &FileCommandsConfig::new("shell", "Shell")
            .editor_kind("shell")
            .folder("shell")
            .format("text")
            .file_extension("js")
            .execute(true)
            .toggle_comment(true),
    )?);
    Ok(ids)
}
