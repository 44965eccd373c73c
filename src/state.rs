use std::path::PathBuf;
use std::sync::atomic::AtomicU16;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::{CommandContext, DatabaseRef, Extensions, RuntimeConfig};
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::editor::Editor;
use crate::error::AppError;
use crate::keymap::KeyChord;
use crate::registry::handlers::{register_standard_commands, StartupEnv};
use crate::registry::CommandRegistry;
use crate::settings::{self, HubSettings};
use crate::workbench::{HostWindow, Workbench};

// ── Ambient state ──────────────────────────────────────────────────

/// Live application state that predicates and actions read. Owned here,
/// handed to commands only as a [`CommandContext`] snapshot.
pub struct AmbientState {
    pub editor: Option<Arc<dyn Editor>>,
    pub database: Option<DatabaseRef>,
    pub extensions: Arc<Extensions>,
    pub host: Option<Arc<dyn HostWindow>>,
    pub workbench: Arc<dyn Workbench>,
}

impl AmbientState {
    pub fn new(workbench: Arc<dyn Workbench>) -> Self {
        Self {
            editor: None,
            database: None,
            extensions: Arc::new(Extensions::default()),
            host: None,
            workbench,
        }
    }
}

// ── Application State ──────────────────────────────────────────────

/// The process-wide command hub: created once at start-up, shared by every
/// surface (CLI, command bus, HTTP bridge) through an `Arc`.
pub struct AppState {
    pub registry: Arc<CommandRegistry>,
    pub dispatcher: Dispatcher,
    pub ambient: Mutex<AmbientState>,
    pub settings: Mutex<HubSettings>,
    pub app_config_dir: PathBuf,
    /// Port of the HTTP bridge (0 = not running).
    pub api_port: AtomicU16,
}

impl AppState {
    pub fn new(
        app_config_dir: PathBuf,
        settings: HubSettings,
        workbench: Arc<dyn Workbench>,
    ) -> Arc<Self> {
        let registry = Arc::new(CommandRegistry::new());
        Arc::new(Self {
            dispatcher: Dispatcher::new(Arc::clone(&registry)),
            registry,
            ambient: Mutex::new(AmbientState::new(workbench)),
            settings: Mutex::new(settings),
            app_config_dir,
            api_port: AtomicU16::new(0),
        })
    }

    /// Register the standard command set with the permissions from settings.
    pub fn register_standard_commands(&self) -> Result<(), AppError> {
        let env = StartupEnv {
            permissions: self.with_settings(HubSettings::permission_set),
        };
        register_standard_commands(&self.registry, &env)
    }

    /// Read-only access to ambient state. Locks the mutex for the duration of `f`.
    pub fn with_ambient<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AmbientState) -> R,
    {
        let guard = self.ambient.lock();
        f(&guard)
    }

    /// Mutating access to ambient state. Locks the mutex for the duration of `f`.
    pub fn with_ambient_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AmbientState) -> R,
    {
        let mut guard = self.ambient.lock();
        f(&mut guard)
    }

    pub fn with_settings<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&HubSettings) -> R,
    {
        let guard = self.settings.lock();
        f(&guard)
    }

    /// Change settings and persist them.
    pub fn update_settings<F>(&self, f: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut HubSettings),
    {
        let mut guard = self.settings.lock();
        f(&mut guard);
        settings::save_settings(&self.app_config_dir, &guard)
    }

    /// A consistent context for one dispatch or listing. Both locks are
    /// released before anything is evaluated.
    pub fn snapshot(&self) -> CommandContext {
        let (toolbar_visible, permissions, run_as_portal) = self.with_settings(|s| {
            (s.toolbar_visible, s.permission_set(), s.run_as_portal)
        });
        self.with_ambient(|a| CommandContext {
            editor: a.editor.clone(),
            database: a.database.clone(),
            config: RuntimeConfig { run_as_portal },
            permissions,
            toolbar_visible,
            extensions: Arc::clone(&a.extensions),
            host: a.host.clone(),
            workbench: Arc::clone(&a.workbench),
        })
    }

    /// Dispatch `id` against the current ambient state.
    pub fn dispatch(&self, id: &str) -> DispatchOutcome {
        self.dispatcher.dispatch(id, &self.snapshot())
    }

    pub fn dispatch_key(&self, chord: &KeyChord) -> DispatchOutcome {
        self.dispatcher.dispatch_key(chord, &self.snapshot())
    }
}
