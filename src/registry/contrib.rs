//! Compound registration for editor-hosting features.
//!
//! A feature module that hosts a document editor describes which capabilities
//! it wants wired up, and [`register_file_commands`] expands that into the
//! individual descriptors, all delegating to whatever editor the accessor
//! returns at call time and all joining the shared `save`/`saveAs`/`undo`/`redo`
//! groups.

use std::sync::Arc;

use tracing::debug;

use super::CommandRegistry;
use crate::context::CommandContext;
use crate::descriptor::{fail, ActionFuture, CommandDescriptor};
use crate::editor::{Capability, Editor, SaveMode, SaveTarget};
use crate::error::AppError;

/// Returns the editor a command family operates on, if one is active.
pub type EditorAccessor = Arc<dyn Fn(&CommandContext) -> Option<Arc<dyn Editor>> + Send + Sync>;

#[derive(Clone)]
pub struct FileCommandsConfig {
    pub id_prefix: String,
    pub category: String,
    pub get_current_editor: EditorAccessor,
    pub folder: Option<String>,
    pub format: Option<String>,
    pub file_extension: Option<String>,
    pub save: bool,
    pub execute: bool,
    pub toggle_comment: bool,
    pub find_replace: bool,
    pub undo_redo: bool,
    /// ANDed into the execute command's enablement.
    pub execute_additional_condition: Option<Arc<dyn Fn(&CommandContext) -> bool + Send + Sync>>,
}

impl FileCommandsConfig {
    /// Defaults: `save` on, every other switch off, and the context's active
    /// editor as the current editor.
    pub fn new(id_prefix: &str, category: &str) -> Self {
        Self {
            id_prefix: id_prefix.to_string(),
            category: category.to_string(),
            get_current_editor: Arc::new(|ctx: &CommandContext| ctx.editor.clone()),
            folder: None,
            format: None,
            file_extension: None,
            save: true,
            execute: false,
            toggle_comment: false,
            find_replace: false,
            undo_redo: false,
            execute_additional_condition: None,
        }
    }

    /// Only treat the active editor as current when its kind matches.
    pub fn editor_kind(mut self, kind: &str) -> Self {
        let kind = kind.to_string();
        self.get_current_editor = Arc::new(move |ctx: &CommandContext| {
            ctx.editor.clone().filter(|e| e.kind() == kind)
        });
        self
    }

    pub fn editor_accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&CommandContext) -> Option<Arc<dyn Editor>> + Send + Sync + 'static,
    {
        self.get_current_editor = Arc::new(accessor);
        self
    }

    pub fn folder(mut self, folder: &str) -> Self {
        self.folder = Some(folder.to_string());
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn file_extension(mut self, extension: &str) -> Self {
        self.file_extension = Some(extension.to_string());
        self
    }

    pub fn save(mut self, on: bool) -> Self {
        self.save = on;
        self
    }

    pub fn execute(mut self, on: bool) -> Self {
        self.execute = on;
        self
    }

    pub fn toggle_comment(mut self, on: bool) -> Self {
        self.toggle_comment = on;
        self
    }

    pub fn find_replace(mut self, on: bool) -> Self {
        self.find_replace = on;
        self
    }

    pub fn undo_redo(mut self, on: bool) -> Self {
        self.undo_redo = on;
        self
    }

    pub fn execute_when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&CommandContext) -> bool + Send + Sync + 'static,
    {
        self.execute_additional_condition = Some(Arc::new(condition));
        self
    }

    fn save_target(&self) -> SaveTarget {
        SaveTarget {
            folder: self.folder.clone(),
            format: self.format.clone(),
            file_extension: self.file_extension.clone(),
        }
    }
}

// ── Registration ────────────────────────────────────────────────

/// Register the descriptor bundle for every enabled switch and return the ids
/// registered, in order.
pub fn register_file_commands(
    registry: &CommandRegistry,
    config: &FileCommandsConfig,
) -> Result<Vec<String>, AppError> {
    let descriptors = file_command_descriptors(config);
    let ids: Vec<String> = descriptors.iter().map(|d| d.id.clone()).collect();
    registry.register_all(descriptors)?;
    debug!(prefix = %config.id_prefix, count = ids.len(), "Registered file commands");
    Ok(ids)
}

fn file_command_descriptors(config: &FileCommandsConfig) -> Vec<CommandDescriptor> {
    let mut out = Vec::new();
    let base = |suffix: &str, name: &str| {
        CommandDescriptor::new(format!("{}.{suffix}", config.id_prefix))
            .category(config.category.clone())
            .name(name)
    };

    if config.save {
        out.push(
            save_command(base("save", "Save"), config, SaveMode::Save)
                .group("save")
                .icon("icon save")
                .toolbar()
                .related_to_tab(),
        );
        out.push(save_command(base("saveAs", "Save As"), config, SaveMode::SaveAs).group("saveAs"));
        out.push(save_command(
            base("saveToDisk", "Save to disk"),
            config,
            SaveMode::SaveToDisk,
        ));
    }

    if config.execute {
        let current = Arc::clone(&config.get_current_editor);
        let extra = config.execute_additional_condition.clone();
        out.push(
            delegate(base("execute", "Execute"), config, |e| e.execute())
                .icon("icon run")
                .toolbar()
                .related_to_tab()
                .key_text("F5 | Ctrl+Enter")
                .enabled_when(move |ctx| {
                    current(ctx).is_some_and(|e| e.supports(Capability::Execute) && !e.is_busy())
                        && extra.as_ref().map_or(true, |cond| cond(ctx))
                }),
        );
        let current = Arc::clone(&config.get_current_editor);
        out.push(
            delegate(base("kill", "Kill"), config, |e| e.kill())
                .icon("icon close")
                .toolbar()
                .related_to_tab()
                .enabled_when(move |ctx| current(ctx).is_some_and(|e| e.can_kill())),
        );
    }

    if config.toggle_comment {
        out.push(
            delegate(base("toggleComment", "Toggle comment"), config, |e| {
                e.toggle_comment()
            })
            .key_text("Ctrl+/")
            .disable_handle_key_text("Ctrl+/")
            .enabled_when(supports(config, Capability::ToggleComment)),
        );
    }

    if config.find_replace {
        out.push(
            delegate(base("find", "Find"), config, |e| e.find())
                .key_text("Ctrl+F")
                .enabled_when(supports(config, Capability::Find)),
        );
        out.push(
            delegate(base("replace", "Replace"), config, |e| e.replace())
                .key_text("Ctrl+H")
                .enabled_when(supports(config, Capability::Replace)),
        );
    }

    if config.undo_redo {
        let current = Arc::clone(&config.get_current_editor);
        out.push(
            delegate(base("undo", "Undo"), config, |e| e.undo())
                .group("undo")
                .icon("icon undo")
                .enabled_when(move |ctx| current(ctx).is_some_and(|e| e.can_undo())),
        );
        let current = Arc::clone(&config.get_current_editor);
        out.push(
            delegate(base("redo", "Redo"), config, |e| e.redo())
                .group("redo")
                .icon("icon redo")
                .enabled_when(move |ctx| current(ctx).is_some_and(|e| e.can_redo())),
        );
    }

    out
}

/// Enabled while an editor is current and advertises `capability`.
fn supports(
    config: &FileCommandsConfig,
    capability: Capability,
) -> impl Fn(&CommandContext) -> bool + Send + Sync + 'static {
    let current = Arc::clone(&config.get_current_editor);
    move |ctx| current(ctx).is_some_and(|e| e.supports(capability))
}

/// Wire `on_click` to a capability method of the current editor.
fn delegate<F>(desc: CommandDescriptor, config: &FileCommandsConfig, call: F) -> CommandDescriptor
where
    F: Fn(&dyn Editor) -> ActionFuture + Send + Sync + 'static,
{
    let current = Arc::clone(&config.get_current_editor);
    desc.on_click(move |ctx| match current(ctx) {
        Some(editor) => call(editor.as_ref()),
        None => fail(AppError::NoEditor),
    })
}

fn save_command(
    desc: CommandDescriptor,
    config: &FileCommandsConfig,
    mode: SaveMode,
) -> CommandDescriptor {
    let current = Arc::clone(&config.get_current_editor);
    let enabled = Arc::clone(&config.get_current_editor);
    let target = config.save_target();
    desc.enabled_when(move |ctx| {
        enabled(ctx).is_some() && (mode != SaveMode::SaveToDisk || ctx.is_desktop())
    })
    .on_click(move |ctx| match current(ctx) {
        Some(editor) => ctx.workbench.save_tab_file(editor, mode, target.clone()),
        None => fail(AppError::NoEditor),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::demo::{self, DemoEditor};
    use crate::dispatcher::{Dispatcher, OutcomeKind};

    #[test]
    fn test_save_and_execute_register_exact_bundle() {
        let registry = CommandRegistry::new();
        let ids = register_file_commands(
            &registry,
            &FileCommandsConfig::new("query", "Query").execute(true),
        )
        .unwrap();

        assert_eq!(
            ids,
            vec![
                "query.save",
                "query.saveAs",
                "query.saveToDisk",
                "query.execute",
                "query.kill"
            ]
        );
        assert_eq!(registry.len(), 5);
        for absent in [
            "query.toggleComment",
            "query.find",
            "query.replace",
            "query.undo",
            "query.redo",
        ] {
            assert!(registry.lookup(absent).is_none(), "{absent} should not exist");
        }
    }

    #[test]
    fn test_all_switches() {
        let registry = CommandRegistry::new();
        let config = FileCommandsConfig::new("shell", "Shell")
            .execute(true)
            .toggle_comment(true)
            .find_replace(true)
            .undo_redo(true);
        let ids = register_file_commands(&registry, &config).unwrap();
        assert_eq!(
            ids,
            vec![
                "shell.save",
                "shell.saveAs",
                "shell.saveToDisk",
                "shell.execute",
                "shell.kill",
                "shell.toggleComment",
                "shell.find",
                "shell.replace",
                "shell.undo",
                "shell.redo"
            ]
        );
        assert_eq!(registry.len(), 10);

        let toggle = registry.lookup("shell.toggleComment").unwrap();
        assert_eq!(toggle.key_text.raw(), "Ctrl+/");
        assert!(toggle.disable_handle_key_text.is_some());
        assert_eq!(registry.lookup("shell.undo").unwrap().group.as_deref(), Some("undo"));
        assert_eq!(registry.lookup("shell.save").unwrap().group.as_deref(), Some("save"));
        assert!(registry.lookup("shell.execute").unwrap().is_related_to_tab);
    }

    #[test]
    fn test_save_off_registers_nothing_by_default() {
        let registry = CommandRegistry::new();
        let ids =
            register_file_commands(&registry, &FileCommandsConfig::new("md", "Markdown").save(false))
                .unwrap();
        assert!(ids.is_empty());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_editor_presence_toggles_save() {
        let registry = std::sync::Arc::new(CommandRegistry::new());
        register_file_commands(&registry, &FileCommandsConfig::new("query", "Query").folder("sql"))
            .unwrap();
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let before = registry.list();

        let (workbench, ctx) = demo::recording_context();
        let with_editor = ctx.clone().with_editor(demo::editor("query"));
        let outcome = dispatcher.dispatch("query.save", &with_editor);
        assert_eq!(outcome.kind(), OutcomeKind::Invoked);
        outcome.finish().await.unwrap();
        assert_eq!(workbench.calls(), vec!["save_tab_file:query:save".to_string()]);

        let without = with_editor.without_editor();
        assert_eq!(
            dispatcher.dispatch("query.save", &without).kind(),
            OutcomeKind::Disabled
        );

        let after = registry.list();
        assert_eq!(before.len(), after.len());
        assert!(before.iter().zip(&after).all(|(a, b)| Arc::ptr_eq(a, b)));
    }

    #[test]
    fn test_save_to_disk_needs_desktop_host() {
        let registry = std::sync::Arc::new(CommandRegistry::new());
        register_file_commands(&registry, &FileCommandsConfig::new("query", "Query")).unwrap();
        let dispatcher = Dispatcher::new(Arc::clone(&registry));

        let ctx = demo::context().with_editor(demo::editor("query"));
        assert_eq!(
            dispatcher.dispatch("query.saveToDisk", &ctx).kind(),
            OutcomeKind::Disabled
        );
        let ctx = ctx.with_host(demo::host());
        assert!(dispatcher.dispatch("query.saveToDisk", &ctx).is_invoked());
    }

    #[tokio::test]
    async fn test_execute_respects_busy_and_extra_condition() {
        let registry = std::sync::Arc::new(CommandRegistry::new());
        let config = FileCommandsConfig::new("query", "Query")
            .execute(true)
            .execute_when(|ctx| ctx.database.is_some());
        register_file_commands(&registry, &config).unwrap();
        let dispatcher = Dispatcher::new(Arc::clone(&registry));

        let editor = Arc::new(DemoEditor::new("query", Capability::all()));
        let ctx = demo::context().with_editor(editor.clone());
        assert_eq!(dispatcher.dispatch("query.execute", &ctx).kind(), OutcomeKind::Disabled);

        let ctx = ctx.with_database(demo::database(&[crate::context::EngineType::Sql]));
        dispatcher
            .dispatch("query.execute", &ctx)
            .finish()
            .await
            .unwrap();
        assert!(editor.is_busy());
        assert_eq!(dispatcher.dispatch("query.execute", &ctx).kind(), OutcomeKind::Disabled);

        // Busy editors can be killed, which clears the busy flag.
        dispatcher.dispatch("query.kill", &ctx).finish().await.unwrap();
        assert!(!editor.is_busy());
        assert_eq!(dispatcher.dispatch("query.kill", &ctx).kind(), OutcomeKind::Disabled);
    }

    #[tokio::test]
    async fn test_undo_group_competes_across_editor_kinds() {
        let registry = std::sync::Arc::new(CommandRegistry::new());
        for (prefix, kind) in [("query", "query"), ("shell", "shell")] {
            let config = FileCommandsConfig::new(prefix, prefix)
                .editor_kind(kind)
                .save(false)
                .undo_redo(true);
            register_file_commands(&registry, &config).unwrap();
        }
        let dispatcher = Dispatcher::new(Arc::clone(&registry));

        let shell = Arc::new(DemoEditor::new("shell", Capability::all()));
        shell.set_can_undo(true);
        let ctx = demo::context().with_editor(shell.clone());

        let outcome = dispatcher.dispatch("undo", &ctx);
        assert_eq!(outcome.into_pending().unwrap().id(), "shell.undo");
        assert_eq!(dispatcher.dispatch("redo", &ctx).kind(), OutcomeKind::Disabled);

        shell.set_can_redo(true);
        let outcome = dispatcher.dispatch("redo", &ctx);
        assert_eq!(outcome.into_pending().unwrap().id(), "shell.redo");
    }

    #[tokio::test]
    async fn test_custom_editor_accessor() {
        let registry = std::sync::Arc::new(CommandRegistry::new());
        let pinned = Arc::new(DemoEditor::new("diagram", Capability::all()));
        let current: Arc<dyn Editor> = pinned.clone();
        let config = FileCommandsConfig::new("diagram", "Diagram")
            .save(false)
            .find_replace(true)
            .editor_accessor(move |_| Some(Arc::clone(&current)));
        register_file_commands(&registry, &config).unwrap();
        let dispatcher = Dispatcher::new(Arc::clone(&registry));

        // The context carries no editor; the accessor supplies one.
        let ctx = demo::context();
        dispatcher.dispatch("diagram.find", &ctx).finish().await.unwrap();
        assert_eq!(pinned.calls(), vec!["find".to_string()]);
    }

    #[tokio::test]
    async fn test_unsupported_capability_is_disabled() {
        let registry = std::sync::Arc::new(CommandRegistry::new());
        register_file_commands(
            &registry,
            &FileCommandsConfig::new("md", "Markdown").find_replace(true),
        )
        .unwrap();
        let dispatcher = Dispatcher::new(Arc::clone(&registry));

        let bare = Arc::new(DemoEditor::new("markdown", &[Capability::Find]));
        let ctx = demo::context().with_editor(bare);
        assert!(dispatcher.dispatch("md.find", &ctx).is_invoked());
        assert_eq!(dispatcher.dispatch("md.replace", &ctx).kind(), OutcomeKind::Disabled);
    }
}
