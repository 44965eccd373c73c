use super::{desktop_only, with_host};
use crate::descriptor::CommandDescriptor;
use crate::workbench::Modal;

/// Anchors for the groups every editor-hosting feature joins. They carry the
/// shared label and binding; the members carry the actions.
pub fn group_anchors() -> Vec<CommandDescriptor> {
    [
        ("group.save", "Save", "Ctrl+S", "save"),
        ("group.saveAs", "Save As", "Ctrl+Shift+S", "saveAs"),
        ("group.undo", "Undo", "Ctrl+Z", "undo"),
        ("group.redo", "Redo", "Ctrl+Y", "redo"),
    ]
    .into_iter()
    .map(|(id, name, keys, group)| {
        CommandDescriptor::new(id)
            .name(name)
            .key_text(keys)
            .group(group)
            .group_anchor()
    })
    .collect()
}

pub fn commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("file.open")
            .category("File")
            .name("Open")
            .key_text("Ctrl+O")
            .enabled_when(desktop_only)
            .on_click(|ctx| with_host(ctx, |host| host.open_file())),
        CommandDescriptor::new("file.openArchive")
            .category("File")
            .name("Open DB Model/Archive")
            .enabled_when(desktop_only)
            .on_click(|ctx| with_host(ctx, |host| host.open_archive_folder())),
        CommandDescriptor::new("file.import")
            .category("File")
            .name("Import data")
            .toolbar()
            .icon("icon import")
            .on_click_sync(|ctx| {
                ctx.workbench.show_modal(Modal::ImportExport {
                    import_to_current_target: true,
                    source_storage_type: ctx.extensions.default_file_format.clone(),
                })
            }),
    ]
}

pub fn exit() -> Vec<CommandDescriptor> {
    vec![CommandDescriptor::new("file.exit")
        .category("File")
        .name("Exit")
        .enabled_when(desktop_only)
        .on_click(|ctx| {
            with_host(ctx, |host| {
                host.close_window();
                crate::descriptor::done()
            })
        })]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::demo::{self, RecordingHost};
    use crate::dispatcher::{Dispatcher, OutcomeKind};
    use crate::registry::CommandRegistry;

    fn dispatcher() -> Dispatcher {
        let registry = Arc::new(CommandRegistry::new());
        registry.register_all(group_anchors()).unwrap();
        registry.register_all(commands()).unwrap();
        registry.register_all(exit()).unwrap();
        Dispatcher::new(registry)
    }

    #[tokio::test]
    async fn test_desktop_commands_need_host() {
        let dispatcher = dispatcher();
        let browser = demo::context();
        for id in ["file.open", "file.openArchive", "file.exit"] {
            assert_eq!(dispatcher.dispatch(id, &browser).kind(), OutcomeKind::Disabled);
        }

        let host = Arc::new(RecordingHost::default());
        let desktop = demo::context().with_host(host.clone());
        for id in ["file.open", "file.openArchive", "file.exit"] {
            dispatcher.dispatch(id, &desktop).finish().await.unwrap();
        }
        assert_eq!(
            host.calls(),
            vec!["open-file", "open-archive-folder", "close-window"]
        );
    }

    #[tokio::test]
    async fn test_import_uses_default_file_format() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();
        let ctx = ctx.with_extensions(crate::context::Extensions {
            themes: vec![],
            default_file_format: Some("csv".into()),
        });
        dispatcher.dispatch("file.import", &ctx).finish().await.unwrap();
        assert_eq!(workbench.calls(), vec!["show_modal:importExport"]);
    }

    #[test]
    fn test_anchors_alone_are_disabled() {
        let dispatcher = dispatcher();
        for id in ["group.save", "save", "group.redo"] {
            assert_eq!(
                dispatcher.dispatch(id, &demo::context()).kind(),
                OutcomeKind::Disabled
            );
        }
    }
}
