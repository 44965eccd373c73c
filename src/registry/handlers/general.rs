use serde_json::json;

use crate::descriptor::CommandDescriptor;
use crate::workbench::{Modal, TabSpec};

/// Layout keys cleared by `view.reset`.
const VIEW_KEYS: &[&str] = &[
    "leftPanelWidth",
    "visibleToolbar",
    "selectedWidget",
    "currentTheme",
    "connectionsWidget",
    "pinnedItemsWidget",
    "dbObjectsWidget",
    "favoritesWidget",
    "savedFilesWidget",
    "closedTabsWidget",
    "queryHistoryWidget",
    "archiveFoldersWidget",
    "archiveFilesWidget",
    "installedPluginsWidget",
    "allPluginsWidget",
    "currentArchive",
];

pub fn leading() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("theme.changeTheme")
            .category("Theme")
            .name("Change")
            .toolbar_name("Change theme")
            .on_click_sync(|ctx| {
                ctx.workbench.show_modal(Modal::Settings {
                    selected_tab: Some(1),
                })
            })
            .sub_commands(|ctx| {
                ctx.extensions
                    .themes
                    .iter()
                    .map(|theme| {
                        let class = theme.class_name.clone();
                        CommandDescriptor::new(format!("theme.changeTheme.{class}"))
                            .category("Theme")
                            .name(theme.name.clone())
                            .on_click_sync(move |ctx| ctx.workbench.set_theme(&class))
                    })
                    .collect()
            }),
        CommandDescriptor::new("toolbar.show")
            .category("Toolbar")
            .name("Show")
            .enabled_when(|ctx| !ctx.toolbar_visible)
            .on_click_sync(|ctx| ctx.workbench.set_toolbar_visible(true)),
        CommandDescriptor::new("toolbar.hide")
            .category("Toolbar")
            .name("Hide")
            .enabled_when(|ctx| ctx.toolbar_visible)
            .on_click_sync(|ctx| ctx.workbench.set_toolbar_visible(false)),
        CommandDescriptor::new("about.show")
            .category("About")
            .name("Show")
            .toolbar_name("About")
            .on_click_sync(|ctx| ctx.workbench.show_modal(Modal::About)),
    ]
}

pub fn tabs() -> Vec<CommandDescriptor> {
    vec![CommandDescriptor::new("tabs.changelog")
        .category("Tabs")
        .name("Changelog")
        .on_click_sync(|ctx| {
            ctx.workbench.open_tab(
                TabSpec::new("ChangeLog", "img markdown", "ChangelogTab").with_props(json!({})),
            )
        })]
}

pub fn view_and_sql() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("view.reset")
            .category("View")
            .name("Reset view")
            .on_click_sync(|ctx| {
                for key in VIEW_KEYS {
                    ctx.workbench.remove_local_storage(key);
                }
                ctx.workbench
                    .notify_success("Restart the application (or reload on web) for applying changes");
            }),
        CommandDescriptor::new("sql.generator")
            .category("SQL")
            .name("SQL Generator")
            .toolbar()
            .icon("icon sql-generator")
            .enabled_when(|ctx| ctx.database.is_some())
            .on_click_sync(|ctx| {
                if let Some(db) = &ctx.database {
                    ctx.workbench.show_modal(Modal::SqlGenerator {
                        connection_id: db.connection_id.clone(),
                        database: db.name.clone(),
                    });
                }
            }),
    ]
}

/// Only registered when the user may change settings.
pub fn settings() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("settings.commands")
            .category("Settings")
            .name("Keyboard shortcuts")
            .on_click_sync(|ctx| {
                ctx.workbench.open_tab(
                    TabSpec::new("Keyboard Shortcuts", "icon keyboard", "CommandListTab")
                        .with_props(json!({})),
                )
            }),
        CommandDescriptor::new("settings.show")
            .category("Settings")
            .name("Change")
            .toolbar_name("Settings")
            .on_click_sync(|ctx| {
                ctx.workbench
                    .show_modal(Modal::Settings { selected_tab: None })
            }),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::demo;
    use crate::dispatcher::{Dispatcher, OutcomeKind};
    use crate::registry::CommandRegistry;

    fn dispatcher() -> Dispatcher {
        let registry = Arc::new(CommandRegistry::new());
        registry.register_all(leading()).unwrap();
        registry.register_all(tabs()).unwrap();
        registry.register_all(view_and_sql()).unwrap();
        registry.register_all(settings()).unwrap();
        Dispatcher::new(registry)
    }

    #[tokio::test]
    async fn test_toolbar_show_hide_follow_visibility() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();

        assert_eq!(dispatcher.dispatch("toolbar.show", &ctx).kind(), OutcomeKind::Disabled);
        dispatcher.dispatch("toolbar.hide", &ctx).finish().await.unwrap();

        let hidden = ctx.with_toolbar_visible(false);
        assert_eq!(dispatcher.dispatch("toolbar.hide", &hidden).kind(), OutcomeKind::Disabled);
        dispatcher.dispatch("toolbar.show", &hidden).finish().await.unwrap();

        assert_eq!(
            workbench.calls(),
            vec!["set_toolbar_visible:false", "set_toolbar_visible:true"]
        );
    }

    #[tokio::test]
    async fn test_view_reset_clears_layout() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();
        dispatcher.dispatch("view.reset", &ctx).finish().await.unwrap();

        let calls = workbench.calls();
        assert_eq!(calls.len(), VIEW_KEYS.len() + 1);
        assert_eq!(calls.first().unwrap(), "remove_local_storage:leftPanelWidth");
        assert!(calls.last().unwrap().starts_with("notify_success:"));
    }

    #[tokio::test]
    async fn test_sql_generator_needs_database() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();
        assert_eq!(dispatcher.dispatch("sql.generator", &ctx).kind(), OutcomeKind::Disabled);

        let ctx = ctx.with_database(demo::database(&[]));
        dispatcher.dispatch("sql.generator", &ctx).finish().await.unwrap();
        assert_eq!(workbench.calls(), vec!["show_modal:sqlGenerator"]);
    }

    #[tokio::test]
    async fn test_theme_modal_and_sub_commands() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();
        let ctx = ctx.with_themes(vec![
            demo::theme("Light", "theme-light"),
            demo::theme("Dark", "theme-dark"),
        ]);

        dispatcher.dispatch("theme.changeTheme", &ctx).finish().await.unwrap();
        dispatcher
            .dispatch_sub("theme.changeTheme", "theme.changeTheme.theme-dark", &ctx)
            .finish()
            .await
            .unwrap();
        assert_eq!(workbench.calls(), vec!["show_modal:settings", "set_theme:theme-dark"]);
    }
}
