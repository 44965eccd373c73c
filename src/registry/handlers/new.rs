//! `new.*`: create connections, tabs and database objects.

use futures_util::FutureExt;
use serde_json::{json, Value};

use super::api_call_detached;
use crate::context::{CommandContext, EngineType};
use crate::descriptor::{fail, ActionFuture, CommandDescriptor};
use crate::error::AppError;
use crate::workbench::{ApiCall, Modal, TabSpec, TextPrompt};

pub fn commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("new.connection")
            .category("New")
            .name("Connection")
            .toolbar_name("Add connection")
            .icon("icon new-connection")
            .toolbar_order(1)
            .enabled_when(|ctx| !ctx.config.run_as_portal)
            .on_click_sync(|ctx| ctx.workbench.show_modal(Modal::Connection)),
        CommandDescriptor::new("new.query")
            .category("New")
            .name("Query")
            .toolbar_name("New query")
            .icon("icon file")
            .toolbar_order(2)
            .key_text("Ctrl+Q")
            .on_click_sync(|ctx| {
                ctx.workbench
                    .open_tab(TabSpec::new("Query #", "img sql-file", "QueryTab"))
            }),
        CommandDescriptor::new("new.shell")
            .category("New")
            .name("JavaScript Shell")
            .menu_name("New JavaScript shell")
            .icon("img shell")
            .on_click_sync(|ctx| {
                ctx.workbench
                    .open_tab(TabSpec::new("Shell #", "img shell", "ShellTab"))
            }),
        CommandDescriptor::new("new.archiveFolder")
            .category("New")
            .name("Archive folder")
            .icon("img archive")
            .on_click(|ctx| {
                prompt_then_call(
                    ctx,
                    TextPrompt::new("Create archive folder", "New archive folder name", ""),
                    "archive/create-folder",
                )
            }),
        CommandDescriptor::new("new.application")
            .category("New")
            .name("Application")
            .icon("img app")
            .on_click(|ctx| {
                prompt_then_call(
                    ctx,
                    TextPrompt::new("Create application", "New application name", ""),
                    "apps/create-folder",
                )
            }),
        CommandDescriptor::new("new.table")
            .category("New")
            .name("Table")
            .toolbar_name("New table")
            .icon("icon table")
            .toolbar()
            .enabled_when(|ctx| ctx.database_supports(EngineType::Sql))
            .on_click(new_table),
        CommandDescriptor::new("new.collection")
            .category("New")
            .name("Collection")
            .toolbar_name("New collection")
            .icon("icon table")
            .toolbar()
            .enabled_when(|ctx| ctx.database_supports(EngineType::Document))
            .on_click(new_collection),
        CommandDescriptor::new("new.dbKey")
            .category("New")
            .name("Key")
            .toolbar_name("New key")
            .toolbar()
            .enabled_when(|ctx| ctx.database_supports(EngineType::KeyValue))
            .on_click_sync(|ctx| {
                if let Some(db) = &ctx.database {
                    ctx.workbench.show_modal(Modal::AddDbKey {
                        connection_id: db.connection_id.clone(),
                        database: db.name.clone(),
                    });
                }
            }),
        CommandDescriptor::new("new.markdown")
            .category("New")
            .name("Markdown page")
            .icon("img markdown")
            .on_click_sync(|ctx| {
                ctx.workbench
                    .open_tab(TabSpec::new("Page #", "img markdown", "MarkdownEditorTab"))
            }),
        CommandDescriptor::new("new.modelCompare")
            .category("New")
            .name("Compare DB")
            .icon("icon compare")
            .toolbar()
            .on_click_sync(|ctx| {
                ctx.workbench
                    .open_tab(TabSpec::new("Compare", "img compare", "CompareModelTab"))
            }),
        CommandDescriptor::new("new.freetable")
            .category("New")
            .name("Data sheet")
            .menu_name("New data sheet")
            .icon("img markdown")
            .on_click_sync(|ctx| {
                ctx.workbench
                    .open_tab(TabSpec::new("Data #", "img free-table", "FreeTableTab"))
            }),
        CommandDescriptor::new("new.jsonl")
            .category("New")
            .name("JSON Lines")
            .menu_name("New JSON lines file")
            .icon("img archive")
            .on_click_sync(|ctx| {
                ctx.workbench.open_tab(
                    TabSpec::new("Lines #", "img archive", "JsonLinesEditorTab")
                        .with_editor(Value::String(r#"{"col1": "val1", "col2": "val2"}"#.into())),
                )
            }),
        CommandDescriptor::new("new.sqliteDatabase")
            .category("New")
            .name("SQLite database")
            .menu_name("New SQLite database")
            .icon("img sqlite-database")
            .on_click(new_sqlite_database),
    ]
}

/// Ask for a folder name and hand it to `route`. Cancelling is not a failure.
fn prompt_then_call(ctx: &CommandContext, prompt: TextPrompt, route: &'static str) -> ActionFuture {
    let answer = ctx.workbench.prompt_text(prompt);
    let ctx = ctx.clone();
    async move {
        match answer.await {
            Some(folder) => api_call_detached(&ctx, route, json!({ "folder": folder })).await,
            None => Ok(()),
        }
    }
    .boxed()
}

fn new_table(ctx: &CommandContext) -> ActionFuture {
    let Some(db) = &ctx.database else {
        return fail(AppError::NoDatabase);
    };
    ctx.workbench.open_tab(
        TabSpec::new("Table #", "img table-structure", "TableStructureTab")
            .with_props(json!({ "conid": db.connection_id, "database": db.name }))
            .with_editor(json!({ "columns": [] }))
            .force_new_tab(),
    );
    crate::descriptor::done()
}

fn new_collection(ctx: &CommandContext) -> ActionFuture {
    let Some(db) = ctx.database.clone() else {
        return fail(AppError::NoDatabase);
    };
    let answer = ctx.workbench.prompt_text(TextPrompt::new(
        "Create collection",
        "New collection name",
        "",
    ));
    let workbench = ctx.workbench.clone();
    async move {
        let Some(name) = answer.await else {
            return Ok(());
        };
        let dbid = json!({ "conid": db.connection_id, "database": db.name });
        let mut script = dbid.clone();
        if let Some(obj) = script.as_object_mut() {
            obj.insert(
                "sql".into(),
                Value::String(format!("db.createCollection('{name}')")),
            );
        }
        workbench
            .api_call(ApiCall::new("database-connections/run-script", script))
            .await?;
        workbench
            .api_call(ApiCall::new("database-connections/sync-model", dbid))
            .await?;
        Ok(())
    }
    .boxed()
}

fn new_sqlite_database(ctx: &CommandContext) -> ActionFuture {
    let answer = ctx.workbench.prompt_text(TextPrompt::new(
        "Create SQLite database",
        "New database name",
        "newdb",
    ));
    let workbench = ctx.workbench.clone();
    async move {
        let Some(file) = answer.await else {
            return Ok(());
        };
        let connection = workbench
            .api_call(ApiCall::new(
                "connections/new-sqlite-database",
                json!({ "file": file }),
            ))
            .await?;
        workbench.set_current_database(connection, &format!("{file}.sqlite"));
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::RuntimeConfig;
    use crate::demo;
    use crate::dispatcher::{Dispatcher, OutcomeKind};
    use crate::registry::CommandRegistry;

    fn dispatcher() -> Dispatcher {
        let registry = Arc::new(CommandRegistry::new());
        registry.register_all(commands()).unwrap();
        Dispatcher::new(registry)
    }

    #[test]
    fn test_portal_mode_disables_new_connection() {
        let dispatcher = dispatcher();
        let ctx = demo::context().with_config(RuntimeConfig {
            run_as_portal: true,
        });
        assert_eq!(dispatcher.dispatch("new.connection", &ctx).kind(), OutcomeKind::Disabled);
        assert!(dispatcher
            .dispatch("new.connection", &demo::context())
            .is_invoked());
    }

    #[test]
    fn test_object_commands_follow_engine_type() {
        let dispatcher = dispatcher();
        let none = demo::context();
        let sql = demo::context().with_database(demo::database(&[EngineType::Sql]));
        let kv = demo::context().with_database(demo::database(&[EngineType::KeyValue]));

        for id in ["new.table", "new.collection", "new.dbKey"] {
            assert_eq!(dispatcher.dispatch(id, &none).kind(), OutcomeKind::Disabled);
        }
        assert!(dispatcher.dispatch("new.table", &sql).is_invoked());
        assert_eq!(dispatcher.dispatch("new.collection", &sql).kind(), OutcomeKind::Disabled);
        assert!(dispatcher.dispatch("new.dbKey", &kv).is_invoked());
    }

    #[tokio::test]
    async fn test_archive_folder_prompt_cancel_and_confirm() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();

        dispatcher.dispatch("new.archiveFolder", &ctx).finish().await.unwrap();
        assert_eq!(workbench.calls(), vec!["prompt_text:Create archive folder"]);

        workbench.answer_prompts_with(Some("exports"));
        dispatcher.dispatch("new.archiveFolder", &ctx).finish().await.unwrap();
        assert_eq!(
            workbench.calls().last().unwrap(),
            "api_call:archive/create-folder"
        );
    }

    #[tokio::test]
    async fn test_new_collection_runs_script_then_syncs() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();
        let ctx = ctx.with_database(demo::database(&[EngineType::Document]));
        workbench.answer_prompts_with(Some("orders"));

        dispatcher.dispatch("new.collection", &ctx).finish().await.unwrap();
        assert_eq!(
            workbench.calls(),
            vec![
                "prompt_text:Create collection",
                "api_call:database-connections/run-script",
                "api_call:database-connections/sync-model",
            ]
        );
    }

    #[tokio::test]
    async fn test_new_sqlite_database_selects_it() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();
        workbench.answer_prompts_with(Some("newdb"));

        dispatcher.dispatch("new.sqliteDatabase", &ctx).finish().await.unwrap();
        assert_eq!(
            workbench.calls().last().unwrap(),
            "set_current_database:newdb.sqlite"
        );
    }
}
