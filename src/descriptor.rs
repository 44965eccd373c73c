//! The command descriptor: one registrable, invocable action and its metadata.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::context::CommandContext;
use crate::error::ActionError;
use crate::keymap::KeyText;

// ── Closure shapes ──────────────────────────────────────────────

/// The asynchronous remainder of an action. Whatever the action does
/// synchronously has already happened by the time this is returned.
pub type ActionFuture = BoxFuture<'static, Result<(), ActionError>>;

/// Enablement predicate. Evaluated fresh on every query; must not mutate state.
pub type Predicate = Arc<dyn Fn(&CommandContext) -> bool + Send + Sync>;

pub type Action = Arc<dyn Fn(&CommandContext) -> ActionFuture + Send + Sync>;

/// Dynamic secondary entries (one per installed theme, ...). Never cached.
pub type SubCommandProducer = Arc<dyn Fn(&CommandContext) -> Vec<CommandDescriptor> + Send + Sync>;

/// An already-completed action.
pub fn done() -> ActionFuture {
    futures_util::future::ready(Ok(())).boxed()
}

/// An already-failed action.
pub fn fail(err: ActionError) -> ActionFuture {
    futures_util::future::ready(Err(err)).boxed()
}

// ── CommandDescriptor ───────────────────────────────────────────

#[derive(Clone, Default)]
pub struct CommandDescriptor {
    /// Dot-namespaced primary key, e.g. `new.query`.
    pub id: String,
    /// Menu placement. `None` for pure group anchors.
    pub category: Option<String>,
    pub name: String,
    pub toolbar_name: Option<String>,
    pub menu_name: Option<String>,
    pub icon: Option<String>,
    pub key_text: KeyText,
    /// Chords the focused editor handles natively; the global key handler must
    /// leave them alone.
    pub disable_handle_key_text: Option<KeyText>,
    pub group: Option<String>,
    pub is_group_command: bool,
    pub toolbar: bool,
    pub toolbar_order: Option<i32>,
    pub is_related_to_tab: bool,
    pub test_enabled: Option<Predicate>,
    pub on_click: Option<Action>,
    pub get_sub_commands: Option<SubCommandProducer>,
}

impl CommandDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn toolbar_name(mut self, name: impl Into<String>) -> Self {
        self.toolbar_name = Some(name.into());
        self
    }

    pub fn menu_name(mut self, name: impl Into<String>) -> Self {
        self.menu_name = Some(name.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn key_text(mut self, raw: &str) -> Self {
        self.key_text = KeyText::parse(raw);
        self
    }

    pub fn disable_handle_key_text(mut self, raw: &str) -> Self {
        self.disable_handle_key_text = Some(KeyText::parse(raw));
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Mark as the anchor of its group: label and key text only, no action.
    pub fn group_anchor(mut self) -> Self {
        self.is_group_command = true;
        self
    }

    pub fn toolbar(mut self) -> Self {
        self.toolbar = true;
        self
    }

    pub fn toolbar_order(mut self, order: i32) -> Self {
        self.toolbar = true;
        self.toolbar_order = Some(order);
        self
    }

    pub fn related_to_tab(mut self) -> Self {
        self.is_related_to_tab = true;
        self
    }

    pub fn enabled_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CommandContext) -> bool + Send + Sync + 'static,
    {
        self.test_enabled = Some(Arc::new(predicate));
        self
    }

    pub fn on_click<F>(mut self, action: F) -> Self
    where
        F: Fn(&CommandContext) -> ActionFuture + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(action));
        self
    }

    /// Convenience for actions that finish synchronously.
    pub fn on_click_sync<F>(self, action: F) -> Self
    where
        F: Fn(&CommandContext) + Send + Sync + 'static,
    {
        self.on_click(move |ctx| {
            action(ctx);
            done()
        })
    }

    /// Convenience for actions built from an `async` block.
    pub fn on_click_async<F, Fut>(self, action: F) -> Self
    where
        F: Fn(&CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        self.on_click(move |ctx| action(ctx).boxed())
    }

    pub fn sub_commands<F>(mut self, producer: F) -> Self
    where
        F: Fn(&CommandContext) -> Vec<CommandDescriptor> + Send + Sync + 'static,
    {
        self.get_sub_commands = Some(Arc::new(producer));
        self
    }

    /// Recompute the dynamic sub-command list against `ctx`.
    pub fn sub_command_list(&self, ctx: &CommandContext) -> Vec<CommandDescriptor> {
        self.get_sub_commands
            .as_ref()
            .map_or_else(Vec::new, |producer| producer(ctx))
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("name", &self.name)
            .field("key_text", &self.key_text.raw())
            .field("group", &self.group)
            .field("is_group_command", &self.is_group_command)
            .field("toolbar", &self.toolbar)
            .field("toolbar_order", &self.toolbar_order)
            .field("is_related_to_tab", &self.is_related_to_tab)
            .field("test_enabled", &self.test_enabled.is_some())
            .field("on_click", &self.on_click.is_some())
            .field("get_sub_commands", &self.get_sub_commands.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn test_builder_sets_fields() {
        let desc = CommandDescriptor::new("new.query")
            .category("New")
            .name("Query")
            .toolbar_name("New query")
            .icon("icon file")
            .key_text("Ctrl+Q")
            .toolbar_order(2);

        assert_eq!(desc.id, "new.query");
        assert_eq!(desc.category.as_deref(), Some("New"));
        assert!(desc.toolbar);
        assert_eq!(desc.toolbar_order, Some(2));
        assert_eq!(desc.key_text.raw(), "Ctrl+Q");
        assert!(desc.on_click.is_none());
        assert!(desc.test_enabled.is_none());
    }

    #[tokio::test]
    async fn test_sync_and_async_actions() {
        let ctx = demo::context();
        let sync = CommandDescriptor::new("a").on_click_sync(|_| {});
        sync.on_click.unwrap()(&ctx).await.unwrap();

        let failing = CommandDescriptor::new("b")
            .on_click_async(|_| async { Err(crate::error::AppError::NoEditor) });
        let err = failing.on_click.unwrap()(&ctx).await.unwrap_err();
        assert_eq!(err, crate::error::AppError::NoEditor);
    }

    #[test]
    fn test_sub_commands_are_recomputed() {
        let desc = CommandDescriptor::new("theme.changeTheme").sub_commands(|ctx| {
            ctx.extensions
                .themes
                .iter()
                .map(|t| CommandDescriptor::new(format!("theme.changeTheme.{}", t.class_name)))
                .collect()
        });

        let empty = demo::context();
        assert!(desc.sub_command_list(&empty).is_empty());

        let themed = demo::context().with_themes(vec![demo::theme("Dark", "theme-dark")]);
        let subs = desc.sub_command_list(&themed);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs.first().unwrap().id, "theme.changeTheme.theme-dark");
    }

    #[test]
    fn test_debug_hides_closures() {
        let desc = CommandDescriptor::new("x").enabled_when(|_| true);
        let dbg = format!("{desc:?}");
        assert!(dbg.contains("test_enabled: true"));
        assert!(dbg.contains("on_click: false"));
    }
}
