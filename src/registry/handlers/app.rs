//! `app.*`: host window control and links.

use futures_util::FutureExt;
use serde_json::{json, Value};

use super::{desktop_only, window_action};
use crate::context::CommandContext;
use crate::descriptor::{fail, ActionFuture, CommandDescriptor};
use crate::error::AppError;
use crate::workbench::{ApiCall, WindowAction};

const DOCS_URL: &str = "https://dbgate.org/docs/";
const WEB_URL: &str = "https://dbgate.org";
const ISSUE_URL: &str = "https://github.com/dbgate/dbgate/issues/new";
const SPONSOR_URL: &str = "https://opencollective.com/dbgate";

/// Backend setting that remembers the full-screen state across restarts.
pub const FULLSCREEN_SETTING: &str = "app.fullscreen";

fn window(id: &str, name: &str, action: WindowAction) -> CommandDescriptor {
    CommandDescriptor::new(id)
        .category("Application")
        .name(name)
        .enabled_when(desktop_only)
        .on_click(move |ctx| window_action(ctx, action))
}

fn link(id: &str, name: &str, url: &'static str) -> CommandDescriptor {
    CommandDescriptor::new(id)
        .category("Application")
        .name(name)
        .on_click_sync(move |ctx| ctx.workbench.open_web_link(url))
}

pub fn commands() -> Vec<CommandDescriptor> {
    vec![
        window("app.minimize", "Minimize", WindowAction::Minimize),
        CommandDescriptor::new("app.toggleFullScreen")
            .category("Application")
            .name("Toggle full screen")
            .key_text("F11")
            .enabled_when(desktop_only)
            .on_click(toggle_full_screen),
        window("app.toggleDevTools", "Toggle Dev Tools", WindowAction::DevTools),
        window("app.reload", "Reload", WindowAction::Reload),
        link("app.openDocs", "Documentation", DOCS_URL),
        link("app.openWeb", "Web site", WEB_URL),
        link("app.openIssue", "Report problem or feature request", ISSUE_URL),
        link("app.openSponsoring", "Become sponsor", SPONSOR_URL),
        window("app.zoomIn", "Zoom in", WindowAction::ZoomIn).key_text("Ctrl+="),
        window("app.zoomOut", "Zoom out", WindowAction::ZoomOut).key_text("Ctrl+-"),
        window("app.zoomReset", "Reset zoom", WindowAction::ZoomReset),
    ]
}

/// Flip the persisted full-screen flag, then tell the host.
fn toggle_full_screen(ctx: &CommandContext) -> ActionFuture {
    let Some(host) = ctx.host.clone() else {
        return fail(AppError::NoHost);
    };
    let workbench = ctx.workbench.clone();
    async move {
        let settings = workbench
            .api_call(ApiCall::new("config/get-settings", Value::Null))
            .await?;
        let fullscreen = !settings
            .get(FULLSCREEN_SETTING)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        workbench
            .api_call(ApiCall::new(
                "config/update-settings",
                json!({ FULLSCREEN_SETTING: fullscreen }),
            ))
            .await?;
        host.window_action(if fullscreen {
            WindowAction::FullscreenOn
        } else {
            WindowAction::FullscreenOff
        });
        Ok(())
    }
    .boxed()
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
        registry.register_all(commands()).unwrap();
        Dispatcher::new(registry)
    }

    #[tokio::test]
    async fn test_toggle_full_screen_alternates() {
        let dispatcher = dispatcher();
        let host = Arc::new(RecordingHost::default());
        let (workbench, ctx) = demo::recording_context();
        let ctx = ctx.with_host(host.clone());

        dispatcher.dispatch("app.toggleFullScreen", &ctx).finish().await.unwrap();
        assert_eq!(workbench.backend_settings()[FULLSCREEN_SETTING], true);
        dispatcher.dispatch("app.toggleFullScreen", &ctx).finish().await.unwrap();
        assert_eq!(workbench.backend_settings()[FULLSCREEN_SETTING], false);

        assert_eq!(
            host.calls(),
            vec!["window-action:fullscreen-on", "window-action:fullscreen-off"]
        );
    }

    #[tokio::test]
    async fn test_zoom_keys_and_browser_mode() {
        let dispatcher = dispatcher();
        assert_eq!(
            dispatcher.dispatch("app.zoomIn", &demo::context()).kind(),
            OutcomeKind::Disabled
        );

        let host = Arc::new(RecordingHost::default());
        let ctx = demo::context().with_host(host.clone());
        let zoom_out: crate::keymap::KeyChord = "Ctrl+-".parse().unwrap();
        dispatcher.dispatch_key(&zoom_out, &ctx).finish().await.unwrap();
        assert_eq!(host.calls(), vec!["window-action:zoomout"]);
    }

    #[tokio::test]
    async fn test_links_work_without_host() {
        let dispatcher = dispatcher();
        let (workbench, ctx) = demo::recording_context();
        dispatcher.dispatch("app.openIssue", &ctx).finish().await.unwrap();
        assert_eq!(workbench.calls(), vec![format!("open_web_link:{ISSUE_URL}")]);
    }
}
