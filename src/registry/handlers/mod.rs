//! The application's standard command set, grouped by menu category.

pub mod app;
pub mod file;
pub mod general;
pub mod new;

use futures_util::FutureExt;
use serde_json::Value;
use tracing::warn;

use super::CommandRegistry;
use crate::context::{CommandContext, Permissions};
use crate::descriptor::{fail, ActionFuture};
use crate::error::AppError;
use crate::settings::SETTINGS_CHANGE;
use crate::workbench::{ApiCall, HostWindow, WindowAction};

/// What is known at registration time. Some commands only exist for
/// sufficiently privileged users.
#[derive(Debug, Clone, Default)]
pub struct StartupEnv {
    pub permissions: Permissions,
}

/// Register every standard command, in menu order.
pub fn register_standard_commands(
    registry: &CommandRegistry,
    env: &StartupEnv,
) -> Result<(), AppError> {
    registry.register_all(general::leading())?;
    registry.register_all(new::commands())?;
    registry.register_all(general::tabs())?;
    registry.register_all(file::group_anchors())?;
    registry.register_all(file::commands())?;
    registry.register_all(general::view_and_sql())?;
    if env.permissions.has(SETTINGS_CHANGE) {
        registry.register_all(general::settings())?;
    }
    registry.register_all(file::exit())?;
    registry.register_all(app::commands())?;
    tracing::info!(count = registry.len(), "Standard commands registered");
    Ok(())
}

// ── Shared action helpers ───────────────────────────────────────

/// Enabled only inside a desktop host.
pub(crate) fn desktop_only(ctx: &CommandContext) -> bool {
    ctx.host.is_some()
}

pub(crate) fn with_host(
    ctx: &CommandContext,
    act: impl FnOnce(&dyn HostWindow) -> ActionFuture,
) -> ActionFuture {
    match ctx.host.as_deref() {
        Some(host) => act(host),
        None => fail(AppError::NoHost),
    }
}

pub(crate) fn window_action(ctx: &CommandContext, action: WindowAction) -> ActionFuture {
    with_host(ctx, |host| {
        host.window_action(action);
        crate::descriptor::done()
    })
}

/// Fire a backend call without waiting on it, the way the UI does for
/// requests whose result is picked up by change notifications. A failure is
/// logged, not returned.
pub(crate) fn api_call_detached(ctx: &CommandContext, route: &str, body: Value) -> ActionFuture {
    let call = ctx.workbench.api_call(ApiCall::new(route, body));
    let route = route.to_string();
    async move {
        tokio::spawn(async move {
            if let Err(e) = call.await {
                warn!(route = %route, error = %e, "Backend call failed");
            }
        });
        Ok(())
    }
    .boxed()
}
