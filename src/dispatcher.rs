//! Resolve-then-invoke. This is the single dispatch point for every surface
//! (menus, toolbar, key handler, command bus, HTTP bridge, CLI).

use std::future::IntoFuture;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::context::CommandContext;
use crate::descriptor::{ActionFuture, CommandDescriptor};
use crate::error::ActionError;
use crate::keymap::KeyChord;
use crate::registry::CommandRegistry;

// ── Outcomes ────────────────────────────────────────────────────

/// Why nothing was invoked. Never an error: stale UI and early host events
/// are expected to hit these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unavailable {
    /// The command (or every member of the group) is currently disabled.
    Disabled,
    /// No descriptor and no group answers to the id.
    Unknown,
}

/// Wire form of a [`DispatchOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-export", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Invoked,
    Disabled,
    Unknown,
}

#[must_use = "an invoked action's failure is only observable through the pending action"]
pub enum DispatchOutcome {
    Invoked(PendingAction),
    Unavailable(Unavailable),
}

impl DispatchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Invoked(_) => OutcomeKind::Invoked,
            Self::Unavailable(Unavailable::Disabled) => OutcomeKind::Disabled,
            Self::Unavailable(Unavailable::Unknown) => OutcomeKind::Unknown,
        }
    }

    pub fn is_invoked(&self) -> bool {
        matches!(self, Self::Invoked(_))
    }

    pub fn into_pending(self) -> Option<PendingAction> {
        match self {
            Self::Invoked(pending) => Some(pending),
            Self::Unavailable(_) => None,
        }
    }

    /// Await the action if one was invoked. Unavailable outcomes complete
    /// immediately with `Ok`.
    pub async fn finish(self) -> Result<OutcomeKind, ActionError> {
        let kind = self.kind();
        if let Some(pending) = self.into_pending() {
            pending.await?;
        }
        Ok(kind)
    }
}

impl std::fmt::Debug for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invoked(pending) => f.debug_tuple("Invoked").field(&pending.id).finish(),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// The asynchronous remainder of an invoked action. Await it to observe
/// completion or failure, or [`detach`](PendingAction::detach) it.
#[must_use = "await the action or detach it"]
pub struct PendingAction {
    id: String,
    future: ActionFuture,
}

impl PendingAction {
    /// Id of the descriptor that actually ran (the group member, for group dispatch).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the action to completion on the current tokio runtime, logging a
    /// failure instead of returning it. Without a runtime the action is dropped.
    pub fn detach(self) -> Option<tokio::task::JoinHandle<()>> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(command = %self.id, "No async runtime, dropping pending action");
            return None;
        };
        let Self { id, future } = self;
        Some(handle.spawn(async move {
            if let Err(e) = future.await {
                error!(command = %id, error = %e, "Command action failed");
            }
        }))
    }
}

impl IntoFuture for PendingAction {
    type Output = Result<(), ActionError>;
    type IntoFuture = ActionFuture;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

// ── Enablement ──────────────────────────────────────────────────

/// Evaluate a descriptor's predicate against `ctx`. No predicate means enabled;
/// a panicking predicate counts as disabled for this query.
pub fn is_enabled(descriptor: &CommandDescriptor, ctx: &CommandContext) -> bool {
    let Some(predicate) = descriptor.test_enabled.as_ref() else {
        return true;
    };
    match catch_unwind(AssertUnwindSafe(|| predicate(ctx))) {
        Ok(enabled) => enabled,
        Err(_) => {
            warn!(command = %descriptor.id, "Enablement predicate panicked, treating as disabled");
            false
        }
    }
}

/// Whether `descriptor` has an action and its predicate passes.
pub fn is_runnable(descriptor: &CommandDescriptor, ctx: &CommandContext) -> bool {
    descriptor.on_click.is_some() && is_enabled(descriptor, ctx)
}

/// First runnable member of `group` in registration order.
pub fn effective_member(
    registry: &CommandRegistry,
    group: &str,
    ctx: &CommandContext,
) -> Option<Arc<CommandDescriptor>> {
    registry
        .group_members(group)
        .into_iter()
        .find(|member| is_runnable(member, ctx))
}

// ── Dispatcher ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Find the descriptor `id` would run.
    ///
    /// A non-anchor descriptor resolves to itself, enabled or not. An anchor id
    /// or a bare group tag resolves to the first runnable group member.
    pub fn resolve(
        &self,
        id: &str,
        ctx: &CommandContext,
    ) -> Result<Arc<CommandDescriptor>, Unavailable> {
        let group = match self.registry.lookup(id) {
            Some(desc) if !desc.is_group_command => return Ok(desc),
            Some(anchor) => anchor.group.clone().ok_or(Unavailable::Disabled)?,
            None if self.registry.has_group(id) => id.to_string(),
            None => return Err(Unavailable::Unknown),
        };

        let member = effective_member(&self.registry, &group, ctx);
        match &member {
            Some(m) => debug!(requested = %id, group = %group, resolved = %m.id, "Resolved group"),
            None => debug!(requested = %id, group = %group, "No enabled group member"),
        }
        member.ok_or(Unavailable::Disabled)
    }

    /// Resolve `id`, re-check enablement, and invoke.
    pub fn dispatch(&self, id: &str, ctx: &CommandContext) -> DispatchOutcome {
        match self.resolve(id, ctx) {
            Ok(desc) => invoke(&desc, ctx),
            Err(Unavailable::Unknown) => {
                warn!(command = %id, "Dispatch of unknown command");
                DispatchOutcome::Unavailable(Unavailable::Unknown)
            }
            Err(reason) => {
                debug!(command = %id, "Command unavailable");
                DispatchOutcome::Unavailable(reason)
            }
        }
    }

    /// Invoke one of the dynamic sub-commands of `parent_id`, recomputed now.
    pub fn dispatch_sub(
        &self,
        parent_id: &str,
        sub_id: &str,
        ctx: &CommandContext,
    ) -> DispatchOutcome {
        let Some(parent) = self.registry.lookup(parent_id) else {
            warn!(command = %parent_id, "Sub-command dispatch on unknown command");
            return DispatchOutcome::Unavailable(Unavailable::Unknown);
        };
        match parent
            .sub_command_list(ctx)
            .into_iter()
            .find(|sub| sub.id == sub_id)
        {
            Some(sub) => invoke(&sub, ctx),
            None => {
                warn!(command = %parent_id, sub = %sub_id, "Unknown sub-command");
                DispatchOutcome::Unavailable(Unavailable::Unknown)
            }
        }
    }

    /// Dispatch the first command claiming `chord` whose effective descriptor
    /// is runnable.
    pub fn dispatch_key(&self, chord: &KeyChord, ctx: &CommandContext) -> DispatchOutcome {
        let candidates = self.registry.commands_for_chord(chord);
        if candidates.is_empty() {
            debug!(chord = %chord, "No command bound to chord");
            return DispatchOutcome::Unavailable(Unavailable::Unknown);
        }

        for candidate in candidates {
            let effective = if candidate.is_group_command {
                candidate
                    .group
                    .as_deref()
                    .and_then(|g| effective_member(&self.registry, g, ctx))
            } else {
                Some(candidate).filter(|d| is_runnable(d, ctx))
            };
            if let Some(desc) = effective {
                debug!(chord = %chord, command = %desc.id, "Key resolved");
                return invoke(&desc, ctx);
            }
        }
        DispatchOutcome::Unavailable(Unavailable::Disabled)
    }
}

/// Check-then-act with nothing in between: the predicate is evaluated and the
/// action started within the same synchronous call.
fn invoke(desc: &CommandDescriptor, ctx: &CommandContext) -> DispatchOutcome {
    if !is_enabled(desc, ctx) {
        return DispatchOutcome::Unavailable(Unavailable::Disabled);
    }
    let Some(action) = desc.on_click.as_ref() else {
        return DispatchOutcome::Unavailable(Unavailable::Disabled);
    };
    debug!(command = %desc.id, "Invoking command");
    DispatchOutcome::Invoked(PendingAction {
        id: desc.id.clone(),
        future: action(ctx),
    })
}
