pub mod catalog;
pub mod contrib;
pub mod handlers;

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::descriptor::CommandDescriptor;
use crate::error::AppError;
use crate::keymap::{KeyChord, KeyText};

// ── CommandRegistry ─────────────────────────────────────────────

/// The authoritative id → descriptor mapping.
///
/// One instance lives for the whole process (owned by [`crate::state::AppState`]),
/// but nothing here is global: tests build their own. Re-registering an id
/// replaces the descriptor in place, so its listing position is the position
/// of the first registration.
///
/// The lock is only held for the duration of a single map operation and never
/// across an await.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<IndexMap<String, Arc<CommandDescriptor>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `descriptor.id`. Overwriting is not an
    /// error; only an empty id is rejected.
    pub fn register(&self, descriptor: CommandDescriptor) -> Result<(), AppError> {
        if descriptor.id.trim().is_empty() {
            return Err(AppError::MissingId);
        }
        let id = descriptor.id.clone();
        let previous = self.commands.write().insert(id.clone(), Arc::new(descriptor));
        if previous.is_some() {
            warn!(command = %id, "Command re-registered, replacing previous descriptor");
        } else {
            debug!(command = %id, "Registered command");
        }
        Ok(())
    }

    /// Register several descriptors, stopping at the first malformed one.
    pub fn register_all(
        &self,
        descriptors: impl IntoIterator<Item = CommandDescriptor>,
    ) -> Result<(), AppError> {
        descriptors.into_iter().try_for_each(|d| self.register(d))
    }

    /// Snapshot of every descriptor in registration order.
    pub fn list(&self) -> Vec<Arc<CommandDescriptor>> {
        self.commands.read().values().cloned().collect()
    }

    /// Direct lookup. No group resolution; see [`crate::dispatcher::Dispatcher::resolve`].
    pub fn lookup(&self, id: &str) -> Option<Arc<CommandDescriptor>> {
        self.commands.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.commands.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }

    // ── Groups ──────────────────────────────────────────────────

    /// Competing members of `group` in registration order, anchors excluded.
    pub fn group_members(&self, group: &str) -> Vec<Arc<CommandDescriptor>> {
        self.commands
            .read()
            .values()
            .filter(|d| !d.is_group_command && d.group.as_deref() == Some(group))
            .cloned()
            .collect()
    }

    /// The anchor carrying the canonical label and key text of `group`.
    pub fn group_anchor(&self, group: &str) -> Option<Arc<CommandDescriptor>> {
        self.commands
            .read()
            .values()
            .find(|d| d.is_group_command && d.group.as_deref() == Some(group))
            .cloned()
    }

    /// Whether any descriptor (anchor or member) carries the `group` tag.
    pub fn has_group(&self, group: &str) -> bool {
        self.commands
            .read()
            .values()
            .any(|d| d.group.as_deref() == Some(group))
    }

    // ── Keys ────────────────────────────────────────────────────

    /// Descriptors claiming `chord`, in registration order. A descriptor that
    /// lists the chord in `disable_handle_key_text` is left to the editor.
    pub fn commands_for_chord(&self, chord: &KeyChord) -> Vec<Arc<CommandDescriptor>> {
        self.commands
            .read()
            .values()
            .filter(|d| d.key_text.contains(chord))
            .filter(|d| {
                !d.disable_handle_key_text
                    .as_ref()
                    .is_some_and(|k| k.contains(chord))
            })
            .cloned()
            .collect()
    }

    /// Key text shown next to a descriptor. Group members without their own
    /// binding inherit the anchor's.
    pub fn display_key_text(&self, descriptor: &CommandDescriptor) -> KeyText {
        if !descriptor.key_text.is_empty() {
            return descriptor.key_text.clone();
        }
        descriptor
            .group
            .as_deref()
            .and_then(|g| self.group_anchor(g))
            .map(|anchor| anchor.key_text.clone())
            .unwrap_or_default()
    }
}
