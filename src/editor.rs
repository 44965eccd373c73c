//! The shape an active editor must have to be driven by editor-hosting commands.
//!
//! Every capability is optional. An editor advertises what it supports through
//! [`Editor::capabilities`]; the default method bodies answer "unsupported" so
//! an implementation only writes the operations it actually has.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::ActionFuture;
use crate::error::AppError;

/// An optional editor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Execute,
    Kill,
    ToggleComment,
    Find,
    Replace,
    Undo,
    Redo,
}

impl Capability {
    pub fn all() -> &'static [Capability] {
        &[
            Self::Execute,
            Self::Kill,
            Self::ToggleComment,
            Self::Find,
            Self::Replace,
            Self::Undo,
            Self::Redo,
        ]
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Execute => "execute",
            Self::Kill => "kill",
            Self::ToggleComment => "toggleComment",
            Self::Find => "find",
            Self::Replace => "replace",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Action future for a capability the editor does not have.
pub fn unsupported(capability: Capability) -> ActionFuture {
    crate::descriptor::fail(AppError::Unsupported {
        capability: capability.to_string(),
    })
}

/// The currently focused document editor (query editor, shell, markdown page, ...).
pub trait Editor: Send + Sync {
    /// Tab component kind, e.g. `"query"` or `"shell"`. Used by contribution
    /// helpers to pick the editor a command family belongs to.
    fn kind(&self) -> &str;

    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    fn execute(&self) -> ActionFuture {
        unsupported(Capability::Execute)
    }

    fn kill(&self) -> ActionFuture {
        unsupported(Capability::Kill)
    }

    /// Whether an execution is in flight. Editors without execution are never busy.
    fn is_busy(&self) -> bool {
        false
    }

    fn can_kill(&self) -> bool {
        false
    }

    fn toggle_comment(&self) -> ActionFuture {
        unsupported(Capability::ToggleComment)
    }

    fn find(&self) -> ActionFuture {
        unsupported(Capability::Find)
    }

    fn replace(&self) -> ActionFuture {
        unsupported(Capability::Replace)
    }

    fn undo(&self) -> ActionFuture {
        unsupported(Capability::Undo)
    }

    fn redo(&self) -> ActionFuture {
        unsupported(Capability::Redo)
    }

    fn can_undo(&self) -> bool {
        false
    }

    fn can_redo(&self) -> bool {
        false
    }
}

// ── Saving ──────────────────────────────────────────────────────

/// How a tab's document is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveMode {
    /// Save in place (prompting for a name the first time).
    Save,
    /// Always prompt for a new name.
    SaveAs,
    /// Write to a file on the local disk (desktop host only).
    SaveToDisk,
}

/// Where a family of editors stores its documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveTarget {
    pub folder: Option<String>,
    pub format: Option<String>,
    pub file_extension: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct Bare;

    impl Editor for Bare {
        fn kind(&self) -> &str {
            "bare"
        }
    }

    #[tokio::test]
    async fn test_missing_capabilities_report_unsupported() {
        let editor = Bare;
        assert!(!editor.supports(Capability::Undo));
        assert!(!editor.is_busy());
        assert!(!editor.can_kill());
        assert!(!editor.can_undo());

        let err = editor.undo().await.unwrap_err();
        assert_eq!(
            err,
            AppError::Unsupported {
                capability: "undo".into()
            }
        );
    }

    #[test]
    fn test_save_mode_wire_names() {
        assert_eq!(serde_json::to_value(SaveMode::SaveAs).unwrap(), "save-as");
        assert_eq!(
            serde_json::to_value(SaveMode::SaveToDisk).unwrap(),
            "save-to-disk"
        );
    }
}
