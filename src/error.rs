use serde::Serialize;
use thiserror::Error;

/// Structured error type for the command hub. Serialized with a `code` tag so
/// out-of-process hosts can match on error codes and display appropriate UI.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-export", ts(export))]
#[serde(tag = "code", content = "detail")]
pub enum AppError {
    /// A descriptor was registered without an id. Always a feature-module bug.
    #[error("Command descriptor registered without an id")]
    MissingId,
    #[error("{what} not found")]
    NotFound { what: String },
    /// The current editor does not implement the requested capability.
    #[error("Editor does not support {capability}")]
    Unsupported { capability: String },
    #[error("No editor is active")]
    NoEditor,
    #[error("No database is selected")]
    NoDatabase,
    #[error("Not running inside a desktop host")]
    NoHost,
    #[error("I/O error: {message}")]
    Io { message: String },
    #[error("JSON error: {message}")]
    Json { message: String },
    #[error("API error: {message}")]
    Api { message: String },
    #[error("Failed to save settings: {message}")]
    Settings { message: String },
    #[error("Command bus is closed")]
    BusClosed,
}

/// Failure raised by a command action. Actions share the application error type;
/// the dispatcher hands these back to whoever awaits the action.
pub type ActionError = AppError;

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json {
            message: e.to_string(),
        }
    }
}

/// Allow converting AppError to String for the CLI and HTTP bridge.
impl From<AppError> for String {
    fn from(e: AppError) -> String {
        e.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_code_tag() {
        let json = serde_json::to_value(AppError::Unsupported {
            capability: "undo".into(),
        })
        .unwrap();
        assert_eq!(json["code"], "Unsupported");
        assert_eq!(json["detail"]["capability"], "undo");

        let unit = serde_json::to_value(AppError::NoEditor).unwrap();
        assert_eq!(unit["code"], "NoEditor");
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            AppError::NotFound { what: "Command 'x'".into() }.to_string(),
            "Command 'x' not found"
        );
        let io: AppError = std::io::Error::other("disk gone").into();
        assert_eq!(io.to_string(), "I/O error: disk gone");
    }
}
