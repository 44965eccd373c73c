//! Event names exchanged with the desktop host process.

/// Host → hub: run the command whose id is the payload.
pub const RUN_COMMAND: &str = "run-command";
/// Hub → host: a [`crate::workbench::WindowAction`] as payload.
pub const WINDOW_ACTION: &str = "window-action";
/// Hub → host: close the main window.
pub const CLOSE_WINDOW: &str = "close-window";
/// Host → hub: stop the command bus.
pub const SHUTDOWN: &str = "shutdown";

pub const ALL: &[&str] = &[RUN_COMMAND, WINDOW_ACTION, CLOSE_WINDOW, SHUTDOWN];
