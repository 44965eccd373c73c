//! External command bus: host-process events enter the same dispatch path as
//! every local surface.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dispatcher::DispatchOutcome;
use crate::error::AppError;
use crate::events;
use crate::keymap::KeyChord;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    Run { id: String },
    Key { chord: KeyChord },
    Shutdown,
}

impl BusMessage {
    /// Translate a raw host event. Unrecognised events are ignored.
    pub fn from_host_event(event: &str, payload: &Value) -> Option<Self> {
        match event {
            events::RUN_COMMAND => payload.as_str().map(|id| Self::Run { id: id.to_string() }),
            events::SHUTDOWN => Some(Self::Shutdown),
            _ => None,
        }
    }
}

/// Cloneable sender side of a [`CommandBus`].
#[derive(Clone)]
pub struct BusHandle {
    tx: mpsc::UnboundedSender<BusMessage>,
}

impl BusHandle {
    pub fn send(&self, message: BusMessage) -> Result<(), AppError> {
        self.tx.send(message).map_err(|_| AppError::BusClosed)
    }

    pub fn run_command(&self, id: &str) -> Result<(), AppError> {
        self.send(BusMessage::Run { id: id.to_string() })
    }

    pub fn shutdown(&self) -> Result<(), AppError> {
        self.send(BusMessage::Shutdown)
    }

    /// Forward a raw host event; returns whether it was recognised.
    pub fn host_event(&self, event: &str, payload: &Value) -> Result<bool, AppError> {
        match BusMessage::from_host_event(event, payload) {
            Some(message) => self.send(message).map(|()| true),
            None => {
                debug!(event, "Ignoring host event");
                Ok(false)
            }
        }
    }
}

/// Counters reported when the bus stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    pub invoked: usize,
    pub unavailable: usize,
}

pub struct CommandBus {
    state: Arc<AppState>,
    rx: mpsc::UnboundedReceiver<BusMessage>,
}

impl CommandBus {
    pub fn new(state: Arc<AppState>) -> (Self, BusHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { state, rx }, BusHandle { tx })
    }

    /// Process messages until `Shutdown` or until every handle is dropped.
    /// Invoked actions are detached onto the runtime; their failures are logged.
    pub async fn run(mut self) -> BusStats {
        let mut stats = BusStats::default();
        let mut shutdown = false;
        while let Some(message) = self.rx.recv().await {
            let (label, outcome) = match message {
                BusMessage::Run { id } => {
                    let outcome = self.state.dispatch(&id);
                    (id, outcome)
                }
                BusMessage::Key { chord } => {
                    let outcome = self.state.dispatch_key(&chord);
                    (chord.to_string(), outcome)
                }
                BusMessage::Shutdown => {
                    shutdown = true;
                    break;
                }
            };
            info!(source = "bus", command = %label, outcome = ?outcome.kind(), "Dispatched");
            match outcome {
                DispatchOutcome::Invoked(pending) => {
                    stats.invoked += 1;
                    let _ = pending.detach();
                }
                DispatchOutcome::Unavailable(_) => stats.unavailable += 1,
            }
        }
        if !shutdown {
            warn!("All command bus senders dropped");
        }
        info!(invoked = stats.invoked, unavailable = stats.unavailable, "Command bus stopped");
        stats
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::demo;
    use crate::settings::HubSettings;

    fn state() -> (Arc<demo::RecordingWorkbench>, Arc<AppState>) {
        let workbench = Arc::new(demo::RecordingWorkbench::new());
        let state = AppState::new(std::env::temp_dir(), HubSettings::default(), workbench.clone());
        state.register_standard_commands().unwrap();
        (workbench, state)
    }

    #[tokio::test]
    async fn test_bus_dispatches_through_single_entry_point() {
        let (workbench, state) = state();
        let (bus, handle) = CommandBus::new(Arc::clone(&state));
        let task = tokio::spawn(bus.run());

        handle.run_command("about.show").unwrap();
        handle.run_command("nonexistent.id").unwrap();
        handle.run_command("toolbar.show").unwrap(); // toolbar already visible
        handle
            .send(BusMessage::Key {
                chord: "Ctrl+Q".parse().unwrap(),
            })
            .unwrap();
        handle.shutdown().unwrap();

        let stats = task.await.unwrap();
        assert_eq!(stats, BusStats { invoked: 2, unavailable: 2 });
        assert_eq!(workbench.calls(), vec!["show_modal:about", "open_tab:QueryTab"]);
    }

    #[tokio::test]
    async fn test_host_events_are_translated() {
        let (workbench, state) = state();
        let (bus, handle) = CommandBus::new(state);
        let task = tokio::spawn(bus.run());

        assert!(handle.host_event(events::RUN_COMMAND, &json!("about.show")).unwrap());
        assert!(!handle.host_event("focus-changed", &Value::Null).unwrap());
        assert!(!handle.host_event(events::RUN_COMMAND, &json!(42)).unwrap());
        drop(handle);

        let stats = task.await.unwrap();
        assert_eq!(stats.invoked, 1);
        assert_eq!(workbench.calls(), vec!["show_modal:about"]);
    }

    #[tokio::test]
    async fn test_closed_bus_reports_error() {
        let (_, state) = state();
        let (bus, handle) = CommandBus::new(state);
        drop(bus);
        assert_eq!(handle.run_command("about.show"), Err(AppError::BusClosed));
    }
}
