use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

use command_hub::bus::{BusHandle, CommandBus};
use command_hub::context::{DatabaseRef, EngineType, Extensions};
use command_hub::demo::{self, RecordingHost, RecordingWorkbench};
use command_hub::dispatcher::{DispatchOutcome, OutcomeKind};
use command_hub::error::AppError;
use command_hub::keymap::KeyChord;
use command_hub::registry::catalog::{self, CommandListing};
use command_hub::settings::{self, HubSettings};
use command_hub::state::AppState;
use command_hub::workbench::HostWindow;
use command_hub::{events, logging, paths};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "command-hub", about = "Command registry and dispatch CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config directory override
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log filter directive (overrides settings; RUST_LOG overrides both)
    #[arg(long, global = true)]
    log: Option<String>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List commands with their current enablement
    List {
        /// Toolbar commands in toolbar order
        #[arg(long, conflicts_with = "menu")]
        toolbar: bool,
        /// Commands grouped into menu sections
        #[arg(long)]
        menu: bool,
        #[command(flatten)]
        ambient: AmbientArgs,
    },
    /// Dispatch a command by id (or group name)
    Run {
        id: String,
        /// Dispatch this dynamic sub-command of <ID> instead
        #[arg(long)]
        sub: Option<String>,
        #[command(flatten)]
        ambient: AmbientArgs,
    },
    /// Dispatch the command bound to each key chord, in order
    Key {
        #[arg(required = true)]
        chords: Vec<String>,
        #[command(flatten)]
        ambient: AmbientArgs,
    },
    /// Print the JSON schema of a command listing
    Schema,
    /// Run the command bus on stdin (one id per line) and the HTTP bridge
    Serve {
        /// HTTP port (default: settings, then a random free port)
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        ambient: AmbientArgs,
    },
    /// Show the settings file
    Settings,
}

/// Ambient state to simulate for one invocation.
#[derive(Args, Default)]
struct AmbientArgs {
    /// Open a demo editor of this kind (e.g. "query", "shell")
    #[arg(long)]
    editor: Option<String>,
    /// Select a demo database supporting these engine types (comma separated)
    #[arg(long, value_delimiter = ',')]
    database: Vec<String>,
    /// Run as if inside the desktop host
    #[arg(long)]
    desktop: bool,
}

// ── State setup ──────────────────────────────────────────────────

struct Session {
    state: Arc<AppState>,
    workbench: Arc<RecordingWorkbench>,
    host: Arc<RecordingHost>,
}

fn initialize(config_dir: PathBuf, settings: HubSettings) -> Session {
    let workbench = Arc::new(RecordingWorkbench::new());
    let state = AppState::new(config_dir, settings, workbench.clone());
    if let Err(e) = state.register_standard_commands() {
        eprintln!("Failed to register standard commands: {e}");
        process::exit(1);
    }
    if let Err(e) = demo::register_demo_features(&state.registry) {
        eprintln!("Failed to register demo features: {e}");
        process::exit(1);
    }
    state.with_ambient_mut(|a| {
        a.extensions = Arc::new(Extensions {
            themes: vec![
                demo::theme("Light", "theme-light"),
                demo::theme("Dark", "theme-dark"),
            ],
            default_file_format: Some("text".to_string()),
        });
    });
    Session {
        state,
        workbench,
        host: Arc::new(RecordingHost::default()),
    }
}

fn apply_ambient(session: &Session, args: &AmbientArgs) {
    let engine_types: Vec<EngineType> = args
        .database
        .iter()
        .map(|s| {
            s.parse().unwrap_or_else(|e: String| {
                eprintln!("Error: {e}");
                process::exit(2);
            })
        })
        .collect();

    session.state.with_ambient_mut(|a| {
        a.editor = args.editor.as_deref().map(demo::editor);
        a.database = (!engine_types.is_empty()).then(|| DatabaseRef {
            engine_types,
            ..demo::database(&[])
        });
        a.host = args
            .desktop
            .then(|| Arc::clone(&session.host) as Arc<dyn HostWindow>);
    });
}

// ── Output formatting ────────────────────────────────────────────

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_listing(commands: &[CommandListing], indent: &str) {
    for c in commands {
        let mark = if c.enabled { ' ' } else { '-' };
        let keys = c.key_text.as_deref().unwrap_or("");
        println!("{indent}{mark} {:<32} {:<36} {keys}", c.id, c.palette_label);
        print_listing(&c.sub_commands, &format!("{indent}    "));
    }
}

/// Settle every dispatch, then report outcomes and the recorded side effects.
async fn report(session: &Session, dispatched: Vec<(String, DispatchOutcome)>, raw_json: bool) {
    let mut results = Vec::new();
    let mut failed = false;
    for (label, outcome) in dispatched {
        let ran = match &outcome {
            DispatchOutcome::Invoked(pending) => Some(pending.id().to_string()),
            DispatchOutcome::Unavailable(_) => None,
        };
        let (kind, error) = match outcome.finish().await {
            Ok(kind) => (kind, None),
            Err(e) => {
                failed = true;
                (OutcomeKind::Invoked, Some(e.to_string()))
            }
        };
        results.push(json!({ "request": label, "ran": ran, "outcome": kind, "error": error }));
    }

    if raw_json {
        print_json(&json!({
            "results": results,
            "workbench": session.workbench.calls(),
            "host": session.host.calls(),
        }));
    } else {
        for r in &results {
            println!(
                "{} -> {}",
                r["request"].as_str().unwrap_or(""),
                r["outcome"].as_str().unwrap_or("")
            );
            if let Some(e) = r["error"].as_str() {
                println!("  error: {e}");
            }
        }
        for call in session.workbench.calls() {
            println!("  workbench  {call}");
        }
        for call in session.host.calls() {
            println!("  host       {call}");
        }
    }
    if failed {
        process::exit(1);
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.unwrap_or_else(paths::default_config_dir);

    let loaded = settings::load_or_default(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load settings: {e}");
        process::exit(1);
    });
    let filter = cli.log.clone().or_else(|| loaded.log_filter.clone());
    if let Err(e) = logging::init_logging(filter.as_deref()) {
        eprintln!("{e}");
    }

    match cli.command {
        Commands::List {
            toolbar,
            menu,
            ambient,
        } => {
            let session = initialize(config_dir, loaded);
            apply_ambient(&session, &ambient);
            let ctx = session.state.snapshot();
            let registry = &session.state.registry;
            if menu {
                let sections = catalog::menu(registry, &ctx);
                if cli.json {
                    print_json(&serde_json::to_value(&sections).unwrap_or_default());
                } else {
                    for section in &sections {
                        println!("{}", section.category);
                        print_listing(&section.commands, "  ");
                    }
                }
            } else {
                let listing = if toolbar {
                    catalog::toolbar(registry, &ctx)
                } else {
                    catalog::palette(registry, &ctx)
                };
                if cli.json {
                    print_json(&serde_json::to_value(&listing).unwrap_or_default());
                } else {
                    print_listing(&listing, "");
                }
            }
        }
        Commands::Run { id, sub, ambient } => {
            let session = initialize(config_dir, loaded);
            apply_ambient(&session, &ambient);
            let outcome = match &sub {
                Some(sub) => {
                    session
                        .state
                        .dispatcher
                        .dispatch_sub(&id, sub, &session.state.snapshot())
                }
                None => session.state.dispatch(&id),
            };
            let label = sub.unwrap_or(id);
            report(&session, vec![(label, outcome)], cli.json).await;
        }
        Commands::Key { chords, ambient } => {
            let session = initialize(config_dir, loaded);
            apply_ambient(&session, &ambient);
            let dispatched = chords
                .into_iter()
                .map(|text| {
                    let chord: KeyChord = text.parse().unwrap_or_else(|e: String| {
                        eprintln!("Error: {e}");
                        process::exit(2);
                    });
                    let outcome = session.state.dispatch_key(&chord);
                    (chord.to_string(), outcome)
                })
                .collect();
            report(&session, dispatched, cli.json).await;
        }
        Commands::Schema => print_json(&catalog::listing_schema()),
        Commands::Serve { port, ambient } => {
            let port = port.or(loaded.api_port);
            let session = initialize(config_dir, loaded);
            apply_ambient(&session, &ambient);
            serve(&session, port).await;
        }
        Commands::Settings => {
            let path = paths::settings_path(&config_dir);
            if cli.json {
                print_json(&serde_json::to_value(&loaded).unwrap_or_default());
            } else {
                println!("Settings file: {}", path.display());
                println!("  toolbar visible: {}", loaded.toolbar_visible);
                println!("  permissions:     {}", loaded.permissions.join(", "));
                println!("  run as portal:   {}", loaded.run_as_portal);
                println!(
                    "  log filter:      {}",
                    loaded.log_filter.as_deref().unwrap_or("(default)")
                );
                println!(
                    "  api port:        {}",
                    loaded.api_port.map_or_else(|| "(random)".to_string(), |p| p.to_string())
                );
            }
        }
    }
}

// ── Serve mode ──────────────────────────────────────────────────

/// Send one stdin line to the bus as a `run-command` event. Blank lines are skipped.
fn forward_line(handle: &BusHandle, line: &str) -> Result<(), AppError> {
    let id = line.trim();
    if !id.is_empty() {
        handle.host_event(events::RUN_COMMAND, &Value::String(id.to_string()))?;
    }
    Ok(())
}

/// Feed stdin lines to the command bus as `run-command` host events until
/// Ctrl+C. The HTTP bridge shares the same state.
async fn serve(session: &Session, port: Option<u16>) {
    #[cfg(feature = "http-api")]
    {
        match command_hub::api::start_api_server(Arc::clone(&session.state), port).await {
            Ok(port) => eprintln!("HTTP bridge on http://127.0.0.1:{port}/api/commands"),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    }
    #[cfg(not(feature = "http-api"))]
    if port.is_some() {
        eprintln!("Built without the http-api feature; ignoring --port");
    }

    let (bus, handle) = CommandBus::new(Arc::clone(&session.state));
    let bus_task = tokio::spawn(bus.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if let Err(e) = forward_line(&handle, &line) {
                        eprintln!("{e}");
                        break;
                    }
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    let _ = handle.shutdown();
    if let Ok(stats) = bus_task.await {
        eprintln!("Bus: {} invoked, {} unavailable", stats.invoked, stats.unavailable);
    }
    for call in session.workbench.calls() {
        eprintln!("  workbench  {call}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_line_stops_on_closed_bus() {
        let session = initialize(std::env::temp_dir().join("command_hub_test_cli"), HubSettings::default());
        let (bus, handle) = CommandBus::new(Arc::clone(&session.state));

        forward_line(&handle, "about.show").unwrap();
        forward_line(&handle, "   ").unwrap();
        drop(bus);
        assert_eq!(forward_line(&handle, "about.show"), Err(AppError::BusClosed));
        assert_eq!(forward_line(&handle, ""), Ok(()));
    }
}
