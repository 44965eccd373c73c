use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::dispatcher::{DispatchOutcome, OutcomeKind};
use crate::error::AppError;
use crate::registry::catalog;
use crate::state::AppState;

// ── Response types ───────────────────────────────────────────────

#[derive(Serialize)]
struct ApiOk<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct ApiErr {
    ok: bool,
    error: String,
}

fn ok_json<T: Serialize>(data: T) -> impl IntoResponse {
    Json(ApiOk { ok: true, data })
}

fn err_json(status: StatusCode, msg: String) -> impl IntoResponse {
    (status, Json(ApiErr { ok: false, error: msg }))
}

/// Body of a dispatch response.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-export", ts(export))]
pub struct DispatchResponse {
    pub outcome: OutcomeKind,
}

// ── Handlers ─────────────────────────────────────────────────────

async fn get_palette(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let ctx = state.snapshot();
    ok_json(catalog::palette(&state.registry, &ctx))
}

async fn get_toolbar(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let ctx = state.snapshot();
    ok_json(catalog::toolbar(&state.registry, &ctx))
}

async fn get_menu(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let ctx = state.snapshot();
    ok_json(catalog::menu(&state.registry, &ctx))
}

async fn get_schema() -> impl IntoResponse {
    ok_json(catalog::listing_schema())
}

/// Await the invoked action so the caller sees its failure.
async fn respond(id: &str, outcome: DispatchOutcome) -> axum::response::Response {
    match outcome.finish().await {
        Ok(outcome) => {
            info!(source = "http", command = %id, outcome = ?outcome, "Dispatched");
            ok_json(DispatchResponse { outcome }).into_response()
        }
        Err(e) => {
            error!(source = "http", command = %id, error = %e, "Command action failed");
            err_json(StatusCode::INTERNAL_SERVER_ERROR, e.into()).into_response()
        }
    }
}

async fn post_command(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let outcome = state.dispatch(&id);
    respond(&id, outcome).await
}

async fn post_sub_command(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, sub)): Path<(String, String)>,
) -> impl IntoResponse {
    let outcome = state
        .dispatcher
        .dispatch_sub(&id, &sub, &state.snapshot());
    respond(&sub, outcome).await
}

// ── Server startup ───────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/commands", get(get_palette))
        .route("/api/commands/toolbar", get(get_toolbar))
        .route("/api/commands/menu", get(get_menu))
        .route("/api/commands/schema", get(get_schema))
        .route("/api/commands/run/{id}", post(post_command))
        .route("/api/commands/run/{id}/sub/{sub}", post(post_sub_command))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

/// Start the HTTP bridge on `127.0.0.1`, on `port` or a random free port.
/// Returns the bound port, which is also recorded in the state and the
/// config directory.
pub async fn start_api_server(state: Arc<AppState>, port: Option<u16>) -> Result<u16, AppError> {
    let app = router(Arc::clone(&state));

    let addr = SocketAddr::from(([127, 0, 0, 1], port.unwrap_or(0)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Api {
            message: format!("Failed to bind API server: {e}"),
        })?;
    let port = listener
        .local_addr()
        .map_err(|e| AppError::Api {
            message: format!("Failed to get API server port: {e}"),
        })?
        .port();

    state.api_port.store(port, Ordering::Relaxed);
    let port_file = crate::paths::api_port_path(&state.app_config_dir);
    if let Err(e) = std::fs::create_dir_all(&state.app_config_dir)
        .map_err(AppError::from)
        .and_then(|()| crate::persist::atomic_write(&port_file, port.to_string().as_bytes()))
    {
        warn!(path = %port_file.display(), error = %e, "Could not record API port");
    }
    info!(port, "HTTP bridge listening");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server error");
        }
    });

    Ok(port)
}
