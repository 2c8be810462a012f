//! Local control endpoint.
//!
//! `POST /api/refresh` runs the external scraper for one scope and reports how
//! it went. Only exists in local development; deployed builds never call it.

use crate::config::AppConfig;
use crate::models::Scope;
use anyhow::{anyhow, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::process::Command;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

pub const DEFAULT_PORT: u16 = 3050;

/// How to launch the scraper. `--force --scope <scope>` is appended per run.
#[derive(Debug, Clone)]
pub struct ScraperCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl ScraperCommand {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            program: config.scraper_program.clone(),
            args: vec![config.scraper_script.to_string_lossy().into_owned()],
            working_dir: None,
        }
    }

    /// Run to completion. Returns stdout on a zero exit status.
    pub async fn run(&self, scope: Scope) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg("--force").arg("--scope").arg(scope.as_str());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| anyhow!("Failed to start '{}': {}", self.program, e))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::warn!(%scope, "Scraper stderr: {}", stderr.trim());
        }

        if !output.status.success() {
            return Err(anyhow!("Scraper exited with {}", output.status));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub struct ControlState {
    scraper: ScraperCommand,
    // One scraper at a time; they all write the same snapshot file
    running: Mutex<()>,
}

impl ControlState {
    pub fn new(scraper: ScraperCommand) -> Self {
        Self {
            scraper,
            running: Mutex::new(()),
        }
    }
}

pub fn router(state: Arc<ControlState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/refresh", post(handle_refresh).fallback(not_found))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

/// Bind `host:port` and serve until the process exits.
pub async fn start(host: &str, port: u16, state: Arc<ControlState>) -> Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    tracing::info!("Server running at http://{}:{}/", host, port);
    serve(listener, state).await
}

pub async fn serve(listener: TcpListener, state: Arc<ControlState>) -> Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Empty or unparsable bodies mean the default scope; a named but unknown scope is an error.
fn scope_from_body(body: &[u8]) -> Result<Scope> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Scope::default());
    }

    let parsed: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Error parsing request body, using default scope: {}", e);
            return Ok(Scope::default());
        }
    };

    match parsed.get("scope") {
        None | Some(Value::Null) => Ok(Scope::default()),
        Some(Value::String(s)) if s.is_empty() => Ok(Scope::default()),
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(anyhow!("scope must be a string, got {}", other)),
    }
}

async fn handle_refresh(State(state): State<Arc<ControlState>>, body: Bytes) -> Response {
    let scope = match scope_from_body(&body) {
        Ok(scope) => scope,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response();
        }
    };

    let _guard = state.running.lock().await;
    tracing::info!(%scope, "Received refresh request. Running scraper...");

    match state.scraper.run(scope).await {
        Ok(stdout) => {
            tracing::info!(%scope, "Scraper output: {}", stdout.trim());
            (
                StatusCode::OK,
                Json(json!({ "success": true, "message": "Scraper executed successfully" })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(%scope, "Error executing scraper: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
