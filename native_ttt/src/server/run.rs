// Routing and server startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::services::ServeDir;

use crate::server::AppState;

pub fn build_router(state: AppState) -> Router {
    let serve_static = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(serve_index))
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({ "ok": true })) }),
        )
        .route(
            "/keep_job_alive",
            get(|| async { Json(serde_json::json!({ "status": "Job is alive" })) }),
        )
        .route("/ws/:game_id", get(crate::server::ws::ws_handler))
        .nest_service("/static", serve_static)
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!(%addr, "tic-tac-toe server running");
    tracing::info!("open http://{} in two browser tabs to play", addr);

    axum::serve(listener, app)
        .await
        .context("serving HTTP/WebSocket connections")?;
    Ok(())
}

/// Serve the client page.
async fn serve_index(State(state): State<AppState>) -> impl IntoResponse {
    let index: PathBuf = state.config.index.clone();
    match tokio::fs::read_to_string(&index).await {
        Ok(content) => (StatusCode::OK, [("content-type", "text/html")], content).into_response(),
        Err(e) => {
            tracing::warn!(path = %index.display(), error = %e, "index page unavailable");
            (StatusCode::NOT_FOUND, "index.html not found").into_response()
        }
    }
}
