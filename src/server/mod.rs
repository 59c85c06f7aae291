//! Public release server
//!
//! Serves the tokenized hold point release channel:
//! - `GET /health` — liveness probe
//! - `GET /release/:token` — release page data: lot summary, evidence,
//!   expiry (does not consume the token)
//! - `POST /release/:token` — submit the release form; consumes the token
//!
//! The token in the URL is the entire authorization boundary; there are no
//! accounts and no sessions. Responses carry JSON error bodies with status
//! codes an external form frontend can branch on: 404 unknown token, 410
//! expired or already used, 409 point already released.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use colored::Colorize;
use tower_http::cors::CorsLayer;

use crate::services::{self, FileNotificationSink, ReleaseRequest, WorkflowError};
use crate::state::ProjectStore;
use crate::Result;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Project root the store is opened at, per request
    pub project_root: PathBuf,
}

/// Start the release server for one project
pub async fn start_server(project_root: PathBuf, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = AppState { project_root };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/release/:token", get(view_release).post(submit_release))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("{}", format!("✓ Release server listening on http://{}", addr).green());
    println!("  Release links: http://{}/release/<token>", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Show the release page data for a presented token
async fn view_release(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let store = ProjectStore::new(&state.project_root);
    match services::view_by_token(&store, &token) {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(e),
    }
}

/// Submit the release form; first successful submission wins
async fn submit_release(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ReleaseRequest>,
) -> Response {
    let store = ProjectStore::new(&state.project_root);
    let sink = FileNotificationSink::new(&store);
    match services::release_by_token(&store, &sink, &token, request) {
        Ok(point) => Json(serde_json::json!({
            "released": true,
            "item": point.item_description,
            "released_at": point.released_at,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Map workflow failures to the status codes the form frontend branches on
fn error_response(error: WorkflowError) -> Response {
    let status = match &error {
        WorkflowError::TokenUnknown => StatusCode::NOT_FOUND,
        WorkflowError::TokenExpired | WorkflowError::TokenUsed => StatusCode::GONE,
        WorkflowError::AlreadyReleased => StatusCode::CONFLICT,
        WorkflowError::NameRequired => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (WorkflowError::TokenUnknown, StatusCode::NOT_FOUND),
            (WorkflowError::TokenExpired, StatusCode::GONE),
            (WorkflowError::TokenUsed, StatusCode::GONE),
            (WorkflowError::AlreadyReleased, StatusCode::CONFLICT),
            (WorkflowError::NameRequired, StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (error, expected) in cases {
            assert_eq!(error_response(error).status(), expected);
        }
    }
}
