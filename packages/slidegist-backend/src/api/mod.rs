use axum::{
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use slidegist_core::gist::GistError;
use slidegist_core::ownership::OwnedDocs;

mod gist;
mod status;

use crate::state::AppState;

/// Axum REST API routes.
///
///   POST   /api/gist/save                  -> create or update a document (+ Set-Cookie)
///   GET    /api/gist/list                  -> documents owned by the calling client
///   DELETE /api/gist/delete/:id            -> delete an owned document (+ Set-Cookie)
///   GET    /api/gist/check-ownership/:id   -> cookie-only ownership check
///   GET    /api/gist/load/:id              -> markdown content and title
///   GET    /api/status                     -> health check
///   GET    /api/logs                       -> recent backend log entries
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/gist/save", post(gist::save))
        .route("/api/gist/list", get(gist::list))
        .route("/api/gist/delete/{id}", delete(gist::delete_document))
        .route(
            "/api/gist/check-ownership/{id}",
            get(gist::check_ownership),
        )
        .route("/api/gist/load/{id}", get(gist::load))
        .route("/api/status", get(status::status))
        .route("/api/logs", get(status::list_logs))
}

// ── Shared types and helpers used across sub-modules ────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Ownership token of the calling client, from all `Cookie` headers.
fn owned_docs(headers: &HeaderMap) -> OwnedDocs {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(OwnedDocs::from_cookie_header)
        .find(|owned| !owned.is_empty())
        .unwrap_or_default()
}

/// Response headers carrying the updated ownership cookie.
fn cookie_headers(owned: &OwnedDocs) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert_header_safe(&mut headers, "set-cookie", &owned.to_set_cookie());
    headers
}

fn gist_error_status(error: &GistError) -> StatusCode {
    match error {
        GistError::NotFound(_) => StatusCode::NOT_FOUND,
        GistError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        GistError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        GistError::Remote { .. } | GistError::Decode(_) => StatusCode::BAD_GATEWAY,
    }
}

fn api_error(error: GistError, target: &'static str) -> ApiError {
    let status = gist_error_status(&error);
    let error = error.to_string();
    log_api_issue(status, target, &error);
    (status, Json(ErrorResponse { error }))
}

fn insert_header_safe(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match value.parse() {
        Ok(parsed) => {
            headers.insert(name, parsed);
        }
        Err(e) => {
            log::warn!("Failed to set header {}={} ({})", name, value, e);
        }
    }
}

fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let message = message.as_ref();
    if status.is_server_error() {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}
