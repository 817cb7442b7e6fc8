use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use slidegist_core::types::SaveOutcome;

use super::{api_error, cookie_headers, log_api_issue, owned_docs, ApiError, ErrorResponse};
use crate::state::{AppState, Gateway};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBody {
    #[serde(default)]
    title: String,
    content: String,
    #[serde(default)]
    gist_id: Option<String>,
}

fn require_gateway(state: &AppState, target: &'static str) -> Result<Arc<Gateway>, ApiError> {
    state.gateway.clone().ok_or_else(|| {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let error = "GitHub token not configured".to_string();
        log_api_issue(status, target, &error);
        (status, Json(ErrorResponse { error }))
    })
}

pub async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SaveBody>,
) -> Result<(HeaderMap, Json<SaveOutcome>), ApiError> {
    let gateway = require_gateway(&state, "slidegist.api.save")?;
    let mut owned = owned_docs(&headers);
    let existing_id = body
        .gist_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let outcome = gateway
        .save(&mut owned, &body.title, &body.content, existing_id)
        .await
        .map_err(|e| api_error(e, "slidegist.api.save"))?;

    Ok((cookie_headers(&owned), Json(outcome)))
}

pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let Some(gateway) = state.gateway.clone() else {
        return Json(serde_json::json!({ "gists": [] }));
    };

    let owned = owned_docs(&headers);
    let mut gists = gateway.list(&owned).await;
    gists.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Json(serde_json::json!({ "gists": gists }))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<serde_json::Value>), ApiError> {
    let gateway = require_gateway(&state, "slidegist.api.delete")?;
    let mut owned = owned_docs(&headers);

    gateway
        .delete(&mut owned, &id)
        .await
        .map_err(|e| api_error(e, "slidegist.api.delete"))?;

    Ok((
        cookie_headers(&owned),
        Json(serde_json::json!({ "success": true })),
    ))
}

pub async fn check_ownership(
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let owned = owned_docs(&headers);
    Json(serde_json::json!({ "owned": owned.contains(&id) }))
}

pub async fn load(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let gateway = require_gateway(&state, "slidegist.api.load")?;
    let document = gateway
        .load(&id)
        .await
        .map_err(|e| api_error(e, "slidegist.api.load"))?;

    Ok(Json(serde_json::json!({
        "content": document.content,
        "title": document.title,
    })))
}
