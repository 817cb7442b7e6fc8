use axum::{extract::State, response::Json};

use crate::state::AppState;

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "bind_address": state.bind_address,
        "remoteConfigured": state.gateway.is_some(),
    }))
}

pub async fn list_logs() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "entries": crate::log_bridge::recent_entries(),
        "filePath": crate::log_bridge::log_file_path(),
    }))
}
