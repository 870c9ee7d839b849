use axum::{extract::State, response::IntoResponse, Json};

use crate::{tools, AppState};

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "tools": tools::all().map(|def| def.name).collect::<Vec<_>>(),
        "sse_sessions": state.sessions.len(),
    }))
}
