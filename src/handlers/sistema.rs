// src/handlers/sistema.rs

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::config::AppState;

// GET /test
#[utoipa::path(
    get,
    path = "/test",
    tag = "Sistema",
    responses(
        (status = 200, description = "Status do serviço")
    )
)]
pub async fn status(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "Extractor NF API",
        "gemini_key_configured": app_state.gemini.chave_configurada(),
    }))
}
