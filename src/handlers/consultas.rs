// src/handlers/consultas.rs
//
// Rotas de consulta em linguagem natural. O envelope de erro aqui é o do
// front ({sucesso: false, erro}), não o formato padrão do AppError.

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    config::AppState,
    models::consulta::{RespostaConsulta, RespostaEmbedding},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PerguntaPayload {
    #[schema(example = "Quanto gastei com insumos em outubro?")]
    pub pergunta: Option<String>,
}

// POST /consultar
#[utoipa::path(
    post,
    path = "/consultar",
    tag = "Consultas",
    request_body = PerguntaPayload,
    responses(
        (status = 200, description = "Resposta da consulta estruturada", body = RespostaConsulta),
        (status = 400, description = "Pergunta ausente")
    )
)]
pub async fn consultar(
    State(app_state): State<AppState>,
    Json(payload): Json<PerguntaPayload>,
) -> Response {
    let Some(pergunta) = payload.pergunta.filter(|p| !p.trim().is_empty()) else {
        return erro_consulta(
            StatusCode::BAD_REQUEST,
            "Campo \"pergunta\" é obrigatório",
        );
    };

    match app_state.consulta_service.consultar(&pergunta).await {
        Ok(resposta) => (StatusCode::OK, Json(resposta)).into_response(),
        Err(e) => {
            error!("❌ Erro na rota /consultar: {}", e);
            erro_consulta(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

// POST /consultar-embedding
#[utoipa::path(
    post,
    path = "/consultar-embedding",
    tag = "Consultas",
    request_body = PerguntaPayload,
    responses(
        (status = 200, description = "Resposta sintetizada do índice vetorial", body = RespostaEmbedding),
        (status = 400, description = "Pergunta ausente")
    )
)]
pub async fn consultar_embedding(
    State(app_state): State<AppState>,
    Json(payload): Json<PerguntaPayload>,
) -> Response {
    let Some(pergunta) = payload.pergunta.filter(|p| !p.trim().is_empty()) else {
        return erro_consulta(
            StatusCode::BAD_REQUEST,
            "Campo \"pergunta\" é obrigatório",
        );
    };

    // O serviço nunca falha: erros viram o texto de desculpas no envelope
    let resposta = app_state.embedding_service.consultar(&pergunta).await;
    (StatusCode::OK, Json(resposta)).into_response()
}

fn erro_consulta(status: StatusCode, erro: &str) -> Response {
    (status, Json(json!({ "sucesso": false, "erro": erro }))).into_response()
}
