// src/handlers/classificacoes.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::cadastro::{
        Classificacao, ResultadoCadastro, ResultadoExclusao, StatusExclusao, TipoClassificacao,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct FiltrosClassificacoes {
    /// Busca por descrição
    pub termo: Option<String>,

    pub tipo: Option<TipoClassificacao>,

    /// true inclui também os registros inativos
    pub todos: Option<bool>,
}

// GET /api/classificacoes
#[utoipa::path(
    get,
    path = "/api/classificacoes",
    tag = "Classificações",
    params(FiltrosClassificacoes),
    responses(
        (status = 200, description = "Lista de classificações", body = Vec<Classificacao>)
    )
)]
pub async fn listar(
    State(app_state): State<AppState>,
    Query(filtros): Query<FiltrosClassificacoes>,
) -> Result<impl IntoResponse, AppError> {
    let classificacoes = app_state
        .cadastro_service
        .listar_classificacoes(
            filtros.termo.as_deref(),
            filtros.tipo,
            filtros.todos.unwrap_or(false),
        )
        .await?;

    Ok((StatusCode::OK, Json(classificacoes)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CriarClassificacaoPayload {
    #[schema(example = "INSUMOS AGRÍCOLAS")]
    pub descricao: Option<String>,

    pub tipo: Option<TipoClassificacao>,
}

// POST /api/classificacoes
#[utoipa::path(
    post,
    path = "/api/classificacoes",
    tag = "Classificações",
    request_body = CriarClassificacaoPayload,
    responses(
        (status = 200, description = "Resultado consultar-ou-criar", body = ResultadoCadastro<Classificacao>)
    )
)]
pub async fn criar(
    State(app_state): State<AppState>,
    Json(payload): Json<CriarClassificacaoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let resultado = app_state
        .cadastro_service
        .find_or_create_classificacao(
            payload.descricao.as_deref().unwrap_or(""),
            payload.tipo.unwrap_or(TipoClassificacao::Despesa),
        )
        .await?;

    Ok((StatusCode::OK, Json(resultado)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AtualizarClassificacaoPayload {
    #[validate(length(min = 1, message = "required"))]
    pub descricao: Option<String>,

    pub tipo: Option<TipoClassificacao>,
}

// PUT /api/classificacoes/{id}
#[utoipa::path(
    put,
    path = "/api/classificacoes/{id}",
    tag = "Classificações",
    request_body = AtualizarClassificacaoPayload,
    params(("id" = Uuid, Path, description = "ID da classificação")),
    responses(
        (status = 200, description = "Classificação atualizada", body = Classificacao),
        (status = 404, description = "Classificação não encontrada")
    )
)]
pub async fn atualizar(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarClassificacaoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let classificacao = app_state
        .cadastro_service
        .atualizar_classificacao(id, payload.descricao.as_deref(), payload.tipo)
        .await?;

    Ok((StatusCode::OK, Json(classificacao)))
}

// DELETE /api/classificacoes/{id}
#[utoipa::path(
    delete,
    path = "/api/classificacoes/{id}",
    tag = "Classificações",
    params(("id" = Uuid, Path, description = "ID da classificação")),
    responses(
        (status = 200, description = "Exclusão lógica efetuada", body = ResultadoExclusao),
        (status = 409, description = "Classificação vinculada a movimentos", body = ResultadoExclusao)
    )
)]
pub async fn excluir(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resultado = app_state
        .cadastro_service
        .excluir_classificacao_logico(id)
        .await?;

    let status = match resultado.status {
        StatusExclusao::Sucesso => StatusCode::OK,
        StatusExclusao::Erro => StatusCode::CONFLICT,
    };

    Ok((status, Json(resultado)))
}
