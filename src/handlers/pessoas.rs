// src/handlers/pessoas.rs

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
    models::cadastro::{Pessoa, ResultadoCadastro, ResultadoExclusao, StatusExclusao, TipoPessoa},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct FiltrosPessoas {
    /// Busca por razão social, fantasia ou documento
    pub termo: Option<String>,

    pub tipo: Option<TipoPessoa>,

    /// true inclui também os registros inativos
    pub todos: Option<bool>,
}

// GET /api/pessoas
#[utoipa::path(
    get,
    path = "/api/pessoas",
    tag = "Pessoas",
    params(FiltrosPessoas),
    responses(
        (status = 200, description = "Lista de pessoas", body = Vec<Pessoa>)
    )
)]
pub async fn listar(
    State(app_state): State<AppState>,
    Query(filtros): Query<FiltrosPessoas>,
) -> Result<impl IntoResponse, AppError> {
    let pessoas = app_state
        .cadastro_service
        .listar_pessoas(
            filtros.termo.as_deref(),
            filtros.tipo,
            filtros.todos.unwrap_or(false),
        )
        .await?;

    Ok((StatusCode::OK, Json(pessoas)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CriarPessoaPayload {
    #[schema(example = "18.944.113/0002-91")]
    pub documento: Option<String>,

    #[schema(example = "AGRO INSUMOS LTDA")]
    pub razaosocial: Option<String>,

    /// Papel do cadastro: FORNECEDOR ou FATURADO (usado nas mensagens)
    #[schema(example = "FORNECEDOR")]
    pub tipo: Option<String>,

    pub fantasia: Option<String>,
}

// POST /api/pessoas
#[utoipa::path(
    post,
    path = "/api/pessoas",
    tag = "Pessoas",
    request_body = CriarPessoaPayload,
    responses(
        (status = 200, description = "Resultado consultar-ou-criar", body = ResultadoCadastro<Pessoa>)
    )
)]
pub async fn criar(
    State(app_state): State<AppState>,
    Json(payload): Json<CriarPessoaPayload>,
) -> Result<impl IntoResponse, AppError> {
    // Chaves ausentes viram ERRO_DADOS no resultado, não erro de validação
    let resultado = app_state
        .cadastro_service
        .find_or_create_pessoa(
            payload.documento.as_deref().unwrap_or(""),
            payload.razaosocial.as_deref().unwrap_or(""),
            payload.tipo.as_deref().unwrap_or("FORNECEDOR"),
            payload.fantasia.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(resultado)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AtualizarPessoaPayload {
    #[validate(length(min = 1, message = "required"))]
    pub razaosocial: Option<String>,

    #[validate(length(min = 1, message = "required"))]
    pub fantasia: Option<String>,

    #[validate(length(min = 1, message = "required"))]
    pub documento: Option<String>,
}

// PUT /api/pessoas/{id}
#[utoipa::path(
    put,
    path = "/api/pessoas/{id}",
    tag = "Pessoas",
    request_body = AtualizarPessoaPayload,
    params(("id" = Uuid, Path, description = "ID da pessoa")),
    responses(
        (status = 200, description = "Pessoa atualizada", body = Pessoa),
        (status = 404, description = "Pessoa não encontrada")
    )
)]
pub async fn atualizar(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarPessoaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // O status nunca é alterado por aqui: o payload tipado não o aceita
    let pessoa = app_state
        .cadastro_service
        .atualizar_pessoa(
            id,
            payload.razaosocial.as_deref(),
            payload.fantasia.as_deref(),
            payload.documento.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(pessoa)))
}

// DELETE /api/pessoas/{id}
#[utoipa::path(
    delete,
    path = "/api/pessoas/{id}",
    tag = "Pessoas",
    params(("id" = Uuid, Path, description = "ID da pessoa")),
    responses(
        (status = 200, description = "Exclusão lógica efetuada", body = ResultadoExclusao),
        (status = 409, description = "Pessoa vinculada a movimentos", body = ResultadoExclusao)
    )
)]
pub async fn excluir(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resultado = app_state.cadastro_service.excluir_pessoa_logico(id).await?;

    let status = match resultado.status {
        StatusExclusao::Sucesso => StatusCode::OK,
        StatusExclusao::Erro => StatusCode::CONFLICT,
    };

    Ok((status, Json(resultado)))
}
