// src/handlers/contas.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::movimento::{MovimentoDetalhado, ParcelaContas, TipoMovimento},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct FiltrosContas {
    /// Busca por número da nota ou razão social do fornecedor
    pub termo: Option<String>,

    pub tipo: Option<TipoMovimento>,

    /// true traz todos os status; o padrão lista apenas PENDENTE
    pub todos: Option<bool>,
}

// GET /api/contas
#[utoipa::path(
    get,
    path = "/api/contas",
    tag = "Contas",
    params(FiltrosContas),
    responses(
        (status = 200, description = "Movimentos com vínculos resolvidos", body = Vec<MovimentoDetalhado>)
    )
)]
pub async fn listar(
    State(app_state): State<AppState>,
    Query(filtros): Query<FiltrosContas>,
) -> Result<impl IntoResponse, AppError> {
    let movimentos = app_state
        .movimento_service
        .listar_contas(
            filtros.termo.as_deref(),
            filtros.tipo,
            filtros.todos.unwrap_or(false),
        )
        .await?;

    Ok((StatusCode::OK, Json(movimentos)))
}

// DELETE /api/contas/{id}
#[utoipa::path(
    delete,
    path = "/api/contas/{id}",
    tag = "Contas",
    params(("id" = Uuid, Path, description = "ID do movimento")),
    responses(
        (status = 200, description = "Movimento inativado"),
        (status = 404, description = "Movimento não encontrado")
    )
)]
pub async fn excluir(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .movimento_service
        .excluir_movimento_logico(id)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PagamentoPayload {
    #[schema(example = "1724.50")]
    pub valor_pago: Decimal,
}

// PUT /api/parcelas/{id}/pagamento
#[utoipa::path(
    put,
    path = "/api/parcelas/{id}/pagamento",
    tag = "Contas",
    request_body = PagamentoPayload,
    params(("id" = Uuid, Path, description = "ID da parcela")),
    responses(
        (status = 200, description = "Parcela com o pagamento registrado", body = ParcelaContas),
        (status = 404, description = "Parcela não encontrada")
    )
)]
pub async fn registrar_pagamento(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PagamentoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let parcela = app_state
        .movimento_service
        .registrar_pagamento_parcela(id, payload.valor_pago)
        .await?;

    Ok((StatusCode::OK, Json(parcela)))
}
