// src/handlers/extracao.rs
//
// Upload multipart da nota fiscal. Só PDFs de até 15MB passam; os campos de
// texto opcionais do formulário semeiam o registro de fallback.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{
    config::AppState,
    models::extracao::{ArquivoNota, CamposFallback, EnvelopeExtracao},
};

pub const TAMANHO_MAXIMO_PDF: usize = 15 * 1024 * 1024;

// POST /extract-data
#[utoipa::path(
    post,
    path = "/extract-data",
    tag = "Extração",
    responses(
        (status = 200, description = "Extração e lançamento concluídos (fallback: true quando a IA está indisponível)", body = EnvelopeExtracao),
        (status = 400, description = "Upload inválido")
    )
)]
pub async fn extrair_dados(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut arquivo: Option<ArquivoNota> = None;
    let mut campos = CamposFallback::default();

    loop {
        let campo = match multipart.next_field().await {
            Ok(Some(campo)) => campo,
            Ok(None) => break,
            Err(e) => {
                return erro_upload(
                    StatusCode::BAD_REQUEST,
                    &format!("Falha ao ler o upload: {e}"),
                )
            }
        };

        match campo.name().map(str::to_string).as_deref() {
            Some("invoice") => {
                if campo.content_type() != Some("application/pdf") {
                    return erro_upload(
                        StatusCode::BAD_REQUEST,
                        "Apenas arquivos PDF são permitidos para extração de dados de notas fiscais.",
                    );
                }

                let nome = campo.file_name().unwrap_or("nota.pdf").to_string();
                let conteudo = match campo.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        return erro_upload(
                            StatusCode::BAD_REQUEST,
                            &format!("Falha ao ler o arquivo: {e}"),
                        )
                    }
                };
                if conteudo.len() > TAMANHO_MAXIMO_PDF {
                    return erro_upload(
                        StatusCode::BAD_REQUEST,
                        "Arquivo muito grande. Máximo 15MB permitido para PDFs.",
                    );
                }

                arquivo = Some(ArquivoNota {
                    nome,
                    tamanho: conteudo.len(),
                    conteudo: conteudo.to_vec(),
                });
            }
            Some("cnpj_fornecedor") => campos.cnpj_fornecedor = texto(campo).await,
            Some("nome_faturado") => campos.nome_faturado = texto(campo).await,
            Some("numero_nf") => campos.numero_nf = texto(campo).await,
            Some("valor_total") => campos.valor_total = texto(campo).await,
            Some("classificacao") => campos.classificacao = texto(campo).await,
            _ => {}
        }
    }

    let Some(arquivo) = arquivo else {
        return erro_upload(StatusCode::BAD_REQUEST, "Nenhum arquivo PDF enviado.");
    };

    match app_state.extracao_service.processar(arquivo, campos).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e) => {
            error!("❌ Erro durante o processamento: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

async fn texto(campo: Field<'_>) -> Option<String> {
    campo.text().await.ok().filter(|t| !t.trim().is_empty())
}

fn erro_upload(status: StatusCode, mensagem: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": mensagem })),
    )
        .into_response()
}
