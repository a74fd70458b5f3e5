use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Registro não encontrado")]
    RegistroNaoEncontrado,

    // A chave é validada na hora do uso, nunca no boot: a ausência dela
    // degrada os fluxos de IA em vez de derrubar o processo.
    #[error("Chave da API do Gemini não configurada no arquivo .env.")]
    ChaveGeminiAusente,

    // A mensagem carrega o status HTTP e o corpo retornado pela API,
    // que é o que o classificador de retentativa inspeciona.
    #[error("Erro na API do Gemini: {0}")]
    GeminiApi(String),

    #[error("Resposta da IA não contém um JSON válido: {0}")]
    RespostaIaInvalida(String),

    #[error("Falha no processamento IA após {tentativas} tentativas: {causa}")]
    FalhaProcessamentoIa { tentativas: u32, causa: String },

    #[error("Dados de Movimento, Parcela ou IDs de dependência inválidos: {0}")]
    DadosMovimentoInvalidos(String),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::RegistroNaoEncontrado => {
                (StatusCode::NOT_FOUND, "Registro não encontrado.".to_string())
            }
            AppError::DadosMovimentoInvalidos(ref m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::ChaveGeminiAusente => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::GeminiApi(_)
            | AppError::RespostaIaInvalida(_)
            | AppError::FalhaProcessamentoIa { .. } => {
                tracing::error!("Falha na integração com o Gemini: {}", self);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
