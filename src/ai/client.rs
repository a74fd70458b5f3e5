// src/ai/client.rs
//
// Cliente da API do Gemini (REST) com pool de conexões reutilizado e a
// retentativa com backoff exponencial usada pelos fluxos de extração.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::common::error::AppError;

// Centraliza os nomes dos modelos para facilitar a manutenção
pub const MODELO_TEXTO: &str = "gemini-2.5-flash";
pub const MODELO_PRO: &str = "gemini-2.5-pro";
pub const MODELO_EMBEDDING: &str = "text-embedding-004";

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Cliente reutilizável do Gemini (com pool de conexões). A chave é opcional
/// de propósito: a ausência dela só aparece na hora da chamada, como um erro
/// de configuração distinguível.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .expect("Falha ao construir o cliente HTTP");

        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn chave_configurada(&self) -> bool {
        self.api_key.is_some()
    }

    fn chave(&self) -> Result<&str, AppError> {
        self.api_key.as_deref().ok_or(AppError::ChaveGeminiAusente)
    }

    /// Gera texto a partir de um prompt, opcionalmente com um PDF anexado
    /// (inline_data em base64).
    pub async fn gerar_conteudo(
        &self,
        modelo: &str,
        prompt: &str,
        anexo: Option<&AnexoPdf>,
        temperatura: Option<f32>,
    ) -> Result<String, AppError> {
        let chave = self.chave()?;
        let url = format!("{}/{}:generateContent?key={}", self.base_url, modelo, chave);

        let mut parts = vec![Parte::Texto {
            text: prompt.to_string(),
        }];
        if let Some(anexo) = anexo {
            parts.push(Parte::Anexo {
                inline_data: DadosEmbutidos {
                    mime_type: anexo.mime_type.clone(),
                    data: anexo.dados_base64.clone(),
                },
            });
        }

        let requisicao = RequisicaoGeracao {
            contents: vec![ConteudoRequisicao { parts }],
            generation_config: temperatura.map(|t| ConfiguracaoGeracao { temperature: t }),
        };

        let resposta = self
            .client
            .post(&url)
            .json(&requisicao)
            .send()
            .await
            .map_err(|e| {
                error!("Falha na requisição ao Gemini: {}", e);
                AppError::GeminiApi(format!("Falha na requisição: {e}"))
            })?;

        let status = resposta.status();
        if !status.is_success() {
            let corpo = resposta.text().await.unwrap_or_default();
            error!("Resposta de erro da API do Gemini: {} {}", status, corpo);
            return Err(AppError::GeminiApi(format!("{}: {}", status.as_u16(), corpo)));
        }

        let resposta: RespostaGeracao = resposta.json().await.map_err(|e| {
            error!("Falha ao interpretar a resposta do Gemini: {}", e);
            AppError::GeminiApi(format!("Resposta ilegível do Gemini: {e}"))
        })?;

        resposta
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| AppError::GeminiApi("Resposta vazia do Gemini".to_string()))
    }

    /// Cria o vetor (embedding) para uma string de texto.
    pub async fn criar_embedding(&self, texto: &str) -> Result<Vec<f32>, AppError> {
        let chave = self.chave()?;
        let url = format!(
            "{}/{}:embedContent?key={}",
            self.base_url, MODELO_EMBEDDING, chave
        );

        let requisicao = RequisicaoEmbedding {
            content: ConteudoEmbedding {
                parts: vec![Parte::Texto {
                    text: texto.to_string(),
                }],
                role: "user".to_string(),
            },
        };

        let resposta = self
            .client
            .post(&url)
            .json(&requisicao)
            .send()
            .await
            .map_err(|e| {
                error!("❌ Erro ao criar embedding: {}", e);
                AppError::GeminiApi(format!("Falha na requisição: {e}"))
            })?;

        let status = resposta.status();
        if !status.is_success() {
            let corpo = resposta.text().await.unwrap_or_default();
            error!("❌ Erro ao criar embedding: {} {}", status, corpo);
            return Err(AppError::GeminiApi(format!("{}: {}", status.as_u16(), corpo)));
        }

        let resposta: RespostaEmbeddingApi = resposta.json().await.map_err(|e| {
            AppError::GeminiApi(format!("Resposta ilegível do Gemini: {e}"))
        })?;

        Ok(resposta.embedding.values)
    }
}

/// PDF pronto para o campo inline_data da requisição.
pub struct AnexoPdf {
    pub dados_base64: String,
    pub mime_type: String,
}

impl AnexoPdf {
    pub fn novo(conteudo: &[u8]) -> Self {
        Self {
            dados_base64: STANDARD.encode(conteudo),
            mime_type: "application/pdf".to_string(),
        }
    }
}

// --- Retentativa com backoff exponencial ---

pub const MAX_RETENTATIVAS: u32 = 3;
pub const BACKOFF_INICIAL_MS: u64 = 1000;

/// Só sobrecarga transitória merece retentativa: rate limit (429),
/// indisponibilidade (503) ou o marcador "overloaded" no corpo do erro.
pub fn erro_transitorio(mensagem: &str) -> bool {
    mensagem.contains("503") || mensagem.contains("429") || mensagem.contains("overloaded")
}

/// Executa `operacao` com até MAX_RETENTATIVAS tentativas extras depois da
/// primeira. A espera antes da retentativa k é BACKOFF_INICIAL_MS * 2^(k-1).
/// Erros não transitórios abortam e são propagados sem alteração; o
/// esgotamento vira um erro final com a contagem de tentativas e a causa.
pub async fn com_retentativa<T, F, Fut>(mut operacao: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut tentativa: u32 = 0;

    loop {
        if tentativa > 0 {
            let espera = Duration::from_millis(BACKOFF_INICIAL_MS * 2u64.pow(tentativa - 1));
            info!(
                "🔄 Tentativa {}/{} após {}ms...",
                tentativa,
                MAX_RETENTATIVAS,
                espera.as_millis()
            );
            tokio::time::sleep(espera).await;
        }

        match operacao().await {
            Ok(valor) => return Ok(valor),
            Err(erro) => {
                let causa = erro.to_string();
                if !erro_transitorio(&causa) {
                    error!("❌ Erro no processamento Gemini: {}", causa);
                    return Err(erro);
                }

                tentativa += 1;
                if tentativa > MAX_RETENTATIVAS {
                    return Err(AppError::FalhaProcessamentoIa {
                        tentativas: tentativa,
                        causa,
                    });
                }
                warn!(
                    "⚠️ Gemini API sobrecarregada. Tentando novamente ({}/{})...",
                    tentativa, MAX_RETENTATIVAS
                );
            }
        }
    }
}

// --- Formato da API (REST v1beta) ---

#[derive(Debug, Serialize)]
struct RequisicaoGeracao {
    contents: Vec<ConteudoRequisicao>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ConfiguracaoGeracao>,
}

#[derive(Debug, Serialize)]
struct ConteudoRequisicao {
    parts: Vec<Parte>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Parte {
    Texto { text: String },
    Anexo { inline_data: DadosEmbutidos },
}

#[derive(Debug, Serialize)]
struct DadosEmbutidos {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct ConfiguracaoGeracao {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct RequisicaoEmbedding {
    content: ConteudoEmbedding,
}

#[derive(Debug, Serialize)]
struct ConteudoEmbedding {
    parts: Vec<Parte>,
    role: String,
}

#[derive(Debug, Deserialize)]
struct RespostaGeracao {
    #[serde(default)]
    candidates: Vec<Candidato>,
}

#[derive(Debug, Deserialize)]
struct Candidato {
    content: ConteudoResposta,
}

#[derive(Debug, Deserialize)]
struct ConteudoResposta {
    #[serde(default)]
    parts: Vec<ParteResposta>,
}

#[derive(Debug, Deserialize)]
struct ParteResposta {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RespostaEmbeddingApi {
    embedding: ValoresEmbedding,
}

#[derive(Debug, Deserialize)]
struct ValoresEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn sobrecarga_transitoria_dorme_com_backoff_exponencial() {
        let chamadas = AtomicU32::new(0);
        let inicio = tokio::time::Instant::now();

        let resultado = com_retentativa(|| {
            let chamadas = &chamadas;
            async move {
                let n = chamadas.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::GeminiApi("503: The model is overloaded".to_string()))
                } else {
                    Ok("extraido")
                }
            }
        })
        .await;

        // Sucesso na terceira tentativa, com esperas de 1000ms e 2000ms
        assert_eq!(resultado.unwrap(), "extraido");
        assert_eq!(chamadas.load(Ordering::SeqCst), 3);
        assert_eq!(inicio.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn erro_nao_transitorio_aborta_sem_dormir() {
        let inicio = tokio::time::Instant::now();

        let resultado: Result<(), AppError> = com_retentativa(|| async {
            Err::<(), _>(AppError::GeminiApi("400: invalid argument".to_string()))
        })
        .await;

        // O erro original é propagado imediatamente, sem backoff
        match resultado {
            Err(AppError::GeminiApi(mensagem)) => assert!(mensagem.contains("invalid argument")),
            outro => panic!("esperava GeminiApi, veio {outro:?}"),
        }
        assert_eq!(inicio.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn esgotamento_vira_erro_final_com_contagem() {
        let chamadas = AtomicU32::new(0);
        let inicio = tokio::time::Instant::now();

        let resultado: Result<(), AppError> = com_retentativa(|| {
            let chamadas = &chamadas;
            async move {
                chamadas.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::GeminiApi("429: quota exceeded".to_string()))
            }
        })
        .await;

        // 1 tentativa inicial + 3 retentativas, esperas de 1s, 2s e 4s
        assert_eq!(chamadas.load(Ordering::SeqCst), 4);
        assert_eq!(inicio.elapsed(), Duration::from_millis(7000));
        match resultado {
            Err(AppError::FalhaProcessamentoIa { tentativas, causa }) => {
                assert_eq!(tentativas, 4);
                assert!(causa.contains("429"));
            }
            outro => panic!("esperava FalhaProcessamentoIa, veio {outro:?}"),
        }
    }

    #[test]
    fn classificacao_de_erros_transitorios() {
        assert!(erro_transitorio("503 Service Unavailable"));
        assert!(erro_transitorio("429: Too Many Requests"));
        assert!(erro_transitorio("the model is overloaded, try again"));
        assert!(!erro_transitorio("invalid argument"));
        assert!(!erro_transitorio("Resposta vazia do Gemini"));
    }
}
