// src/services/embedding_service.rs
//
// Índice vetorial: ingestão dos movimentos como chunks de texto com
// embedding e a consulta RAG por similaridade.

use futures::future::join_all;
use pgvector::Vector;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    ai::{client::GeminiClient, consulta as agente_consulta},
    common::error::AppError,
    db::DocumentoRepository,
    models::consulta::{DocumentoResumo, RespostaEmbedding},
    models::movimento::{FiltroMovimentos, MovimentoDetalhado},
    services::MovimentoService,
};

/// Número de documentos mais relevantes usados como contexto.
pub const TOP_K: i64 = 5;

/// Limite de chamadas de embedding simultâneas na reindexação.
const TAMANHO_LOTE: usize = 10;

#[derive(Clone)]
pub struct EmbeddingService {
    gemini: GeminiClient,
    documentos: DocumentoRepository,
    movimentos: MovimentoService,
}

impl EmbeddingService {
    pub fn new(
        gemini: GeminiClient,
        documentos: DocumentoRepository,
        movimentos: MovimentoService,
    ) -> Self {
        Self {
            gemini,
            documentos,
            movimentos,
        }
    }

    // =========================================================================
    //  INGESTÃO
    // =========================================================================

    /// Reconstrói o índice vetorial inteiro a partir dos movimentos atuais.
    /// Chamada na inicialização; falhas individuais são registradas e
    /// puladas para não travar o boot.
    pub async fn ingestao_inicial(&self) -> Result<(), AppError> {
        info!("🚀 INICIANDO INGESTÃO DE EMBEDDINGS");

        self.documentos.limpar_indice().await?;
        info!("Índice vetorial anterior limpo.");

        let movimentos = self
            .movimentos
            .buscar_por_filtros(&FiltroMovimentos::default())
            .await?;

        if movimentos.is_empty() {
            warn!("⚠️ Nenhuma nota fiscal encontrada para indexar.");
            return Ok(());
        }

        info!("📝 Processando {} movimentos...", movimentos.len());

        let mut processados = 0usize;
        for lote in movimentos.chunks(TAMANHO_LOTE) {
            let tarefas = lote.iter().map(|movimento| self.indexar_detalhado(movimento));
            for (movimento, resultado) in lote.iter().zip(join_all(tarefas).await) {
                match resultado {
                    Ok(()) => processados += 1,
                    Err(e) => error!(
                        "❌ ERRO ao processar movimento {}: {}",
                        movimento.movimento.id, e
                    ),
                }
            }
        }

        info!("✅ Indexação de {} documentos concluída.", processados);
        Ok(())
    }

    /// Indexa (ou reindexa) um único movimento depois de uma criação.
    /// Substitui a reconstrução total por escrita: remove o chunk antigo do
    /// movimento e insere o novo.
    pub async fn indexar_movimento(&self, movimento_id: Uuid) -> Result<(), AppError> {
        let detalhado = self
            .movimentos
            .buscar_detalhado(movimento_id)
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)?;

        self.documentos.remover_por_movimento(movimento_id).await?;
        self.indexar_detalhado(&detalhado).await
    }

    async fn indexar_detalhado(&self, detalhado: &MovimentoDetalhado) -> Result<(), AppError> {
        let texto = montar_texto_contexto(detalhado);
        let embedding = self.gemini.criar_embedding(&texto).await?;

        let categorias = nomes_de_classificacao(detalhado);
        let metadata = json!({
            "movimento_id": detalhado.movimento.id,
            "categoria": categorias,
            "numero_nf": detalhado.movimento.numeronotafiscal,
        });

        self.documentos
            .inserir(&texto, Vector::from(embedding), metadata)
            .await
    }

    // =========================================================================
    //  CONSULTA
    // =========================================================================

    /// Consulta RAG por similaridade vetorial. Nunca devolve erro: qualquer
    /// falha degrada para o texto estático de desculpas no mesmo envelope.
    pub async fn consultar(&self, pergunta: &str) -> RespostaEmbedding {
        info!("🧠 RAG-Embedding: Recebida pergunta: \"{}\"", pergunta);

        match self.tentar_consultar(pergunta).await {
            Ok(resposta) => resposta,
            Err(e) => {
                error!("❌ ERRO no Agente RAG Embedding: {}", e);
                RespostaEmbedding {
                    resposta: agente_consulta::RESPOSTA_INDICE_INDISPONIVEL.to_string(),
                    contexto_usado: String::new(),
                    documentos_originais: vec![],
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn tentar_consultar(&self, pergunta: &str) -> Result<RespostaEmbedding, AppError> {
        // 1. Vetor da pergunta
        let vetor = self.gemini.criar_embedding(pergunta).await?;
        info!(
            "🧠 RAG-Embedding: Vetor da pergunta gerado ({} dimensões).",
            vetor.len()
        );

        // 2. Busca de similaridade (pgvector, distância ascendente)
        let documentos = self
            .documentos
            .buscar_similares(Vector::from(vetor), TOP_K)
            .await?;

        // 3. Contexto compilado dos mais relevantes
        let contexto = documentos
            .iter()
            .map(|d| d.texto.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        info!(
            "🧠 RAG-Embedding: {} documentos recuperados. Contexto de {} caracteres.",
            documentos.len(),
            contexto.len()
        );

        // 4. Síntese restrita ao contexto
        let resposta = agente_consulta::sintetizar_resposta_contextual(
            &self.gemini,
            pergunta,
            &contexto,
        )
        .await?;

        Ok(RespostaEmbedding {
            resposta: resposta.trim().to_string(),
            contexto_usado: contexto,
            documentos_originais: documentos
                .into_iter()
                .map(|d| DocumentoResumo {
                    texto: d.texto,
                    distancia: d.distancia,
                })
                .collect(),
            error: None,
        })
    }
}

/// Chunk de texto com alto contexto semântico, um por movimento.
pub fn montar_texto_contexto(detalhado: &MovimentoDetalhado) -> String {
    format!(
        "Movimento ID: {}. Nota Fiscal: {}. Fornecedor: {}. Categoria(s): {}. \
         Valor Total: {:.2}. Descrição dos Itens: {}. Data de Emissão: {}.",
        detalhado.movimento.id,
        detalhado.movimento.numeronotafiscal.as_deref().unwrap_or("N/A"),
        detalhado.fornecedor_cliente.razaosocial,
        nomes_de_classificacao(detalhado),
        detalhado.movimento.valortotal,
        detalhado.movimento.descricao,
        detalhado.movimento.datemissao,
    )
}

fn nomes_de_classificacao(detalhado: &MovimentoDetalhado) -> String {
    detalhado
        .classificacoes
        .iter()
        .map(|c| c.descricao.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cadastro::{
        Classificacao, Pessoa, StatusRegistro, TipoClassificacao, TipoPessoa,
    };
    use crate::models::movimento::{MovimentoContas, StatusMovimento, TipoMovimento};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    #[test]
    fn chunk_carrega_os_campos_semanticos_do_movimento() {
        let fornecedor = Pessoa {
            id: Uuid::new_v4(),
            tipo: TipoPessoa::Juridica,
            razaosocial: "AGRO INSUMOS LTDA".to_string(),
            fantasia: "Agro Insumos".to_string(),
            documento: "18944113000291".to_string(),
            status: StatusRegistro::Ativo,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let faturado = fornecedor.clone();

        let detalhado = MovimentoDetalhado {
            movimento: MovimentoContas {
                id: Uuid::new_v4(),
                tipo: TipoMovimento::Apagar,
                numeronotafiscal: Some("000207590".to_string()),
                datemissao: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
                descricao: "Sementes de soja".to_string(),
                status: StatusMovimento::Pendente,
                valortotal: "3449.00".parse::<Decimal>().unwrap(),
                fornecedor_id: fornecedor.id,
                faturado_id: faturado.id,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            fornecedor_cliente: fornecedor,
            faturado,
            parcelas: vec![],
            classificacoes: vec![Classificacao {
                id: Uuid::new_v4(),
                tipo: TipoClassificacao::Despesa,
                descricao: "INSUMOS AGRÍCOLAS".to_string(),
                status: StatusRegistro::Ativo,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }],
        };

        let texto = montar_texto_contexto(&detalhado);
        assert!(texto.contains("Nota Fiscal: 000207590"));
        assert!(texto.contains("Fornecedor: AGRO INSUMOS LTDA"));
        assert!(texto.contains("Categoria(s): INSUMOS AGRÍCOLAS"));
        assert!(texto.contains("Valor Total: 3449.00"));
        assert!(texto.contains("Data de Emissão: 2024-10-01"));
    }
}
