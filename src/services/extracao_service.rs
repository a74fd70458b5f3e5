// src/services/extracao_service.rs
//
// Pipeline da rota /extract-data: extração com IA (com fallback rotulado),
// resolução consultar-ou-criar das dependências, lançamento do movimento e
// indexação do chunk vetorial.

use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

use crate::{
    ai::{client::GeminiClient, extrator},
    common::error::AppError,
    models::cadastro::TipoClassificacao,
    models::extracao::{
        AnaliseBd, ArquivoNota, CamposFallback, EnvelopeExtracao, MetadadosProcessamento,
        ResultadoMovimento,
    },
    services::{CadastroService, EmbeddingService, MovimentoService},
};

#[derive(Clone)]
pub struct ExtracaoService {
    gemini: GeminiClient,
    cadastros: CadastroService,
    movimentos: MovimentoService,
    indexacao: EmbeddingService,
}

impl ExtracaoService {
    pub fn new(
        gemini: GeminiClient,
        cadastros: CadastroService,
        movimentos: MovimentoService,
        indexacao: EmbeddingService,
    ) -> Self {
        Self {
            gemini,
            cadastros,
            movimentos,
            indexacao,
        }
    }

    pub async fn processar(
        &self,
        arquivo: ArquivoNota,
        campos: CamposFallback,
    ) -> Result<EnvelopeExtracao, AppError> {
        let inicio = Instant::now();
        info!("🚀 Iniciando processamento...");

        // 1. EXTRAÇÃO DE DADOS (GEMINI API). Indisponibilidade — inclusive
        // chave ausente — degrada para o registro rotulado de fallback.
        let (mut dados, fallback) = match extrator::processar_pdf(&self.gemini, &arquivo.conteudo)
            .await
        {
            Ok(dados) => (dados, false),
            Err(e) => {
                warn!("⚠️ Falha na extração com IA, usando dados de fallback: {}", e);
                (extrator::dados_fallback(&campos), true)
            }
        };

        // Categoria ausente: o classificador dedicado decide, com default
        // documentado em ADMINISTRATIVAS.
        let sem_categoria = dados
            .classificacao_despesa
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .is_none();
        if sem_categoria && !fallback {
            if let Some(descricao) = dados.descricao_produtos.as_deref().filter(|d| !d.is_empty()) {
                dados.classificacao_despesa =
                    Some(extrator::classificar_despesa(&self.gemini, descricao).await);
            }
        }

        // 2. ANÁLISE E PERSISTÊNCIA NO BANCO DE DADOS

        // A. FORNECEDOR
        let fornecedor = self
            .cadastros
            .find_or_create_pessoa(
                dados.fornecedor.cnpj.as_deref().unwrap_or(""),
                dados.fornecedor.razao_social.as_deref().unwrap_or(""),
                "FORNECEDOR",
                dados.fornecedor.fantasia.as_deref(),
            )
            .await?;

        // B. FATURADO
        let faturado = self
            .cadastros
            .find_or_create_pessoa(
                dados.faturado.cpf.as_deref().unwrap_or(""),
                dados.faturado.nome_completo.as_deref().unwrap_or(""),
                "FATURADO",
                None,
            )
            .await?;

        // C. DESPESA
        let despesa = self
            .cadastros
            .find_or_create_classificacao(
                dados.classificacao_despesa.as_deref().unwrap_or(""),
                TipoClassificacao::Despesa,
            )
            .await?;

        // D. CRIAÇÃO DE MOVIMENTO. Falhas de validação viram resultado
        // estruturado no envelope, nunca um 5xx da rota.
        let movimento = match self
            .movimentos
            .criar_movimento_e_parcelas(&dados, fornecedor.id, faturado.id, despesa.id)
            .await
        {
            Ok((movimento, parcelas)) => {
                info!("🔄 Novo Movimento lançado. Reindexando Embeddings...");
                if let Err(e) = self.indexacao.indexar_movimento(movimento.id).await {
                    warn!("⚠️ Falha ao indexar o movimento {}: {}", movimento.id, e);
                }
                ResultadoMovimento::criado(movimento.id, parcelas.first().map(|p| p.id))
            }
            Err(AppError::DadosMovimentoInvalidos(mensagem)) => {
                ResultadoMovimento::falha(mensagem)
            }
            Err(e) => return Err(e),
        };

        // 3. RETORNO DA RESPOSTA
        let tempo_total = format!("{:.1}s", inicio.elapsed().as_secs_f64());
        info!("🎉 Processamento e Lançamento concluído em {}", tempo_total);

        Ok(EnvelopeExtracao {
            success: true,
            method: "direct_pdf_processing_with_db_launch".to_string(),
            data: dados,
            db_analysis: AnaliseBd {
                fornecedor,
                faturado,
                despesa,
                movimento,
            },
            fallback,
            fallback_message: fallback.then(|| {
                "O serviço Gemini está temporariamente indisponível. Os dados exibidos são \
                 temporários. Por favor, tente novamente mais tarde."
                    .to_string()
            }),
            metadata: MetadadosProcessamento {
                filename: arquivo.nome,
                file_size: arquivo.tamanho,
                processing_time: tempo_total,
                timestamp: Utc::now().to_rfc3339(),
            },
        })
    }
}
