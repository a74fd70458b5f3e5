// src/models/consulta.rs
//
// Tipos do caminho de consulta em linguagem natural: critérios devolvidos
// pelo tradutor de perguntas, resultados agregados e envelopes das rotas
// /consultar e /consultar-embedding.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CriteriosBusca {
    #[serde(default)]
    pub tipo_consulta: Option<String>,

    pub filtros: FiltrosBusca,

    /// "soma" | "media" | "contagem" | "lista". Mantida como texto livre:
    /// um modo desconhecido vira o agregado sentinela "desconhecido".
    #[serde(default)]
    pub agregacao: Option<String>,

    #[serde(default)]
    pub resposta_amigavel: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FiltrosBusca {
    #[serde(default)]
    pub fornecedor_nome: Option<String>,

    #[serde(default)]
    pub fornecedor_cnpj: Option<String>,

    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub data_inicio: Option<NaiveDate>,

    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub data_fim: Option<NaiveDate>,

    #[serde(default)]
    pub valor_min: Option<Decimal>,

    #[serde(default)]
    pub valor_max: Option<Decimal>,

    #[serde(default)]
    pub classificacao: Option<String>,

    #[serde(default)]
    pub numero_nota: Option<String>,
}

impl CriteriosBusca {
    /// Degradação de melhor esforço quando a tradução falha: a pergunta
    /// inteira vira filtro de nome de fornecedor e a agregação é forçada
    /// para lista. Responder algo vale mais do que não responder nada.
    pub fn fallback(pergunta: &str) -> Self {
        Self {
            tipo_consulta: Some("geral".to_string()),
            filtros: FiltrosBusca {
                fornecedor_nome: Some(pergunta.to_string()),
                ..FiltrosBusca::default()
            },
            agregacao: Some("lista".to_string()),
            resposta_amigavel: None,
        }
    }
}

/// Visão achatada de um movimento para o agregado "lista".
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotaResumo {
    pub id: Uuid,
    pub numero_nf: Option<String>,
    pub fornecedor: String,
    pub valor: Decimal,

    #[schema(value_type = String, format = Date)]
    pub data: NaiveDate,

    pub descricao: String,
    pub classificacao: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "tipo")]
pub enum ResultadoAgregado {
    #[serde(rename = "lista")]
    Lista { total: usize, dados: Vec<NotaResumo> },

    #[serde(rename = "soma")]
    Soma {
        total: usize,
        valor_total: Decimal,
        valor_total_formatado: String,
    },

    #[serde(rename = "media")]
    Media {
        total: usize,
        valor_medio: Decimal,
        valor_medio_formatado: String,
    },

    #[serde(rename = "contagem")]
    Contagem { total: usize },

    #[serde(rename = "desconhecido")]
    Desconhecido { dados: Vec<NotaResumo> },
}

// --- Envelopes das rotas de consulta ---

#[derive(Debug, Serialize, ToSchema)]
pub struct RespostaConsulta {
    pub sucesso: bool,
    pub pergunta_original: String,
    pub criterios_busca: CriteriosBusca,
    pub resultados: ResultadoAgregado,
    pub resposta_natural: String,
    pub metadados: MetadadosConsulta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetadadosConsulta {
    pub total_encontrado: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RespostaEmbedding {
    pub resposta: String,
    pub contexto_usado: String,
    pub documentos_originais: Vec<DocumentoResumo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentoResumo {
    pub texto: String,
    pub distancia: f64,
}
