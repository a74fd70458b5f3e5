// src/models/movimento.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::cadastro::{Classificacao, Pessoa};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_movimento", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TipoMovimento {
    Apagar,   // Contas a Pagar (notas extraídas)
    Areceber, // Contas a Receber
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_movimento", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusMovimento {
    Pendente,
    Pago,
    Inativo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_parcela", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusParcela {
    Pendente,
    Pago,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MovimentoContas {
    pub id: Uuid,

    pub tipo: TipoMovimento,

    #[schema(example = "000207590")]
    pub numeronotafiscal: Option<String>,

    #[schema(value_type = String, format = Date, example = "2024-10-01")]
    pub datemissao: NaiveDate,

    pub descricao: String,

    pub status: StatusMovimento,

    #[schema(example = "3449.00")]
    pub valortotal: Decimal,

    pub fornecedor_id: Uuid,
    pub faturado_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParcelaContas {
    pub id: Uuid,

    pub movimento_id: Uuid,

    #[schema(example = "1/2")]
    pub identificacao: String,

    #[schema(value_type = String, format = Date, example = "2024-11-01")]
    pub datavencimento: NaiveDate,

    #[schema(example = "1724.50")]
    pub valorparcela: Decimal,

    pub valorpago: Option<Decimal>,

    // Saldo devedor: nasce igual ao valor da parcela e é abatido pelos
    // pagamentos. PAGO exatamente quando chega a zero ou menos.
    pub valorsaldo: Decimal,

    pub statusparcela: StatusParcela,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Movimento com todos os vínculos resolvidos, no formato que o front e os
/// agentes de consulta consomem.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MovimentoDetalhado {
    #[serde(flatten)]
    pub movimento: MovimentoContas,

    #[serde(rename = "fornecedorCliente")]
    pub fornecedor_cliente: Pessoa,

    pub faturado: Pessoa,

    pub parcelas: Vec<ParcelaContas>,

    pub classificacoes: Vec<Classificacao>,
}

/// Filtros de busca aplicados sobre movimentos (montados pelo tradutor de
/// perguntas ou pelos endpoints de gestão).
#[derive(Debug, Clone, Default)]
pub struct FiltroMovimentos {
    pub status: Option<StatusMovimento>,
    pub tipo: Option<TipoMovimento>,
    pub fornecedor_nome: Option<String>,
    pub fornecedor_cnpj: Option<String>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub valor_min: Option<Decimal>,
    pub valor_max: Option<Decimal>,
    pub classificacao: Option<String>,
    pub numero_nota: Option<String>,
}
