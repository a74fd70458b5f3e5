// src/models/extracao.rs
//
// Contrato JSON que o Gemini deve devolver ao analisar o PDF de uma NF-e.
// O parse tipado é a etapa de validação de esquema: formatos fora do
// contrato são rejeitados em vez de aproveitados parcialmente.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::cadastro::{Classificacao, Pessoa, ResultadoCadastro};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DadosNotaFiscal {
    pub fornecedor: FornecedorExtraido,
    pub faturado: FaturadoExtraido,

    pub numero_nota_fiscal: Option<String>,

    /// YYYY-MM-DD
    pub data_emissao: Option<String>,

    pub descricao_produtos: Option<String>,

    #[serde(default)]
    pub quantidade_parcelas: Option<u32>,

    /// YYYY-MM-DD
    pub data_vencimento: Option<String>,

    /// Valor em centavos (ex: 344900 para R$ 3.449,00). O modelo às vezes
    /// devolve número, às vezes string; os dois formatos são tolerados.
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = 344900)]
    pub valor_total: Option<Value>,

    /// Uma das nove categorias do prompt. Não é validada aqui: quem consome
    /// precisa tratar como entrada não confiável.
    pub classificacao_despesa: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FornecedorExtraido {
    pub razao_social: Option<String>,
    pub fantasia: Option<String>,
    pub cnpj: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FaturadoExtraido {
    pub nome_completo: Option<String>,
    pub cpf: Option<String>,
}

impl DadosNotaFiscal {
    /// Quantidade de parcelas com o default do contrato (1).
    pub fn parcelas(&self) -> u32 {
        self.quantidade_parcelas.unwrap_or(1).max(1)
    }

    /// Valor total em centavos, coagido de número ou string.
    pub fn valor_total_centavos(&self) -> Option<f64> {
        match self.valor_total.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

// --- Envelope da rota /extract-data ---

#[derive(Debug, Serialize, ToSchema)]
pub struct EnvelopeExtracao {
    pub success: bool,
    pub method: String,
    pub data: DadosNotaFiscal,

    #[serde(rename = "dbAnalysis")]
    pub db_analysis: AnaliseBd,

    pub fallback: bool,

    #[serde(rename = "fallbackMessage")]
    pub fallback_message: Option<String>,

    pub metadata: MetadadosProcessamento,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnaliseBd {
    pub fornecedor: ResultadoCadastro<Pessoa>,
    pub faturado: ResultadoCadastro<Pessoa>,
    pub despesa: ResultadoCadastro<Classificacao>,
    pub movimento: ResultadoMovimento,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResultadoMovimento {
    pub status: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(rename = "parcelaId", skip_serializing_if = "Option::is_none")]
    pub parcela_id: Option<Uuid>,
}

impl ResultadoMovimento {
    pub fn criado(id: Uuid, parcela_id: Option<Uuid>) -> Self {
        Self {
            status: "CRIADO_SUCESSO".to_string(),
            message: "Registro lançado com sucesso.".to_string(),
            id: Some(id),
            parcela_id,
        }
    }

    pub fn falha(message: impl Into<String>) -> Self {
        Self {
            status: "FALHA_CRIACAO".to_string(),
            message: message.into(),
            id: None,
            parcela_id: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetadadosProcessamento {
    pub filename: String,

    #[serde(rename = "fileSize")]
    pub file_size: usize,

    #[serde(rename = "processingTime")]
    pub processing_time: String,

    pub timestamp: String,
}

/// PDF recebido no upload multipart.
#[derive(Debug, Clone)]
pub struct ArquivoNota {
    pub nome: String,
    pub tamanho: usize,
    pub conteudo: Vec<u8>,
}

/// Campos opcionais do formulário de upload usados para semear o registro de
/// fallback quando o Gemini está indisponível.
#[derive(Debug, Clone, Default)]
pub struct CamposFallback {
    pub cnpj_fornecedor: Option<String>,
    pub nome_faturado: Option<String>,
    pub numero_nf: Option<String>,
    pub valor_total: Option<String>,
    pub classificacao: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valor_total_aceita_numero_ou_string() {
        let mut dados: DadosNotaFiscal = serde_json::from_value(serde_json::json!({
            "fornecedor": {"razao_social": "X", "fantasia": null, "cnpj": "1"},
            "faturado": {"nome_completo": "Y", "cpf": "2"},
            "numero_nota_fiscal": null,
            "data_emissao": null,
            "descricao_produtos": null,
            "data_vencimento": null,
            "valor_total": 344900,
            "classificacao_despesa": null
        }))
        .unwrap();

        assert_eq!(dados.valor_total_centavos(), Some(344900.0));
        assert_eq!(dados.parcelas(), 1);

        dados.valor_total = Some(Value::String("344900".to_string()));
        assert_eq!(dados.valor_total_centavos(), Some(344900.0));

        dados.valor_total = None;
        assert_eq!(dados.valor_total_centavos(), None);
    }

    #[test]
    fn formato_fora_do_contrato_e_rejeitado() {
        // "fornecedor" como string viola o esquema: o parse falha em vez de
        // aproveitar um casamento parcial.
        let resultado: Result<DadosNotaFiscal, _> = serde_json::from_value(serde_json::json!({
            "fornecedor": "AGRO INSUMOS LTDA",
            "faturado": {"nome_completo": "Y", "cpf": "2"}
        }));
        assert!(resultado.is_err());
    }
}
