// src/models/cadastro.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_pessoa", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TipoPessoa {
    Fisica,   // CPF
    Juridica, // CNPJ
}

impl TipoPessoa {
    /// Heurística da nota fiscal: mais de 11 dígitos (CNPJ) = JURIDICA.
    pub fn inferir(documento: &str) -> Self {
        if documento.len() > 11 {
            TipoPessoa::Juridica
        } else {
            TipoPessoa::Fisica
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_registro", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusRegistro {
    Ativo,
    Inativo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_classificacao", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TipoClassificacao {
    Despesa,
    Receita,
}

/// Remove tudo que não for dígito do CPF/CNPJ antes de qualquer consulta ou
/// gravação ("18.944.113/0002-91" vira "18944113000291").
pub fn normalizar_documento(documento: &str) -> String {
    documento.chars().filter(|c| c.is_ascii_digit()).collect()
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Pessoa {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    pub tipo: TipoPessoa,

    #[schema(example = "AGRO INSUMOS LTDA")]
    pub razaosocial: String,

    #[schema(example = "Agro Insumos")]
    pub fantasia: String,

    // Sempre armazenado normalizado (apenas dígitos)
    #[schema(example = "18944113000291")]
    pub documento: String,

    pub status: StatusRegistro,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Classificacao {
    pub id: Uuid,

    pub tipo: TipoClassificacao,

    #[schema(example = "INSUMOS AGRÍCOLAS")]
    pub descricao: String,

    pub status: StatusRegistro,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Resultado das operações de cadastro (máquina de estados do gateway) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum StatusCadastro {
    #[serde(rename = "EXISTE")]
    Existe,
    #[serde(rename = "CRIADO")]
    Criado,
    #[serde(rename = "ERRO_DADOS")]
    ErroDados,
}

/// Resultado tri-estado das operações consultar-ou-criar. O mesmo formato
/// serve para pessoas e classificações; os campos extras (documento e
/// razão social) só são preenchidos para pessoas.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultadoCadastro<T> {
    pub status: StatusCadastro,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub documento: Option<String>,

    #[serde(rename = "razaoSocial", skip_serializing_if = "Option::is_none")]
    pub razao_social: Option<String>,
}

impl<T> ResultadoCadastro<T> {
    pub fn erro_dados(message: impl Into<String>) -> Self {
        Self {
            status: StatusCadastro::ErroDados,
            id: None,
            data: None,
            message: message.into(),
            documento: None,
            razao_social: None,
        }
    }

    pub fn existe(id: Uuid, data: T) -> Self {
        Self {
            status: StatusCadastro::Existe,
            id: Some(id),
            data: Some(data),
            message: "EXISTE".to_string(),
            documento: None,
            razao_social: None,
        }
    }

    pub fn criado(id: Uuid, data: T) -> Self {
        Self {
            status: StatusCadastro::Criado,
            id: Some(id),
            data: Some(data),
            message: "NÃO EXISTE (CRIADO AGORA)".to_string(),
            documento: None,
            razao_social: None,
        }
    }
}

/// Resultado das exclusões lógicas. A recusa por vínculo com movimentos é um
/// resultado estruturado, não uma exceção.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultadoExclusao {
    pub status: StatusExclusao,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum StatusExclusao {
    #[serde(rename = "SUCESSO")]
    Sucesso,
    #[serde(rename = "ERRO")]
    Erro,
}

impl ResultadoExclusao {
    pub fn sucesso(message: impl Into<String>) -> Self {
        Self {
            status: StatusExclusao::Sucesso,
            message: message.into(),
        }
    }

    pub fn erro(message: impl Into<String>) -> Self {
        Self {
            status: StatusExclusao::Erro,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizacao_remove_pontuacao_do_documento() {
        assert_eq!(normalizar_documento("18.944.113/0002-91"), "18944113000291");
        assert_eq!(normalizar_documento("709.046.011-88"), "70904601188");
        assert_eq!(normalizar_documento(""), "");
        assert_eq!(normalizar_documento("abc"), "");
    }

    #[test]
    fn tipo_inferido_pelo_tamanho_do_documento() {
        // 14 dígitos (CNPJ) = JURIDICA, 11 (CPF) = FISICA
        assert_eq!(TipoPessoa::inferir("18944113000291"), TipoPessoa::Juridica);
        assert_eq!(TipoPessoa::inferir("70904601188"), TipoPessoa::Fisica);
    }

    #[test]
    fn status_cadastro_serializa_no_formato_do_front() {
        let r: ResultadoCadastro<Pessoa> = ResultadoCadastro::erro_dados("faltou documento");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "ERRO_DADOS");
        assert!(json.get("id").is_none());
    }
}
