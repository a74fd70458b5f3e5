// src/db/pessoa_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::cadastro::{Pessoa, StatusRegistro, TipoPessoa},
};

#[derive(Clone)]
pub struct PessoaRepository {
    pool: PgPool,
}

impl PessoaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Consulta pela chave natural (documento já normalizado).
    pub async fn buscar_por_documento(&self, documento: &str) -> Result<Option<Pessoa>, AppError> {
        let pessoa = sqlx::query_as::<_, Pessoa>("SELECT * FROM pessoas WHERE documento = $1")
            .bind(documento)
            .fetch_optional(&self.pool)
            .await?;

        Ok(pessoa)
    }

    pub async fn buscar_por_id(&self, id: Uuid) -> Result<Option<Pessoa>, AppError> {
        let pessoa = sqlx::query_as::<_, Pessoa>("SELECT * FROM pessoas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(pessoa)
    }

    pub async fn inserir(
        &self,
        tipo: TipoPessoa,
        razaosocial: &str,
        fantasia: &str,
        documento: &str,
    ) -> Result<Pessoa, AppError> {
        let pessoa = sqlx::query_as::<_, Pessoa>(
            r#"
            INSERT INTO pessoas (tipo, razaosocial, fantasia, documento)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tipo)
        .bind(razaosocial)
        .bind(fantasia)
        .bind(documento)
        .fetch_one(&self.pool)
        .await?;

        Ok(pessoa)
    }

    pub async fn listar(
        &self,
        termo: Option<&str>,
        tipo: Option<TipoPessoa>,
        incluir_inativos: bool,
    ) -> Result<Vec<Pessoa>, AppError> {
        let mut consulta = QueryBuilder::<Postgres>::new("SELECT * FROM pessoas WHERE 1=1");

        if !incluir_inativos {
            consulta.push(" AND status = ");
            consulta.push_bind(StatusRegistro::Ativo);
        }
        if let Some(tipo) = tipo {
            consulta.push(" AND tipo = ");
            consulta.push_bind(tipo);
        }
        if let Some(termo) = termo.filter(|t| !t.trim().is_empty()) {
            let padrao = format!("%{}%", termo.trim());
            consulta.push(" AND (razaosocial ILIKE ");
            consulta.push_bind(padrao.clone());
            consulta.push(" OR fantasia ILIKE ");
            consulta.push_bind(padrao.clone());
            consulta.push(" OR documento LIKE ");
            consulta.push_bind(padrao);
            consulta.push(")");
        }

        consulta.push(" ORDER BY razaosocial ASC");

        let pessoas = consulta
            .build_query_as::<Pessoa>()
            .fetch_all(&self.pool)
            .await?;

        Ok(pessoas)
    }

    /// Patch de campos; o status nunca é alterado por aqui.
    pub async fn atualizar(
        &self,
        id: Uuid,
        razaosocial: Option<&str>,
        fantasia: Option<&str>,
        documento: Option<&str>,
    ) -> Result<Option<Pessoa>, AppError> {
        let pessoa = sqlx::query_as::<_, Pessoa>(
            r#"
            UPDATE pessoas SET
                razaosocial = COALESCE($2, razaosocial),
                fantasia    = COALESCE($3, fantasia),
                documento   = COALESCE($4, documento),
                updated_at  = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(razaosocial)
        .bind(fantasia)
        .bind(documento)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pessoa)
    }

    /// Quantos movimentos referenciam a pessoa como fornecedor ou faturado.
    pub async fn contar_movimentos_vinculados(&self, id: Uuid) -> Result<i64, AppError> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM movimento_contas WHERE fornecedor_id = $1 OR faturado_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    pub async fn alterar_status(
        &self,
        id: Uuid,
        status: StatusRegistro,
    ) -> Result<Option<Pessoa>, AppError> {
        let pessoa = sqlx::query_as::<_, Pessoa>(
            "UPDATE pessoas SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pessoa)
    }
}
