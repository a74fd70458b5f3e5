// src/db/classificacao_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::cadastro::{Classificacao, StatusRegistro, TipoClassificacao},
};

#[derive(Clone)]
pub struct ClassificacaoRepository {
    pool: PgPool,
}

impl ClassificacaoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Chave natural: descrição (case-insensitive) dentro de um tipo.
    pub async fn buscar_por_descricao(
        &self,
        descricao: &str,
        tipo: TipoClassificacao,
    ) -> Result<Option<Classificacao>, AppError> {
        let classificacao = sqlx::query_as::<_, Classificacao>(
            "SELECT * FROM classificacao WHERE lower(descricao) = lower($1) AND tipo = $2",
        )
        .bind(descricao)
        .bind(tipo)
        .fetch_optional(&self.pool)
        .await?;

        Ok(classificacao)
    }

    pub async fn buscar_por_id(&self, id: Uuid) -> Result<Option<Classificacao>, AppError> {
        let classificacao =
            sqlx::query_as::<_, Classificacao>("SELECT * FROM classificacao WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(classificacao)
    }

    pub async fn inserir(
        &self,
        descricao: &str,
        tipo: TipoClassificacao,
    ) -> Result<Classificacao, AppError> {
        let classificacao = sqlx::query_as::<_, Classificacao>(
            r#"
            INSERT INTO classificacao (tipo, descricao)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(tipo)
        .bind(descricao)
        .fetch_one(&self.pool)
        .await?;

        Ok(classificacao)
    }

    pub async fn listar(
        &self,
        termo: Option<&str>,
        tipo: Option<TipoClassificacao>,
        incluir_inativos: bool,
    ) -> Result<Vec<Classificacao>, AppError> {
        let mut consulta = QueryBuilder::<Postgres>::new("SELECT * FROM classificacao WHERE 1=1");

        if !incluir_inativos {
            consulta.push(" AND status = ");
            consulta.push_bind(StatusRegistro::Ativo);
        }
        if let Some(tipo) = tipo {
            consulta.push(" AND tipo = ");
            consulta.push_bind(tipo);
        }
        if let Some(termo) = termo.filter(|t| !t.trim().is_empty()) {
            consulta.push(" AND descricao ILIKE ");
            consulta.push_bind(format!("%{}%", termo.trim()));
        }

        consulta.push(" ORDER BY descricao ASC");

        let classificacoes = consulta
            .build_query_as::<Classificacao>()
            .fetch_all(&self.pool)
            .await?;

        Ok(classificacoes)
    }

    pub async fn atualizar(
        &self,
        id: Uuid,
        descricao: Option<&str>,
        tipo: Option<TipoClassificacao>,
    ) -> Result<Option<Classificacao>, AppError> {
        let classificacao = sqlx::query_as::<_, Classificacao>(
            r#"
            UPDATE classificacao SET
                descricao  = COALESCE($2, descricao),
                tipo       = COALESCE($3, tipo),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(descricao)
        .bind(tipo)
        .fetch_optional(&self.pool)
        .await?;

        Ok(classificacao)
    }

    /// Quantos vínculos movimento-classificação apontam para o registro.
    pub async fn contar_movimentos_vinculados(&self, id: Uuid) -> Result<i64, AppError> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM movimento_contas_classificacao WHERE classificacao_id = $1",
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
    ) -> Result<Option<Classificacao>, AppError> {
        let classificacao = sqlx::query_as::<_, Classificacao>(
            "UPDATE classificacao SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(classificacao)
    }
}
