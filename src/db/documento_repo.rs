// src/db/documento_repo.rs

use pgvector::Vector;
use serde_json::Value;
use uuid::Uuid;

use sqlx::PgPool;

use crate::{common::error::AppError, models::documento::DocumentoSimilar};

#[derive(Clone)]
pub struct DocumentoRepository {
    pool: PgPool,
}

impl DocumentoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Limpa o índice inteiro antes de uma reindexação completa.
    pub async fn limpar_indice(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM documento_contexto")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove o chunk de um movimento específico (upsert incremental).
    pub async fn remover_por_movimento(&self, movimento_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM documento_contexto WHERE metadata->>'movimento_id' = $1")
            .bind(movimento_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn inserir(
        &self,
        texto: &str,
        embedding: Vector,
        metadata: Value,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO documento_contexto (texto, embedding, metadata) VALUES ($1, $2, $3)",
        )
        .bind(texto)
        .bind(embedding)
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Busca por similaridade vetorial: distância `<=>` ascendente
    /// (menor = mais próximo), limitada aos top-K.
    pub async fn buscar_similares(
        &self,
        embedding: Vector,
        limite: i64,
    ) -> Result<Vec<DocumentoSimilar>, AppError> {
        let documentos = sqlx::query_as::<_, DocumentoSimilar>(
            r#"
            SELECT texto, metadata, embedding <=> $1 AS distancia
            FROM documento_contexto
            ORDER BY distancia
            LIMIT $2
            "#,
        )
        .bind(embedding)
        .bind(limite)
        .fetch_all(&self.pool)
        .await?;

        Ok(documentos)
    }
}
