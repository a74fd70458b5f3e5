// src/db/movimento_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::cadastro::Classificacao,
    models::movimento::{
        FiltroMovimentos, MovimentoContas, ParcelaContas, StatusMovimento, StatusParcela,
        TipoMovimento,
    },
};

#[derive(Clone)]
pub struct MovimentoRepository {
    pool: PgPool,
}

impl MovimentoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CRIAÇÃO (participa da transação do serviço)
    // =========================================================================

    pub async fn inserir_movimento<'e, E>(
        &self,
        executor: E,
        tipo: TipoMovimento,
        numeronotafiscal: Option<&str>,
        datemissao: NaiveDate,
        descricao: &str,
        valortotal: Decimal,
        fornecedor_id: Uuid,
        faturado_id: Uuid,
    ) -> Result<MovimentoContas, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimento = sqlx::query_as::<_, MovimentoContas>(
            r#"
            INSERT INTO movimento_contas (
                tipo, numeronotafiscal, datemissao, descricao,
                valortotal, fornecedor_id, faturado_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tipo)
        .bind(numeronotafiscal)
        .bind(datemissao)
        .bind(descricao)
        .bind(valortotal)
        .bind(fornecedor_id)
        .bind(faturado_id)
        .fetch_one(executor)
        .await?;

        Ok(movimento)
    }

    pub async fn inserir_parcela<'e, E>(
        &self,
        executor: E,
        movimento_id: Uuid,
        identificacao: &str,
        datavencimento: NaiveDate,
        valorparcela: Decimal,
    ) -> Result<ParcelaContas, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O saldo nasce igual ao valor da parcela
        let parcela = sqlx::query_as::<_, ParcelaContas>(
            r#"
            INSERT INTO parcela_contas (
                movimento_id, identificacao, datavencimento, valorparcela, valorsaldo
            )
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(movimento_id)
        .bind(identificacao)
        .bind(datavencimento)
        .bind(valorparcela)
        .fetch_one(executor)
        .await?;

        Ok(parcela)
    }

    pub async fn vincular_classificacao<'e, E>(
        &self,
        executor: E,
        movimento_id: Uuid,
        classificacao_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO movimento_contas_classificacao (movimento_id, classificacao_id) VALUES ($1, $2)",
        )
        .bind(movimento_id)
        .bind(classificacao_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn buscar_por_id(&self, id: Uuid) -> Result<Option<MovimentoContas>, AppError> {
        let movimento =
            sqlx::query_as::<_, MovimentoContas>("SELECT * FROM movimento_contas WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(movimento)
    }

    pub async fn listar(&self, filtro: &FiltroMovimentos) -> Result<Vec<MovimentoContas>, AppError> {
        let mut consulta = QueryBuilder::<Postgres>::new(
            "SELECT m.* FROM movimento_contas m JOIN pessoas f ON f.id = m.fornecedor_id WHERE 1=1",
        );

        if let Some(status) = filtro.status {
            consulta.push(" AND m.status = ");
            consulta.push_bind(status);
        }
        if let Some(tipo) = filtro.tipo {
            consulta.push(" AND m.tipo = ");
            consulta.push_bind(tipo);
        }
        if let Some(nome) = filtro.fornecedor_nome.as_deref().filter(|n| !n.trim().is_empty()) {
            consulta.push(" AND f.razaosocial ILIKE ");
            consulta.push_bind(format!("%{}%", nome.trim()));
        }
        if let Some(cnpj) = filtro.fornecedor_cnpj.as_deref().filter(|c| !c.is_empty()) {
            consulta.push(" AND f.documento = ");
            consulta.push_bind(cnpj.to_string());
        }
        if let Some(inicio) = filtro.data_inicio {
            consulta.push(" AND m.datemissao >= ");
            consulta.push_bind(inicio);
        }
        if let Some(fim) = filtro.data_fim {
            consulta.push(" AND m.datemissao <= ");
            consulta.push_bind(fim);
        }
        if let Some(minimo) = filtro.valor_min {
            consulta.push(" AND m.valortotal >= ");
            consulta.push_bind(minimo);
        }
        if let Some(maximo) = filtro.valor_max {
            consulta.push(" AND m.valortotal <= ");
            consulta.push_bind(maximo);
        }
        if let Some(classificacao) = filtro.classificacao.as_deref().filter(|c| !c.trim().is_empty())
        {
            consulta.push(
                " AND EXISTS (SELECT 1 FROM movimento_contas_classificacao l \
                 JOIN classificacao c ON c.id = l.classificacao_id \
                 WHERE l.movimento_id = m.id AND c.descricao ILIKE ",
            );
            consulta.push_bind(format!("%{}%", classificacao.trim()));
            consulta.push(")");
        }
        if let Some(numero) = filtro.numero_nota.as_deref().filter(|n| !n.trim().is_empty()) {
            consulta.push(" AND m.numeronotafiscal LIKE ");
            consulta.push_bind(format!("%{}%", numero.trim()));
        }

        consulta.push(" ORDER BY m.datemissao DESC");

        let movimentos = consulta
            .build_query_as::<MovimentoContas>()
            .fetch_all(&self.pool)
            .await?;

        Ok(movimentos)
    }

    pub async fn parcelas_do_movimento(
        &self,
        movimento_id: Uuid,
    ) -> Result<Vec<ParcelaContas>, AppError> {
        let parcelas = sqlx::query_as::<_, ParcelaContas>(
            "SELECT * FROM parcela_contas WHERE movimento_id = $1 ORDER BY identificacao ASC",
        )
        .bind(movimento_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(parcelas)
    }

    pub async fn classificacoes_do_movimento(
        &self,
        movimento_id: Uuid,
    ) -> Result<Vec<Classificacao>, AppError> {
        let classificacoes = sqlx::query_as::<_, Classificacao>(
            r#"
            SELECT c.* FROM classificacao c
            JOIN movimento_contas_classificacao l ON l.classificacao_id = c.id
            WHERE l.movimento_id = $1
            ORDER BY c.descricao ASC
            "#,
        )
        .bind(movimento_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(classificacoes)
    }

    pub async fn alterar_status(
        &self,
        id: Uuid,
        status: StatusMovimento,
    ) -> Result<Option<MovimentoContas>, AppError> {
        let movimento = sqlx::query_as::<_, MovimentoContas>(
            "UPDATE movimento_contas SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movimento)
    }

    // =========================================================================
    //  PARCELAS
    // =========================================================================

    pub async fn buscar_parcela(&self, id: Uuid) -> Result<Option<ParcelaContas>, AppError> {
        let parcela =
            sqlx::query_as::<_, ParcelaContas>("SELECT * FROM parcela_contas WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(parcela)
    }

    pub async fn atualizar_pagamento_parcela(
        &self,
        id: Uuid,
        valorpago: Decimal,
        valorsaldo: Decimal,
        statusparcela: StatusParcela,
    ) -> Result<ParcelaContas, AppError> {
        let parcela = sqlx::query_as::<_, ParcelaContas>(
            r#"
            UPDATE parcela_contas SET
                valorpago     = $2,
                valorsaldo    = $3,
                statusparcela = $4,
                updated_at    = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(valorpago)
        .bind(valorsaldo)
        .bind(statusparcela)
        .fetch_one(&self.pool)
        .await?;

        Ok(parcela)
    }
}
