// src/services/movimento_service.rs
//
// Criação transacional de movimento + parcelas + vínculo de classificação,
// consultas detalhadas e o ciclo de vida das parcelas.

use chrono::{Months, NaiveDate, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{MovimentoRepository, PessoaRepository},
    models::extracao::DadosNotaFiscal,
    models::movimento::{
        FiltroMovimentos, MovimentoContas, MovimentoDetalhado, ParcelaContas, StatusMovimento,
        StatusParcela, TipoMovimento,
    },
};

#[derive(Clone)]
pub struct MovimentoService {
    pool: PgPool,
    movimentos: MovimentoRepository,
    pessoas: PessoaRepository,
}

impl MovimentoService {
    pub fn new(pool: PgPool, movimentos: MovimentoRepository, pessoas: PessoaRepository) -> Self {
        Self {
            pool,
            movimentos,
            pessoas,
        }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    /// Cria o movimento e suas parcelas numa única transação. Falha fechado
    /// (erro duro, nenhuma linha gravada) se faltar qualquer ID de
    /// dependência ou se o valor não for positivo após a conversão de
    /// centavos para reais.
    pub async fn criar_movimento_e_parcelas(
        &self,
        dados: &DadosNotaFiscal,
        fornecedor_id: Option<Uuid>,
        faturado_id: Option<Uuid>,
        classificacao_id: Option<Uuid>,
    ) -> Result<(MovimentoContas, Vec<ParcelaContas>), AppError> {
        let (Some(fornecedor_id), Some(faturado_id), Some(classificacao_id)) =
            (fornecedor_id, faturado_id, classificacao_id)
        else {
            return Err(AppError::DadosMovimentoInvalidos(
                "IDs de Fornecedor, Faturado ou Classificação não foram resolvidos.".to_string(),
            ));
        };

        let centavos = dados.valor_total_centavos().ok_or_else(|| {
            AppError::DadosMovimentoInvalidos("Valor total ausente ou não numérico.".to_string())
        })?;
        let quantidade = dados.parcelas();
        let (valor_total, valor_parcela) = calcular_valores(centavos, quantidade)?;

        let data_emissao = dados
            .data_emissao
            .as_deref()
            .and_then(analisar_data)
            .ok_or_else(|| {
                AppError::DadosMovimentoInvalidos("Data de emissão ausente ou inválida.".to_string())
            })?;
        let primeiro_vencimento = dados
            .data_vencimento
            .as_deref()
            .and_then(analisar_data)
            .unwrap_or_else(|| Utc::now().date_naive());

        let numero = dados.numero_nota_fiscal.as_deref();
        let descricao = dados
            .descricao_produtos
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("NF {}", numero.unwrap_or("S/N")));

        let mut tx = self.pool.begin().await?;

        let movimento = self
            .movimentos
            .inserir_movimento(
                &mut *tx,
                TipoMovimento::Apagar,
                numero,
                data_emissao,
                &descricao,
                valor_total,
                fornecedor_id,
                faturado_id,
            )
            .await?;

        self.movimentos
            .vincular_classificacao(&mut *tx, movimento.id, classificacao_id)
            .await?;

        let mut parcelas = Vec::with_capacity(quantidade as usize);
        for k in 1..=quantidade {
            // Parcela k vence k-1 meses após o primeiro vencimento
            let vencimento = primeiro_vencimento
                .checked_add_months(Months::new(k - 1))
                .unwrap_or(primeiro_vencimento);
            let parcela = self
                .movimentos
                .inserir_parcela(
                    &mut *tx,
                    movimento.id,
                    &format!("{k}/{quantidade}"),
                    vencimento,
                    valor_parcela,
                )
                .await?;
            parcelas.push(parcela);
        }

        tx.commit().await?;

        Ok((movimento, parcelas))
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn buscar_detalhado(&self, id: Uuid) -> Result<Option<MovimentoDetalhado>, AppError> {
        match self.movimentos.buscar_por_id(id).await? {
            Some(movimento) => Ok(Some(self.montar_detalhado(movimento).await?)),
            None => Ok(None),
        }
    }

    pub async fn buscar_por_filtros(
        &self,
        filtro: &FiltroMovimentos,
    ) -> Result<Vec<MovimentoDetalhado>, AppError> {
        let movimentos = self.movimentos.listar(filtro).await?;

        let mut detalhados = Vec::with_capacity(movimentos.len());
        for movimento in movimentos {
            detalhados.push(self.montar_detalhado(movimento).await?);
        }

        Ok(detalhados)
    }

    /// Listagem do console de gestão: só pendentes por padrão e filtro de
    /// texto aplicado sobre número da nota e razão social do fornecedor.
    pub async fn listar_contas(
        &self,
        termo: Option<&str>,
        tipo: Option<TipoMovimento>,
        incluir_todos: bool,
    ) -> Result<Vec<MovimentoDetalhado>, AppError> {
        let filtro = FiltroMovimentos {
            status: if incluir_todos {
                None
            } else {
                Some(StatusMovimento::Pendente)
            },
            tipo,
            ..FiltroMovimentos::default()
        };

        let mut detalhados = self.buscar_por_filtros(&filtro).await?;

        if let Some(termo) = termo.map(str::to_lowercase).filter(|t| !t.is_empty()) {
            detalhados.retain(|m| {
                m.movimento
                    .numeronotafiscal
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&termo))
                    || m.fornecedor_cliente
                        .razaosocial
                        .to_lowercase()
                        .contains(&termo)
            });
        }

        Ok(detalhados)
    }

    pub async fn excluir_movimento_logico(&self, id: Uuid) -> Result<(), AppError> {
        self.movimentos
            .alterar_status(id, StatusMovimento::Inativo)
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)?;

        Ok(())
    }

    async fn montar_detalhado(
        &self,
        movimento: MovimentoContas,
    ) -> Result<MovimentoDetalhado, AppError> {
        let fornecedor = self
            .pessoas
            .buscar_por_id(movimento.fornecedor_id)
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)?;
        let faturado = self
            .pessoas
            .buscar_por_id(movimento.faturado_id)
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)?;
        let parcelas = self.movimentos.parcelas_do_movimento(movimento.id).await?;
        let classificacoes = self
            .movimentos
            .classificacoes_do_movimento(movimento.id)
            .await?;

        Ok(MovimentoDetalhado {
            movimento,
            fornecedor_cliente: fornecedor,
            faturado,
            parcelas,
            classificacoes,
        })
    }

    // =========================================================================
    //  PARCELAS
    // =========================================================================

    /// Registra o pagamento de uma parcela: abate do saldo devedor atual e
    /// vira PAGO exatamente quando o saldo chega a zero ou menos.
    pub async fn registrar_pagamento_parcela(
        &self,
        id: Uuid,
        valor_pago: Decimal,
    ) -> Result<ParcelaContas, AppError> {
        if valor_pago <= Decimal::ZERO {
            return Err(AppError::DadosMovimentoInvalidos(
                "Valor pago deve ser positivo.".to_string(),
            ));
        }

        let parcela = self
            .movimentos
            .buscar_parcela(id)
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)?;

        let (pago_acumulado, novo_saldo, novo_status) =
            aplicar_pagamento(parcela.valorsaldo, parcela.valorpago, valor_pago);

        self.movimentos
            .atualizar_pagamento_parcela(id, pago_acumulado, novo_saldo, novo_status)
            .await
    }
}

/// Converte o valor em centavos para reais e calcula o valor de cada
/// parcela (divisão igual, arredondada a duas casas). Valor não positivo é
/// erro duro.
fn calcular_valores(centavos: f64, quantidade: u32) -> Result<(Decimal, Decimal), AppError> {
    let total = Decimal::from_f64(centavos)
        .ok_or_else(|| {
            AppError::DadosMovimentoInvalidos("Valor total não numérico.".to_string())
        })?
        / Decimal::from(100);
    let total = total.round_dp(2);

    if total <= Decimal::ZERO {
        return Err(AppError::DadosMovimentoInvalidos(
            "Valor total deve ser positivo.".to_string(),
        ));
    }

    let parcela = (total / Decimal::from(quantidade.max(1))).round_dp(2);

    Ok((total, parcela))
}

fn aplicar_pagamento(
    saldo_atual: Decimal,
    pago_atual: Option<Decimal>,
    valor_pago: Decimal,
) -> (Decimal, Decimal, StatusParcela) {
    let pago_acumulado = pago_atual.unwrap_or(Decimal::ZERO) + valor_pago;
    let novo_saldo = saldo_atual - valor_pago;
    let novo_status = if novo_saldo <= Decimal::ZERO {
        StatusParcela::Pago
    } else {
        StatusParcela::Pendente
    };

    (pago_acumulado, novo_saldo, novo_status)
}

fn analisar_data(texto: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(texto.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(texto: &str) -> Decimal {
        texto.parse().unwrap()
    }

    #[test]
    fn centavos_viram_reais_e_parcelas_iguais() {
        // 344900 centavos em 2 parcelas: total R$ 3.449,00, parcela R$ 1.724,50
        let (total, parcela) = calcular_valores(344900.0, 2).unwrap();
        assert_eq!(total, dec("3449.00"));
        assert_eq!(parcela, dec("1724.50"));

        let (total, parcela) = calcular_valores(344900.0, 1).unwrap();
        assert_eq!(total, dec("3449.00"));
        assert_eq!(parcela, dec("3449.00"));
    }

    #[test]
    fn valor_nao_positivo_e_erro_duro() {
        assert!(matches!(
            calcular_valores(0.0, 1),
            Err(AppError::DadosMovimentoInvalidos(_))
        ));
        assert!(matches!(
            calcular_valores(-100.0, 1),
            Err(AppError::DadosMovimentoInvalidos(_))
        ));
    }

    #[test]
    fn pagamento_parcial_mantem_pendente() {
        let (pago, saldo, status) = aplicar_pagamento(dec("1724.50"), None, dec("1000.00"));
        assert_eq!(pago, dec("1000.00"));
        assert_eq!(saldo, dec("724.50"));
        assert_eq!(status, StatusParcela::Pendente);
    }

    #[test]
    fn pagamento_que_zera_o_saldo_quita_a_parcela() {
        let (pago, saldo, status) =
            aplicar_pagamento(dec("724.50"), Some(dec("1000.00")), dec("724.50"));
        assert_eq!(pago, dec("1724.50"));
        assert_eq!(saldo, dec("0.00"));
        assert_eq!(status, StatusParcela::Pago);
    }

    #[test]
    fn pagamento_acima_do_saldo_tambem_quita() {
        let (_, saldo, status) = aplicar_pagamento(dec("100.00"), None, dec("150.00"));
        assert_eq!(saldo, dec("-50.00"));
        assert_eq!(status, StatusParcela::Pago);
    }

    #[test]
    fn datas_fora_do_formato_iso_sao_rejeitadas() {
        assert_eq!(
            analisar_data("2024-10-01"),
            NaiveDate::from_ymd_opt(2024, 10, 1)
        );
        assert_eq!(analisar_data("01/10/2024"), None);
        assert_eq!(analisar_data(""), None);
    }
}
