// src/services/consulta_service.rs
//
// Caminho de consulta estruturada: pergunta → critérios (via IA, com
// fallback) → busca filtrada → agregação → resposta em linguagem natural.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    ai::{client::GeminiClient, consulta as agente_consulta},
    common::error::AppError,
    models::cadastro::normalizar_documento,
    models::consulta::{
        FiltrosBusca, MetadadosConsulta, NotaResumo, RespostaConsulta, ResultadoAgregado,
    },
    models::movimento::{FiltroMovimentos, MovimentoDetalhado},
    services::MovimentoService,
};

#[derive(Clone)]
pub struct ConsultaService {
    gemini: GeminiClient,
    movimentos: MovimentoService,
}

impl ConsultaService {
    pub fn new(gemini: GeminiClient, movimentos: MovimentoService) -> Self {
        Self { gemini, movimentos }
    }

    pub async fn consultar(&self, pergunta: &str) -> Result<RespostaConsulta, AppError> {
        info!("🚀 Iniciando consulta RAG...");

        // 1. Interpretar a pergunta (degrada para filtro de fornecedor)
        let criterios = agente_consulta::interpretar_pergunta(&self.gemini, pergunta).await;

        // 2. Buscar no banco de dados
        let filtro = montar_filtro(&criterios.filtros);
        let movimentos = self.movimentos.buscar_por_filtros(&filtro).await?;
        info!("✅ Encontradas {} notas fiscais", movimentos.len());

        // 3. Agregar resultados
        let resultados = agregar_resultados(&movimentos, criterios.agregacao.as_deref());

        // 4. Gerar resposta em linguagem natural
        let resposta_natural =
            agente_consulta::gerar_resposta_natural(&self.gemini, pergunta, &resultados).await;

        info!("✅ Consulta RAG concluída");

        Ok(RespostaConsulta {
            sucesso: true,
            pergunta_original: pergunta.to_string(),
            criterios_busca: criterios,
            resultados,
            resposta_natural,
            metadados: MetadadosConsulta {
                total_encontrado: movimentos.len(),
                timestamp: Utc::now().to_rfc3339(),
            },
        })
    }
}

fn montar_filtro(filtros: &FiltrosBusca) -> FiltroMovimentos {
    FiltroMovimentos {
        fornecedor_nome: filtros.fornecedor_nome.clone(),
        fornecedor_cnpj: filtros
            .fornecedor_cnpj
            .as_deref()
            .map(normalizar_documento)
            .filter(|c| !c.is_empty()),
        data_inicio: filtros.data_inicio,
        data_fim: filtros.data_fim,
        valor_min: filtros.valor_min,
        valor_max: filtros.valor_max,
        classificacao: filtros.classificacao.clone(),
        numero_nota: filtros.numero_nota.clone(),
        ..FiltroMovimentos::default()
    }
}

/// Reduz a lista de movimentos para a apresentação pedida. Função pura: a
/// média de uma lista vazia é 0, e um modo desconhecido devolve a lista
/// crua sob o rótulo sentinela.
pub fn agregar_resultados(
    movimentos: &[MovimentoDetalhado],
    agregacao: Option<&str>,
) -> ResultadoAgregado {
    match agregacao {
        None | Some("lista") => ResultadoAgregado::Lista {
            total: movimentos.len(),
            dados: movimentos.iter().map(resumir).collect(),
        },
        Some("soma") => {
            let soma = somar(movimentos);
            ResultadoAgregado::Soma {
                total: movimentos.len(),
                valor_total: soma,
                valor_total_formatado: formatar_brl(soma),
            }
        }
        Some("media") => {
            let media = if movimentos.is_empty() {
                Decimal::ZERO
            } else {
                (somar(movimentos) / Decimal::from(movimentos.len() as u64)).round_dp(2)
            };
            ResultadoAgregado::Media {
                total: movimentos.len(),
                valor_medio: media,
                valor_medio_formatado: formatar_brl(media),
            }
        }
        Some("contagem") => ResultadoAgregado::Contagem {
            total: movimentos.len(),
        },
        Some(_) => ResultadoAgregado::Desconhecido {
            dados: movimentos.iter().map(resumir).collect(),
        },
    }
}

fn somar(movimentos: &[MovimentoDetalhado]) -> Decimal {
    movimentos
        .iter()
        .map(|m| m.movimento.valortotal)
        .sum::<Decimal>()
}

fn resumir(detalhado: &MovimentoDetalhado) -> NotaResumo {
    NotaResumo {
        id: detalhado.movimento.id,
        numero_nf: detalhado.movimento.numeronotafiscal.clone(),
        fornecedor: detalhado.fornecedor_cliente.razaosocial.clone(),
        valor: detalhado.movimento.valortotal,
        data: detalhado.movimento.datemissao,
        descricao: detalhado.movimento.descricao.clone(),
        classificacao: detalhado
            .classificacoes
            .first()
            .map(|c| c.descricao.clone())
            .unwrap_or_else(|| "N/A".to_string()),
    }
}

/// Formata um valor em moeda brasileira: "R$ 3.449,00".
pub fn formatar_brl(valor: Decimal) -> String {
    let negativo = valor.is_sign_negative();
    let texto = format!("{:.2}", valor.abs());
    let (inteiro, centavos) = texto.split_once('.').unwrap_or((texto.as_str(), "00"));

    let mut agrupado = String::new();
    for (posicao, digito) in inteiro.chars().rev().enumerate() {
        if posicao > 0 && posicao % 3 == 0 {
            agrupado.push('.');
        }
        agrupado.push(digito);
    }
    let inteiro: String = agrupado.chars().rev().collect();

    format!("{}R$ {},{}", if negativo { "-" } else { "" }, inteiro, centavos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cadastro::{
        Classificacao, Pessoa, StatusRegistro, TipoClassificacao, TipoPessoa,
    };
    use crate::models::movimento::{MovimentoContas, StatusMovimento, TipoMovimento};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn dec(texto: &str) -> Decimal {
        texto.parse().unwrap()
    }

    fn pessoa(razao: &str) -> Pessoa {
        Pessoa {
            id: Uuid::new_v4(),
            tipo: TipoPessoa::Juridica,
            razaosocial: razao.to_string(),
            fantasia: razao.to_string(),
            documento: "18944113000291".to_string(),
            status: StatusRegistro::Ativo,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn movimento(valor: &str, categoria: Option<&str>) -> MovimentoDetalhado {
        let fornecedor = pessoa("AGRO INSUMOS LTDA");
        let faturado = pessoa("FAZENDA BOA VISTA");

        MovimentoDetalhado {
            movimento: MovimentoContas {
                id: Uuid::new_v4(),
                tipo: TipoMovimento::Apagar,
                numeronotafiscal: Some("000207590".to_string()),
                datemissao: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
                descricao: "Sementes de soja".to_string(),
                status: StatusMovimento::Pendente,
                valortotal: dec(valor),
                fornecedor_id: fornecedor.id,
                faturado_id: faturado.id,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            fornecedor_cliente: fornecedor,
            faturado,
            parcelas: vec![],
            classificacoes: categoria
                .map(|descricao| {
                    vec![Classificacao {
                        id: Uuid::new_v4(),
                        tipo: TipoClassificacao::Despesa,
                        descricao: descricao.to_string(),
                        status: StatusRegistro::Ativo,
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    #[test]
    fn lista_achata_os_movimentos() {
        let movimentos = vec![
            movimento("3449.00", Some("INSUMOS AGRÍCOLAS")),
            movimento("100.00", None),
        ];

        match agregar_resultados(&movimentos, Some("lista")) {
            ResultadoAgregado::Lista { total, dados } => {
                assert_eq!(total, 2);
                assert_eq!(dados[0].fornecedor, "AGRO INSUMOS LTDA");
                assert_eq!(dados[0].classificacao, "INSUMOS AGRÍCOLAS");
                // Sem classificação vinculada, o rótulo é "N/A"
                assert_eq!(dados[1].classificacao, "N/A");
            }
            outro => panic!("esperava lista, veio {outro:?}"),
        }
    }

    #[test]
    fn agregacao_ausente_equivale_a_lista() {
        let movimentos = vec![movimento("10.00", None)];
        assert!(matches!(
            agregar_resultados(&movimentos, None),
            ResultadoAgregado::Lista { total: 1, .. }
        ));
    }

    #[test]
    fn soma_inclui_o_valor_formatado() {
        let movimentos = vec![movimento("3449.00", None), movimento("1551.00", None)];

        match agregar_resultados(&movimentos, Some("soma")) {
            ResultadoAgregado::Soma {
                total,
                valor_total,
                valor_total_formatado,
            } => {
                assert_eq!(total, 2);
                assert_eq!(valor_total, dec("5000.00"));
                assert_eq!(valor_total_formatado, "R$ 5.000,00");
            }
            outro => panic!("esperava soma, veio {outro:?}"),
        }
    }

    #[test]
    fn media_de_lista_vazia_e_zero() {
        match agregar_resultados(&[], Some("media")) {
            ResultadoAgregado::Media {
                total, valor_medio, ..
            } => {
                assert_eq!(total, 0);
                assert_eq!(valor_medio, Decimal::ZERO);
            }
            outro => panic!("esperava media, veio {outro:?}"),
        }
    }

    #[test]
    fn media_divide_a_soma_pela_contagem() {
        let movimentos = vec![movimento("3449.00", None), movimento("1551.00", None)];

        match agregar_resultados(&movimentos, Some("media")) {
            ResultadoAgregado::Media { valor_medio, .. } => {
                assert_eq!(valor_medio, dec("2500.00"));
            }
            outro => panic!("esperava media, veio {outro:?}"),
        }
    }

    #[test]
    fn modo_desconhecido_devolve_a_lista_crua() {
        let movimentos = vec![movimento("10.00", None)];
        match agregar_resultados(&movimentos, Some("mediana")) {
            ResultadoAgregado::Desconhecido { dados } => assert_eq!(dados.len(), 1),
            outro => panic!("esperava desconhecido, veio {outro:?}"),
        }
    }

    #[test]
    fn formatacao_de_moeda_brasileira() {
        assert_eq!(formatar_brl(dec("3449.00")), "R$ 3.449,00");
        assert_eq!(formatar_brl(dec("1724.50")), "R$ 1.724,50");
        assert_eq!(formatar_brl(dec("0")), "R$ 0,00");
        assert_eq!(formatar_brl(dec("1234567.89")), "R$ 1.234.567,89");
        assert_eq!(formatar_brl(dec("-50.10")), "-R$ 50,10");
    }

    #[test]
    fn cnpj_do_filtro_e_normalizado() {
        let filtros = FiltrosBusca {
            fornecedor_cnpj: Some("18.944.113/0002-91".to_string()),
            ..FiltrosBusca::default()
        };

        let filtro = montar_filtro(&filtros);
        assert_eq!(filtro.fornecedor_cnpj.as_deref(), Some("18944113000291"));
        assert!(filtro.status.is_none());
    }
}
