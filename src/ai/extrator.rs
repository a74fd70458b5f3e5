// src/ai/extrator.rs
//
// Agente de extração: manda o PDF da nota fiscal para o Gemini e recupera o
// JSON do contrato `DadosNotaFiscal`, com a tolerância de parse necessária
// para respostas embrulhadas em markdown ou cercadas de texto.

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::ai::client::{com_retentativa, AnexoPdf, GeminiClient, MODELO_PRO, MODELO_TEXTO};
use crate::common::error::AppError;
use crate::models::extracao::{CamposFallback, DadosNotaFiscal, FaturadoExtraido, FornecedorExtraido};

pub const CATEGORIAS_DESPESAS: [&str; 9] = [
    "INSUMOS AGRÍCOLAS",
    "MANUTENÇÃO E OPERAÇÃO",
    "RECURSOS HUMANOS",
    "SERVIÇOS OPERACIONAIS",
    "INFRAESTRUTURA E UTILIDADES",
    "ADMINISTRATIVAS",
    "SEGUROS E PROTEÇÃO",
    "IMPOSTOS E TAXAS",
    "INVESTIMENTOS",
];

/// Categoria usada quando o classificador falha ou devolve algo fora da lista.
pub const CATEGORIA_PADRAO: &str = "ADMINISTRATIVAS";

pub const ROTULO_FALLBACK: &str = "DADOS TEMPORÁRIOS - GEMINI INDISPONÍVEL";

/// Recupera um JSON tipado de uma resposta de modelo: remove cercas de
/// markdown, recorta o trecho `{...}` (primeira chave à última) e só então
/// invoca o parser. O parse tipado rejeita formatos fora do contrato em vez
/// de aproveitar casamentos parciais.
pub fn extrair_json<T: DeserializeOwned>(texto: &str) -> Result<T, AppError> {
    let limpo = texto.replace("```json", "").replace("```", "");
    let limpo = limpo.trim();

    let candidato = match (limpo.find('{'), limpo.rfind('}')) {
        (Some(inicio), Some(fim)) if fim > inicio => &limpo[inicio..=fim],
        _ => limpo,
    };

    serde_json::from_str(candidato).map_err(|e| AppError::RespostaIaInvalida(e.to_string()))
}

/// Analisa o PDF de uma NF-e com o Gemini, com retentativa para sobrecarga.
pub async fn processar_pdf(
    client: &GeminiClient,
    pdf: &[u8],
) -> Result<DadosNotaFiscal, AppError> {
    let prompt = montar_prompt_extracao();
    let anexo = AnexoPdf::novo(pdf);

    com_retentativa(|| {
        let prompt = &prompt;
        let anexo = &anexo;
        async move {
            info!("🤖 Processando PDF diretamente com Gemini ({})...", MODELO_TEXTO);
            let texto = client
                .gerar_conteudo(MODELO_TEXTO, prompt, Some(anexo), None)
                .await?;
            let dados = extrair_json::<DadosNotaFiscal>(&texto)?;
            info!("✅ Dados processados com sucesso pelo Gemini");
            Ok(dados)
        }
    })
    .await
}

fn montar_prompt_extracao() -> String {
    let categorias = CATEGORIAS_DESPESAS
        .iter()
        .enumerate()
        .map(|(i, cat)| format!("{}. {}", i + 1, cat))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Você é um especialista em análise de notas fiscais brasileiras (NFe). Analise este documento PDF de uma nota fiscal e extraia EXATAMENTE os seguintes dados em formato JSON válido.

INSTRUÇÕES CRÍTICAS:
- Use 'null' se a informação não for encontrada
- Para datas, use formato YYYY-MM-DD
- Para valores monetários, use apenas números (sem R$ e vírgulas, use somente ponto para separador para casas decimais, exemplo: 3012,00 vira 3012.00)
- Para CNPJ/CPF, mantenha apenas números
- Para classificação de despesa, analise os produtos/serviços e escolha UMA categoria mais adequada

ATENÇÃO ESPECIAL - NÃO CONFUNDA ESTES CAMPOS:
- NÚMERO DA NOTA FISCAL: Aparece como "NF-e N°:" ou "N°:" seguido de números (exemplo: "000.207.590")
- CNPJ DO FORNECEDOR: Formato XX.XXX.XXX/XXXX-XX (exemplo: "18.944.113/0002-91") - geralmente na seção do emitente/fornecedor
- CNPJ/CPF DO DESTINATÁRIO: Na seção "DESTINATÁRIO/REMETENTE"

ESTRUTURA TÍPICA DE UMA NFe:
1. CABEÇALHO: Contém o número da NFe (N°:)
2. EMITENTE/FORNECEDOR: Razão social, CNPJ do fornecedor
3. DESTINATÁRIO: Nome e CNPJ/CPF de quem recebe
4. PRODUTOS/SERVIÇOS: Descrição e valores
5. TOTAIS: Valor total da nota

CATEGORIAS DE DESPESAS DISPONÍVEIS:
{categorias}

FORMATO DE RESPOSTA (JSON):
{{
    "fornecedor": {{
        "razao_social": "string ou null (nome da empresa emitente)",
        "fantasia": "string ou null (nome fantasia se houver)",
        "cnpj": "apenas números ou null (CNPJ da empresa EMITENTE/FORNECEDORA)"
    }},
    "faturado": {{
        "nome_completo": "string ou null (nome do DESTINATÁRIO)",
        "cpf": "apenas números ou null (CPF/CNPJ do DESTINATÁRIO)"
    }},
    "numero_nota_fiscal": "string ou null (número que aparece após 'N°:' ou 'NF-e N°:')",
    "data_emissao": "YYYY-MM-DD ou null",
    "descricao_produtos": "descrição detalhada dos produtos/serviços ou null",
    "quantidade_parcelas": 1,
    "data_vencimento": "YYYY-MM-DD ou null",
    "valor_total": "número ou null (valor em centavos, ex: 344900 para R$ 3.449,00)",
    "classificacao_despesa": "uma das categorias acima ou null"
}}

EXEMPLOS PARA EVITAR CONFUSÃO:
- Se vir "N°: 000.207.590", então numero_nota_fiscal = "000207590"
- Se vir CNPJ "18.944.113/0002-91" na seção do emitente, então fornecedor.cnpj = "18944113000291"
- Se vir CPF "709.046.011-88" na seção destinatário, então faturado.cpf = "70904601188"

RESPOSTA: Retorne APENAS o JSON válido, sem comentários, explicações ou formatação markdown."#
    )
}

/// Registro temporário usado quando a extração com IA falha. Os campos do
/// formulário de upload, quando presentes, semeiam os dados.
pub fn dados_fallback(campos: &CamposFallback) -> DadosNotaFiscal {
    let hoje = Utc::now().date_naive().to_string();

    DadosNotaFiscal {
        fornecedor: FornecedorExtraido {
            razao_social: Some(ROTULO_FALLBACK.to_string()),
            fantasia: Some("FALLBACK".to_string()),
            cnpj: Some(
                campos
                    .cnpj_fornecedor
                    .clone()
                    .unwrap_or_else(|| "00000000000000".to_string()),
            ),
        },
        faturado: FaturadoExtraido {
            nome_completo: Some(
                campos
                    .nome_faturado
                    .clone()
                    .unwrap_or_else(|| "USUÁRIO TEMPORÁRIO".to_string()),
            ),
            cpf: Some("00000000000".to_string()),
        },
        numero_nota_fiscal: Some(
            campos
                .numero_nf
                .clone()
                .unwrap_or_else(|| "TEMPORÁRIO".to_string()),
        ),
        data_emissao: Some(hoje.clone()),
        descricao_produtos: Some(
            "Dados temporários devido à indisponibilidade do serviço Gemini".to_string(),
        ),
        quantidade_parcelas: Some(1),
        data_vencimento: Some(hoje),
        valor_total: campos
            .valor_total
            .clone()
            .map(serde_json::Value::String)
            .or(Some(serde_json::Value::from(0))),
        classificacao_despesa: Some(
            campos
                .classificacao
                .clone()
                .unwrap_or_else(|| CATEGORIA_PADRAO.to_string()),
        ),
    }
}

/// Classifica a despesa pela descrição dos produtos. A pertinência à lista
/// fechada é validada aqui; qualquer resposta fora dela (ou qualquer erro)
/// cai na categoria padrão.
pub async fn classificar_despesa(client: &GeminiClient, descricao_produtos: &str) -> String {
    let categorias = CATEGORIAS_DESPESAS.join("\n");
    let prompt = format!(
        r#"Você é um especialista em classificação de despesas agrícolas.
Analise a seguinte descrição de produtos/serviços e classifique em UMA das categorias disponíveis:

Descrição: "{descricao_produtos}"

Categorias disponíveis:
{categorias}

Responda APENAS com o nome da categoria mais adequada, sem explicações adicionais."#
    );

    match client.gerar_conteudo(MODELO_PRO, &prompt, None, None).await {
        Ok(resposta) => validar_categoria(&resposta),
        Err(e) => {
            tracing::error!("Erro ao classificar despesa com Gemini: {}", e);
            CATEGORIA_PADRAO.to_string()
        }
    }
}

fn validar_categoria(resposta: &str) -> String {
    let limpa = resposta.trim();
    if CATEGORIAS_DESPESAS.contains(&limpa) {
        limpa.to_string()
    } else {
        CATEGORIA_PADRAO.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extrai_json_de_resposta_com_cercas_de_markdown() {
        let resposta = "```json\n{\"fornecedor\": {\"razao_social\": \"AGRO LTDA\", \"fantasia\": null, \"cnpj\": \"18944113000291\"}, \"faturado\": {\"nome_completo\": \"João\", \"cpf\": \"70904601188\"}, \"numero_nota_fiscal\": \"000207590\", \"data_emissao\": \"2024-10-01\", \"descricao_produtos\": \"Sementes\", \"quantidade_parcelas\": 2, \"data_vencimento\": \"2024-11-01\", \"valor_total\": 344900, \"classificacao_despesa\": \"INSUMOS AGRÍCOLAS\"}\n```";

        let dados: DadosNotaFiscal = extrair_json(resposta).unwrap();
        assert_eq!(dados.fornecedor.cnpj.as_deref(), Some("18944113000291"));
        assert_eq!(dados.parcelas(), 2);
        assert_eq!(dados.valor_total_centavos(), Some(344900.0));
    }

    #[test]
    fn extrai_json_cercado_de_texto_livre() {
        let resposta = "Claro! Segue o resultado:\n{\"agregacao\": \"soma\", \"filtros\": {}}\nEspero ter ajudado.";

        let valor: serde_json::Value = extrair_json(resposta).unwrap();
        assert_eq!(valor["agregacao"], "soma");
    }

    #[test]
    fn resposta_sem_json_vira_erro_propagado() {
        let resultado: Result<serde_json::Value, _> =
            extrair_json("Não consegui analisar o documento.");
        assert!(matches!(resultado, Err(AppError::RespostaIaInvalida(_))));
    }

    #[test]
    fn categoria_fora_da_lista_cai_no_padrao() {
        assert_eq!(validar_categoria("INSUMOS AGRÍCOLAS"), "INSUMOS AGRÍCOLAS");
        assert_eq!(validar_categoria("  IMPOSTOS E TAXAS  "), "IMPOSTOS E TAXAS");
        assert_eq!(validar_categoria("CATEGORIA INVENTADA"), CATEGORIA_PADRAO);
        assert_eq!(validar_categoria(""), CATEGORIA_PADRAO);
    }

    #[test]
    fn fallback_e_rotulado_e_usa_campos_do_formulario() {
        let campos = CamposFallback {
            cnpj_fornecedor: Some("18944113000291".to_string()),
            valor_total: Some("150000".to_string()),
            ..CamposFallback::default()
        };

        let dados = dados_fallback(&campos);
        assert_eq!(dados.fornecedor.razao_social.as_deref(), Some(ROTULO_FALLBACK));
        assert_eq!(dados.fornecedor.cnpj.as_deref(), Some("18944113000291"));
        assert_eq!(dados.valor_total_centavos(), Some(150000.0));
        assert_eq!(dados.parcelas(), 1);
    }
}
