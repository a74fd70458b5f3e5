// src/ai/consulta.rs
//
// Agentes de consulta em linguagem natural: tradução de pergunta para
// critérios de busca estruturados e síntese de respostas em português.

use tracing::{error, info, warn};

use crate::ai::client::{GeminiClient, MODELO_TEXTO};
use crate::ai::extrator::extrair_json;
use crate::common::error::AppError;
use crate::models::consulta::{CriteriosBusca, ResultadoAgregado};

pub const RESPOSTA_INDISPONIVEL: &str =
    "Desculpe, não consegui formular uma resposta adequada.";

pub const RESPOSTA_INDICE_INDISPONIVEL: &str = "Desculpe, ocorreu um erro ao consultar o índice vetorial. Verifique se o servidor do PostgreSQL está ativo e se o índice foi criado corretamente.";

/// Converte uma pergunta em linguagem natural para critérios de busca.
/// Nunca falha: se o modelo estiver fora do ar, sem chave ou devolver algo
/// ilegível, degrada para um único filtro de nome de fornecedor com
/// agregação "lista".
pub async fn interpretar_pergunta(client: &GeminiClient, pergunta: &str) -> CriteriosBusca {
    info!("🤖 Interpretando pergunta: \"{}\"", pergunta);

    match tentar_interpretar(client, pergunta).await {
        Ok(criterios) => {
            info!("✅ Critérios interpretados");
            criterios
        }
        Err(e) => {
            warn!(
                "⚠️ Falha na interpretação ({}). Usando a pergunta como filtro de fornecedor.",
                e
            );
            CriteriosBusca::fallback(pergunta)
        }
    }
}

async fn tentar_interpretar(
    client: &GeminiClient,
    pergunta: &str,
) -> Result<CriteriosBusca, AppError> {
    let prompt = montar_prompt_interpretacao(pergunta);
    let texto = client
        .gerar_conteudo(MODELO_TEXTO, &prompt, None, None)
        .await?;
    extrair_json(&texto)
}

fn montar_prompt_interpretacao(pergunta: &str) -> String {
    format!(
        r#"Você é um assistente que converte perguntas sobre notas fiscais em critérios de busca estruturados.

PERGUNTA DO USUÁRIO: "{pergunta}"

Analise a pergunta e retorne UM JSON com os seguintes campos (use null se não aplicável):

{{
  "tipo_consulta": "fornecedor" | "periodo" | "valor" | "categoria" | "geral",
  "filtros": {{
    "fornecedor_nome": "string ou null (nome ou parte do nome)",
    "fornecedor_cnpj": "string ou null (apenas números)",
    "data_inicio": "YYYY-MM-DD ou null",
    "data_fim": "YYYY-MM-DD ou null",
    "valor_min": number ou null,
    "valor_max": number ou null,
    "classificacao": "string ou null (categoria de despesa)",
    "numero_nota": "string ou null"
  }},
  "agregacao": "soma" | "media" | "contagem" | "lista" | null,
  "resposta_amigavel": "string (reformule a pergunta de forma clara)"
}}

EXEMPLOS:

Pergunta: "Quanto gastei com a empresa XYZ em outubro?"
Resposta: {{
  "tipo_consulta": "fornecedor",
  "filtros": {{
    "fornecedor_nome": "XYZ",
    "data_inicio": "2024-10-01",
    "data_fim": "2024-10-31",
    "fornecedor_cnpj": null,
    "valor_min": null,
    "valor_max": null,
    "classificacao": null,
    "numero_nota": null
  }},
  "agregacao": "soma",
  "resposta_amigavel": "Total gasto com fornecedor XYZ em outubro de 2024"
}}

Pergunta: "Mostre todas as notas acima de R$ 5000"
Resposta: {{
  "tipo_consulta": "valor",
  "filtros": {{
    "fornecedor_nome": null,
    "fornecedor_cnpj": null,
    "data_inicio": null,
    "data_fim": null,
    "valor_min": 5000,
    "valor_max": null,
    "classificacao": null,
    "numero_nota": null
  }},
  "agregacao": "lista",
  "resposta_amigavel": "Notas fiscais com valor superior a R$ 5.000,00"
}}

IMPORTANTE:
- Para datas, use o formato YYYY-MM-DD
- Para valores monetários, converta para número (ex: "R$ 5.000" = 5000)
- Se o usuário mencionar "este mês", "hoje", use a data atual como referência
- Retorne APENAS o JSON, sem texto adicional"#
    )
}

/// Gera uma resposta em linguagem natural a partir dos resultados agregados.
/// Em caso de falha devolve o texto estático de desculpas.
pub async fn gerar_resposta_natural(
    client: &GeminiClient,
    pergunta: &str,
    resultados: &ResultadoAgregado,
) -> String {
    let dados = serde_json::to_string_pretty(resultados).unwrap_or_default();

    let prompt = format!(
        r#"Você é um assistente financeiro que responde perguntas sobre notas fiscais de forma clara e objetiva.

PERGUNTA DO USUÁRIO: "{pergunta}"

DADOS ENCONTRADOS:
{dados}

Gere uma resposta em português do Brasil que:
1. Seja direta e objetiva
2. Apresente os números de forma clara (use formatação brasileira para valores)
3. Se houver muitos resultados, resuma os principais pontos
4. Se não houver resultados, explique de forma amigável

RESPOSTA:"#
    );

    match client.gerar_conteudo(MODELO_TEXTO, &prompt, None, None).await {
        Ok(texto) => texto.trim().to_string(),
        Err(e) => {
            error!("❌ Erro ao gerar resposta natural: {}", e);
            RESPOSTA_INDISPONIVEL.to_string()
        }
    }
}

/// Síntese do caminho vetorial: responde usando exclusivamente o contexto
/// recuperado do índice. A restrição é uma instrução de prompt, não uma
/// verificação posterior.
pub async fn sintetizar_resposta_contextual(
    client: &GeminiClient,
    pergunta: &str,
    contexto: &str,
) -> Result<String, AppError> {
    let prompt = format!(
        r#"Você é um assistente financeiro inteligente e prestativo.
Use EXCLUSIVAMENTE o contexto fornecido abaixo para responder à pergunta do usuário.
Não invente informações. Se o contexto for insuficiente, diga que não consegue responder.
Sua resposta deve ser concisa e focada nos dados.

--- CONTEXTO DAS NOTAS FISCAIS ---
{contexto}
----------------------------------

PERGUNTA DO USUÁRIO: {pergunta}"#
    );

    client
        .gerar_conteudo(MODELO_TEXTO, &prompt, None, Some(0.1))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_usa_a_pergunta_como_filtro_de_fornecedor() {
        let criterios = CriteriosBusca::fallback("notas da empresa XYZ");

        assert_eq!(
            criterios.filtros.fornecedor_nome.as_deref(),
            Some("notas da empresa XYZ")
        );
        assert_eq!(criterios.agregacao.as_deref(), Some("lista"));
        assert!(criterios.filtros.data_inicio.is_none());
        assert!(criterios.filtros.valor_min.is_none());
    }

    #[test]
    fn criterios_do_modelo_sao_recuperados_com_tolerancia() {
        let resposta = "```json\n{\"tipo_consulta\": \"valor\", \"filtros\": {\"valor_min\": 5000}, \"agregacao\": \"lista\", \"resposta_amigavel\": \"Notas acima de R$ 5.000\"}\n```";

        let criterios: CriteriosBusca = extrair_json(resposta).unwrap();
        assert_eq!(criterios.agregacao.as_deref(), Some("lista"));
        assert_eq!(
            criterios.filtros.valor_min,
            Some(rust_decimal::Decimal::from(5000))
        );
        assert!(criterios.filtros.fornecedor_nome.is_none());
    }
}
