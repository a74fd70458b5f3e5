// src/services/cadastro_service.rs
//
// Gateway de persistência consultar-ou-criar para pessoas e classificações.
// A mesma máquina de estados (ERRO_DADOS / EXISTE / CRIADO) é implementada
// uma única vez aqui, em vez de repetida por chamador.

use tracing::info;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClassificacaoRepository, PessoaRepository},
    models::cadastro::{
        normalizar_documento, Classificacao, Pessoa, ResultadoCadastro, ResultadoExclusao,
        StatusRegistro, TipoClassificacao, TipoPessoa,
    },
};

#[derive(Clone)]
pub struct CadastroService {
    pessoas: PessoaRepository,
    classificacoes: ClassificacaoRepository,
}

impl CadastroService {
    pub fn new(pessoas: PessoaRepository, classificacoes: ClassificacaoRepository) -> Self {
        Self {
            pessoas,
            classificacoes,
        }
    }

    // =========================================================================
    //  PESSOAS (FORNECEDORES / FATURADOS)
    // =========================================================================

    /// Consulta ou cria uma pessoa pela chave natural (documento normalizado).
    /// `papel` ('FORNECEDOR' ou 'FATURADO') só entra nas mensagens.
    pub async fn find_or_create_pessoa(
        &self,
        documento: &str,
        razao_social: &str,
        papel: &str,
        fantasia: Option<&str>,
    ) -> Result<ResultadoCadastro<Pessoa>, AppError> {
        let doc_limpo = normalizar_documento(documento);

        if doc_limpo.is_empty() || razao_social.trim().is_empty() {
            return Ok(ResultadoCadastro::erro_dados(format!(
                "Dados insuficientes para criar/consultar {papel}"
            )));
        }

        if let Some(pessoa) = self.pessoas.buscar_por_documento(&doc_limpo).await? {
            return Ok(resultado_pessoa_existente(pessoa, &doc_limpo));
        }

        let tipo = TipoPessoa::inferir(&doc_limpo);
        let fantasia = fantasia
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(razao_social);

        match self
            .pessoas
            .inserir(tipo, razao_social, fantasia, &doc_limpo)
            .await
        {
            Ok(nova) => {
                info!("✅ {} criado: {}", papel, nova.razaosocial);
                Ok(resultado_pessoa_criada(nova, &doc_limpo))
            }
            // Corrida entre requisições criando o mesmo documento: a
            // restrição de unicidade segura a duplicata e a reconsulta
            // devolve o registro vencedor.
            Err(erro) if violacao_de_unicidade(&erro) => {
                let pessoa = self
                    .pessoas
                    .buscar_por_documento(&doc_limpo)
                    .await?
                    .ok_or(erro)?;
                Ok(resultado_pessoa_existente(pessoa, &doc_limpo))
            }
            Err(erro) => Err(erro),
        }
    }

    pub async fn listar_pessoas(
        &self,
        termo: Option<&str>,
        tipo: Option<TipoPessoa>,
        incluir_inativos: bool,
    ) -> Result<Vec<Pessoa>, AppError> {
        self.pessoas.listar(termo, tipo, incluir_inativos).await
    }

    pub async fn atualizar_pessoa(
        &self,
        id: Uuid,
        razaosocial: Option<&str>,
        fantasia: Option<&str>,
        documento: Option<&str>,
    ) -> Result<Pessoa, AppError> {
        let doc_limpo = documento.map(normalizar_documento);

        self.pessoas
            .atualizar(id, razaosocial, fantasia, doc_limpo.as_deref())
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)
    }

    /// Exclusão lógica: recusada (resultado estruturado, não exceção) quando
    /// a pessoa está vinculada a movimentos; caso contrário vira INATIVO.
    pub async fn excluir_pessoa_logico(&self, id: Uuid) -> Result<ResultadoExclusao, AppError> {
        let vinculos = self.pessoas.contar_movimentos_vinculados(id).await?;
        if vinculos > 0 {
            return Ok(ResultadoExclusao::erro(
                "Não é possível excluir esta pessoa pois está vinculada a movimentos.",
            ));
        }

        self.pessoas
            .alterar_status(id, StatusRegistro::Inativo)
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)?;

        Ok(ResultadoExclusao::sucesso("Pessoa excluída com sucesso."))
    }

    // =========================================================================
    //  CLASSIFICAÇÕES
    // =========================================================================

    /// Consulta ou cria uma classificação pela descrição (case-insensitive),
    /// dentro de um tipo.
    pub async fn find_or_create_classificacao(
        &self,
        descricao: &str,
        tipo: TipoClassificacao,
    ) -> Result<ResultadoCadastro<Classificacao>, AppError> {
        let descricao = descricao.trim();

        if descricao.is_empty() {
            return Ok(ResultadoCadastro::erro_dados(format!(
                "Descrição de {} não fornecida",
                rotulo_tipo(tipo)
            )));
        }

        if let Some(classificacao) = self
            .classificacoes
            .buscar_por_descricao(descricao, tipo)
            .await?
        {
            return Ok(ResultadoCadastro::existe(classificacao.id, classificacao));
        }

        match self.classificacoes.inserir(descricao, tipo).await {
            Ok(nova) => {
                info!("✅ Classificação criada: {}", nova.descricao);
                Ok(ResultadoCadastro::criado(nova.id, nova))
            }
            Err(erro) if violacao_de_unicidade(&erro) => {
                let classificacao = self
                    .classificacoes
                    .buscar_por_descricao(descricao, tipo)
                    .await?
                    .ok_or(erro)?;
                Ok(ResultadoCadastro::existe(classificacao.id, classificacao))
            }
            Err(erro) => Err(erro),
        }
    }

    pub async fn listar_classificacoes(
        &self,
        termo: Option<&str>,
        tipo: Option<TipoClassificacao>,
        incluir_inativos: bool,
    ) -> Result<Vec<Classificacao>, AppError> {
        self.classificacoes
            .listar(termo, tipo, incluir_inativos)
            .await
    }

    pub async fn atualizar_classificacao(
        &self,
        id: Uuid,
        descricao: Option<&str>,
        tipo: Option<TipoClassificacao>,
    ) -> Result<Classificacao, AppError> {
        self.classificacoes
            .atualizar(id, descricao, tipo)
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)
    }

    pub async fn excluir_classificacao_logico(
        &self,
        id: Uuid,
    ) -> Result<ResultadoExclusao, AppError> {
        let vinculos = self.classificacoes.contar_movimentos_vinculados(id).await?;
        if vinculos > 0 {
            return Ok(ResultadoExclusao::erro(
                "Não é possível excluir esta classificação pois está vinculada a movimentos.",
            ));
        }

        self.classificacoes
            .alterar_status(id, StatusRegistro::Inativo)
            .await?
            .ok_or(AppError::RegistroNaoEncontrado)?;

        Ok(ResultadoExclusao::sucesso(
            "Classificação excluída com sucesso.",
        ))
    }
}

fn resultado_pessoa_existente(pessoa: Pessoa, documento: &str) -> ResultadoCadastro<Pessoa> {
    let razao = pessoa.razaosocial.clone();
    let mut resultado = ResultadoCadastro::existe(pessoa.id, pessoa);
    resultado.documento = Some(documento.to_string());
    resultado.razao_social = Some(razao);
    resultado
}

fn resultado_pessoa_criada(pessoa: Pessoa, documento: &str) -> ResultadoCadastro<Pessoa> {
    let razao = pessoa.razaosocial.clone();
    let mut resultado = ResultadoCadastro::criado(pessoa.id, pessoa);
    resultado.documento = Some(documento.to_string());
    resultado.razao_social = Some(razao);
    resultado
}

fn rotulo_tipo(tipo: TipoClassificacao) -> &'static str {
    match tipo {
        TipoClassificacao::Despesa => "despesa",
        TipoClassificacao::Receita => "receita",
    }
}

fn violacao_de_unicidade(erro: &AppError) -> bool {
    matches!(
        erro,
        AppError::DatabaseError(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cadastro::StatusCadastro;
    use sqlx::postgres::PgPoolOptions;

    // Pool preguiçosa: nenhuma conexão é aberta, o que garante que os casos
    // ERRO_DADOS retornam antes de qualquer acesso ao banco.
    fn servico_sem_banco() -> CadastroService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/nao_usado")
            .expect("URL de teste inválida");
        CadastroService::new(
            PessoaRepository::new(pool.clone()),
            ClassificacaoRepository::new(pool),
        )
    }

    #[tokio::test]
    async fn documento_vazio_retorna_erro_dados_sem_gravar() {
        let servico = servico_sem_banco();

        let resultado = servico
            .find_or_create_pessoa("..--/", "AGRO LTDA", "FORNECEDOR", None)
            .await
            .unwrap();

        assert_eq!(resultado.status, StatusCadastro::ErroDados);
        assert!(resultado.id.is_none());
        assert!(resultado.message.contains("FORNECEDOR"));
    }

    #[tokio::test]
    async fn razao_social_vazia_retorna_erro_dados() {
        let servico = servico_sem_banco();

        let resultado = servico
            .find_or_create_pessoa("18.944.113/0002-91", "   ", "FATURADO", None)
            .await
            .unwrap();

        assert_eq!(resultado.status, StatusCadastro::ErroDados);
        assert!(resultado.message.contains("FATURADO"));
    }

    #[tokio::test]
    async fn descricao_vazia_retorna_erro_dados_sem_gravar() {
        let servico = servico_sem_banco();

        let resultado = servico
            .find_or_create_classificacao("", TipoClassificacao::Despesa)
            .await
            .unwrap();

        assert_eq!(resultado.status, StatusCadastro::ErroDados);
        assert!(resultado.id.is_none());
        assert_eq!(resultado.message, "Descrição de despesa não fornecida");
    }
}
