// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    ai::client::GeminiClient,
    db::{ClassificacaoRepository, DocumentoRepository, MovimentoRepository, PessoaRepository},
    services::{
        CadastroService, ConsultaService, EmbeddingService, ExtracaoService, MovimentoService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub gemini: GeminiClient,
    pub cadastro_service: CadastroService,
    pub movimento_service: MovimentoService,
    pub consulta_service: ConsultaService,
    pub embedding_service: EmbeddingService,
    pub extracao_service: ExtracaoService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        // A chave do Gemini é opcional: sem ela os fluxos de IA degradam
        // para fallback/desculpas em vez de derrubar o processo.
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|chave| !chave.trim().is_empty());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let gemini = GeminiClient::new(gemini_api_key);

        let pessoa_repo = PessoaRepository::new(db_pool.clone());
        let classificacao_repo = ClassificacaoRepository::new(db_pool.clone());
        let movimento_repo = MovimentoRepository::new(db_pool.clone());
        let documento_repo = DocumentoRepository::new(db_pool.clone());

        let cadastro_service =
            CadastroService::new(pessoa_repo.clone(), classificacao_repo.clone());
        let movimento_service =
            MovimentoService::new(db_pool.clone(), movimento_repo.clone(), pessoa_repo.clone());
        let embedding_service = EmbeddingService::new(
            gemini.clone(),
            documento_repo.clone(),
            movimento_service.clone(),
        );
        let consulta_service = ConsultaService::new(gemini.clone(), movimento_service.clone());
        let extracao_service = ExtracaoService::new(
            gemini.clone(),
            cadastro_service.clone(),
            movimento_service.clone(),
            embedding_service.clone(),
        );

        Ok(Self {
            db_pool,
            gemini,
            cadastro_service,
            movimento_service,
            consulta_service,
            embedding_service,
            extracao_service,
        })
    }
}
