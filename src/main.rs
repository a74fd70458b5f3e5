// src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod ai;
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Constrói o índice vetorial na inicialização. A indisponibilidade do
    // Gemini (chave ausente, API fora) não derruba o boot.
    if let Err(e) = app_state.embedding_service.ingestao_inicial().await {
        tracing::warn!("⚠️ Índice vetorial não construído: {}", e);
    }

    // Rotas da API de gestão (CRUD)
    let rotas_gestao = Router::new()
        .route(
            "/pessoas",
            get(handlers::pessoas::listar).post(handlers::pessoas::criar),
        )
        .route(
            "/pessoas/{id}",
            put(handlers::pessoas::atualizar).delete(handlers::pessoas::excluir),
        )
        .route(
            "/classificacoes",
            get(handlers::classificacoes::listar).post(handlers::classificacoes::criar),
        )
        .route(
            "/classificacoes/{id}",
            put(handlers::classificacoes::atualizar).delete(handlers::classificacoes::excluir),
        )
        .route("/contas", get(handlers::contas::listar))
        .route("/contas/{id}", delete(handlers::contas::excluir))
        .route(
            "/parcelas/{id}/pagamento",
            put(handlers::contas::registrar_pagamento),
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/test", get(handlers::sistema::status))
        .route("/extract-data", post(handlers::extracao::extrair_dados))
        .route("/consultar", post(handlers::consultas::consultar))
        .route(
            "/consultar-embedding",
            post(handlers::consultas::consultar_embedding),
        )
        .nest("/api", rotas_gestao)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Margem sobre os 15MB do PDF para o restante do formulário
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .with_state(app_state.clone());

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");

    tracing::info!("{}", "=".repeat(60));
    tracing::info!("🚀 SISTEMA DE EXTRAÇÃO DE DADOS DE NOTAS FISCAIS");
    tracing::info!("🌐 Servidor: http://{}", listener.local_addr().unwrap());
    tracing::info!(
        "🔑 API Gemini: {}",
        if app_state.gemini.chave_configurada() {
            "✅ Configurada"
        } else {
            "❌ Não configurada"
        }
    );
    tracing::info!("{}", "=".repeat(60));

    if !app_state.gemini.chave_configurada() {
        tracing::warn!("⚠️  ATENÇÃO: Configure a API key do Gemini no arquivo .env");
    }

    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
