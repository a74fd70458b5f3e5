// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Sistema ---
        handlers::sistema::status,

        // --- Extração ---
        handlers::extracao::extrair_dados,

        // --- Consultas ---
        handlers::consultas::consultar,
        handlers::consultas::consultar_embedding,

        // --- Pessoas ---
        handlers::pessoas::listar,
        handlers::pessoas::criar,
        handlers::pessoas::atualizar,
        handlers::pessoas::excluir,

        // --- Classificações ---
        handlers::classificacoes::listar,
        handlers::classificacoes::criar,
        handlers::classificacoes::atualizar,
        handlers::classificacoes::excluir,

        // --- Contas ---
        handlers::contas::listar,
        handlers::contas::excluir,
        handlers::contas::registrar_pagamento,
    ),
    components(
        schemas(
            // --- Cadastros ---
            models::cadastro::TipoPessoa,
            models::cadastro::StatusRegistro,
            models::cadastro::TipoClassificacao,
            models::cadastro::Pessoa,
            models::cadastro::Classificacao,
            models::cadastro::StatusCadastro,
            models::cadastro::StatusExclusao,
            models::cadastro::ResultadoExclusao,
            models::cadastro::ResultadoCadastro<models::cadastro::Pessoa>,
            models::cadastro::ResultadoCadastro<models::cadastro::Classificacao>,

            // --- Movimentos ---
            models::movimento::TipoMovimento,
            models::movimento::StatusMovimento,
            models::movimento::StatusParcela,
            models::movimento::MovimentoContas,
            models::movimento::ParcelaContas,
            models::movimento::MovimentoDetalhado,

            // --- Extração ---
            models::extracao::DadosNotaFiscal,
            models::extracao::FornecedorExtraido,
            models::extracao::FaturadoExtraido,
            models::extracao::EnvelopeExtracao,
            models::extracao::AnaliseBd,
            models::extracao::ResultadoMovimento,
            models::extracao::MetadadosProcessamento,

            // --- Consultas ---
            models::consulta::CriteriosBusca,
            models::consulta::FiltrosBusca,
            models::consulta::NotaResumo,
            models::consulta::ResultadoAgregado,
            models::consulta::RespostaConsulta,
            models::consulta::MetadadosConsulta,
            models::consulta::RespostaEmbedding,
            models::consulta::DocumentoResumo,

            // --- Payloads ---
            handlers::pessoas::CriarPessoaPayload,
            handlers::pessoas::AtualizarPessoaPayload,
            handlers::classificacoes::CriarClassificacaoPayload,
            handlers::classificacoes::AtualizarClassificacaoPayload,
            handlers::contas::PagamentoPayload,
            handlers::consultas::PerguntaPayload,
        )
    ),
    tags(
        (name = "Sistema", description = "Status do serviço"),
        (name = "Extração", description = "Extração de dados de notas fiscais (PDF + IA)"),
        (name = "Consultas", description = "Consultas em linguagem natural (SQL e vetorial)"),
        (name = "Pessoas", description = "Gestão de fornecedores e faturados"),
        (name = "Classificações", description = "Gestão de categorias de despesa"),
        (name = "Contas", description = "Movimentos de contas e parcelas")
    )
)]
pub struct ApiDoc;
