pub mod cadastro_service;
pub use cadastro_service::CadastroService;
pub mod consulta_service;
pub use consulta_service::ConsultaService;
pub mod embedding_service;
pub use embedding_service::EmbeddingService;
pub mod extracao_service;
pub use extracao_service::ExtracaoService;
pub mod movimento_service;
pub use movimento_service::MovimentoService;
