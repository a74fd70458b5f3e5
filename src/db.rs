pub mod classificacao_repo;
pub use classificacao_repo::ClassificacaoRepository;
pub mod documento_repo;
pub use documento_repo::DocumentoRepository;
pub mod movimento_repo;
pub use movimento_repo::MovimentoRepository;
pub mod pessoa_repo;
pub use pessoa_repo::PessoaRepository;
