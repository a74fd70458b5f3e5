pub mod classificacoes;
pub mod consultas;
pub mod contas;
pub mod extracao;
pub mod pessoas;
pub mod sistema;
