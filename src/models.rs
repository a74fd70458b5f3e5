pub mod cadastro;
pub mod consulta;
pub mod documento;
pub mod extracao;
pub mod movimento;
