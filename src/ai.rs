pub mod client;
pub mod consulta;
pub mod extrator;
