// src/models/documento.rs

use serde_json::Value;
use sqlx::FromRow;

/// Linha devolvida pela busca de similaridade no índice vetorial.
/// A distância vem do operador `<=>` do pgvector (menor = mais próximo).
#[derive(Debug, Clone, FromRow)]
pub struct DocumentoSimilar {
    pub texto: String,
    pub metadata: Value,
    pub distancia: f64,
}
