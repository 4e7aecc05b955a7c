use anyhow::Result;

/// The one or two vectors produced for a product.
///
/// `secondary` is absent whenever the secondary model did not load at
/// startup; the schema still carries its slot, the point simply omits it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductVectors {
    pub primary: Vec<f32>,
    pub secondary: Option<Vec<f32>>,
}

/// Seam over the embedding models. Encoding is synchronous and CPU-bound.
pub trait Embedder: Send + Sync {
    /// Encodes `text` with the primary model, and with the secondary model
    /// when it is available. Primary failure fails the call.
    fn embed(&self, text: &str) -> Result<ProductVectors>;

    /// Whether the secondary model loaded at startup. Fixed for the process
    /// lifetime; a load failure is never retried.
    fn secondary_enabled(&self) -> bool;
}
