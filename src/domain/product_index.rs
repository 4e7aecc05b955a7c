use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::embedder::ProductVectors;
use crate::domain::product::Product;

/// Why indexing a single product failed. Kept as an explicit per-record
/// result so the batch loop can count and continue instead of aborting.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),
    #[error("vector store write failed: {0}")]
    Store(#[source] anyhow::Error),
}

/// Seam over the vector store. The store owns indexing and search; this
/// trait only covers what synchronization needs.
#[async_trait]
pub trait ProductIndex: Send + Sync {
    /// Idempotently ensures the target collection exists. Creation only;
    /// an existing collection is never dropped or altered.
    async fn ensure_schema(&self) -> Result<()>;

    /// Whether a record with this external product id is already indexed.
    async fn contains(&self, product_id: i64) -> Result<bool>;

    /// Writes one indexed record: denormalized properties plus the named
    /// vector(s).
    async fn insert(&self, product: &Product, vectors: &ProductVectors) -> Result<()>;
}
