use std::collections::HashSet;
use std::sync::Arc;

use log::{error, info, warn};
use serde_json::{Map, Value};

use crate::config::CheckFailurePolicy;
use crate::domain::embedder::Embedder;
use crate::domain::product::{Product, SyncReport};
use crate::domain::product_index::{IndexError, ProductIndex};

/// Keeps the vector store in step with the Supabase product table.
///
/// Holds the Known-IDs cache: ids confirmed present remotely (or inserted by
/// this process) are never checked or indexed again for the process lifetime.
/// The cache is an optimization only; a miss always goes to the store.
pub struct SyncService {
    index: Arc<dyn ProductIndex>,
    embedder: Arc<dyn Embedder>,
    on_check_failure: CheckFailurePolicy,
    known_ids: HashSet<i64>,
}

impl SyncService {
    pub fn new(
        index: Arc<dyn ProductIndex>,
        embedder: Arc<dyn Embedder>,
        on_check_failure: CheckFailurePolicy,
    ) -> Self {
        Self {
            index,
            embedder,
            on_check_failure,
            known_ids: HashSet::new(),
        }
    }

    /// Whether a product id is already indexed. Cache first, then a remote
    /// point query. On query failure the configured policy decides: `Reindex`
    /// reports "absent" and accepts a possible duplicate write, `Skip`
    /// reports "present" and accepts possibly missing one.
    pub async fn exists(&mut self, product_id: i64) -> bool {
        if self.known_ids.contains(&product_id) {
            return true;
        }
        match self.index.contains(product_id).await {
            Ok(true) => {
                self.known_ids.insert(product_id);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(
                    "Existence check failed for product {}: {}. Applying {:?} policy.",
                    product_id, e, self.on_check_failure
                );
                matches!(self.on_check_failure, CheckFailurePolicy::Skip)
            }
        }
    }

    /// One synchronization pass over a batch of raw Supabase rows.
    ///
    /// Rows without a usable id are skipped silently, already-indexed rows
    /// are skipped, and a failure on one row never aborts the rest of the
    /// batch. Returns the inserted/failed tally.
    pub async fn synchronize(&mut self, rows: &[Map<String, Value>]) -> SyncReport {
        let mut report = SyncReport::default();
        if rows.is_empty() {
            return report;
        }

        for row in rows {
            let product = Product::from_row(row);
            if product.id == 0 {
                // Unidentifiable rows are never indexed.
                continue;
            }
            if self.exists(product.id).await {
                continue;
            }
            match self.index_product(&product).await {
                Ok(()) => {
                    report.inserted += 1;
                    self.known_ids.insert(product.id);
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "Failed to index product '{}' (id={}): {}",
                        product.name, product.id, e
                    );
                }
            }
        }

        if report.inserted > 0 {
            info!("Synchronization: {} new product(s) indexed.", report.inserted);
        }
        report
    }

    async fn index_product(&self, product: &Product) -> Result<(), IndexError> {
        let text = product.embedding_text();
        let vectors = self.embedder.embed(&text).map_err(IndexError::Embedding)?;
        self.index
            .insert(product, &vectors)
            .await
            .map_err(IndexError::Store)?;
        Ok(())
    }
}
