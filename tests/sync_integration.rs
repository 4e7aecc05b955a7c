//! End-to-end tests against a live Qdrant instance.
//!
//! Run with a local server (`docker run -p 6333:6333 -p 6334:6334
//! qdrant/qdrant`) and `cargo test -- --ignored`. Override the target with
//! `QDRANT_HOST` / `QDRANT_GRPC_PORT`. A stub embedder keeps these tests
//! independent of any model download.

use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use produto_sync::config::{CheckFailurePolicy, QdrantConfig};
use produto_sync::domain::embedder::{Embedder, ProductVectors};
use produto_sync::domain::product_index::ProductIndex;
use produto_sync::{QdrantProductIndex, SyncService};

const DIM: u64 = 4;

struct StubEmbedder;

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> Result<ProductVectors> {
        // Deterministic, text-dependent, fixed-dimension.
        let seed = text.bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32));
        let base = (seed % 97) as f32 / 97.0;
        Ok(ProductVectors {
            primary: vec![base, 1.0 - base, 0.5, 0.25],
            secondary: Some(vec![0.25, 0.5, base, 1.0 - base]),
        })
    }

    fn secondary_enabled(&self) -> bool {
        true
    }
}

fn test_config() -> QdrantConfig {
    let mut config = QdrantConfig::default();
    if let Ok(host) = std::env::var("QDRANT_HOST") {
        config.host = host;
    }
    if let Ok(port) = std::env::var("QDRANT_GRPC_PORT") {
        config.grpc_port = port.parse().expect("QDRANT_GRPC_PORT must be a port number");
    }
    config.collection = format!("produtos_test_{}", Uuid::new_v4().simple());
    config
}

fn connect(config: &QdrantConfig) -> QdrantProductIndex {
    QdrantProductIndex::connect(config, DIM, Some(DIM)).expect("failed to build Qdrant client")
}

fn row(value: Value) -> Map<String, Value> {
    value.as_object().expect("test row must be an object").clone()
}

#[tokio::test]
#[ignore = "requires a running Qdrant instance"]
async fn ensure_schema_is_idempotent() {
    let config = test_config();
    let index = connect(&config);

    index.ensure_schema().await.expect("first ensure_schema failed");
    index.ensure_schema().await.expect("second ensure_schema failed");
}

#[tokio::test]
#[ignore = "requires a running Qdrant instance"]
async fn insert_then_contains_roundtrip() {
    let config = test_config();
    let index = connect(&config);
    index.ensure_schema().await.expect("ensure_schema failed");

    assert!(!index.contains(101).await.expect("contains failed"));

    let product = produto_sync::Product {
        id: 101,
        name: "Berbequim".to_string(),
        description: "Berbequim sem fios 18V".to_string(),
        price: 129.9,
        category: "Ferramentas".to_string(),
        tags: vec!["bricolage".to_string()],
        stock: 3,
    };
    let vectors = StubEmbedder.embed(&product.embedding_text()).unwrap();
    index.insert(&product, &vectors).await.expect("insert failed");

    assert!(index.contains(101).await.expect("contains failed"));
    assert!(!index.contains(999).await.expect("contains failed"));
}

#[tokio::test]
#[ignore = "requires a running Qdrant instance"]
async fn synchronize_is_idempotent_across_service_instances() {
    let config = test_config();
    let index = connect(&config);
    index.ensure_schema().await.expect("ensure_schema failed");
    let index: Arc<dyn ProductIndex> = Arc::new(index);

    let batch = vec![
        row(json!({ "id": 1, "nome": "Martelo", "preco": 9.9, "estoque": 5 })),
        row(json!({ "id": 0, "nome": "sem id" })),
        row(json!({ "id": 2, "nome": "Serra", "tags": "corte, madeira" })),
    ];

    let mut first = SyncService::new(index.clone(), Arc::new(StubEmbedder), CheckFailurePolicy::Reindex);
    let report = first.synchronize(&batch).await;
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 0);

    // A fresh service has an empty cache, so idempotence here comes from the
    // remote existence check alone.
    let mut second = SyncService::new(index, Arc::new(StubEmbedder), CheckFailurePolicy::Reindex);
    let report = second.synchronize(&batch).await;
    assert_eq!(report.inserted, 0);
    assert_eq!(report.failed, 0);
}
