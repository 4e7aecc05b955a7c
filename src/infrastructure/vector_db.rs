use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use qdrant_client;
use self::qdrant_client::qdrant::{
    vectors_config::Config as VectorsConfigKind,
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType,
    Filter, PayloadIncludeSelector, PointStruct, ScrollPointsBuilder, UpsertPointsBuilder,
    VectorParams, VectorParamsMap, VectorsConfig,
};
use self::qdrant_client::{Payload, Qdrant};

use crate::config::QdrantConfig;
use crate::domain::embedder::ProductVectors;
use crate::domain::product::Product;
use crate::domain::product_index::ProductIndex;

/// Payload field holding the external product id. Existence checks filter on
/// this field; the Qdrant point id itself is a fresh UUID per insert.
pub const PRODUCT_ID_FIELD: &str = "produto_id";
/// Named vector slot fed by the primary (Portuguese) model.
pub const PRIMARY_VECTOR: &str = "vetor_portugues";
/// Named vector slot fed by the secondary (multilingual) model.
pub const SECONDARY_VECTOR: &str = "vetor_multilingue";

/// Denormalized copy of the product stored alongside the vectors. Field
/// names match the Supabase columns.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct ProductPayload {
    produto_id: i64,
    nome: String,
    descricao: String,
    preco: f64,
    categoria: String,
    tags: Vec<String>,
    estoque: i64,
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        Self {
            produto_id: product.id,
            nome: product.name.clone(),
            descricao: product.description.clone(),
            preco: product.price,
            categoria: product.category.clone(),
            tags: product.tags.clone(),
            estoque: product.stock,
        }
    }
}

/// Qdrant-backed implementation of [`ProductIndex`].
pub struct QdrantProductIndex {
    client: Qdrant,
    collection: String,
    primary_dim: u64,
    secondary_dim: Option<u64>,
}

impl QdrantProductIndex {
    pub fn new(
        client: Qdrant,
        collection: String,
        primary_dim: u64,
        secondary_dim: Option<u64>,
    ) -> Result<Self> {
        if collection.is_empty() {
            return Err(anyhow!("Collection name cannot be empty"));
        }
        if primary_dim == 0 || secondary_dim == Some(0) {
            return Err(anyhow!("Vector size must be greater than zero"));
        }
        Ok(Self {
            client,
            collection,
            primary_dim,
            secondary_dim,
        })
    }

    /// Builds the gRPC client from configuration and wraps it.
    pub fn connect(
        config: &QdrantConfig,
        primary_dim: u64,
        secondary_dim: Option<u64>,
    ) -> Result<Self> {
        log::info!("Connecting to Qdrant at {}...", config.grpc_url());
        let client = Qdrant::from_url(&config.grpc_url())
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build Qdrant client")?;
        Self::new(
            client,
            config.collection.clone(),
            primary_dim,
            secondary_dim,
        )
    }

    async fn create_collection_internal(&self) -> Result<()> {
        log::info!(
            "Creating collection '{}' with named vectors ({} dim {}{})...",
            self.collection,
            PRIMARY_VECTOR,
            self.primary_dim,
            match self.secondary_dim {
                Some(dim) => format!(", {} dim {}", SECONDARY_VECTOR, dim),
                None => String::new(),
            }
        );

        let mut map = HashMap::new();
        map.insert(
            PRIMARY_VECTOR.to_string(),
            VectorParams {
                size: self.primary_dim,
                distance: Distance::Cosine.into(),
                ..Default::default()
            },
        );
        if let Some(dim) = self.secondary_dim {
            map.insert(
                SECONDARY_VECTOR.to_string(),
                VectorParams {
                    size: dim,
                    distance: Distance::Cosine.into(),
                    ..Default::default()
                },
            );
        }

        let vectors_config = VectorsConfig {
            config: Some(VectorsConfigKind::ParamsMap(VectorParamsMap { map })),
        };
        self.client
            .create_collection(
                CreateCollectionBuilder::new(self.collection.clone()).vectors_config(vectors_config),
            )
            .await
            .with_context(|| format!("Failed to create collection '{}'", self.collection))?;

        // Keeps existence scrolls point queries instead of full scans.
        if let Err(e) = self
            .client
            .create_field_index(CreateFieldIndexCollectionBuilder::new(
                self.collection.clone(),
                PRODUCT_ID_FIELD,
                FieldType::Integer,
            ))
            .await
        {
            log::warn!(
                "Failed to create payload index on '{}.{}': {}",
                self.collection,
                PRODUCT_ID_FIELD,
                e
            );
        }

        log::info!("Collection '{}' created.", self.collection);
        Ok(())
    }
}

fn vector_map(vectors: &ProductVectors) -> HashMap<String, Vec<f32>> {
    let mut map = HashMap::from([(PRIMARY_VECTOR.to_string(), vectors.primary.clone())]);
    if let Some(secondary) = &vectors.secondary {
        map.insert(SECONDARY_VECTOR.to_string(), secondary.clone());
    }
    map
}

#[async_trait]
impl ProductIndex for QdrantProductIndex {
    async fn ensure_schema(&self) -> Result<()> {
        match self.client.collection_exists(&self.collection).await {
            Ok(true) => {
                log::info!("Collection '{}' already exists. Reusing it.", self.collection);
                return Ok(());
            }
            Ok(false) => {
                log::info!("Collection '{}' not found. Creating...", self.collection);
            }
            Err(e) => {
                log::warn!(
                    "Could not check existence of collection '{}': {}. Attempting to create...",
                    self.collection,
                    e
                );
            }
        }
        self.create_collection_internal().await
    }

    async fn contains(&self, product_id: i64) -> Result<bool> {
        let scroll = ScrollPointsBuilder::new(self.collection.clone())
            .filter(Filter::must([Condition::matches(
                PRODUCT_ID_FIELD,
                product_id,
            )]))
            .limit(1)
            .with_payload(PayloadIncludeSelector {
                fields: vec![PRODUCT_ID_FIELD.to_string()],
            })
            .with_vectors(false);

        let response = self
            .client
            .scroll(scroll)
            .await
            .with_context(|| format!("Existence query failed for product {}", product_id))?;
        Ok(!response.result.is_empty())
    }

    async fn insert(&self, product: &Product, vectors: &ProductVectors) -> Result<()> {
        log::debug!(
            "Indexing product '{}' (id={}): primary dim {}, secondary dim {:?}",
            product.name,
            product.id,
            vectors.primary.len(),
            vectors.secondary.as_ref().map(Vec::len)
        );

        let payload_value = serde_json::to_value(ProductPayload::from(product))
            .with_context(|| format!("Failed to serialize payload for product {}", product.id))?;
        let payload = Payload::try_from(payload_value)
            .map_err(|e| anyhow!("Failed to convert payload for product {}: {}", product.id, e))?;

        let point = PointStruct::new(Uuid::new_v4().to_string(), vector_map(vectors), payload);
        self.client
            .upsert_points(UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true))
            .await
            .with_context(|| format!("Upsert failed for product {}", product.id))?;
        Ok(())
    }
}

/// One-shot readiness probe against the REST port. Non-fatal by design: the
/// caller logs a warning on failure and lets the gRPC connect surface the
/// real error.
pub async fn probe_ready(config: &QdrantConfig) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    client
        .get(config.ready_url())
        .send()
        .await
        .with_context(|| format!("Readiness probe failed for {}", config.ready_url()))?
        .error_for_status()
        .context("Qdrant reported not ready")?;
    Ok(())
}
