pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::SyncService;
pub use config::{load_config, CheckFailurePolicy, SyncConfig};
pub use domain::embedder::{Embedder, ProductVectors};
pub use domain::product::{Product, SyncReport};
pub use domain::product_index::{IndexError, ProductIndex};
pub use infrastructure::vector_db::qdrant_client;
pub use infrastructure::{DualEmbedder, QdrantProductIndex, SupabaseClient};
