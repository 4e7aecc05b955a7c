pub mod embedding;
pub mod supabase;
pub mod vector_db;

pub use embedding::{DualEmbedder, EmbeddingGenerator};
pub use supabase::SupabaseClient;
pub use vector_db::QdrantProductIndex;
