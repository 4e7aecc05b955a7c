use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "sync_config.toml";

/// What `exists()` should report when the remote existence check itself
/// fails. The original behavior is `Reindex`: prefer risking a duplicate
/// write over silently skipping a product.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckFailurePolicy {
    #[default]
    #[serde(rename = "reindex")]
    Reindex,
    #[serde(rename = "skip")]
    Skip,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QdrantConfig {
    pub host: String,
    /// REST port, used only for the pre-connect readiness probe.
    pub rest_port: u16,
    pub grpc_port: u16,
    pub collection: String,
    pub timeout_init_secs: u64,
    pub timeout_query_secs: u64,
    pub timeout_insert_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            rest_port: 6333,
            grpc_port: 6334,
            collection: "Produtos".to_string(),
            timeout_init_secs: 60,
            timeout_query_secs: 60,
            timeout_insert_secs: 180,
        }
    }
}

impl QdrantConfig {
    pub fn grpc_url(&self) -> String {
        format!("http://{}:{}", self.host, self.grpc_port)
    }

    pub fn ready_url(&self) -> String {
        format!("http://{}:{}/readyz", self.host, self.rest_port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_init_secs)
    }

    /// The client applies a single per-request timeout; the insert phase is
    /// the long one, so the larger of the two bounds governs.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_query_secs.max(self.timeout_insert_secs))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. "https://xyzcompany.supabase.co".
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "produtos".to_string()
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: default_table(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EmbeddingConfig {
    /// fastembed model code of the primary (Portuguese-capable) model.
    pub primary_model: String,
    /// Optional secondary multilingual model; `None` disables the second
    /// vector entirely.
    pub secondary_model: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let default_cache_dir = ProjectDirs::from("dev", "produto-sync", "produto-sync")
            .map(|dirs| dirs.cache_dir().to_path_buf());
        Self {
            primary_model: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
                .to_string(),
            secondary_model: Some("intfloat/multilingual-e5-small".to_string()),
            cache_dir: default_cache_dir,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SyncOptions {
    #[serde(default)]
    pub on_check_failure: CheckFailurePolicy,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub qdrant: QdrantConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub sync: SyncOptions,
}

/// Loads configuration as defaults merged with a TOML file and
/// `SYNC_`-prefixed environment variables (nested keys split on `__`).
/// `SYNC_CONFIG_PATH` overrides the config file location.
pub fn load_config() -> Result<SyncConfig> {
    let config_path_env = std::env::var("SYNC_CONFIG_PATH").ok();
    let config_path = config_path_env
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    if let Some(ref env_path) = config_path_env {
        if !std::path::Path::new(env_path).exists() {
            return Err(anyhow::anyhow!(
                "Config file not found at SYNC_CONFIG_PATH: {}",
                env_path
            ));
        }
        log::info!("SYNC_CONFIG_PATH is set: {}", env_path);
    }

    let figment = Figment::new()
        .merge(Serialized::defaults(SyncConfig::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("SYNC_").split("__"));

    let config: SyncConfig = figment.extract().context("Failed to extract SyncConfig")?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &SyncConfig) -> Result<()> {
    if config.supabase.url.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "supabase.url must be configured (SYNC_SUPABASE__URL)"
        ));
    }
    if config.supabase.api_key.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "supabase.api_key must be configured (SYNC_SUPABASE__API_KEY)"
        ));
    }
    if config.qdrant.collection.trim().is_empty() {
        return Err(anyhow::anyhow!("qdrant.collection cannot be empty"));
    }
    if config.embedding.primary_model.trim().is_empty() {
        return Err(anyhow::anyhow!("embedding.primary_model cannot be empty"));
    }
    Ok(())
}
