use anyhow::{anyhow, Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;

use crate::config::EmbeddingConfig;
use crate::domain::embedder::{Embedder, ProductVectors};

/// A model code resolved against the fastembed catalog.
///
/// The catalog also carries the vector dimension, so slot sizes are known
/// before (and independently of) downloading any weights.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub model: EmbeddingModel,
    pub code: String,
    pub dim: usize,
}

pub fn resolve_model(model_code: &str) -> Result<ResolvedModel> {
    TextEmbedding::list_supported_models()
        .into_iter()
        .find(|info| info.model_code.eq_ignore_ascii_case(model_code))
        .map(|info| ResolvedModel {
            model: info.model,
            code: info.model_code,
            dim: info.dim,
        })
        .ok_or_else(|| {
            let known: Vec<String> = TextEmbedding::list_supported_models()
                .into_iter()
                .map(|info| info.model_code)
                .collect();
            anyhow!(
                "Unknown embedding model '{}'. Supported models: {}",
                model_code,
                known.join(", ")
            )
        })
}

/// A single loaded embedding model.
pub struct EmbeddingGenerator {
    model: TextEmbedding,
    dim: usize,
}

impl EmbeddingGenerator {
    pub fn new(resolved: &ResolvedModel, cache_dir: Option<PathBuf>) -> Result<Self> {
        let mut opts = InitOptions::new(resolved.model.clone());
        if let Some(dir) = cache_dir {
            opts = opts.with_cache_dir(dir);
        }
        let model = TextEmbedding::try_new(opts)
            .with_context(|| format!("Failed to load embedding model '{}'", resolved.code))?;
        Ok(Self {
            model,
            dim: resolved.dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.model
            .embed(vec![text], None)?
            .pop()
            .ok_or_else(|| anyhow!("Model returned no embedding for input text"))
    }
}

/// The primary model plus an optional secondary one.
///
/// Primary load failure is fatal; a secondary failure only degrades
/// capability: the flag is recorded once at load time and never retried, and
/// every subsequent `embed` omits the secondary vector.
pub struct DualEmbedder {
    primary: EmbeddingGenerator,
    secondary: Option<EmbeddingGenerator>,
    secondary_dim: Option<usize>,
}

impl DualEmbedder {
    pub fn load(config: &EmbeddingConfig) -> Result<Self> {
        let primary_resolved = resolve_model(&config.primary_model)?;
        log::info!(
            "Loading primary embedding model '{}' (dim {})... (this can take a while on first run)",
            primary_resolved.code,
            primary_resolved.dim
        );
        let primary = EmbeddingGenerator::new(&primary_resolved, config.cache_dir.clone())?;

        let (secondary, secondary_dim) = match &config.secondary_model {
            Some(code) => match resolve_model(code) {
                Ok(resolved) => {
                    log::info!(
                        "Loading secondary embedding model '{}' (dim {})...",
                        resolved.code,
                        resolved.dim
                    );
                    match EmbeddingGenerator::new(&resolved, config.cache_dir.clone()) {
                        Ok(generator) => (Some(generator), Some(resolved.dim)),
                        Err(e) => {
                            log::warn!(
                                "Failed to load secondary model '{}': {}. Proceeding with primary only.",
                                code,
                                e
                            );
                            // Slot size is still known, only the weights are missing.
                            (None, Some(resolved.dim))
                        }
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Secondary model '{}' not recognized: {}. Proceeding with primary only.",
                        code,
                        e
                    );
                    (None, None)
                }
            },
            None => (None, None),
        };

        log::info!("Embedding models loaded.");
        Ok(Self {
            primary,
            secondary,
            secondary_dim,
        })
    }

    pub fn primary_dim(&self) -> usize {
        self.primary.dim()
    }

    /// The schema slot size for the secondary vector, when the configured
    /// model name was recognized. Present even when the weights failed to
    /// load, so schema creation does not depend on degraded state.
    pub fn secondary_dim(&self) -> Option<usize> {
        self.secondary_dim
    }
}

impl Embedder for DualEmbedder {
    fn embed(&self, text: &str) -> Result<ProductVectors> {
        let primary = self.primary.encode(text)?;
        let secondary = match &self.secondary {
            Some(generator) => Some(generator.encode(text)?),
            None => None,
        };
        Ok(ProductVectors { primary, secondary })
    }

    fn secondary_enabled(&self) -> bool {
        self.secondary.is_some()
    }
}
