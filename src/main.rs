use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;

use produto_sync::config;
use produto_sync::domain::embedder::Embedder;
use produto_sync::domain::product_index::ProductIndex;
use produto_sync::infrastructure::vector_db::probe_ready;
use produto_sync::{DualEmbedder, QdrantProductIndex, SupabaseClient, SyncService};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    log::info!("produto-sync started.");

    let config = config::load_config()?;

    if let Err(e) = probe_ready(&config.qdrant).await {
        log::warn!("Qdrant readiness probe failed: {}. Continuing anyway.", e);
    }

    // Model loading is CPU/IO heavy and synchronous; keep it off the runtime.
    let embedding_config = config.embedding.clone();
    let embedder = tokio::task::spawn_blocking(move || DualEmbedder::load(&embedding_config)).await??;
    if !embedder.secondary_enabled() {
        log::warn!("Running in degraded mode: secondary vectors will be omitted.");
    }

    let index = QdrantProductIndex::connect(
        &config.qdrant,
        embedder.primary_dim() as u64,
        embedder.secondary_dim().map(|dim| dim as u64),
    )?;
    index.ensure_schema().await?;

    let supabase = SupabaseClient::new(&config.supabase);
    let rows = supabase.fetch_products().await?;

    let index: Arc<dyn ProductIndex> = Arc::new(index);
    let embedder: Arc<dyn Embedder> = Arc::new(embedder);
    let mut service = SyncService::new(index, embedder, config.sync.on_check_failure);

    let report = service.synchronize(&rows).await;
    log::info!(
        "Synchronization finished: {} inserted, {} failed, {} row(s) total.",
        report.inserted,
        report.failed,
        rows.len()
    );

    // Returning the code (instead of process::exit) lets the client and
    // model handles drop before the process ends.
    if report.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
