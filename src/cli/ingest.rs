use anyhow::Result;
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::embedder::{create_embedder, Embedder, EmbedderConfig};
use crate::ingest::{Ingestor, Splitter};
use crate::store::{create_index, VectorIndex};

static INGESTING: Emoji<'_, '_> = Emoji("📥 ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

pub async fn run_ingest(file: &Path, no_health_check: bool) -> Result<()> {
    let settings = Settings::from_env();

    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&EmbedderConfig {
        endpoint: settings.ollama_endpoint.clone(),
        model: settings.embedding_model.clone(),
        dimensions: settings.embed_dimensions,
        timeout_secs: settings.http_timeout_secs,
    }));

    if !no_health_check {
        println!("{}Checking embedding service...", INFO);
        embedder.health_check().await?;
    }

    let index: Arc<dyn VectorIndex> = Arc::from(create_index(&settings)?);
    let splitter = Splitter::new(settings.chunk_size, settings.chunk_overlap)?;
    let ingestor = Ingestor::new(Arc::clone(&embedder), Arc::clone(&index), splitter);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("{}Ingesting {}...", INGESTING, file.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = ingestor.ingest_path(file).await?;

    pb.finish_and_clear();

    println!("\n{}Ingestion complete!\n", SUCCESS);
    println!("  Source:          {}", style(&report.source_id).green());
    println!("  Pages:           {}", style(report.pages).cyan());
    println!("  Chunks written:  {}", style(report.chunks_written).cyan());

    let total = index.count().await?;
    println!("\n{}Index now holds {} chunks.", INFO, style(total).yellow());

    Ok(())
}
