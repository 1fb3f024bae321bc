mod feedback;
mod routes;
mod worker;

pub use feedback::FeedbackLog;
pub use worker::{spawn_worker, IngestJob};

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::sync::mpsc;
use tracing::info;

use crate::config::Settings;
use crate::embedder::{create_embedder, Embedder, EmbedderConfig};
use crate::generator::{Generator, OllamaGenerator};
use crate::ingest::{Ingestor, Splitter};
use crate::retriever::Retriever;
use crate::store::create_index;

const INGEST_QUEUE_DEPTH: usize = 64;

/// Shared handler state. Everything inside is either immutable or internally
/// synchronized, so axum can clone it per request.
#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
    pub generator: Arc<Generator>,
    pub jobs: mpsc::Sender<IngestJob>,
    pub feedback: Arc<FeedbackLog>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(routes::query))
        .route("/retrieve", post(routes::retrieve))
        .route("/ingest", post(routes::ingest))
        .route("/feedback", post(routes::feedback))
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .with_state(state)
}

/// Wires the pipeline together from settings and runs the HTTP server until
/// the process is stopped.
pub async fn serve(settings: Settings) -> Result<()> {
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&EmbedderConfig {
        endpoint: settings.ollama_endpoint.clone(),
        model: settings.embedding_model.clone(),
        dimensions: settings.embed_dimensions,
        timeout_secs: settings.http_timeout_secs,
    }));
    let index = Arc::from(create_index(&settings)?);
    let splitter = Splitter::new(settings.chunk_size, settings.chunk_overlap)?;

    let ingestor = Arc::new(Ingestor::new(
        Arc::clone(&embedder),
        Arc::clone(&index),
        splitter,
    ));
    let retriever = Arc::new(Retriever::new(Arc::clone(&embedder), Arc::clone(&index)));
    let generator = Arc::new(Generator::new(Arc::new(OllamaGenerator::new(
        &settings.ollama_endpoint,
        &settings.llm_model,
        settings.http_timeout_secs,
    ))));

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    let state = AppState {
        retriever,
        generator,
        jobs: spawn_worker(ingestor, INGEST_QUEUE_DEPTH),
        feedback: Arc::new(FeedbackLog::new(settings.feedback_path.clone().into())),
        metrics: Some(metrics),
    };

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    info!(bind = %settings.bind, backend = %settings.index_backend, "doclens listening");

    axum::serve(listener, router(state))
        .await
        .context("server shutdown")?;
    Ok(())
}
