use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

use crate::ingest::Ingestor;

/// One queued ingestion: the uploaded bytes plus naming for logs and chunk ids.
#[derive(Debug)]
pub struct IngestJob {
    pub job_id: Uuid,
    pub filename: String,
    pub source_id: String,
    pub bytes: Vec<u8>,
}

/// Starts the background ingestion worker and returns the job queue handle.
///
/// The worker outlives any individual HTTP request; dropping a request does
/// not cancel its queued job. Completion and failure are observable only
/// through logs and metrics. Failures are terminal for that job.
pub fn spawn_worker(ingestor: Arc<Ingestor>, queue_depth: usize) -> mpsc::Sender<IngestJob> {
    let (jobs, mut queue) = mpsc::channel::<IngestJob>(queue_depth.max(1));

    tokio::spawn(async move {
        while let Some(job) = queue.recv().await {
            let job_id = job.job_id;
            info!(%job_id, filename = %job.filename, "background ingestion started");
            counter!("doclens_ingest_jobs_total").increment(1);

            match ingestor.ingest_bytes(&job.source_id, &job.bytes).await {
                Ok(report) => {
                    counter!("doclens_ingest_chunks_total")
                        .increment(report.chunks_written as u64);
                    info!(
                        %job_id,
                        source_id = %report.source_id,
                        pages = report.pages,
                        chunks = report.chunks_written,
                        "background ingestion finished"
                    );
                }
                Err(err) => {
                    counter!("doclens_ingest_failures_total").increment(1);
                    error!(%job_id, filename = %job.filename, %err, "background ingestion failed");
                }
            }
        }
        info!("ingestion worker stopped: job queue closed");
    });

    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::Embedder;
    use crate::error::Result;
    use crate::ingest::Splitter;
    use crate::store::{LocalIndex, VectorIndex};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FlatEmbedder;

    #[async_trait]
    impl Embedder for FlatEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn queued_job_eventually_lands_in_the_index() {
        let index = Arc::new(LocalIndex::in_memory(2));
        let ingestor = Arc::new(Ingestor::new(
            Arc::new(FlatEmbedder),
            index.clone(),
            Splitter::new(100, 0).unwrap(),
        ));
        let jobs = spawn_worker(ingestor, 8);

        jobs.send(IngestJob {
            job_id: Uuid::new_v4(),
            filename: "notes.txt".to_string(),
            source_id: "notes".to_string(),
            bytes: b"a short note".to_vec(),
        })
        .await
        .unwrap();

        // The caller only gets an acknowledgment; poll the index for the result.
        for _ in 0..50 {
            if index.count().await.unwrap() > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job was never processed");
    }
}
