//! The ingestion state machine.
//!
//! One submitted document becomes one job: extraction, chunking, embedding,
//! and injection run sequentially on a spawned task while the caller polls
//! the job table. Any step failure halts the job and records the cause;
//! there is no partial continuation, no retry, and no mid-job cancellation.

use crate::chunker::Chunker;
use crate::error::{IngestError, IngestResult};
use crate::jobs::JobStore;
use distill_core::{
    document_id, point_id, EmbeddedPoint, Job, JobId, JobState, JobStats, PointPayload,
};
use distill_extract::ExtractionRouter;
use distill_openai::{embed_in_batches, Embedder};
use distill_store::VectorStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives each submitted document through the ingestion states.
#[derive(Clone)]
pub struct IngestionPipeline {
    jobs: JobStore,
    router: Arc<ExtractionRouter>,
    embedder: Arc<dyn Embedder>,
    chunker: Arc<Chunker>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl IngestionPipeline {
    pub fn new(
        jobs: JobStore,
        router: Arc<ExtractionRouter>,
        embedder: Arc<dyn Embedder>,
        chunker: Arc<Chunker>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            router,
            embedder,
            chunker,
            store,
            collection: collection.into(),
        }
    }

    /// Submit a document for ingestion.
    ///
    /// Returns the job identifier immediately; the pipeline runs on a
    /// spawned task and the caller polls [`IngestionPipeline::job`].
    pub fn submit(&self, bytes: Vec<u8>, filename: impl Into<String>) -> JobId {
        let job = Job::new(filename);
        let id = job.id.clone();
        self.jobs.insert(job);

        info!("Queued ingestion job {}", id);

        let pipeline = self.clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            pipeline.run(job_id, bytes).await;
        });

        id
    }

    /// Observe a job's current state.
    pub fn job(&self, id: &str) -> IngestResult<Job> {
        self.jobs.get(id)
    }

    /// All jobs, newest first.
    pub fn list_jobs(&self) -> Vec<Job> {
        self.jobs.list()
    }

    async fn run(&self, job_id: JobId, bytes: Vec<u8>) {
        if let Err(e) = self.execute(&job_id, &bytes).await {
            warn!("Ingestion job {} failed: {}", job_id, e);
            let message = e.to_string();
            if let Err(store_err) = self.jobs.update(&job_id, |job| job.fail(message)) {
                warn!("Could not record failure for job {}: {}", job_id, store_err);
            }
        }
    }

    async fn execute(&self, job_id: &str, bytes: &[u8]) -> IngestResult<()> {
        let filename = self.jobs.get(job_id)?.filename;

        self.jobs
            .update(job_id, |job| job.advance(JobState::Extracting))?;
        let (extraction, method) = self.router.extract(bytes, &filename).await?;
        self.jobs.update(job_id, |job| {
            job.extraction_method = Some(method);
            Ok(())
        })?;
        debug!(
            "Job {}: extracted {} characters via {}",
            job_id,
            extraction.text.len(),
            method
        );

        self.jobs
            .update(job_id, |job| job.advance(JobState::Chunking))?;
        let passages = self.chunker.chunk_text(&extraction.text);
        if passages.is_empty() {
            return Err(IngestError::EmptyChunks);
        }
        debug!("Job {}: {} passages", job_id, passages.len());

        self.jobs
            .update(job_id, |job| job.advance(JobState::Embedding))?;
        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let vectors = embed_in_batches(self.embedder.as_ref(), &texts).await?;

        self.jobs
            .update(job_id, |job| job.advance(JobState::Injecting))?;
        let doc_id = document_id(&filename);
        let points: Vec<EmbeddedPoint> = passages
            .iter()
            .zip(vectors)
            .map(|(passage, vector)| EmbeddedPoint {
                id: point_id(&doc_id, passage.chunk_index),
                vector,
                payload: PointPayload {
                    document_id: doc_id.clone(),
                    filename: filename.clone(),
                    chunk_index: passage.chunk_index,
                    text: passage.text.clone(),
                    token_count: passage.token_count,
                },
            })
            .collect();

        self.store
            .ensure_collection(&self.collection, self.embedder.dimension())
            .await?;
        self.store.upsert(&self.collection, &points).await?;

        let stats = JobStats {
            chunk_count: passages.len(),
            total_tokens: passages.iter().map(|p| p.token_count).sum(),
        };
        self.jobs.update(job_id, |job| job.complete(stats))?;

        info!(
            "Job {} completed: {} chunks, {} tokens, extraction {}",
            job_id, stats.chunk_count, stats.total_tokens, method
        );
        Ok(())
    }
}
