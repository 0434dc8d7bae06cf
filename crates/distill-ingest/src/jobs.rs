//! The owned job table.
//!
//! Job state lives in an explicitly owned keyed table injected into the
//! pipeline, not module-level state, so tests can run multiple pipelines
//! deterministically.

use crate::error::{IngestError, IngestResult};
use distill_core::{Job, JobId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread-safe table of ingestion jobs, keyed by job ID.
///
/// Jobs are retained until explicitly purged.
#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job.
    pub fn insert(&self, job: Job) {
        self.inner.write().insert(job.id.clone(), job);
    }

    /// Look up a job. An unknown identifier is an error, not an empty
    /// default.
    pub fn get(&self, id: &str) -> IngestResult<Job> {
        self.inner
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| IngestError::JobNotFound(id.to_string()))
    }

    /// Apply a mutation to a job under the write lock.
    pub fn update<F>(&self, id: &str, f: F) -> IngestResult<()>
    where
        F: FnOnce(&mut Job) -> distill_core::Result<()>,
    {
        let mut jobs = self.inner.write();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| IngestError::JobNotFound(id.to_string()))?;
        f(job)?;
        Ok(())
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.inner.read().values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Remove a job from the table.
    pub fn purge(&self, id: &str) -> IngestResult<()> {
        self.inner
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| IngestError::JobNotFound(id.to_string()))
    }
}
