//! Job lifecycle: creation, background enrichment, edits and deletion.
//!
//! A created job is stored as `processing` and handed to the enrichment
//! supervisor. The background task settles it exactly once, as `active`
//! with a summary or as `error`, through a write that only applies while
//! the stored status is still `processing`.

use std::sync::Arc;

use actors::{EnrichmentTask, SupervisorHandle, TaskFuture};
use db::{DbError, JobStore, StatusUpdate};
use recruit_core::{JobEdit, JobId, JobRecord, JobStatus, NewJob};

use crate::enrichment::{Enricher, EnrichmentRequest};
use crate::error::ApiError;
use crate::facades::{SharedCache, invalidate_job};
use crate::mapping::{edit_to_patch, job_from_row, new_job_row};

/// Job writes and status transitions.
pub struct JobLifecycle<S> {
    store: Arc<S>,
    cache: SharedCache,
    supervisor: SupervisorHandle,
}

impl<S> Clone for JobLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            supervisor: self.supervisor.clone(),
        }
    }
}

impl<S: JobStore> JobLifecycle<S> {
    pub fn new(store: Arc<S>, cache: SharedCache, supervisor: SupervisorHandle) -> Self {
        Self {
            store,
            cache,
            supervisor,
        }
    }

    /// Store a new job as `processing` and start enrichment for it.
    ///
    /// Returns as soon as the row is written; the terminal status arrives
    /// later through the store. If enrichment cannot be started the row is
    /// removed and nothing is left behind.
    pub async fn create_job(&self, new_job: NewJob) -> Result<JobRecord, ApiError> {
        if new_job.title.trim().is_empty() || new_job.company.trim().is_empty() {
            return Err(ApiError::InvalidInput("title and company are required".into()));
        }

        let id = JobId::new();
        let row = new_job_row(&id, &new_job, self.cache.now());
        let stored = self
            .store
            .insert_job(&row)
            .await
            .map_err(ApiError::StoreWrite)?;
        let job = match job_from_row(stored) {
            Ok(job) => job,
            Err(e) => {
                self.discard(&id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.supervisor.launch(job.clone()) {
            tracing::error!("Enrichment could not start for job {}: {}", id, e);
            self.discard(&id).await;
            return Err(e.into());
        }
        invalidate_job(&self.cache, &id);

        tracing::info!("Job {} created, enrichment pending", id);
        Ok(job)
    }

    /// Remove a freshly inserted row that will never be enriched. If the
    /// delete fails the row is settled as `error` instead.
    async fn discard(&self, id: &JobId) {
        if let Err(e) = self.store.delete_job(id).await {
            tracing::warn!("Could not remove unlaunched job {}: {}", id, e);
            let failed = StatusUpdate::failed(self.cache.now());
            if let Err(e) = self.store.transition_job(id, JobStatus::Processing, &failed).await {
                tracing::error!("Job {} left in processing: {}", id, e);
            }
        }
        invalidate_job(&self.cache, id);
    }

    /// Apply field edits and, optionally, a manual status change.
    pub async fn edit_job(&self, id: &JobId, edit: JobEdit) -> Result<JobRecord, ApiError> {
        let current = self
            .store
            .get_job(id)
            .await
            .map_err(ApiError::StoreRead)?
            .ok_or_else(|| ApiError::JobNotFound(id.clone()))?;
        let current = job_from_row(current)?;

        if let Some(to) = edit.status {
            check_manual_transition(&current, to)?;
        }

        let mut patch = edit_to_patch(&edit, self.cache.now());
        // re-stating the current status writes nothing
        if patch.status == Some(current.status) {
            patch.status = None;
        }
        let stored = match self.store.update_job(id, &patch).await {
            Ok(row) => row,
            Err(DbError::NotFound(_)) => return Err(ApiError::JobNotFound(id.clone())),
            Err(e) => return Err(ApiError::StoreWrite(e)),
        };
        invalidate_job(&self.cache, id);

        let job = job_from_row(stored)?;
        if current.status != job.status {
            tracing::info!("Job {} moved from {} to {}", id, current.status, job.status);
        }
        Ok(job)
    }

    pub async fn close_job(&self, id: &JobId) -> Result<JobRecord, ApiError> {
        let edit = JobEdit {
            status: Some(JobStatus::Closed),
            ..Default::default()
        };
        self.edit_job(id, edit).await
    }

    /// Delete a job, abandoning any enrichment still running for it.
    pub async fn delete_job(&self, id: &JobId) -> Result<(), ApiError> {
        match self.supervisor.cancel(id.clone()).await {
            Ok(true) => tracing::info!("Cancelled pending enrichment for job {}", id),
            Ok(false) => {}
            Err(e) => tracing::warn!("Could not cancel enrichment for job {}: {}", id, e),
        }

        self.store
            .delete_job(id)
            .await
            .map_err(ApiError::StoreWrite)?;
        invalidate_job(&self.cache, id);

        tracing::info!("Job {} deleted", id);
        Ok(())
    }
}

fn check_manual_transition(current: &JobRecord, to: JobStatus) -> Result<(), ApiError> {
    let from = current.status;
    let invalid = ApiError::InvalidTransition { from, to };

    if !from.allows_manual_transition(to) {
        return Err(invalid);
    }
    if to == JobStatus::Active && from != JobStatus::Active && !current.has_summary() {
        return Err(invalid);
    }
    Ok(())
}

/// How a background enrichment run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The job left `processing` with this status.
    Settled(JobStatus),
    /// The job was no longer `processing`; nothing was written.
    AlreadySettled,
    /// The terminal write failed; the job is still `processing`.
    WriteFailed,
}

/// Background enrichment for one job.
pub struct EnrichJob<S, E> {
    store: Arc<S>,
    enricher: Arc<E>,
    cache: SharedCache,
}

impl<S, E> Clone for EnrichJob<S, E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            enricher: self.enricher.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<S: JobStore, E: Enricher> EnrichJob<S, E> {
    pub fn new(store: Arc<S>, enricher: Arc<E>, cache: SharedCache) -> Self {
        Self {
            store,
            enricher,
            cache,
        }
    }

    /// Call the enrichment service and settle the job.
    pub async fn complete(&self, job: &JobRecord) -> Completion {
        let request = EnrichmentRequest::from(job);
        let update = match self.enricher.enrich(&request).await {
            Ok(enrichment) => {
                StatusUpdate::activated(enrichment.summary, enrichment.external_id, self.cache.now())
            }
            Err(e) => {
                tracing::warn!("Enrichment failed for job {}: {}", job.id, e);
                StatusUpdate::failed(self.cache.now())
            }
        };

        let completion = match self
            .store
            .transition_job(&job.id, JobStatus::Processing, &update)
            .await
        {
            Ok(Some(_)) => {
                tracing::info!("Job {} settled as {}", job.id, update.status);
                Completion::Settled(update.status)
            }
            Ok(None) => {
                tracing::info!("Job {} already left processing, result discarded", job.id);
                Completion::AlreadySettled
            }
            Err(e) => {
                tracing::error!("Failed to record enrichment result for job {}: {}", job.id, e);
                Completion::WriteFailed
            }
        };

        invalidate_job(&self.cache, &job.id);
        completion
    }
}

impl<S: JobStore, E: Enricher> EnrichmentTask for EnrichJob<S, E> {
    fn run(&self, job: JobRecord) -> TaskFuture {
        let this = self.clone();
        Box::pin(async move {
            this.complete(&job).await;
        })
    }
}
