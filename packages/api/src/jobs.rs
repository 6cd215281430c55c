//! Read-through access to job descriptions.

use std::sync::Arc;

use db::{JobFilter, JobStore};
use recruit_core::{JobId, JobRecord, JobStatus};

use crate::error::ApiError;
use crate::facades::{JobCache, JobsCache, SharedCache};
use crate::mapping::job_from_row;

/// Job reads backed by the shared cache.
///
/// Cached records keep their stored status; the deadline closure is applied
/// on every read so a cached active job still closes on time.
pub struct JobsApi<S> {
    store: Arc<S>,
    cache: SharedCache,
    jobs: JobsCache,
    job: JobCache,
}

impl<S> Clone for JobsApi<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            jobs: self.jobs.clone(),
            job: self.job.clone(),
        }
    }
}

impl<S: JobStore> JobsApi<S> {
    pub fn new(store: Arc<S>, cache: SharedCache) -> Self {
        Self {
            store,
            jobs: JobsCache::new(cache.clone()),
            job: JobCache::new(cache.clone()),
            cache,
        }
    }

    /// Every job, newest first.
    pub async fn list_all(&self) -> Result<Vec<JobRecord>, ApiError> {
        let now = self.cache.now();
        let jobs = self.collection().await?;
        Ok(jobs.iter().map(|job| job.as_of(now)).collect())
    }

    /// Jobs that read as active, i.e. active and not past their deadline.
    pub async fn list_active(&self) -> Result<Vec<JobRecord>, ApiError> {
        let now = self.cache.now();
        let jobs = self.collection().await?;
        Ok(jobs
            .iter()
            .filter(|job| job.effective_status(now) == JobStatus::Active)
            .cloned()
            .collect())
    }

    /// Jobs owned by one recruiter.
    pub async fn list_for_recruiter(&self, email: &str) -> Result<Vec<JobRecord>, ApiError> {
        let now = self.cache.now();
        let jobs = self.collection().await?;
        Ok(jobs
            .iter()
            .filter(|job| job.recruiter_email.as_deref() == Some(email))
            .map(|job| job.as_of(now))
            .collect())
    }

    /// A single job.
    ///
    /// Served from `job:<id>` when fresh, then from a fresh job collection,
    /// and only then from the store. A copy taken from the collection
    /// expires with the collection.
    pub async fn get_by_id(&self, id: &JobId) -> Result<JobRecord, ApiError> {
        let now = self.cache.now();

        if let Some(job) = self.job.get(id) {
            tracing::debug!("Cache hit for job {}", id);
            return Ok(job.as_of(now));
        }

        if let Some((job, expires_at)) = self.jobs.get_with_expiry().and_then(|(jobs, expires_at)| {
            jobs.into_iter()
                .find(|job| &job.id == id)
                .map(|job| (job, expires_at))
        }) {
            tracing::debug!("Job {} served from cached collection", id);
            self.job.set_until(job.clone(), expires_at);
            return Ok(job.as_of(now));
        }

        let row = self
            .store
            .get_job(id)
            .await
            .map_err(ApiError::StoreRead)?
            .ok_or_else(|| ApiError::JobNotFound(id.clone()))?;
        let job = job_from_row(row)?;
        self.job.set(job.clone());

        Ok(job.as_of(now))
    }

    async fn collection(&self) -> Result<Vec<JobRecord>, ApiError> {
        if let Some(jobs) = self.jobs.get() {
            tracing::debug!("Cache hit for job collection");
            return Ok(jobs);
        }

        let rows = self
            .store
            .list_jobs(&JobFilter::default())
            .await
            .map_err(ApiError::StoreRead)?;
        let jobs = rows
            .into_iter()
            .map(job_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} jobs from store", jobs.len());
        self.jobs.set(jobs.clone());
        Ok(jobs)
    }
}
