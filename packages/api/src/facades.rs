//! Typed views over the shared entity cache.
//!
//! All facades share one [`EntityCache`] so a single invalidation call
//! reaches every view that holds a copy of the same rows.

use std::fmt;
use std::sync::Arc;

use cache::EntityCache;
use chrono::{DateTime, Utc};
use recruit_core::{ApplicationRecord, JobId, JobRecord};
use serde::{Deserialize, Serialize};

/// Values held by the shared cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CachedValue {
    Jobs(Vec<JobRecord>),
    Job(Box<JobRecord>),
    Applications(Vec<ApplicationRecord>),
}

/// The cache every facade, data access function and listener shares.
pub type SharedCache = Arc<EntityCache<CachedValue>>;

/// Cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `jobs`
    Jobs,
    /// `job:<id>`
    Job(JobId),
    /// `applications`
    Applications,
    /// `applications:job:<id>`
    ApplicationsForJob(JobId),
}

impl CacheKey {
    /// Applications key for an optional job scope.
    pub fn applications(job_id: Option<&JobId>) -> Self {
        match job_id {
            Some(id) => CacheKey::ApplicationsForJob(id.clone()),
            None => CacheKey::Applications,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Jobs => f.write_str("jobs"),
            CacheKey::Job(id) => write!(f, "job:{}", id),
            CacheKey::Applications => f.write_str("applications"),
            CacheKey::ApplicationsForJob(id) => write!(f, "applications:job:{}", id),
        }
    }
}

/// The full job collection.
#[derive(Clone)]
pub struct JobsCache {
    cache: SharedCache,
}

impl JobsCache {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    pub fn get(&self) -> Option<Vec<JobRecord>> {
        match self.cache.get(&CacheKey::Jobs.to_string())? {
            CachedValue::Jobs(jobs) => Some(jobs),
            other => mismatched(&CacheKey::Jobs, &other),
        }
    }

    /// The collection and the instant it expires.
    pub fn get_with_expiry(&self) -> Option<(Vec<JobRecord>, DateTime<Utc>)> {
        let entry = self.cache.get_entry(&CacheKey::Jobs.to_string())?;
        match entry.value {
            CachedValue::Jobs(jobs) => Some((jobs, entry.expires_at)),
            other => mismatched(&CacheKey::Jobs, &other),
        }
    }

    pub fn set(&self, jobs: Vec<JobRecord>) {
        self.cache.set(CacheKey::Jobs.to_string(), CachedValue::Jobs(jobs));
    }
}

/// Single jobs keyed by id.
#[derive(Clone)]
pub struct JobCache {
    cache: SharedCache,
}

impl JobCache {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        let key = CacheKey::Job(id.clone());
        match self.cache.get(&key.to_string())? {
            CachedValue::Job(job) => Some(*job),
            other => mismatched(&key, &other),
        }
    }

    pub fn set(&self, job: JobRecord) {
        let key = CacheKey::Job(job.id.clone());
        self.cache.set(key.to_string(), CachedValue::Job(Box::new(job)));
    }

    /// Cache `job` only until `expires_at`, for copies taken from a
    /// collection that must not outlive it.
    pub fn set_until(&self, job: JobRecord, expires_at: DateTime<Utc>) {
        let key = CacheKey::Job(job.id.clone());
        self.cache
            .set_until(key.to_string(), CachedValue::Job(Box::new(job)), expires_at);
    }
}

/// Application collections, either all of them or one job's.
#[derive(Clone)]
pub struct ApplicationsCache {
    cache: SharedCache,
}

impl ApplicationsCache {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    pub fn get(&self, job_id: Option<&JobId>) -> Option<Vec<ApplicationRecord>> {
        let key = CacheKey::applications(job_id);
        match self.cache.get(&key.to_string())? {
            CachedValue::Applications(applications) => Some(applications),
            other => mismatched(&key, &other),
        }
    }

    pub fn set(&self, job_id: Option<&JobId>, applications: Vec<ApplicationRecord>) {
        let key = CacheKey::applications(job_id);
        self.cache
            .set(key.to_string(), CachedValue::Applications(applications));
    }
}

fn mismatched<T>(key: &CacheKey, value: &CachedValue) -> Option<T> {
    let kind = match value {
        CachedValue::Jobs(_) => "jobs",
        CachedValue::Job(_) => "job",
        CachedValue::Applications(_) => "applications",
    };
    tracing::debug!("Cache key {} holds {} value, treating as miss", key, kind);
    None
}

/// Drop a job's cached copy and the job collection.
pub fn invalidate_job(cache: &EntityCache<CachedValue>, id: &JobId) {
    cache.remove(&CacheKey::Job(id.clone()).to_string());
    cache.remove(&CacheKey::Jobs.to_string());
    tracing::debug!("Invalidated cached job {}", id);
}

/// Drop the application collection and, when given, one job's applications.
pub fn invalidate_applications(cache: &EntityCache<CachedValue>, job_id: Option<&JobId>) {
    cache.remove(&CacheKey::Applications.to_string());
    if let Some(id) = job_id {
        cache.remove(&CacheKey::ApplicationsForJob(id.clone()).to_string());
    }
}
