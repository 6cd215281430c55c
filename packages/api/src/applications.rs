//! Read-through access to job applications, plus the writes recruiters and
//! candidates make.

use std::collections::HashMap;
use std::sync::Arc;

use db::{ApplicationFilter, ApplicationPatch, ApplicationStore, DbError};
use recruit_core::{
    ApplicationId, ApplicationRecord, ApplicationStatus, JobId, NewApplication,
    clamp_match_score,
};

use crate::error::ApiError;
use crate::facades::{ApplicationsCache, SharedCache, invalidate_applications};
use crate::mapping::{application_from_row, new_application_row};

/// Application reads and writes backed by the shared cache.
pub struct ApplicationsApi<S> {
    store: Arc<S>,
    cache: SharedCache,
    applications: ApplicationsCache,
}

impl<S> Clone for ApplicationsApi<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            applications: self.applications.clone(),
        }
    }
}

impl<S: ApplicationStore> ApplicationsApi<S> {
    pub fn new(store: Arc<S>, cache: SharedCache) -> Self {
        Self {
            store,
            applications: ApplicationsCache::new(cache.clone()),
            cache,
        }
    }

    /// Every application, newest first.
    pub async fn list_all(&self) -> Result<Vec<ApplicationRecord>, ApiError> {
        self.collection(None).await
    }

    pub async fn list_for_job(&self, job_id: &JobId) -> Result<Vec<ApplicationRecord>, ApiError> {
        self.collection(Some(job_id)).await
    }

    /// Applications submitted under an email, compared case-insensitively.
    pub async fn list_for_user_email(
        &self,
        email: &str,
    ) -> Result<Vec<ApplicationRecord>, ApiError> {
        let applications = self.collection(None).await?;
        Ok(applications
            .into_iter()
            .filter(|application| application.candidate.email_matches(email))
            .collect())
    }

    /// A single application. Not cached on its own.
    pub async fn get_by_id(&self, id: &ApplicationId) -> Result<ApplicationRecord, ApiError> {
        if let Some(application) = self
            .applications
            .get(None)
            .and_then(|all| all.into_iter().find(|a| &a.id == id))
        {
            return Ok(application);
        }

        let row = self
            .store
            .get_application(id)
            .await
            .map_err(ApiError::StoreRead)?
            .ok_or_else(|| ApiError::ApplicationNotFound(id.clone()))?;
        Ok(application_from_row(row)?)
    }

    /// Number of applications for a job. Always asks the store.
    pub async fn count_by_job(&self, job_id: &JobId) -> Result<u64, ApiError> {
        self.store
            .count_for_job(job_id)
            .await
            .map_err(ApiError::StoreRead)
    }

    /// Application counts for every job that has any. Always asks the store.
    pub async fn count_all_grouped_by_job(&self) -> Result<HashMap<JobId, u64>, ApiError> {
        self.store
            .count_grouped_by_job()
            .await
            .map_err(ApiError::StoreRead)
    }

    /// Record a new application as `pending`.
    pub async fn submit(&self, application: NewApplication) -> Result<ApplicationRecord, ApiError> {
        if application.candidate.email.trim().is_empty() {
            return Err(ApiError::InvalidInput("candidate email is required".into()));
        }

        let id = ApplicationId::new();
        let row = new_application_row(&id, &application, self.cache.now());
        let stored = self
            .store
            .insert_application(&row)
            .await
            .map_err(ApiError::StoreWrite)?;
        invalidate_applications(&self.cache, Some(&application.job_id));

        tracing::info!("Application {} submitted for job {}", id, application.job_id);
        Ok(application_from_row(stored)?)
    }

    pub async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, ApiError> {
        self.write(id, ApplicationPatch::status(status, self.cache.now()))
            .await
    }

    /// Store a match score, clamped into `0..=100`.
    pub async fn set_match_score(
        &self,
        id: &ApplicationId,
        score: f64,
    ) -> Result<ApplicationRecord, ApiError> {
        let score = clamp_match_score(score)
            .ok_or_else(|| ApiError::InvalidInput(format!("match score {} is not finite", score)))?;
        self.write(id, ApplicationPatch::match_score(score, self.cache.now()))
            .await
    }

    async fn write(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<ApplicationRecord, ApiError> {
        let stored = match self.store.update_application(id, &patch).await {
            Ok(row) => row,
            Err(DbError::NotFound(_)) => return Err(ApiError::ApplicationNotFound(id.clone())),
            Err(e) => return Err(ApiError::StoreWrite(e)),
        };
        let application = application_from_row(stored)?;
        invalidate_applications(&self.cache, Some(&application.job_id));
        Ok(application)
    }

    async fn collection(
        &self,
        job_id: Option<&JobId>,
    ) -> Result<Vec<ApplicationRecord>, ApiError> {
        if let Some(applications) = self.applications.get(job_id) {
            return Ok(applications);
        }

        let filter = match job_id {
            Some(id) => ApplicationFilter::for_job(id.clone()),
            None => ApplicationFilter::default(),
        };
        let rows = self
            .store
            .list_applications(&filter)
            .await
            .map_err(ApiError::StoreRead)?;
        let applications = rows
            .into_iter()
            .map(application_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        self.applications.set(job_id, applications.clone());
        Ok(applications)
    }
}
