//! Store traits consumed by the data access layer.
//!
//! Futures are declared `Send` so callers can drive them from detached
//! tokio tasks.

use std::collections::HashMap;
use std::future::Future;

use recruit_core::{ApplicationId, JobId, JobStatus};

use crate::DbError;
use crate::rows::{
    ApplicationFilter, ApplicationPatch, ApplicationRow, JobFilter, JobPatch, JobRow,
    StatusUpdate,
};

/// Row-level access to `job_descriptions`.
pub trait JobStore: Send + Sync + 'static {
    fn list_jobs(
        &self,
        filter: &JobFilter,
    ) -> impl Future<Output = Result<Vec<JobRow>, DbError>> + Send;

    fn get_job(&self, id: &JobId) -> impl Future<Output = Result<Option<JobRow>, DbError>> + Send;

    fn insert_job(&self, row: &JobRow) -> impl Future<Output = Result<JobRow, DbError>> + Send;

    /// Merge `patch` into an existing row. `DbError::NotFound` if absent.
    fn update_job(
        &self,
        id: &JobId,
        patch: &JobPatch,
    ) -> impl Future<Output = Result<JobRow, DbError>> + Send;

    /// Apply `update` only while the stored status equals `expected`.
    ///
    /// Returns `None` when the row is missing or has already moved on.
    fn transition_job(
        &self,
        id: &JobId,
        expected: JobStatus,
        update: &StatusUpdate,
    ) -> impl Future<Output = Result<Option<JobRow>, DbError>> + Send;

    fn delete_job(&self, id: &JobId) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Row-level access to `job_applications`.
pub trait ApplicationStore: Send + Sync + 'static {
    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> impl Future<Output = Result<Vec<ApplicationRow>, DbError>> + Send;

    fn get_application(
        &self,
        id: &ApplicationId,
    ) -> impl Future<Output = Result<Option<ApplicationRow>, DbError>> + Send;

    fn insert_application(
        &self,
        row: &ApplicationRow,
    ) -> impl Future<Output = Result<ApplicationRow, DbError>> + Send;

    fn update_application(
        &self,
        id: &ApplicationId,
        patch: &ApplicationPatch,
    ) -> impl Future<Output = Result<ApplicationRow, DbError>> + Send;

    fn count_for_job(&self, job_id: &JobId) -> impl Future<Output = Result<u64, DbError>> + Send;

    fn count_grouped_by_job(
        &self,
    ) -> impl Future<Output = Result<HashMap<JobId, u64>, DbError>> + Send;
}
