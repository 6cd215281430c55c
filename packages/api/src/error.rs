//! Errors surfaced by the data access layer.

use actors::ActorError;
use db::DbError;
use recruit_core::{ApplicationId, JobId, JobStatus};

use crate::mapping::MappingError;

/// Errors returned by the data access functions and the job lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Store read failed: {0}")]
    StoreRead(#[source] DbError),

    #[error("Store write failed: {0}")]
    StoreWrite(#[source] DbError),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Application not found: {0}")]
    ApplicationNotFound(ApplicationId),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Enrichment supervisor unavailable: {0}")]
    Supervisor(#[from] ActorError),
}
