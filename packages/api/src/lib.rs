//! Data access layer for the recruitment app.
//!
//! This crate ties the store, the shared entity cache and the enrichment
//! supervisor together:
//! - Read-through job and application access (`JobsApi`, `ApplicationsApi`)
//! - The job lifecycle and its background enrichment (`JobLifecycle`)
//! - Cache invalidation from store change notifications (`RealtimeInvalidator`)
//! - Startup wiring (`RecruitApp`)

mod applications;
mod enrichment;
mod error;
mod facades;
mod init;
mod jobs;
mod lifecycle;
mod mapping;
mod realtime;

pub use applications::ApplicationsApi;
pub use enrichment::{
    DEFAULT_ENRICHMENT_URL, Enricher, Enrichment, EnrichmentError, EnrichmentRequest,
    HttpEnricher, parse_response,
};
pub use error::ApiError;
pub use facades::{
    ApplicationsCache, CacheKey, CachedValue, JobCache, JobsCache, SharedCache,
    invalidate_applications, invalidate_job,
};
pub use init::{AppConfig, ConfigError, InitError, RecruitApp};
pub use jobs::JobsApi;
pub use lifecycle::{Completion, EnrichJob, JobLifecycle};
pub use mapping::{MappingError, application_from_row, job_from_row};
pub use realtime::{RealtimeInvalidator, ViewSubscription, WatchScope};

// Re-export core types for convenience
pub use recruit_core::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Candidate, JobEdit, JobId, JobRecord,
    JobStatus, NewApplication, NewJob,
};
