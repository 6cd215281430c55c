//! Core domain types for the recruitment data layer.
//!
//! This crate contains shared types used across all packages:
//! - JobRecord and JobStatus for job descriptions
//! - ApplicationRecord and ApplicationStatus for candidate applications
//! - ChangeEvent for store change notifications

mod application;
mod events;
mod job;

pub use application::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Candidate, NewApplication,
    clamp_match_score,
};
pub use events::{ChangeAction, ChangeEvent, Table};
pub use job::{EmploymentType, JobEdit, JobId, JobRecord, JobStatus, NewJob, SalaryRange};

/// Errors parsing domain values from strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("identifier must not be empty")]
    EmptyId,
    #[error("unknown status: {0}")]
    UnknownStatus(String),
}
