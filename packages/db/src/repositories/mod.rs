//! Repository implementations for database operations.

mod application_repo;
mod job_repo;

pub use application_repo::ApplicationRepository;
pub use job_repo::JobRepository;
