//! Message types for the enrichment supervisor.

use recruit_core::{JobId, JobRecord};
use ractor::RpcReplyPort;

/// Messages for the EnrichmentSupervisor.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// Start enrichment for a job. Ignored while a task for the same job is
    /// still running.
    Launch { job: Box<JobRecord> },

    /// A task reported completion.
    Finished { job_id: JobId },

    /// Abort the task for a job. Replies whether a task was running.
    Cancel {
        job_id: JobId,
        reply: RpcReplyPort<bool>,
    },

    /// Check whether a task for a job is running.
    IsRunning {
        job_id: JobId,
        reply: RpcReplyPort<bool>,
    },

    /// List jobs with a running task.
    InFlight { reply: RpcReplyPort<Vec<JobId>> },

    /// Stop the supervisor. Running tasks are left to finish on their own.
    Shutdown,
}

/// Error type for supervisor operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("Actor error: {0}")]
    Actor(String),

    #[error("Supervisor did not reply")]
    NoReply,
}
