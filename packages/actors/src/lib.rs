//! Actor system for background job enrichment.
//!
//! Creating a job hands it to the `EnrichmentSupervisor`, which runs one
//! detached task per job. The task decides the job's terminal status on its
//! own; callers never wait for it.
//!
//! # Usage
//!
//! ```ignore
//! use actors::{FnTask, start_supervisor};
//!
//! let task = Arc::new(FnTask::new(|job| Box::pin(async move { /* ... */ })));
//! let (supervisor, handle) = start_supervisor(task).await?;
//!
//! supervisor.launch(job)?;
//! ```

mod handler;
mod messages;
mod supervisor;

pub use handler::{EnrichmentTask, FnTask, TaskFuture};
pub use messages::{ActorError, SupervisorMessage};
pub use supervisor::{EnrichmentSupervisor, SupervisorHandle, SupervisorState, start_supervisor};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, SpawnErr};
