//! Supervisor actor owning detached enrichment tasks.

use std::collections::HashMap;
use std::sync::Arc;

use recruit_core::{JobId, JobRecord};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::task::JoinHandle;

use crate::handler::EnrichmentTask;
use crate::messages::{ActorError, SupervisorMessage};

/// State for the supervisor actor.
pub struct SupervisorState {
    /// Running tasks by job.
    tasks: HashMap<JobId, JoinHandle<()>>,
    /// Work to run per job.
    task: Arc<dyn EnrichmentTask>,
}

impl SupervisorState {
    pub fn new(task: Arc<dyn EnrichmentTask>) -> Self {
        Self {
            tasks: HashMap::new(),
            task,
        }
    }

    fn is_running(&self, job_id: &JobId) -> bool {
        self.tasks.get(job_id).is_some_and(|h| !h.is_finished())
    }
}

/// Supervisor actor that launches one enrichment task per created job.
pub struct EnrichmentSupervisor;

impl Actor for EnrichmentSupervisor {
    type Msg = SupervisorMessage;
    type State = SupervisorState;
    type Arguments = Arc<dyn EnrichmentTask>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting enrichment supervisor");
        Ok(SupervisorState::new(args))
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisorMessage::Launch { job } => {
                let job = *job;
                let job_id = job.id.clone();

                if state.is_running(&job_id) {
                    tracing::debug!("Enrichment for job {} already running", job_id);
                    return Ok(());
                }

                let run = state.task.run(job);
                let supervisor = myself.clone();
                let finished_id = job_id.clone();
                let handle = tokio::spawn(async move {
                    run.await;
                    let _ = supervisor.send_message(SupervisorMessage::Finished {
                        job_id: finished_id,
                    });
                });

                tracing::info!("Enrichment started for job {}", job_id);
                state.tasks.insert(job_id, handle);
            }

            SupervisorMessage::Finished { job_id } => {
                // A relaunch may already own the slot.
                if state.tasks.get(&job_id).is_some_and(|h| h.is_finished()) {
                    state.tasks.remove(&job_id);
                }
                tracing::debug!("Enrichment finished for job {}", job_id);
            }

            SupervisorMessage::Cancel { job_id, reply } => {
                let cancelled = match state.tasks.remove(&job_id) {
                    Some(handle) if !handle.is_finished() => {
                        handle.abort();
                        tracing::info!("Enrichment cancelled for job {}", job_id);
                        true
                    }
                    _ => false,
                };
                let _ = reply.send(cancelled);
            }

            SupervisorMessage::IsRunning { job_id, reply } => {
                let _ = reply.send(state.is_running(&job_id));
            }

            SupervisorMessage::InFlight { reply } => {
                let running = state
                    .tasks
                    .iter()
                    .filter(|(_, h)| !h.is_finished())
                    .map(|(id, _)| id.clone())
                    .collect();
                let _ = reply.send(running);
            }

            SupervisorMessage::Shutdown => {
                tracing::info!("Shutting down enrichment supervisor");
                myself.stop(None);
                return Ok(());
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let running = state.tasks.values().filter(|h| !h.is_finished()).count();
        if running > 0 {
            tracing::warn!("{} enrichment tasks still running after supervisor stop", running);
        }
        Ok(())
    }
}

/// Cloneable front for a running supervisor.
#[derive(Clone)]
pub struct SupervisorHandle {
    actor: ActorRef<SupervisorMessage>,
}

impl SupervisorHandle {
    pub fn new(actor: ActorRef<SupervisorMessage>) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorRef<SupervisorMessage> {
        &self.actor
    }

    /// Hand a job to the supervisor without waiting for the task.
    pub fn launch(&self, job: JobRecord) -> Result<(), ActorError> {
        self.actor
            .send_message(SupervisorMessage::Launch { job: Box::new(job) })
            .map_err(|e| ActorError::Actor(format!("Failed to send message: {}", e)))
    }

    pub async fn cancel(&self, job_id: JobId) -> Result<bool, ActorError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(SupervisorMessage::Cancel {
                job_id,
                reply: tx.into(),
            })
            .map_err(|e| ActorError::Actor(format!("Failed to send message: {}", e)))?;

        rx.await.map_err(|_| ActorError::NoReply)
    }

    pub async fn is_running(&self, job_id: JobId) -> Result<bool, ActorError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(SupervisorMessage::IsRunning {
                job_id,
                reply: tx.into(),
            })
            .map_err(|e| ActorError::Actor(format!("Failed to send message: {}", e)))?;

        rx.await.map_err(|_| ActorError::NoReply)
    }

    pub async fn in_flight(&self) -> Result<Vec<JobId>, ActorError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.actor
            .send_message(SupervisorMessage::InFlight { reply: tx.into() })
            .map_err(|e| ActorError::Actor(format!("Failed to send message: {}", e)))?;

        rx.await.map_err(|_| ActorError::NoReply)
    }

    pub fn shutdown(&self) {
        let _ = self.actor.send_message(SupervisorMessage::Shutdown);
    }
}

/// Start the supervisor with the given task.
pub async fn start_supervisor(
    task: Arc<dyn EnrichmentTask>,
) -> Result<(SupervisorHandle, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    let (actor, handle) = Actor::spawn(None, EnrichmentSupervisor, task).await?;

    Ok((SupervisorHandle::new(actor), handle))
}
