//! Enrichment work handed to the supervisor.

use recruit_core::JobRecord;
use std::future::Future;
use std::pin::Pin;

/// Future type for a detached enrichment run.
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Work performed for a freshly created job.
///
/// The returned future owns the whole background path: calling the
/// enrichment service, writing the terminal status, invalidating caches.
/// It reports nothing back; the supervisor only tracks that it is running.
pub trait EnrichmentTask: Send + Sync + 'static {
    fn run(&self, job: JobRecord) -> TaskFuture;
}

/// A simple function-based task.
pub struct FnTask<F>
where
    F: Fn(JobRecord) -> TaskFuture + Send + Sync + 'static,
{
    task: F,
}

impl<F> FnTask<F>
where
    F: Fn(JobRecord) -> TaskFuture + Send + Sync + 'static,
{
    pub fn new(task: F) -> Self {
        Self { task }
    }
}

impl<F> EnrichmentTask for FnTask<F>
where
    F: Fn(JobRecord) -> TaskFuture + Send + Sync + 'static,
{
    fn run(&self, job: JobRecord) -> TaskFuture {
        (self.task)(job)
    }
}
