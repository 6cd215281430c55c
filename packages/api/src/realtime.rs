//! Cache invalidation driven by store change notifications.
//!
//! A view calls [`RealtimeInvalidator::watch`] while it is mounted. Each
//! relevant change drops the affected cache keys and bumps a generation the
//! view waits on, after which it re-reads through the data access layer.
//! Dropping the [`ViewSubscription`] stops the listener.

use std::sync::Arc;

use cache::EntityCache;
use db::ChangeFeed;
use recruit_core::{ChangeEvent, JobId, Table};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::facades::{CacheKey, CachedValue, SharedCache, invalidate_applications, invalidate_job};

/// What a view is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    Jobs,
    Job(JobId),
    Applications,
    ApplicationsForJob(JobId),
}

impl WatchScope {
    fn table(&self) -> Table {
        match self {
            WatchScope::Jobs | WatchScope::Job(_) => Table::JobDescriptions,
            WatchScope::Applications | WatchScope::ApplicationsForJob(_) => Table::JobApplications,
        }
    }

    fn matches(&self, event: &ChangeEvent) -> bool {
        match self {
            WatchScope::Jobs | WatchScope::Applications => true,
            WatchScope::Job(id) => event.record_id == id.as_str(),
            // Deletes may arrive without the job column.
            WatchScope::ApplicationsForJob(id) => event
                .job_id
                .as_deref()
                .is_none_or(|job_id| job_id == id.as_str()),
        }
    }

    fn invalidate(&self, cache: &EntityCache<CachedValue>, event: &ChangeEvent) {
        let job_id = event.job_id.as_deref().and_then(|id| JobId::parse(id).ok());
        match self {
            WatchScope::Jobs | WatchScope::Job(_) => match &job_id {
                Some(id) => invalidate_job(cache, id),
                None => self.invalidate_all(cache),
            },
            WatchScope::Applications => match &job_id {
                Some(id) => invalidate_applications(cache, Some(id)),
                None => self.invalidate_all(cache),
            },
            WatchScope::ApplicationsForJob(id) => invalidate_applications(cache, Some(id)),
        }
    }

    /// Used when notifications were missed and the affected rows are unknown.
    fn invalidate_all(&self, cache: &EntityCache<CachedValue>) {
        match self {
            WatchScope::Jobs | WatchScope::Job(_) => {
                cache.remove(&CacheKey::Jobs.to_string());
                cache.remove_prefix("job:");
            }
            WatchScope::Applications | WatchScope::ApplicationsForJob(_) => {
                cache.remove_prefix(&CacheKey::Applications.to_string());
            }
        }
    }
}

/// Starts per-view listeners on a change feed.
pub struct RealtimeInvalidator<F> {
    feed: Arc<F>,
    cache: SharedCache,
}

impl<F> Clone for RealtimeInvalidator<F> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<F: ChangeFeed> RealtimeInvalidator<F> {
    pub fn new(feed: Arc<F>, cache: SharedCache) -> Self {
        Self { feed, cache }
    }

    /// Listen for changes relevant to `scope` until the subscription drops.
    ///
    /// Only changes made after this call are observed.
    pub fn watch(&self, scope: WatchScope) -> ViewSubscription {
        let mut events = self.feed.subscribe(scope.table());
        let (generation_tx, generation_rx) = watch::channel(0u64);
        let cache = self.cache.clone();

        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if !scope.matches(&event) {
                            continue;
                        }
                        tracing::debug!("Refreshing {:?} after {}", scope, event.description());
                        scope.invalidate(&cache, &event);
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!("{:?} listener missed {} changes", scope, missed);
                        scope.invalidate_all(&cache);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                generation_tx.send_modify(|generation| *generation += 1);
            }
            tracing::debug!("Change feed closed, {:?} listener stopped", scope);
        });

        ViewSubscription {
            generation: generation_rx,
            listener,
        }
    }
}

/// A mounted view's interest in changes.
pub struct ViewSubscription {
    generation: watch::Receiver<u64>,
    listener: JoinHandle<()>,
}

impl ViewSubscription {
    /// Number of refreshes signalled so far.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Wait for the next refresh. Returns `None` once the listener has
    /// stopped.
    pub async fn refreshed(&mut self) -> Option<u64> {
        self.generation.changed().await.ok()?;
        Some(*self.generation.borrow_and_update())
    }

    pub fn is_listening(&self) -> bool {
        !self.listener.is_finished()
    }
}

impl Drop for ViewSubscription {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
