//! Change notifications per table.
//!
//! [`LiveFeed`] turns SurrealDB live queries into broadcast channels that
//! any number of views can subscribe to. Nothing is replayed: a receiver
//! only sees notifications sent after it subscribed.

use futures_util::StreamExt;
use recruit_core::{ChangeAction, ChangeEvent, Table};
use serde::Deserialize;
use surrealdb::sql::Thing;
use surrealdb::{Action, Notification};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::{Database, DbError};

/// Capacity of each per-table channel. Slow receivers observe `Lagged`.
const CHANNEL_CAPACITY: usize = 256;

/// Source of change notifications.
pub trait ChangeFeed: Send + Sync + 'static {
    /// Subscribe to changes on one table.
    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent>;
}

/// In-process fan-out of change events, one channel per table.
#[derive(Clone)]
pub struct BroadcastFeed {
    jobs: broadcast::Sender<ChangeEvent>,
    applications: broadcast::Sender<ChangeEvent>,
}

impl BroadcastFeed {
    pub fn new() -> Self {
        let (jobs, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (applications, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { jobs, applications }
    }

    fn sender(&self, table: Table) -> &broadcast::Sender<ChangeEvent> {
        match table {
            Table::JobDescriptions => &self.jobs,
            Table::JobApplications => &self.applications,
        }
    }

    /// Publish an event. Returns the number of receivers reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender(event.table).send(event).unwrap_or(0)
    }

    /// Live subscribers on one table.
    pub fn receiver_count(&self, table: Table) -> usize {
        self.sender(table).receiver_count()
    }
}

impl Default for BroadcastFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed for BroadcastFeed {
    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        self.sender(table).subscribe()
    }
}

/// Fields read from a live notification.
#[derive(Debug, Deserialize)]
struct LiveRow {
    id: Thing,
    #[serde(default)]
    job_id: Option<String>,
}

/// Live-query backed feed over both tables.
pub struct LiveFeed {
    feed: BroadcastFeed,
    tasks: Vec<JoinHandle<()>>,
}

impl LiveFeed {
    /// Start live queries on both tables.
    pub async fn start(db: &Database) -> Result<Self, DbError> {
        let feed = BroadcastFeed::new();
        let tasks = vec![
            spawn_forwarder(db, Table::JobDescriptions, feed.clone()).await?,
            spawn_forwarder(db, Table::JobApplications, feed.clone()).await?,
        ];

        tracing::info!("Live change feed started");

        Ok(Self { feed, tasks })
    }

    /// Stop forwarding notifications. Existing receivers see the channel close
    /// once the feed is dropped.
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl ChangeFeed for LiveFeed {
    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe(table)
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn spawn_forwarder(
    db: &Database,
    table: Table,
    feed: BroadcastFeed,
) -> Result<JoinHandle<()>, DbError> {
    let mut stream: surrealdb::method::Stream<Vec<LiveRow>> =
        db.select(table.as_str()).live().await?;

    Ok(tokio::spawn(async move {
        while let Some(notification) = stream.next().await {
            let notification: Notification<LiveRow> = match notification {
                Ok(notification) => notification,
                Err(e) => {
                    tracing::warn!("Live notification on {} failed: {}", table, e);
                    continue;
                }
            };

            let action = match notification.action {
                Action::Create => ChangeAction::Insert,
                Action::Update => ChangeAction::Update,
                Action::Delete => ChangeAction::Delete,
                _ => continue,
            };

            let row = notification.data;
            let mut event = ChangeEvent::new(table, action, row.id.id.to_raw());
            if let Some(job_id) = row.job_id {
                event = event.with_job_id(job_id);
            }

            tracing::debug!("Change: {}", event.description());
            feed.publish(event);
        }

        tracing::info!("Live feed for {} ended", table);
    }))
}
