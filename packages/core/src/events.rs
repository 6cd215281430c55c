//! Change notifications from the backing store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tables that emit change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    JobDescriptions,
    JobApplications,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::JobDescriptions => "job_descriptions",
            Table::JobApplications => "job_applications",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// A single row mutation observed on a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub action: ChangeAction,
    pub record_id: String,
    /// Job the row belongs to: the row itself for jobs, the `job_id`
    /// column for applications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: Table, action: ChangeAction, record_id: impl Into<String>) -> Self {
        let record_id = record_id.into();
        let job_id = match table {
            Table::JobDescriptions => Some(record_id.clone()),
            Table::JobApplications => None,
        };
        Self {
            table,
            action,
            record_id,
            job_id,
            timestamp: Utc::now(),
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        let action = match self.action {
            ChangeAction::Insert => "inserted",
            ChangeAction::Update => "updated",
            ChangeAction::Delete => "deleted",
        };
        format!("{}:{} {}", self.table, self.record_id, action)
    }
}
