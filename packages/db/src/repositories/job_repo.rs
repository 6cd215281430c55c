//! Job description repository.

use recruit_core::{JobId, JobStatus};

use crate::rows::{JobColumns, JobFilter, JobPatch, JobRow, Record, StatusUpdate};
use crate::schema::JOBS_TABLE;
use crate::store::JobStore;
use crate::{Database, DbError};

/// Repository for `job_descriptions` rows.
#[derive(Clone)]
pub struct JobRepository {
    db: Database,
}

impl JobRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl JobStore for JobRepository {
    /// List jobs with optional filtering, newest first.
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobRow>, DbError> {
        let mut conditions = Vec::new();
        let mut bindings: Vec<(&'static str, serde_json::Value)> = Vec::new();

        if let Some(statuses) = &filter.status_in {
            conditions.push("status IN $status_in");
            let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
            bindings.push(("status_in", serde_json::json!(statuses)));
        }

        if let Some(status) = &filter.status_not {
            conditions.push("status != $status_not");
            bindings.push(("status_not", serde_json::json!(status.as_str())));
        }

        if let Some(email) = &filter.recruiter_email {
            conditions.push("recruiter_email = $recruiter_email");
            bindings.push(("recruiter_email", serde_json::json!(email)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!("SELECT * FROM {} {}", JOBS_TABLE, where_clause);

        let mut result = self.db.query(&query);

        for (name, value) in bindings {
            result = result.bind((name, value));
        }

        let mut response = result.await?;
        let records: Vec<Record<JobColumns>> = response.take(0)?;

        // Timestamps are stored as RFC 3339 text whose fractional part
        // varies in width, so order on the parsed values.
        let mut rows: Vec<JobRow> = records.into_iter().map(JobRow::from).collect();
        rows.sort_by(|a, b| b.data.created_at.cmp(&a.data.created_at));
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<JobRow>, DbError> {
        let record: Option<Record<JobColumns>> =
            self.db.select((JOBS_TABLE, id.to_string())).await?;

        Ok(record.map(JobRow::from))
    }

    async fn insert_job(&self, row: &JobRow) -> Result<JobRow, DbError> {
        let record: Option<Record<JobColumns>> = self
            .db
            .create((JOBS_TABLE, row.id.clone()))
            .content(row.data.clone())
            .await?;

        record
            .map(JobRow::from)
            .ok_or_else(|| DbError::Query(format!("Failed to create job {}", row.id)))
    }

    async fn update_job(&self, id: &JobId, patch: &JobPatch) -> Result<JobRow, DbError> {
        if self.get_job(id).await?.is_none() {
            return Err(DbError::NotFound(format!("Job not found: {}", id)));
        }

        let record: Option<Record<JobColumns>> = self
            .db
            .update((JOBS_TABLE, id.to_string()))
            .merge(patch.clone())
            .await?;

        record
            .map(JobRow::from)
            .ok_or_else(|| DbError::NotFound(format!("Job not found: {}", id)))
    }

    async fn transition_job(
        &self,
        id: &JobId,
        expected: JobStatus,
        update: &StatusUpdate,
    ) -> Result<Option<JobRow>, DbError> {
        let patch = serde_json::to_value(update)?;

        let mut response = self
            .db
            .query(
                r#"
                UPDATE type::thing($table, $id)
                MERGE $patch
                WHERE status = $expected
                RETURN AFTER
                "#,
            )
            .bind(("table", JOBS_TABLE))
            .bind(("id", id.to_string()))
            .bind(("patch", patch))
            .bind(("expected", expected.as_str()))
            .await?;

        let records: Vec<Record<JobColumns>> = response.take(0)?;

        Ok(records.into_iter().next().map(JobRow::from))
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), DbError> {
        let _: Option<Record<JobColumns>> = self.db.delete((JOBS_TABLE, id.to_string())).await?;

        Ok(())
    }
}
