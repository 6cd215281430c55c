//! Job application repository.

use std::collections::HashMap;

use recruit_core::{ApplicationId, JobId};
use serde::Deserialize;

use crate::rows::{ApplicationColumns, ApplicationFilter, ApplicationPatch, ApplicationRow, Record};
use crate::schema::APPLICATIONS_TABLE;
use crate::store::ApplicationStore;
use crate::{Database, DbError};

/// Repository for `job_applications` rows.
#[derive(Clone)]
pub struct ApplicationRepository {
    db: Database,
}

impl ApplicationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ApplicationStore for ApplicationRepository {
    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationRow>, DbError> {
        let mut conditions = Vec::new();
        let mut bindings: Vec<(&'static str, serde_json::Value)> = Vec::new();

        if let Some(job_id) = &filter.job_id {
            conditions.push("job_id = $job_id");
            bindings.push(("job_id", serde_json::json!(job_id.as_str())));
        }

        if let Some(email) = &filter.candidate_email {
            conditions.push("candidate_email = $candidate_email");
            bindings.push(("candidate_email", serde_json::json!(email)));
        }

        if let Some(statuses) = &filter.status_in {
            conditions.push("status IN $status_in");
            let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
            bindings.push(("status_in", serde_json::json!(statuses)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!("SELECT * FROM {} {}", APPLICATIONS_TABLE, where_clause);

        let mut result = self.db.query(&query);

        for (name, value) in bindings {
            result = result.bind((name, value));
        }

        let mut response = result.await?;
        let records: Vec<Record<ApplicationColumns>> = response.take(0)?;

        // Timestamps are stored as RFC 3339 text whose fractional part
        // varies in width, so order on the parsed values.
        let mut rows: Vec<ApplicationRow> = records.into_iter().map(ApplicationRow::from).collect();
        rows.sort_by(|a, b| b.data.applied_at.cmp(&a.data.applied_at));
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn get_application(&self, id: &ApplicationId) -> Result<Option<ApplicationRow>, DbError> {
        let record: Option<Record<ApplicationColumns>> =
            self.db.select((APPLICATIONS_TABLE, id.to_string())).await?;

        Ok(record.map(ApplicationRow::from))
    }

    async fn insert_application(&self, row: &ApplicationRow) -> Result<ApplicationRow, DbError> {
        let record: Option<Record<ApplicationColumns>> = self
            .db
            .create((APPLICATIONS_TABLE, row.id.clone()))
            .content(row.data.clone())
            .await?;

        record
            .map(ApplicationRow::from)
            .ok_or_else(|| DbError::Query(format!("Failed to create application {}", row.id)))
    }

    async fn update_application(
        &self,
        id: &ApplicationId,
        patch: &ApplicationPatch,
    ) -> Result<ApplicationRow, DbError> {
        if self.get_application(id).await?.is_none() {
            return Err(DbError::NotFound(format!("Application not found: {}", id)));
        }

        let record: Option<Record<ApplicationColumns>> = self
            .db
            .update((APPLICATIONS_TABLE, id.to_string()))
            .merge(patch.clone())
            .await?;

        record
            .map(ApplicationRow::from)
            .ok_or_else(|| DbError::NotFound(format!("Application not found: {}", id)))
    }

    async fn count_for_job(&self, job_id: &JobId) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                r#"
                SELECT count() AS count
                FROM job_applications
                WHERE job_id = $job_id
                GROUP ALL
                "#,
            )
            .bind(("job_id", job_id.to_string()))
            .await?;

        #[derive(Deserialize)]
        struct Count {
            count: i64,
        }

        let counts: Vec<Count> = result.take(0)?;

        Ok(counts.first().map_or(0, |c| c.count.max(0) as u64))
    }

    /// Count applications per job.
    async fn count_grouped_by_job(&self) -> Result<HashMap<JobId, u64>, DbError> {
        let mut result = self
            .db
            .query(
                r#"
                SELECT job_id, count() AS count
                FROM job_applications
                GROUP BY job_id
                "#,
            )
            .await?;

        #[derive(Deserialize)]
        struct JobCount {
            job_id: Option<String>,
            count: i64,
        }

        let counts: Vec<JobCount> = result.take(0)?;

        let mut map = HashMap::new();
        for count in counts {
            if let Some(job_id) = count.job_id.as_deref().and_then(|id| JobId::parse(id).ok()) {
                map.insert(job_id, count.count.max(0) as u64);
            }
        }

        Ok(map)
    }
}
