//! Raw row shapes as stored in the backing tables.
//!
//! Rows are flat and loosely typed on purpose: free-form employment types,
//! status strings, split salary and candidate columns. Callers map them to
//! domain records.

use chrono::{DateTime, Utc};
use recruit_core::{ApplicationStatus, JobId, JobStatus};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

/// A row together with its record id.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    pub id: String,
    pub data: T,
}

impl<T> Row<T> {
    pub fn new(id: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

pub type JobRow = Row<JobColumns>;
pub type ApplicationRow = Row<ApplicationColumns>;

/// Internal record type for SurrealDB.
#[derive(Debug, Deserialize)]
pub(crate) struct Record<T> {
    id: Thing,
    #[serde(flatten)]
    data: T,
}

impl<T> From<Record<T>> for Row<T> {
    fn from(record: Record<T>) -> Self {
        Row {
            id: record.id.id.to_raw(),
            data: record.data,
        }
    }
}

/// Columns of `job_descriptions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobColumns {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub salary_currency: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub recruiter_email: Option<String>,
    #[serde(default)]
    pub request_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns of `job_applications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationColumns {
    pub job_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    #[serde(default)]
    pub candidate_phone: Option<String>,
    #[serde(default)]
    pub candidate_resume_url: Option<String>,
    #[serde(default)]
    pub candidate_cover_letter: Option<String>,
    pub status: String,
    #[serde(default)]
    pub match_score: Option<f64>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter options for listing jobs.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    /// Keep rows whose status is one of these.
    pub status_in: Option<Vec<JobStatus>>,
    /// Drop rows with this status.
    pub status_not: Option<JobStatus>,
    pub recruiter_email: Option<String>,
    pub limit: Option<usize>,
}

impl JobFilter {
    pub fn matches(&self, row: &JobColumns) -> bool {
        if let Some(statuses) = &self.status_in
            && !statuses.iter().any(|s| s.as_str() == row.status)
        {
            return false;
        }
        if let Some(status) = &self.status_not
            && status.as_str() == row.status
        {
            return false;
        }
        if let Some(email) = &self.recruiter_email
            && row.recruiter_email.as_deref() != Some(email.as_str())
        {
            return false;
        }
        true
    }
}

/// Filter options for listing applications.
#[derive(Debug, Default, Clone)]
pub struct ApplicationFilter {
    pub job_id: Option<JobId>,
    pub candidate_email: Option<String>,
    pub status_in: Option<Vec<ApplicationStatus>>,
    pub limit: Option<usize>,
}

impl ApplicationFilter {
    pub fn for_job(job_id: JobId) -> Self {
        Self {
            job_id: Some(job_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, row: &ApplicationColumns) -> bool {
        if let Some(job_id) = &self.job_id
            && job_id.as_str() != row.job_id
        {
            return false;
        }
        if let Some(email) = &self.candidate_email
            && email != &row.candidate_email
        {
            return false;
        }
        if let Some(statuses) = &self.status_in
            && !statuses.iter().any(|s| s.as_str() == row.status)
        {
            return false;
        }
        true
    }
}

/// Partial update of a job row. Unset fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    pub updated_at: DateTime<Utc>,
}

impl JobPatch {
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            ..Default::default()
        }
    }

    /// Apply this patch to columns held in memory.
    pub fn apply(&self, row: &mut JobColumns) {
        if let Some(v) = &self.title {
            row.title = v.clone();
        }
        if let Some(v) = &self.company {
            row.company = v.clone();
        }
        if let Some(v) = &self.location {
            row.location = Some(v.clone());
        }
        if let Some(v) = &self.employment_type {
            row.employment_type = Some(v.clone());
        }
        if let Some(v) = &self.description {
            row.description = Some(v.clone());
        }
        if let Some(v) = &self.requirements {
            row.requirements = v.clone();
        }
        if let Some(v) = self.salary_min {
            row.salary_min = Some(v);
        }
        if let Some(v) = self.salary_max {
            row.salary_max = Some(v);
        }
        if let Some(v) = &self.salary_currency {
            row.salary_currency = Some(v.clone());
        }
        if let Some(v) = self.deadline {
            row.deadline = Some(v);
        }
        if let Some(v) = self.status {
            row.status = v.as_str().to_string();
        }
        row.updated_at = self.updated_at;
    }
}

/// Status write made by the enrichment task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusUpdate {
    /// Enrichment succeeded.
    pub fn activated(
        summary: impl Into<String>,
        external_id: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: JobStatus::Active,
            summary: Some(summary.into()),
            external_id: Some(external_id.into()),
            updated_at,
        }
    }

    /// Enrichment failed. Job fields are left as they were.
    pub fn failed(updated_at: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Error,
            summary: None,
            external_id: None,
            updated_at,
        }
    }

    pub fn apply(&self, row: &mut JobColumns) {
        row.status = self.status.as_str().to_string();
        if let Some(summary) = &self.summary {
            row.summary = Some(summary.clone());
        }
        if let Some(external_id) = &self.external_id {
            row.external_id = Some(external_id.clone());
        }
        row.updated_at = self.updated_at;
    }
}

/// Partial update of an application row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationPatch {
    pub fn status(status: ApplicationStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            match_score: None,
            updated_at,
        }
    }

    pub fn match_score(score: f64, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: None,
            match_score: Some(score),
            updated_at,
        }
    }

    pub fn apply(&self, row: &mut ApplicationColumns) {
        if let Some(status) = self.status {
            row.status = status.as_str().to_string();
        }
        if let Some(score) = self.match_score {
            row.match_score = Some(score);
        }
        row.updated_at = self.updated_at;
    }
}
