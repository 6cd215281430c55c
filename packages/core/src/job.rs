//! Job description domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::ParseError;

/// Identifier for a job description.
///
/// Ids are opaque strings owned by the backing store. New ids are ULIDs so
/// they sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Wrap an id read from the store.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored lifecycle status of a job description.
///
/// `Processing` is only ever entered by creation and only ever left by the
/// background enrichment task, which moves it to `Active` or `Error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Draft,
    Processing,
    Active,
    Closed,
    Error,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Draft,
        JobStatus::Processing,
        JobStatus::Active,
        JobStatus::Closed,
        JobStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Processing => "processing",
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
            JobStatus::Error => "error",
        }
    }

    /// Terminal states of the enrichment path.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Active | JobStatus::Error)
    }

    /// Whether an explicit edit may move a job from `self` to `to`.
    ///
    /// `Processing` belongs to the enrichment task and `Error` is only set by
    /// a failed enrichment, so neither is ever a manual target, and a job
    /// still in `Processing` cannot be moved by hand.
    pub fn allows_manual_transition(&self, to: JobStatus) -> bool {
        if matches!(to, JobStatus::Processing | JobStatus::Error) {
            return false;
        }
        if *self == to {
            return true;
        }
        match (self, to) {
            (JobStatus::Processing, _) => false,
            (JobStatus::Draft, JobStatus::Active | JobStatus::Closed) => true,
            (JobStatus::Active, JobStatus::Draft | JobStatus::Closed) => true,
            (JobStatus::Closed, JobStatus::Active) => true,
            (JobStatus::Error, JobStatus::Closed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(JobStatus::Draft),
            "processing" => Ok(JobStatus::Processing),
            "active" => Ok(JobStatus::Active),
            "closed" => Ok(JobStatus::Closed),
            "error" => Ok(JobStatus::Error),
            _ => Err(ParseError::UnknownStatus(s.to_string())),
        }
    }
}

/// Closed set of employment types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
            EmploymentType::Temporary => "temporary",
        }
    }

    /// Coerce a free-form store value into the closed set.
    ///
    /// Matching ignores case and treats `-`, `_` and spaces alike. Returns
    /// `None` for anything outside the set.
    pub fn coerce(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "full_time" | "fulltime" => Some(EmploymentType::FullTime),
            "part_time" | "parttime" => Some(EmploymentType::PartTime),
            "contract" | "contractor" => Some(EmploymentType::Contract),
            "internship" | "intern" => Some(EmploymentType::Internship),
            "temporary" | "temp" => Some(EmploymentType::Temporary),
            _ => None,
        }
    }
}

impl std::fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Salary band assembled from the store's flat salary columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    pub currency: String,
}

/// A job description in its domain shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<SalaryRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    /// Status as stored. Use [`JobRecord::effective_status`] for display.
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recruiter_email: Option<String>,
    /// Opaque client payload carried alongside the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Whether the deadline has passed at `now`.
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline < now)
    }

    /// Status as read paths report it: an active job past its deadline is
    /// closed, regardless of what is stored.
    pub fn effective_status(&self, now: DateTime<Utc>) -> JobStatus {
        if self.status == JobStatus::Active && self.deadline_passed(now) {
            JobStatus::Closed
        } else {
            self.status
        }
    }

    /// Copy of this record with the derived status applied.
    pub fn as_of(&self, now: DateTime<Utc>) -> JobRecord {
        let mut job = self.clone();
        job.status = self.effective_status(now);
        job
    }

    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// Input for creating a job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub salary_range: Option<SalaryRange>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recruiter_email: Option<String>,
    #[serde(default)]
    pub request_data: Option<serde_json::Value>,
}

impl NewJob {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_employment_type(mut self, employment_type: EmploymentType) -> Self {
        self.employment_type = employment_type;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<String>) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_salary_range(mut self, salary_range: SalaryRange) -> Self {
        self.salary_range = Some(salary_range);
        self
    }

    pub fn with_recruiter_email(mut self, email: impl Into<String>) -> Self {
        self.recruiter_email = Some(email.into());
        self
    }
}

/// Explicit field edits. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobEdit {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub salary_range: Option<SalaryRange>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<JobStatus>,
}

impl JobEdit {
    pub fn is_empty(&self) -> bool {
        self == &JobEdit::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active_job(deadline: Option<DateTime<Utc>>) -> JobRecord {
        let now = Utc::now();
        JobRecord {
            id: JobId::new(),
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            location: String::new(),
            employment_type: EmploymentType::FullTime,
            description: String::new(),
            requirements: Vec::new(),
            salary_range: None,
            deadline,
            status: JobStatus::Active,
            summary: Some("summary".into()),
            external_id: None,
            recruiter_email: None,
            request_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn past_deadline_reads_as_closed_without_touching_stored_status() {
        let now = Utc::now();
        let job = active_job(Some(now - Duration::days(1)));

        assert_eq!(job.effective_status(now), JobStatus::Closed);
        assert_eq!(job.as_of(now).status, JobStatus::Closed);
        assert_eq!(job.status, JobStatus::Active);
    }

    #[test]
    fn only_active_jobs_are_closed_by_deadline() {
        let now = Utc::now();
        let mut job = active_job(Some(now - Duration::days(1)));
        job.status = JobStatus::Processing;
        assert_eq!(job.effective_status(now), JobStatus::Processing);

        let open = active_job(Some(now + Duration::days(14)));
        assert_eq!(open.effective_status(now), JobStatus::Active);
        assert_eq!(active_job(None).effective_status(now), JobStatus::Active);
    }

    #[test]
    fn employment_type_coercion() {
        assert_eq!(EmploymentType::coerce("Full-Time"), Some(EmploymentType::FullTime));
        assert_eq!(EmploymentType::coerce("part time"), Some(EmploymentType::PartTime));
        assert_eq!(EmploymentType::coerce("CONTRACT"), Some(EmploymentType::Contract));
        assert_eq!(EmploymentType::coerce("freelance"), None);
    }

    #[test]
    fn manual_transitions_never_enter_processing_or_error() {
        for from in JobStatus::ALL {
            assert!(!from.allows_manual_transition(JobStatus::Processing));
            assert!(!from.allows_manual_transition(JobStatus::Error));
        }
        assert!(JobStatus::Active.allows_manual_transition(JobStatus::Active));
        assert!(!JobStatus::Processing.allows_manual_transition(JobStatus::Active));
        assert!(JobStatus::Active.allows_manual_transition(JobStatus::Closed));
        assert!(JobStatus::Draft.allows_manual_transition(JobStatus::Active));
    }
}
