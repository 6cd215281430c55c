//! Conversion between raw store rows and domain records.
//!
//! Store rows are loosely typed. Reading coerces them into the domain
//! shape: free-form employment types fold into the closed set, split salary
//! columns become a [`SalaryRange`], candidate columns become a
//! [`Candidate`]. A status outside the closed set is a mapping failure.

use chrono::{DateTime, Utc};
use db::{ApplicationColumns, ApplicationRow, JobColumns, JobPatch, JobRow};
use recruit_core::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Candidate, EmploymentType, JobEdit,
    JobId, JobRecord, JobStatus, NewApplication, NewJob, ParseError, SalaryRange,
    clamp_match_score,
};

/// Currency assumed when a row carries salary figures without one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A row that cannot be represented as a domain record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Cannot map row {id}: {source}")]
pub struct MappingError {
    pub id: String,
    #[source]
    pub source: ParseError,
}

impl MappingError {
    fn new(id: &str, source: ParseError) -> Self {
        Self {
            id: id.to_string(),
            source,
        }
    }
}

/// Map a `job_descriptions` row into a [`JobRecord`].
pub fn job_from_row(row: JobRow) -> Result<JobRecord, MappingError> {
    let id = JobId::parse(&row.id).map_err(|e| MappingError::new(&row.id, e))?;
    let cols = row.data;
    let status: JobStatus = cols
        .status
        .parse()
        .map_err(|e| MappingError::new(&row.id, e))?;

    let employment_type = match cols.employment_type.as_deref() {
        Some(raw) => EmploymentType::coerce(raw).unwrap_or_else(|| {
            tracing::debug!("Job {}: unknown employment type {:?}, using full_time", id, raw);
            EmploymentType::FullTime
        }),
        None => EmploymentType::FullTime,
    };

    let salary_range = salary_from_columns(cols.salary_min, cols.salary_max, cols.salary_currency);

    Ok(JobRecord {
        id,
        title: cols.title,
        company: cols.company,
        location: cols.location.unwrap_or_default(),
        employment_type,
        description: cols.description.unwrap_or_default(),
        requirements: cols.requirements,
        salary_range,
        deadline: cols.deadline,
        status,
        summary: cols.summary,
        external_id: cols.external_id,
        recruiter_email: cols.recruiter_email,
        request_data: cols.request_data,
        created_at: cols.created_at,
        updated_at: cols.updated_at,
    })
}

fn salary_from_columns(
    min: Option<i64>,
    max: Option<i64>,
    currency: Option<String>,
) -> Option<SalaryRange> {
    if min.is_none() && max.is_none() && currency.is_none() {
        return None;
    }
    Some(SalaryRange {
        min,
        max,
        currency: currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    })
}

/// Build the row written when a job is created. New jobs always start in
/// `processing`.
pub fn new_job_row(id: &JobId, job: &NewJob, now: DateTime<Utc>) -> JobRow {
    let (salary_min, salary_max, salary_currency) = match &job.salary_range {
        Some(range) => (range.min, range.max, Some(range.currency.clone())),
        None => (None, None, None),
    };

    JobRow::new(
        id.as_str(),
        JobColumns {
            title: job.title.clone(),
            company: job.company.clone(),
            location: Some(job.location.clone()),
            employment_type: Some(job.employment_type.as_str().to_string()),
            description: Some(job.description.clone()),
            requirements: job.requirements.clone(),
            salary_min,
            salary_max,
            salary_currency,
            deadline: job.deadline,
            status: JobStatus::Processing.as_str().to_string(),
            summary: None,
            external_id: None,
            recruiter_email: job.recruiter_email.clone(),
            request_data: job.request_data.clone(),
            created_at: now,
            updated_at: now,
        },
    )
}

/// Translate an edit into a store patch stamped with `now`.
pub fn edit_to_patch(edit: &JobEdit, now: DateTime<Utc>) -> JobPatch {
    let mut patch = JobPatch::new(now);
    patch.title = edit.title.clone();
    patch.company = edit.company.clone();
    patch.location = edit.location.clone();
    patch.employment_type = edit.employment_type.map(|t| t.as_str().to_string());
    patch.description = edit.description.clone();
    patch.requirements = edit.requirements.clone();
    if let Some(range) = &edit.salary_range {
        patch.salary_min = range.min;
        patch.salary_max = range.max;
        patch.salary_currency = Some(range.currency.clone());
    }
    patch.deadline = edit.deadline;
    patch.status = edit.status;
    patch
}

/// Map a `job_applications` row into an [`ApplicationRecord`].
pub fn application_from_row(row: ApplicationRow) -> Result<ApplicationRecord, MappingError> {
    let id = ApplicationId::parse(&row.id).map_err(|e| MappingError::new(&row.id, e))?;
    let cols = row.data;
    let job_id = JobId::parse(&cols.job_id).map_err(|e| MappingError::new(&row.id, e))?;
    let status: ApplicationStatus = cols
        .status
        .parse()
        .map_err(|e| MappingError::new(&row.id, e))?;

    Ok(ApplicationRecord {
        id,
        job_id,
        candidate: Candidate {
            name: cols.candidate_name,
            email: cols.candidate_email,
            phone: cols.candidate_phone,
            resume_url: cols.candidate_resume_url,
            cover_letter: cols.candidate_cover_letter,
        },
        applied_at: cols.applied_at,
        status,
        match_score: cols.match_score.and_then(clamp_match_score),
        updated_at: cols.updated_at,
    })
}

/// Build the row written when a candidate applies.
pub fn new_application_row(
    id: &ApplicationId,
    application: &NewApplication,
    now: DateTime<Utc>,
) -> ApplicationRow {
    let candidate = &application.candidate;
    ApplicationRow::new(
        id.as_str(),
        ApplicationColumns {
            job_id: application.job_id.as_str().to_string(),
            candidate_name: candidate.name.clone(),
            candidate_email: candidate.email.trim().to_string(),
            candidate_phone: candidate.phone.clone(),
            candidate_resume_url: candidate.resume_url.clone(),
            candidate_cover_letter: candidate.cover_letter.clone(),
            status: ApplicationStatus::Pending.as_str().to_string(),
            match_score: None,
            applied_at: now,
            updated_at: now,
        },
    )
}
