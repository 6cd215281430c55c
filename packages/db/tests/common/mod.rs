use chrono::{DateTime, Utc};

use db::{ApplicationColumns, ApplicationRow, Database, DbConfig, DbError, JobColumns, JobRow};
use recruit_core::{ApplicationId, JobId};

pub async fn setup_db() -> Result<Database, DbError> {
    db::init(&DbConfig::memory()).await
}

pub fn job_row(title: &str, status: &str, created_at: DateTime<Utc>) -> JobRow {
    JobRow::new(
        JobId::new().to_string(),
        JobColumns {
            title: title.to_string(),
            company: "Acme".to_string(),
            location: Some("Remote".to_string()),
            employment_type: Some("Full-Time".to_string()),
            description: Some("Build things".to_string()),
            requirements: vec!["Rust".to_string()],
            salary_min: Some(90_000),
            salary_max: Some(120_000),
            salary_currency: Some("EUR".to_string()),
            deadline: None,
            status: status.to_string(),
            summary: None,
            external_id: None,
            recruiter_email: Some("recruiter@acme.test".to_string()),
            request_data: None,
            created_at,
            updated_at: created_at,
        },
    )
}

pub fn application_row(job_id: &str, email: &str) -> ApplicationRow {
    let now = Utc::now();
    ApplicationRow::new(
        ApplicationId::new().to_string(),
        ApplicationColumns {
            job_id: job_id.to_string(),
            candidate_name: "Ada".to_string(),
            candidate_email: email.to_string(),
            candidate_phone: None,
            candidate_resume_url: None,
            candidate_cover_letter: None,
            status: "pending".to_string(),
            match_score: None,
            applied_at: now,
            updated_at: now,
        },
    )
}
