//! Database schema definitions using SurrealQL.

use crate::{Database, DbError};

/// Table holding job descriptions.
pub const JOBS_TABLE: &str = "job_descriptions";

/// Table holding job applications.
pub const APPLICATIONS_TABLE: &str = "job_applications";

/// Initialize the database schema.
///
/// Both tables are schemaless: rows are written in the flat shape of
/// [`crate::JobColumns`] and [`crate::ApplicationColumns`] and only the
/// filtered columns are indexed.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    tracing::info!("Initializing database schema...");

    db.query(JOB_SCHEMA).await?.check()?;
    db.query(APPLICATION_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Job description table schema.
const JOB_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS job_descriptions SCHEMALESS;

-- Read paths filter by status and recruiter
DEFINE INDEX IF NOT EXISTS job_status ON job_descriptions FIELDS status;
DEFINE INDEX IF NOT EXISTS job_recruiter ON job_descriptions FIELDS recruiter_email;
DEFINE INDEX IF NOT EXISTS job_created ON job_descriptions FIELDS created_at;
"#;

/// Job application table schema.
const APPLICATION_SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS job_applications SCHEMALESS;

DEFINE INDEX IF NOT EXISTS application_job ON job_applications FIELDS job_id;
DEFINE INDEX IF NOT EXISTS application_email ON job_applications FIELDS candidate_email;
DEFINE INDEX IF NOT EXISTS application_status ON job_applications FIELDS status;
"#;
