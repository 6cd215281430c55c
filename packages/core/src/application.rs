//! Job application domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{JobId, ParseError};

/// Identifier for a job application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

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

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review status of an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewing,
    Shortlisted,
    Rejected,
    Hired,
    /// Waiting on the match-scoring process.
    Processing,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Processing => "processing",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewing" => Ok(ApplicationStatus::Reviewing),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "hired" => Ok(ApplicationStatus::Hired),
            "processing" => Ok(ApplicationStatus::Processing),
            _ => Err(ParseError::UnknownStatus(s.to_string())),
        }
    }
}

/// The person applying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    /// Email comparison used by the per-candidate listing.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// An application in its domain shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub candidate: Candidate,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    /// Match score in `0..=100`, set by recruiters or the scoring process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Input for submitting an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub job_id: JobId,
    pub candidate: Candidate,
}

impl NewApplication {
    pub fn new(job_id: JobId, candidate: Candidate) -> Self {
        Self { job_id, candidate }
    }
}

/// Clamp a score into `0..=100`. Non-finite scores are dropped.
pub fn clamp_match_score(score: f64) -> Option<f64> {
    if score.is_finite() {
        Some(score.clamp(0.0, 100.0))
    } else {
        None
    }
}
