//! Client for the job description enrichment service.

use std::future::Future;

use chrono::{DateTime, Utc};
use recruit_core::JobRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Endpoint used when none is configured.
pub const DEFAULT_ENRICHMENT_URL: &str = "http://localhost:8000/api/job-descriptions/enrich";

/// Job fields sent for enrichment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentRequest {
    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub description: String,
    pub requirements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

impl From<&JobRecord> for EnrichmentRequest {
    fn from(job: &JobRecord) -> Self {
        let salary = job.salary_range.as_ref();
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            employment_type: job.employment_type.as_str().to_string(),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            salary_min: salary.and_then(|s| s.min),
            salary_max: salary.and_then(|s| s.max),
            salary_currency: salary.map(|s| s.currency.clone()),
            deadline: job.deadline,
        }
    }
}

/// A successful enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    /// Identifier assigned by the enrichment service.
    pub external_id: String,
    pub summary: String,
}

/// Reasons an enrichment attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Enrichment request failed: {0}")]
    Network(String),

    #[error("Enrichment service returned status {0}")]
    Status(u16),

    #[error("Malformed enrichment response: {0}")]
    Malformed(String),
}

/// Produces a summary and external id for a job.
pub trait Enricher: Send + Sync + 'static {
    fn enrich(
        &self,
        request: &EnrichmentRequest,
    ) -> impl Future<Output = Result<Enrichment, EnrichmentError>> + Send;
}

#[derive(Deserialize)]
struct EnrichmentResponse {
    id: Option<String>,
    summary: Option<String>,
}

/// Validate a response body. Both `id` and a non-blank `summary` are
/// required.
pub fn parse_response(body: &str) -> Result<Enrichment, EnrichmentError> {
    let response: EnrichmentResponse =
        serde_json::from_str(body).map_err(|e| EnrichmentError::Malformed(e.to_string()))?;

    let external_id = response
        .id
        .ok_or_else(|| EnrichmentError::Malformed("missing id".into()))?;
    let summary = response
        .summary
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| EnrichmentError::Malformed("missing summary".into()))?;

    Ok(Enrichment {
        external_id,
        summary,
    })
}

/// Enricher calling the service over HTTP.
///
/// Requests carry no timeout and are never retried; a failed call settles
/// the job as `error`.
#[derive(Debug, Clone)]
pub struct HttpEnricher {
    client: Client,
    url: String,
}

impl HttpEnricher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpEnricher {
    fn default() -> Self {
        Self::new(DEFAULT_ENRICHMENT_URL)
    }
}

impl Enricher for HttpEnricher {
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<Enrichment, EnrichmentError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;
        parse_response(&body)
    }
}
