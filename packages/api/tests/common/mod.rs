#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api::{Enricher, Enrichment, EnrichmentError, EnrichmentRequest, SharedCache};
use cache::{CacheConfig, EntityCache, ManualClock};
use chrono::{DateTime, TimeZone, Utc};
use db::{
    ApplicationColumns, ApplicationFilter, ApplicationPatch, ApplicationRow, ApplicationStore,
    DbError, JobColumns, JobFilter, JobPatch, JobRow, JobStore, StatusUpdate,
};
use recruit_core::{ApplicationId, JobId, JobStatus};
use tokio::sync::Notify;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("valid time")
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}

pub fn cache_at(clock: &Arc<ManualClock>) -> SharedCache {
    Arc::new(EntityCache::new(CacheConfig::default()).with_clock(clock.clone()))
}

fn injected() -> DbError {
    DbError::Query("injected failure".to_string())
}

/// In-memory job table with call counters and failure switches.
#[derive(Default)]
pub struct FakeJobStore {
    rows: Mutex<Vec<JobRow>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_transitions: AtomicBool,
    settle_after_read: Mutex<Option<String>>,
}

impl FakeJobStore {
    pub fn with_rows(rows: Vec<JobRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_transitions(&self, fail: bool) {
        self.fail_transitions.store(fail, Ordering::SeqCst);
    }

    /// Change the stored status right after the next `get_job` returns,
    /// as a background completion landing between a read and a write would.
    pub fn settle_after_next_read(&self, status: &str) {
        *self.settle_after_read.lock().expect("lock") = Some(status.to_string());
    }

    pub fn row(&self, id: &JobId) -> Option<JobRow> {
        let rows = self.rows.lock().expect("lock");
        rows.iter().find(|r| r.id == id.as_str()).cloned()
    }

    /// Overwrite a row behind the cache's back, as another client would.
    pub fn set_status(&self, id: &JobId, status: &str) {
        let mut rows = self.rows.lock().expect("lock");
        if let Some(row) = rows.iter_mut().find(|r| r.id == id.as_str()) {
            row.data.status = status.to_string();
        }
    }

    /// Poll until the stored status leaves `processing`.
    pub async fn wait_settled(&self, id: &JobId) -> String {
        for _ in 0..200 {
            if let Some(row) = self.row(id)
                && row.data.status != "processing"
            {
                return row.data.status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        "processing".to_string()
    }
}

impl JobStore for FakeJobStore {
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobRow>, DbError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let rows = self.rows.lock().expect("lock");
        let mut out: Vec<JobRow> = rows.iter().filter(|r| filter.matches(&r.data)).cloned().collect();
        out.sort_by(|a, b| b.data.created_at.cmp(&a.data.created_at));
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<JobRow>, DbError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let row = self.row(id);
        if let Some(status) = self.settle_after_read.lock().expect("lock").take() {
            self.set_status(id, &status);
        }
        Ok(row)
    }

    async fn insert_job(&self, row: &JobRow) -> Result<JobRow, DbError> {
        self.rows.lock().expect("lock").push(row.clone());
        Ok(row.clone())
    }

    async fn update_job(&self, id: &JobId, patch: &JobPatch) -> Result<JobRow, DbError> {
        let mut rows = self.rows.lock().expect("lock");
        let row = rows
            .iter_mut()
            .find(|r| r.id == id.as_str())
            .ok_or_else(|| DbError::NotFound(format!("job {}", id)))?;
        patch.apply(&mut row.data);
        Ok(row.clone())
    }

    async fn transition_job(
        &self,
        id: &JobId,
        expected: JobStatus,
        update: &StatusUpdate,
    ) -> Result<Option<JobRow>, DbError> {
        if self.fail_transitions.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let mut rows = self.rows.lock().expect("lock");
        match rows
            .iter_mut()
            .find(|r| r.id == id.as_str() && r.data.status == expected.as_str())
        {
            Some(row) => {
                update.apply(&mut row.data);
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), DbError> {
        self.rows.lock().expect("lock").retain(|r| r.id != id.as_str());
        Ok(())
    }
}

/// In-memory application table with call counters.
#[derive(Default)]
pub struct FakeApplicationStore {
    rows: Mutex<Vec<ApplicationRow>>,
    list_calls: AtomicUsize,
    count_calls: AtomicUsize,
    fail_reads: AtomicBool,
}

impl FakeApplicationStore {
    pub fn with_rows(rows: Vec<ApplicationRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl ApplicationStore for FakeApplicationStore {
    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationRow>, DbError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let rows = self.rows.lock().expect("lock");
        let mut out: Vec<ApplicationRow> =
            rows.iter().filter(|r| filter.matches(&r.data)).cloned().collect();
        out.sort_by(|a, b| b.data.applied_at.cmp(&a.data.applied_at));
        Ok(out)
    }

    async fn get_application(&self, id: &ApplicationId) -> Result<Option<ApplicationRow>, DbError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let rows = self.rows.lock().expect("lock");
        Ok(rows.iter().find(|r| r.id == id.as_str()).cloned())
    }

    async fn insert_application(&self, row: &ApplicationRow) -> Result<ApplicationRow, DbError> {
        self.rows.lock().expect("lock").push(row.clone());
        Ok(row.clone())
    }

    async fn update_application(
        &self,
        id: &ApplicationId,
        patch: &ApplicationPatch,
    ) -> Result<ApplicationRow, DbError> {
        let mut rows = self.rows.lock().expect("lock");
        let row = rows
            .iter_mut()
            .find(|r| r.id == id.as_str())
            .ok_or_else(|| DbError::NotFound(format!("application {}", id)))?;
        patch.apply(&mut row.data);
        Ok(row.clone())
    }

    async fn count_for_job(&self, job_id: &JobId) -> Result<u64, DbError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().expect("lock");
        Ok(rows.iter().filter(|r| r.data.job_id == job_id.as_str()).count() as u64)
    }

    async fn count_grouped_by_job(&self) -> Result<HashMap<JobId, u64>, DbError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().expect("lock");
        let mut counts = HashMap::new();
        for row in rows.iter() {
            let job_id = JobId::parse(&row.data.job_id).map_err(|e| DbError::Query(e.to_string()))?;
            *counts.entry(job_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Enricher replaying scripted results, optionally held until released.
pub struct ScriptedEnricher {
    results: Mutex<VecDeque<Result<Enrichment, EnrichmentError>>>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<EnrichmentRequest>>,
}

impl ScriptedEnricher {
    pub fn new(results: Vec<Result<Enrichment, EnrichmentError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            gate: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(external_id: &str, summary: &str) -> Self {
        Self::new(vec![Ok(Enrichment {
            external_id: external_id.to_string(),
            summary: summary.to_string(),
        })])
    }

    pub fn failing(error: EnrichmentError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<EnrichmentRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Enricher for ScriptedEnricher {
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<Enrichment, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().expect("lock").push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.results
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(EnrichmentError::Network("no scripted result".to_string())))
    }
}

pub fn job_row(title: &str, status: &str, created_at: DateTime<Utc>) -> JobRow {
    JobRow::new(
        JobId::new().to_string(),
        JobColumns {
            title: title.to_string(),
            company: "Acme".to_string(),
            location: Some("Berlin".to_string()),
            employment_type: Some("Full-Time".to_string()),
            description: Some("Ship features".to_string()),
            requirements: vec!["Rust".to_string()],
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            deadline: None,
            status: status.to_string(),
            summary: Some("Existing summary".to_string()),
            external_id: None,
            recruiter_email: Some("recruiter@acme.test".to_string()),
            request_data: None,
            created_at,
            updated_at: created_at,
        },
    )
}

pub fn application_row(job_id: &JobId, email: &str, applied_at: DateTime<Utc>) -> ApplicationRow {
    ApplicationRow::new(
        ApplicationId::new().to_string(),
        ApplicationColumns {
            job_id: job_id.to_string(),
            candidate_name: "Grace".to_string(),
            candidate_email: email.to_string(),
            candidate_phone: None,
            candidate_resume_url: None,
            candidate_cover_letter: None,
            status: "pending".to_string(),
            match_score: None,
            applied_at,
            updated_at: applied_at,
        },
    )
}

pub fn job_id(row: &JobRow) -> JobId {
    JobId::parse(&row.id).expect("row id")
}
