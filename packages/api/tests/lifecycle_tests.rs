#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;
use std::sync::Arc;

use actors::start_supervisor;
use api::{
    ApiError, CacheKey, Completion, EnrichJob, EnrichmentError, JobLifecycle, JobsApi,
};
use recruit_core::{JobEdit, JobId, JobStatus, NewJob, SalaryRange};
use tokio::sync::Notify;

use common::{FakeJobStore, ScriptedEnricher, cache_at, job_id, job_row, manual_clock, start_time};

fn new_job() -> NewJob {
    NewJob::new("Site Reliability Engineer", "Acme")
        .with_location("Remote")
        .with_requirements(vec!["Kubernetes".to_string()])
        .with_salary_range(SalaryRange {
            min: Some(100_000),
            max: Some(140_000),
            currency: "USD".to_string(),
        })
}

#[tokio::test]
async fn test_create_then_enrich_to_active() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let store = Arc::new(FakeJobStore::default());
    let enricher = Arc::new(ScriptedEnricher::succeeding("ext-1", "Great role"));
    let (supervisor, handle) = start_supervisor(Arc::new(EnrichJob::new(
        store.clone(),
        enricher.clone(),
        cache.clone(),
    )))
    .await?;
    let lifecycle = JobLifecycle::new(store.clone(), cache.clone(), supervisor.clone());

    let created = lifecycle.create_job(new_job()).await?;
    assert_eq!(created.status, JobStatus::Processing);
    assert_eq!(created.summary, None);

    assert_eq!(store.wait_settled(&created.id).await, "active");
    let row = store.row(&created.id).ok_or("job missing")?;
    assert_eq!(row.data.summary.as_deref(), Some("Great role"));
    assert_eq!(row.data.external_id.as_deref(), Some("ext-1"));

    let sent = enricher.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].salary_max, Some(140_000));
    assert_eq!(sent[0].requirements, vec!["Kubernetes".to_string()]);

    // readers see the settled job
    let jobs = JobsApi::new(store.clone(), cache.clone());
    let job = jobs.get_by_id(&created.id).await?;
    assert_eq!(job.status, JobStatus::Active);

    supervisor.shutdown();
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn test_failed_enrichment_marks_error_and_keeps_fields() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let store = Arc::new(FakeJobStore::default());
    let enricher = Arc::new(ScriptedEnricher::failing(EnrichmentError::Network(
        "connection refused".to_string(),
    )));
    let (supervisor, handle) =
        start_supervisor(Arc::new(EnrichJob::new(store.clone(), enricher, cache.clone()))).await?;
    let lifecycle = JobLifecycle::new(store.clone(), cache.clone(), supervisor.clone());

    let created = lifecycle.create_job(new_job()).await?;
    let before = store.row(&created.id).ok_or("job missing")?;

    assert_eq!(store.wait_settled(&created.id).await, "error");
    let after = store.row(&created.id).ok_or("job missing")?;
    assert_eq!(after.data.title, before.data.title);
    assert_eq!(after.data.requirements, before.data.requirements);
    assert_eq!(after.data.summary, None);
    assert_eq!(after.data.external_id, None);

    supervisor.shutdown();
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn test_duplicate_completion_is_ignored() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let row = job_row("Processing", "processing", start_time());
    let id = job_id(&row);
    let store = Arc::new(FakeJobStore::with_rows(vec![row]));
    let enricher = Arc::new(ScriptedEnricher::new(vec![
        Ok(api::Enrichment {
            external_id: "ext-1".to_string(),
            summary: "First".to_string(),
        }),
        Ok(api::Enrichment {
            external_id: "ext-2".to_string(),
            summary: "Second".to_string(),
        }),
    ]));
    let task = EnrichJob::new(store.clone(), enricher, cache.clone());
    let job = api::job_from_row(store.row(&id).ok_or("job missing")?)?;

    assert_eq!(task.complete(&job).await, Completion::Settled(JobStatus::Active));
    assert_eq!(task.complete(&job).await, Completion::AlreadySettled);

    let stored = store.row(&id).ok_or("job missing")?;
    assert_eq!(stored.data.external_id.as_deref(), Some("ext-1"));
    assert_eq!(stored.data.summary.as_deref(), Some("First"));
    Ok(())
}

#[tokio::test]
async fn test_failed_terminal_write_leaves_processing() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let row = job_row("Stuck", "processing", start_time());
    let id = job_id(&row);
    let store = Arc::new(FakeJobStore::with_rows(vec![row]));
    store.fail_transitions(true);
    let task = EnrichJob::new(
        store.clone(),
        Arc::new(ScriptedEnricher::succeeding("ext-1", "Great role")),
        cache,
    );
    let job = api::job_from_row(store.row(&id).ok_or("job missing")?)?;

    assert_eq!(task.complete(&job).await, Completion::WriteFailed);
    assert_eq!(store.row(&id).map(|r| r.data.status).as_deref(), Some("processing"));
    Ok(())
}

#[tokio::test]
async fn test_completion_invalidates_cached_job() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let row = job_row("Cached", "processing", start_time());
    let id = job_id(&row);
    let store = Arc::new(FakeJobStore::with_rows(vec![row]));
    let jobs = JobsApi::new(store.clone(), cache.clone());

    assert_eq!(jobs.get_by_id(&id).await?.status, JobStatus::Processing);
    jobs.list_all().await?;

    let task = EnrichJob::new(
        store.clone(),
        Arc::new(ScriptedEnricher::succeeding("ext-1", "Great role")),
        cache.clone(),
    );
    let job = api::job_from_row(store.row(&id).ok_or("job missing")?)?;
    task.complete(&job).await;

    assert!(!cache.contains(&CacheKey::Job(id.clone()).to_string()));
    assert!(!cache.contains(&CacheKey::Jobs.to_string()));
    assert_eq!(jobs.get_by_id(&id).await?.status, JobStatus::Active);
    Ok(())
}

#[tokio::test]
async fn test_edit_rules() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let processing = job_row("Pending", "processing", start_time());
    let mut draft = job_row("Draft", "draft", start_time());
    draft.data.summary = None;
    let active = job_row("Live", "active", start_time());
    let (processing_id, draft_id, active_id) =
        (job_id(&processing), job_id(&draft), job_id(&active));
    let store = Arc::new(FakeJobStore::with_rows(vec![processing, draft, active]));
    let (supervisor, handle) = start_supervisor(Arc::new(EnrichJob::new(
        store.clone(),
        Arc::new(ScriptedEnricher::new(vec![])),
        cache.clone(),
    )))
    .await?;
    let lifecycle = JobLifecycle::new(store.clone(), cache.clone(), supervisor.clone());

    // field edits on a processing job keep its status
    clock.advance(chrono::Duration::minutes(1));
    let edited = lifecycle
        .edit_job(
            &processing_id,
            JobEdit {
                title: Some("Pending (edited)".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(edited.status, JobStatus::Processing);
    assert_eq!(edited.updated_at, start_time() + chrono::Duration::minutes(1));

    // but its status cannot be changed by hand
    let to_closed = JobEdit {
        status: Some(JobStatus::Closed),
        ..Default::default()
    };
    assert!(matches!(
        lifecycle.edit_job(&processing_id, to_closed.clone()).await,
        Err(ApiError::InvalidTransition {
            from: JobStatus::Processing,
            to: JobStatus::Closed
        })
    ));

    // processing and error are never manual targets, not even as a no-op
    for target in [JobStatus::Processing, JobStatus::Error] {
        for id in [&active_id, &processing_id] {
            let edit = JobEdit {
                status: Some(target),
                ..Default::default()
            };
            assert!(matches!(
                lifecycle.edit_job(id, edit).await,
                Err(ApiError::InvalidTransition { .. })
            ));
        }
    }
    assert_eq!(store.row(&processing_id).map(|r| r.data.status).as_deref(), Some("processing"));

    // activating needs a summary
    let to_active = JobEdit {
        status: Some(JobStatus::Active),
        ..Default::default()
    };
    assert!(matches!(
        lifecycle.edit_job(&draft_id, to_active).await,
        Err(ApiError::InvalidTransition { .. })
    ));

    let closed = lifecycle.close_job(&active_id).await?;
    assert_eq!(closed.status, JobStatus::Closed);
    assert_eq!(store.row(&active_id).map(|r| r.data.status).as_deref(), Some("closed"));

    assert!(matches!(
        lifecycle.close_job(&JobId::new()).await,
        Err(ApiError::JobNotFound(_))
    ));

    supervisor.shutdown();
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn test_field_edit_does_not_undo_concurrent_settle() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let row = job_row("Racing", "processing", start_time());
    let id = job_id(&row);
    let store = Arc::new(FakeJobStore::with_rows(vec![row]));
    let (supervisor, handle) = start_supervisor(Arc::new(EnrichJob::new(
        store.clone(),
        Arc::new(ScriptedEnricher::new(vec![])),
        cache.clone(),
    )))
    .await?;
    let lifecycle = JobLifecycle::new(store.clone(), cache, supervisor.clone());

    store.settle_after_next_read("active");
    let edited = lifecycle
        .edit_job(
            &id,
            JobEdit {
                title: Some("Racing (edited)".to_string()),
                status: Some(JobStatus::Processing),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(edited, Err(ApiError::InvalidTransition { .. })));
    assert_eq!(store.row(&id).map(|r| r.data.status).as_deref(), Some("active"));

    // a plain field edit leaves the settled status alone
    store.set_status(&id, "processing");
    store.settle_after_next_read("active");
    let edited = lifecycle
        .edit_job(
            &id,
            JobEdit {
                title: Some("Racing (edited)".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(edited.status, JobStatus::Active);
    assert_eq!(edited.title, "Racing (edited)");

    supervisor.shutdown();
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn test_create_without_supervisor_leaves_no_row() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let store = Arc::new(FakeJobStore::default());
    let (supervisor, handle) = start_supervisor(Arc::new(EnrichJob::new(
        store.clone(),
        Arc::new(ScriptedEnricher::new(vec![])),
        cache.clone(),
    )))
    .await?;
    supervisor.shutdown();
    handle.await?;

    let lifecycle = JobLifecycle::new(store.clone(), cache, supervisor);
    let result = lifecycle.create_job(new_job()).await;

    assert!(matches!(result, Err(ApiError::Supervisor(_))));
    assert_eq!(store.list_calls(), 0);
    let jobs = JobsApi::new(store.clone(), cache_at(&clock));
    assert!(jobs.list_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_delete_cancels_enrichment() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let store = Arc::new(FakeJobStore::default());
    let gate = Arc::new(Notify::new());
    let enricher = Arc::new(ScriptedEnricher::succeeding("ext-1", "Great role").gated(gate.clone()));
    let (supervisor, handle) = start_supervisor(Arc::new(EnrichJob::new(
        store.clone(),
        enricher.clone(),
        cache.clone(),
    )))
    .await?;
    let lifecycle = JobLifecycle::new(store.clone(), cache.clone(), supervisor.clone());

    let created = lifecycle.create_job(new_job()).await?;
    assert!(supervisor.is_running(created.id.clone()).await?);

    lifecycle.delete_job(&created.id).await?;
    assert!(!supervisor.is_running(created.id.clone()).await?);
    assert!(store.row(&created.id).is_none());

    gate.notify_one();
    assert!(supervisor.in_flight().await?.is_empty());

    supervisor.shutdown();
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn test_create_requires_title_and_company() -> Result<(), Box<dyn Error>> {
    let clock = manual_clock();
    let cache = cache_at(&clock);
    let store = Arc::new(FakeJobStore::default());
    let (supervisor, handle) = start_supervisor(Arc::new(EnrichJob::new(
        store.clone(),
        Arc::new(ScriptedEnricher::new(vec![])),
        cache.clone(),
    )))
    .await?;
    let lifecycle = JobLifecycle::new(store.clone(), cache, supervisor.clone());

    let result = lifecycle.create_job(NewJob::new("  ", "Acme")).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    assert_eq!(store.list_calls(), 0);

    supervisor.shutdown();
    handle.await?;
    Ok(())
}
