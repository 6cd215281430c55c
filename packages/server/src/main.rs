//! Runs the recruitment data layer until interrupted.

use api::{AppConfig, RecruitApp, WatchScope};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env()?;
    let app = RecruitApp::start(config).await?;

    match app.jobs.list_active().await {
        Ok(active) => tracing::info!("{} active jobs", active.len()),
        Err(e) => tracing::warn!("Initial job load failed: {}", e),
    }

    // Keep the active job list warm while jobs change.
    let mut view = app.realtime.watch(WatchScope::Jobs);
    let jobs = app.jobs.clone();
    let refresher = tokio::spawn(async move {
        while view.refreshed().await.is_some() {
            match jobs.list_active().await {
                Ok(active) => tracing::info!("{} active jobs", active.len()),
                Err(e) => tracing::warn!("Job refresh failed: {}", e),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    refresher.abort();
    app.shutdown().await;
    Ok(())
}
