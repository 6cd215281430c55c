//! Startup wiring for the recruitment data layer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actors::{SupervisorHandle, start_supervisor};
use cache::{CacheConfig, DEFAULT_QUOTA_BYTES, DEFAULT_TTL, EntityCache, FileMedium, MemoryMedium, SnapshotMedium};
use db::repositories::{ApplicationRepository, JobRepository};
use db::{DbConfig, DbError, LiveFeed};
use tokio::task::JoinHandle;

use crate::applications::ApplicationsApi;
use crate::enrichment::{DEFAULT_ENRICHMENT_URL, HttpEnricher};
use crate::facades::SharedCache;
use crate::jobs::JobsApi;
use crate::lifecycle::{EnrichJob, JobLifecycle};
use crate::realtime::RealtimeInvalidator;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Startup errors.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database initialization failed: {0}")]
    Database(#[from] DbError),

    #[error("Failed to start enrichment supervisor: {0}")]
    Supervisor(#[from] actors::SpawnErr),
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub cache_ttl: Duration,
    /// Directory for cache snapshots. `None` keeps snapshots in process
    /// memory, so nothing cached survives a restart.
    pub cache_dir: Option<PathBuf>,
    pub cache_quota_bytes: usize,
    pub enrichment_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            cache_ttl: DEFAULT_TTL,
            cache_dir: None,
            cache_quota_bytes: DEFAULT_QUOTA_BYTES,
            enrichment_url: DEFAULT_ENRICHMENT_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from `RECRUIT_*` and `ENRICHMENT_URL` environment
    /// variables. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = var("RECRUIT_DB_ENDPOINT") {
            config.db = config.db.with_endpoint(endpoint);
        }
        if let Some(namespace) = var("RECRUIT_DB_NAMESPACE") {
            config.db = config.db.with_namespace(namespace);
        }
        if let Some(database) = var("RECRUIT_DB_DATABASE") {
            config.db = config.db.with_database(database);
        }
        if let Some(secs) = var("RECRUIT_CACHE_TTL_SECS") {
            let secs = parse_positive("RECRUIT_CACHE_TTL_SECS", &secs)?;
            config.cache_ttl = Duration::from_secs(secs as u64);
        }
        if let Some(dir) = var("RECRUIT_CACHE_DIR") {
            config.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(quota) = var("RECRUIT_CACHE_QUOTA_BYTES") {
            config.cache_quota_bytes = parse_positive("RECRUIT_CACHE_QUOTA_BYTES", &quota)?;
        }
        if let Some(url) = var("ENRICHMENT_URL") {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    name: "ENRICHMENT_URL",
                    value: url,
                    reason: "expected an http(s) URL".into(),
                });
            }
            config.enrichment_url = url;
        }

        Ok(config)
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".into(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// The wired data layer.
pub struct RecruitApp {
    pub jobs: JobsApi<JobRepository>,
    pub applications: ApplicationsApi<ApplicationRepository>,
    pub lifecycle: JobLifecycle<JobRepository>,
    pub realtime: RealtimeInvalidator<LiveFeed>,
    cache: SharedCache,
    supervisor: SupervisorHandle,
    supervisor_task: JoinHandle<()>,
}

impl RecruitApp {
    /// Connect the store, restore the cache and start background services.
    ///
    /// This should be called once at startup.
    pub async fn start(config: AppConfig) -> Result<Self, InitError> {
        tracing::info!("Initializing recruitment data layer...");

        let db = db::init(&config.db).await?;

        let medium: Arc<dyn SnapshotMedium> = match &config.cache_dir {
            Some(dir) => Arc::new(FileMedium::with_capacity(dir, config.cache_quota_bytes)),
            None => Arc::new(MemoryMedium::with_capacity(config.cache_quota_bytes)),
        };
        let cache: SharedCache = Arc::new(
            EntityCache::new(CacheConfig::default().with_default_ttl(config.cache_ttl))
                .with_medium(medium),
        );
        cache.restore();

        let feed = Arc::new(LiveFeed::start(&db).await?);

        let job_store = Arc::new(JobRepository::new(db.clone()));
        let application_store = Arc::new(ApplicationRepository::new(db));

        let enricher = Arc::new(HttpEnricher::new(config.enrichment_url.clone()));
        let task = Arc::new(EnrichJob::new(job_store.clone(), enricher, cache.clone()));
        let (supervisor, supervisor_task) = start_supervisor(task).await?;

        let app = Self {
            jobs: JobsApi::new(job_store.clone(), cache.clone()),
            applications: ApplicationsApi::new(application_store, cache.clone()),
            lifecycle: JobLifecycle::new(job_store, cache.clone(), supervisor.clone()),
            realtime: RealtimeInvalidator::new(feed, cache.clone()),
            cache,
            supervisor,
            supervisor_task,
        };

        tracing::info!("Recruitment data layer initialized");
        Ok(app)
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Stop the supervisor and write the cache snapshot.
    pub async fn shutdown(self) {
        self.supervisor.shutdown();
        if let Err(e) = self.supervisor_task.await {
            tracing::warn!("Enrichment supervisor ended abnormally: {}", e);
        }

        self.cache.persist();
    }
}
