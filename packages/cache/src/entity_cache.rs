//! Generic key to value store with per-entry expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::medium::{PersistenceError, SnapshotMedium};

/// Default time-to-live for entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

const SNAPSHOT_VERSION: u32 = 1;

/// A cached value and the instant it stops being served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Configuration for cache behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// TTL used by [`EntityCache::set`].
    pub default_ttl: Duration,
    /// Key the snapshot is stored under in the medium.
    pub snapshot_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            snapshot_key: "recruit-cache".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_snapshot_key(mut self, key: impl Into<String>) -> Self {
        self.snapshot_key = key.into();
        self
    }
}

#[derive(Serialize)]
struct SnapshotOut<'a, V> {
    version: u32,
    entries: HashMap<&'a str, &'a CacheEntry<V>>,
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    #[serde(default)]
    entries: serde_json::Map<String, serde_json::Value>,
}

/// Time-expiring key to value store.
///
/// Expired entries are dropped lazily when read; there is no sweeper and no
/// size bound. All methods take `&self` and are safe to call from several
/// tasks. The internal lock is never held across an await point.
pub struct EntityCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    medium: Option<Arc<dyn SnapshotMedium>>,
}

impl<V> EntityCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            clock: Arc::new(SystemClock),
            medium: None,
        }
    }

    /// Use `clock` for expiry decisions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persist snapshots to `medium`.
    pub fn with_medium(mut self, medium: Arc<dyn SnapshotMedium>) -> Self {
        self.medium = Some(medium);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a live value. An expired entry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::debug!("Cache entry {} expired", key);
                None
            }
            None => None,
        }
    }

    /// Get a live entry together with its expiry.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.lock().get(key).is_some_and(|e| !e.is_expired(now))
    }

    /// Store `value` with the default TTL, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Store `value` for `ttl`, replacing any previous entry.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.set_until(key, value, expires_at);
    }

    /// Store `value` until `expires_at`, replacing any previous entry.
    pub fn set_until(&self, key: impl Into<String>, value: V, expires_at: DateTime<Utc>) {
        self.lock()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Remove one entry. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn remove_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of entries that have not expired.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.lock().values().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every live entry to the snapshot medium.
    ///
    /// Returns the number of entries written. Failures are logged and
    /// reported as zero.
    pub fn persist(&self) -> usize {
        let Some(medium) = &self.medium else {
            return 0;
        };

        match self.try_persist(medium.as_ref()) {
            Ok(count) => {
                tracing::info!("Persisted {} cache entries", count);
                count
            }
            Err(e) => {
                tracing::warn!("Cache snapshot not saved: {}", e);
                0
            }
        }
    }

    fn try_persist(&self, medium: &dyn SnapshotMedium) -> Result<usize, PersistenceError> {
        let now = self.clock.now();
        let entries = self.lock();

        let live: HashMap<&str, &CacheEntry<V>> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| (key.as_str(), entry))
            .collect();
        let count = live.len();

        let json = serde_json::to_string(&SnapshotOut {
            version: SNAPSHOT_VERSION,
            entries: live,
        })?;
        drop(entries);

        medium.set_item(&self.config.snapshot_key, &json)?;
        Ok(count)
    }

    /// Load entries from the snapshot medium.
    ///
    /// Entries that fail to parse or have already expired are skipped.
    /// Keys already present in memory are left alone. Returns the number of
    /// entries loaded; any failure yields zero.
    pub fn restore(&self) -> usize {
        let Some(medium) = &self.medium else {
            return 0;
        };

        match self.try_restore(medium.as_ref()) {
            Ok(count) => {
                tracing::info!("Restored {} cache entries", count);
                count
            }
            Err(e) => {
                tracing::warn!("Cache snapshot not loaded: {}", e);
                0
            }
        }
    }

    fn try_restore(&self, medium: &dyn SnapshotMedium) -> Result<usize, PersistenceError> {
        let Some(json) = medium.get_item(&self.config.snapshot_key)? else {
            return Ok(0);
        };

        let snapshot: SnapshotIn = serde_json::from_str(&json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                "Ignoring cache snapshot version {} (expected {})",
                snapshot.version,
                SNAPSHOT_VERSION
            );
            return Ok(0);
        }

        let now = self.clock.now();
        let mut entries = self.lock();
        let mut loaded = 0;

        for (key, raw) in snapshot.entries {
            let entry: CacheEntry<V> = match serde_json::from_value(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Dropping unreadable cache entry {}: {}", key, e);
                    continue;
                }
            };
            if entry.is_expired(now) || entries.contains_key(&key) {
                continue;
            }
            entries.insert(key, entry);
            loaded += 1;
        }

        Ok(loaded)
    }
}
