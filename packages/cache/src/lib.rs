//! Time-expiring entity cache with best-effort snapshot persistence.
//!
//! The cache is an explicitly constructed value: build one at startup,
//! share it behind an `Arc`, call [`EntityCache::restore`] once and
//! [`EntityCache::persist`] on shutdown.
//!
//! Persistence never fails loudly. A missing medium, a full quota or a
//! corrupt snapshot degrade to an empty (or partially filled) cache and a
//! warning in the logs.

mod clock;
mod entity_cache;
mod medium;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity_cache::{CacheConfig, CacheEntry, DEFAULT_TTL, EntityCache};
pub use medium::{DEFAULT_QUOTA_BYTES, FileMedium, MemoryMedium, PersistenceError, SnapshotMedium};
