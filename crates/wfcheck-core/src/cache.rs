//! TTL-bound memo of "latest version" lookups.
//!
//! The cache sits in front of a [`VersionSource`]. Today the only source is the
//! static [`KnownActionRegistry`](crate::policy::KnownActionRegistry); a
//! network-backed source can be dropped in behind the same trait without the
//! classifier noticing.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

pub trait VersionSource: Send + Sync {
    fn latest_version(&self, name: &str) -> Option<String>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// VersionCache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub name: String,
    /// `None` records that the source does not know the name.
    pub resolved: Option<String>,
    pub stored_at: DateTime<Utc>,
}

pub struct VersionCache {
    source: Arc<dyn VersionSource>,
    clock: Arc<dyn Clock>,
    ttl_ms: AtomicU64,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl VersionCache {
    pub fn new(source: Arc<dyn VersionSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn VersionSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            ttl_ms: AtomicU64::new(DEFAULT_TTL.as_millis() as u64),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms.load(Ordering::Relaxed))
    }

    pub fn set_ttl(&self, ttl: Duration) {
        let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.ttl_ms.store(ms, Ordering::Relaxed);
    }

    /// Cached value if the entry is younger than the TTL; otherwise resolve
    /// through the source, store, and return.
    pub fn get(&self, name: &str) -> Option<String> {
        let now = self.clock.now();
        let ttl = self.ttl();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = entries.get(name) {
            if is_fresh(entry, now, ttl) {
                tracing::debug!(name, "version cache hit");
                return entry.resolved.clone();
            }
        }

        tracing::debug!(name, "version cache miss");
        let resolved = self.source.latest_version(name);
        entries.insert(
            name.to_string(),
            CacheEntry {
                name: name.to_string(),
                resolved: resolved.clone(),
                stored_at: now,
            },
        );
        resolved
    }

    pub fn entry(&self, name: &str) -> Option<CacheEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

fn is_fresh(entry: &CacheEntry, now: DateTime<Utc>, ttl: Duration) -> bool {
    // A negative age (clock stepped backwards) counts as fresh.
    match now.signed_duration_since(entry.stored_at).to_std() {
        Ok(age) => age <= ttl,
        Err(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
