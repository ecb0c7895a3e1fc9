//! Routing-record cache.
//!
//! Keyed by the digit-only form of a phone number. Entries are written after
//! each profile mutation and expire after a fixed TTL. Expired entries are
//! dropped on read of their key and swept on every write. Concurrent writers
//! race and the last one wins.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use cdir_pathfinder::RoutingRecord;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: std::sync::Arc<parking_lot::Mutex<DateTime<Utc>>>,
}

#[cfg(any(test, feature = "test-util"))]

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Arc::new(parking_lot::Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = add_ttl(*now, by);
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Best-effort store of routing records per number.
pub trait RoutingCache: Send + Sync {
    /// Unexpired records for `key`.
    fn get(&self, key: &str) -> Option<Vec<RoutingRecord>>;

    /// Store `records` under `key` for `ttl`, replacing any previous entry.
    fn put(&self, key: &str, records: Vec<RoutingRecord>, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<RoutingRecord>,
    expires_at: DateTime<Utc>,
}

/// In-process [`RoutingCache`].
#[derive(Debug)]
pub struct InMemoryRoutingCache<C: Clock = SystemClock> {
    entries: DashMap<String, CacheEntry>,
    clock: C,
}

impl InMemoryRoutingCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryRoutingCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryRoutingCache<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of stored entries. Expired ones count until the next write or
    /// a read of their key.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Clock> RoutingCache for InMemoryRoutingCache<C> {
    fn get(&self, key: &str) -> Option<Vec<RoutingRecord>> {
        let now = self.clock.now();
        let expired = {
            let entry = self.entries.get(key)?;
            if now < entry.expires_at {
                return Some(entry.records.clone());
            }
            true
        };
        if expired {
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        None
    }

    fn put(&self, key: &str, records: Vec<RoutingRecord>, ttl: Duration) {
        let now = self.clock.now();
        self.entries.retain(|_, e| e.expires_at > now);
        let expires_at = add_ttl(now, ttl);
        self.entries
            .insert(key.to_string(), CacheEntry { records, expires_at });
    }
}

fn add_ttl(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
