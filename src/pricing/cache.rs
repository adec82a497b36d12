//! Price cache with TTL and size bounds
//!
//! Only successful live lookups are stored. Maintenance is lazy: the resolver
//! calls `cleanup` right before each lookup instead of running a timer.

use crate::config::{DEFAULT_CACHE_MAX_SIZE, DEFAULT_CACHE_TTL_SECS};
use crate::pricing::PriceKey;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::debug;

/// A cached live price
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCacheEntry {
    pub price: f64,
    pub captured_at: DateTime<Utc>,
    /// Insertion sequence, breaks `captured_at` ties during eviction
    seq: u64,
}

#[derive(Debug)]
pub struct PriceCache {
    entries: HashMap<PriceKey, PriceCacheEntry>,
    ttl: Duration,
    max_size: usize,
    next_seq: u64,
}

impl PriceCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_size,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if an entry exists for `key`, expired or not
    pub fn contains(&self, key: &PriceKey) -> bool {
        self.entries.contains_key(key)
    }

    fn is_expired(&self, entry: &PriceCacheEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.captured_at) >= self.ttl
    }

    /// Cached price for `key`; expired entries are a miss
    pub fn get(&self, key: &PriceKey, now: DateTime<Utc>) -> Option<f64> {
        self.entries
            .get(key)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.price)
    }

    pub fn put(&mut self, key: PriceKey, price: f64, now: DateTime<Utc>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            PriceCacheEntry {
                price,
                captured_at: now,
                seq,
            },
        );
    }

    /// Drop expired entries, returning how many were removed
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.signed_duration_since(entry.captured_at) < ttl);
        before - self.entries.len()
    }

    /// Evict oldest entries until at most `max_size` remain
    pub fn enforce_capacity(&mut self) -> usize {
        if self.entries.len() <= self.max_size {
            return 0;
        }

        let excess = self.entries.len() - self.max_size;
        let mut by_age: Vec<(DateTime<Utc>, u64, PriceKey)> = self
            .entries
            .iter()
            .map(|(k, e)| (e.captured_at, e.seq, k.clone()))
            .collect();
        by_age.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        for (_, _, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        excess
    }

    /// Expiry pass followed by a capacity pass
    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let expired = self.evict_expired(now);
        let evicted = self.enforce_capacity();
        if expired > 0 || evicted > 0 {
            debug!(
                "Price cache cleanup: {} expired, {} evicted, {} remaining",
                expired,
                evicted,
                self.entries.len()
            );
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(
            Duration::seconds(DEFAULT_CACHE_TTL_SECS as i64),
            DEFAULT_CACHE_MAX_SIZE,
        )
    }
}
