//! Price cache expiry and eviction
//!
//! All tests drive the cache with an explicit clock.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wastectl::error::Result;
use wastectl::pricing::{
    PriceCache, PriceKey, PriceOrigin, PricingMode, PricingResolver, PricingSource, PricingTable,
    UnitPrice,
};
use wastectl::resources::ResourceKind;

fn key(i: usize) -> PriceKey {
    PriceKey::new(
        ResourceKind::Ec2,
        Some(format!("m5.{}xlarge", i).as_str()),
        "us-east-1",
    )
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn test_entry_expires_after_ttl() {
    let mut cache = PriceCache::new(Duration::seconds(1), 10);
    cache.put(key(1), 0.2, t0());

    assert_eq!(cache.get(&key(1), t0() + Duration::milliseconds(500)), Some(0.2));

    let later = t0() + Duration::milliseconds(1100);
    cache.cleanup(later);
    assert!(!cache.contains(&key(1)));
    assert_eq!(cache.get(&key(1), later), None);
}

#[test]
fn test_expiry_boundary_is_inclusive() {
    let mut cache = PriceCache::new(Duration::seconds(60), 10);
    cache.put(key(1), 0.2, t0());

    assert_eq!(cache.get(&key(1), t0() + Duration::seconds(60)), None);
    assert_eq!(cache.evict_expired(t0() + Duration::seconds(60)), 1);
}

#[test]
fn test_capacity_keeps_most_recent() {
    let mut cache = PriceCache::new(Duration::hours(1), 10);
    for i in 0..15 {
        cache.put(key(i), i as f64, t0() + Duration::seconds(i as i64));
    }

    cache.cleanup(t0() + Duration::seconds(20));

    assert_eq!(cache.len(), 10);
    for i in 0..5 {
        assert!(!cache.contains(&key(i)), "entry {} should be evicted", i);
    }
    for i in 5..15 {
        assert!(cache.contains(&key(i)), "entry {} should remain", i);
    }
}

#[test]
fn test_same_timestamp_evicts_in_insertion_order() {
    let mut cache = PriceCache::new(Duration::hours(1), 2);
    for i in 0..4 {
        cache.put(key(i), 1.0, t0());
    }

    assert_eq!(cache.enforce_capacity(), 2);
    assert!(!cache.contains(&key(0)));
    assert!(!cache.contains(&key(1)));
    assert!(cache.contains(&key(2)));
    assert!(cache.contains(&key(3)));
}

#[test]
fn test_expired_removed_before_capacity_pass() {
    let mut cache = PriceCache::new(Duration::seconds(10), 3);
    cache.put(key(0), 1.0, t0());
    cache.put(key(1), 1.0, t0());
    for i in 2..5 {
        cache.put(key(i), 1.0, t0() + Duration::seconds(15));
    }

    cache.cleanup(t0() + Duration::seconds(16));

    assert_eq!(cache.len(), 3);
    assert!(cache.contains(&key(2)));
    assert!(cache.contains(&key(4)));
}

struct CountingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl PricingSource for CountingSource {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn fetch_unit_price(&self, _key: &PriceKey) -> Result<Option<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(0.1))
    }
}

#[tokio::test]
async fn test_resolver_refetches_after_expiry() {
    let source = Arc::new(CountingSource {
        calls: AtomicUsize::new(0),
    });
    let resolver = PricingResolver::new(
        PricingTable::default(),
        PriceCache::new(Duration::seconds(1), 10),
    )
    .with_source(source.clone());
    let kind = ResourceKind::Elb;

    let first = resolver
        .resolve_price_at(&kind, None, Some("us-east-1"), PricingMode::Live, t0())
        .await
        .unwrap();
    let second = resolver
        .resolve_price_at(
            &kind,
            None,
            Some("us-east-1"),
            PricingMode::Live,
            t0() + Duration::milliseconds(500),
        )
        .await
        .unwrap();
    let third = resolver
        .resolve_price_at(
            &kind,
            None,
            Some("us-east-1"),
            PricingMode::Live,
            t0() + Duration::milliseconds(1100),
        )
        .await
        .unwrap();

    assert_eq!(first.origin, PriceOrigin::Live);
    assert_eq!(second.origin, PriceOrigin::Cached);
    assert_eq!(third.origin, PriceOrigin::Live);
    assert_eq!(first.price, UnitPrice::Hourly(0.1));
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reset_cache_forces_refetch() {
    let source = Arc::new(CountingSource {
        calls: AtomicUsize::new(0),
    });
    let resolver = PricingResolver::new(PricingTable::default(), PriceCache::default())
        .with_source(source.clone());
    let kind = ResourceKind::Elb;

    resolver
        .resolve_price_at(&kind, None, Some("us-east-1"), PricingMode::Live, t0())
        .await
        .unwrap();
    assert_eq!(resolver.cache_len().await, 1);

    resolver.reset_cache().await;
    assert_eq!(resolver.cache_len().await, 0);

    let after = resolver
        .resolve_price_at(&kind, None, Some("us-east-1"), PricingMode::Live, t0())
        .await
        .unwrap();
    assert_eq!(after.origin, PriceOrigin::Live);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

proptest! {
    #[test]
    fn test_cleanup_never_exceeds_capacity(count in 0usize..60, max_size in 1usize..20) {
        let mut cache = PriceCache::new(Duration::hours(1), max_size);
        for i in 0..count {
            cache.put(key(i), 1.0, t0() + Duration::seconds(i as i64));
        }

        cache.cleanup(t0() + Duration::seconds(count as i64));

        prop_assert_eq!(cache.len(), count.min(max_size));
        // The newest entry always survives
        if count > 0 {
            prop_assert!(cache.contains(&key(count - 1)));
        }
    }
}
