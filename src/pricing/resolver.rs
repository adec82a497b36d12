//! Unit price resolution: cache, then live source, then static table
//!
//! `resolve_price` never fails. A live lookup that errors, panics, returns
//! nothing, or cannot be attempted degrades to the static price for that kind
//! and variant, and is never cached.

use crate::pricing::{PriceCache, PriceKey, PricingMode, PricingSource, PricingTable, UnitPrice};
use crate::resources::ResourceKind;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Where a resolved price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrigin {
    Static,
    Cached,
    Live,
    /// Live mode, but the live lookup produced nothing usable
    StaticFallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPrice {
    pub price: UnitPrice,
    pub origin: PriceOrigin,
}

/// Resolves unit prices for resource kinds
///
/// Owns the price cache. The cache sits behind a mutex so one resolver can be
/// shared across concurrent estimations in a process; nothing is shared
/// between processes.
pub struct PricingResolver {
    table: PricingTable,
    cache: Mutex<PriceCache>,
    source: Option<Arc<dyn PricingSource>>,
}

impl PricingResolver {
    pub fn new(table: PricingTable, cache: PriceCache) -> Self {
        Self {
            table,
            cache: Mutex::new(cache),
            source: None,
        }
    }

    /// Attach the live pricing source used in live mode
    pub fn with_source(mut self, source: Arc<dyn PricingSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn has_live_source(&self) -> bool {
        self.source.is_some()
    }

    /// Static price for a kind, `None` for unknown kinds
    pub fn static_price(&self, kind: &ResourceKind, variant: Option<&str>) -> Option<ResolvedPrice> {
        self.table.price_for(kind, variant).map(|price| ResolvedPrice {
            price,
            origin: PriceOrigin::Static,
        })
    }

    pub async fn resolve_price(
        &self,
        kind: &ResourceKind,
        variant: Option<&str>,
        region: Option<&str>,
        mode: PricingMode,
    ) -> Option<ResolvedPrice> {
        self.resolve_price_at(kind, variant, region, mode, Utc::now())
            .await
    }

    /// [`PricingResolver::resolve_price`] with an explicit clock
    pub async fn resolve_price_at(
        &self,
        kind: &ResourceKind,
        variant: Option<&str>,
        region: Option<&str>,
        mode: PricingMode,
        now: DateTime<Utc>,
    ) -> Option<ResolvedPrice> {
        let static_price = self.static_price(kind, variant)?;

        if mode == PricingMode::Static || !supports_live(kind) {
            return Some(static_price);
        }

        let Some(region) = region.filter(|r| !r.is_empty()) else {
            warn!(
                "No region for {} {}; using static pricing",
                kind,
                variant.unwrap_or("-")
            );
            return Some(fallback(static_price));
        };

        let key = PriceKey::new(kind.clone(), variant, region);
        let live = self.live_unit_price(&key, now).await;

        Some(
            live.map(|(price, origin)| ResolvedPrice {
                price: live_unit(kind, price),
                origin,
            })
            .unwrap_or_else(|| fallback(static_price)),
        )
    }

    /// Cached or freshly fetched live price, `None` on any failure
    async fn live_unit_price(&self, key: &PriceKey, now: DateTime<Utc>) -> Option<(f64, PriceOrigin)> {
        {
            let mut cache = self.cache.lock().await;
            cache.cleanup(now);
            if let Some(price) = cache.get(key, now) {
                debug!("Price cache hit for {}", key);
                return Some((price, PriceOrigin::Cached));
            }
        }

        let price = self.fetch_guarded(key).await?;
        self.cache.lock().await.put(key.clone(), price, now);
        Some((price, PriceOrigin::Live))
    }

    /// Call the live source, turning errors, panics and bad values into `None`
    async fn fetch_guarded(&self, key: &PriceKey) -> Option<f64> {
        let Some(source) = self.source.as_ref() else {
            warn!("Live pricing requested but no pricing source configured; using static pricing for {}", key);
            return None;
        };

        let outcome = AssertUnwindSafe(source.fetch_unit_price(key))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(Some(price))) if price.is_finite() && price >= 0.0 => Some(price),
            Ok(Ok(Some(price))) => {
                warn!("{} returned unusable price {} for {}; using static pricing", source.name(), price, key);
                None
            }
            Ok(Ok(None)) => {
                warn!("{} has no price for {}; using static pricing", source.name(), key);
                None
            }
            Ok(Err(e)) => {
                warn!("{} lookup failed for {}: {}; using static pricing", source.name(), key, e);
                None
            }
            Err(_) => {
                warn!("{} lookup panicked for {}; using static pricing", source.name(), key);
                None
            }
        }
    }

    /// True if a live price for `key` is currently cached (expired or not)
    pub async fn is_cached(&self, key: &PriceKey) -> bool {
        self.cache.lock().await.contains(key)
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Drop every cached price
    pub async fn reset_cache(&self) {
        self.cache.lock().await.clear();
    }
}

/// RDS and unknown kinds are always priced statically
fn supports_live(kind: &ResourceKind) -> bool {
    kind.is_known() && !kind.is_rds()
}

/// Unit of a live price: EBS is quoted per GB-month, EC2 and ELB per hour
fn live_unit(kind: &ResourceKind, price: f64) -> UnitPrice {
    match kind {
        ResourceKind::Ebs => UnitPrice::PerGbMonth(price),
        _ => UnitPrice::Hourly(price),
    }
}

fn fallback(static_price: ResolvedPrice) -> ResolvedPrice {
    ResolvedPrice {
        origin: PriceOrigin::StaticFallback,
        ..static_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, WastectlError};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed answer and counts calls
    struct FixedSource {
        answer: Option<f64>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn price(p: f64) -> Self {
            Self { answer: Some(p), fail: false, calls: AtomicUsize::new(0) }
        }

        fn empty() -> Self {
            Self { answer: None, fail: false, calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { answer: None, fail: true, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl PricingSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_unit_price(&self, _key: &PriceKey) -> Result<Option<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WastectlError::PricingSource {
                    provider: "fixed".to_string(),
                    message: "throttled".to_string(),
                    source: None,
                });
            }
            Ok(self.answer)
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl PricingSource for PanickingSource {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn fetch_unit_price(&self, _key: &PriceKey) -> Result<Option<f64>> {
            panic!("price list document shape changed");
        }
    }

    fn resolver_with(source: Arc<dyn PricingSource>) -> PricingResolver {
        PricingResolver::new(PricingTable::default(), PriceCache::default()).with_source(source)
    }

    #[tokio::test]
    async fn test_static_mode_ignores_source() {
        let source = Arc::new(FixedSource::price(0.5));
        let resolver = resolver_with(source.clone());

        let resolved = resolver
            .resolve_price(&ResourceKind::Ec2, Some("t3.micro"), Some("us-east-1"), PricingMode::Static)
            .await
            .unwrap();
        assert_eq!(resolved.price, UnitPrice::Monthly(8.5));
        assert_eq!(resolved.origin, PriceOrigin::Static);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_hit_is_cached_and_reused() {
        let source = Arc::new(FixedSource::price(0.0104));
        let resolver = resolver_with(source.clone());
        let t0 = Utc::now();

        let first = resolver
            .resolve_price_at(&ResourceKind::Ec2, Some("t3.micro"), Some("us-east-1"), PricingMode::Live, t0)
            .await
            .unwrap();
        assert_eq!(first.price, UnitPrice::Hourly(0.0104));
        assert_eq!(first.origin, PriceOrigin::Live);

        let second = resolver
            .resolve_price_at(
                &ResourceKind::Ec2,
                Some("t3.micro"),
                Some("us-east-1"),
                PricingMode::Live,
                t0 + Duration::seconds(60),
            )
            .await
            .unwrap();
        assert_eq!(second.origin, PriceOrigin::Cached);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let source = Arc::new(FixedSource::price(0.02));
        let resolver = PricingResolver::new(
            PricingTable::default(),
            PriceCache::new(Duration::seconds(1), 10),
        )
        .with_source(source.clone());
        let t0 = Utc::now();

        for offset_ms in [0, 1100] {
            resolver
                .resolve_price_at(
                    &ResourceKind::Elb,
                    None,
                    Some("us-east-1"),
                    PricingMode::Live,
                    t0 + Duration::milliseconds(offset_ms),
                )
                .await;
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_result_falls_back_and_is_not_cached() {
        let resolver = resolver_with(Arc::new(FixedSource::empty()));

        let resolved = resolver
            .resolve_price(&ResourceKind::Ec2, Some("t3.micro"), Some("us-east-1"), PricingMode::Live)
            .await
            .unwrap();
        assert_eq!(resolved.price, UnitPrice::Monthly(8.5));
        assert_eq!(resolved.origin, PriceOrigin::StaticFallback);

        let key = PriceKey::new(ResourceKind::Ec2, Some("t3.micro"), "us-east-1");
        assert!(!resolver.is_cached(&key).await);
    }

    #[tokio::test]
    async fn test_error_and_panic_fall_back() {
        for source in [
            Arc::new(FixedSource::failing()) as Arc<dyn PricingSource>,
            Arc::new(PanickingSource) as Arc<dyn PricingSource>,
        ] {
            let resolver = resolver_with(source);
            let resolved = resolver
                .resolve_price(&ResourceKind::Ebs, Some("gp3"), Some("us-east-1"), PricingMode::Live)
                .await
                .unwrap();
            assert_eq!(resolved.price, UnitPrice::PerGbMonth(0.10));
            assert_eq!(resolved.origin, PriceOrigin::StaticFallback);
            assert_eq!(resolver.cache_len().await, 0);
        }
    }

    #[tokio::test]
    async fn test_negative_live_price_rejected() {
        let resolver = resolver_with(Arc::new(FixedSource::price(-1.0)));
        let resolved = resolver
            .resolve_price(&ResourceKind::Elb, None, Some("us-east-1"), PricingMode::Live)
            .await
            .unwrap();
        assert_eq!(resolved.origin, PriceOrigin::StaticFallback);
        assert_eq!(resolver.cache_len().await, 0);
    }

    #[tokio::test]
    async fn test_rds_never_goes_live() {
        let source = Arc::new(FixedSource::price(1.0));
        let resolver = resolver_with(source.clone());
        let resolved = resolver
            .resolve_price(&ResourceKind::RdsCluster, None, Some("us-east-1"), PricingMode::Live)
            .await
            .unwrap();
        assert_eq!(resolved.price, UnitPrice::Monthly(120.0));
        assert_eq!(resolved.origin, PriceOrigin::Static);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_without_region_or_source_falls_back() {
        let resolver = resolver_with(Arc::new(FixedSource::price(1.0)));
        let resolved = resolver
            .resolve_price(&ResourceKind::Elb, None, None, PricingMode::Live)
            .await
            .unwrap();
        assert_eq!(resolved.origin, PriceOrigin::StaticFallback);

        let no_source = PricingResolver::new(PricingTable::default(), PriceCache::default());
        let resolved = no_source
            .resolve_price(&ResourceKind::Elb, None, Some("us-east-1"), PricingMode::Live)
            .await
            .unwrap();
        assert_eq!(resolved.price, UnitPrice::Monthly(18.0));
        assert_eq!(resolved.origin, PriceOrigin::StaticFallback);
    }

    #[tokio::test]
    async fn test_unknown_kind_has_no_price() {
        let resolver = resolver_with(Arc::new(FixedSource::price(1.0)));
        let resolved = resolver
            .resolve_price(&ResourceKind::Other("FOO".into()), None, Some("us-east-1"), PricingMode::Live)
            .await;
        assert!(resolved.is_none());
    }
}
