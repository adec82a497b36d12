//! Monthly cost estimation for flagged resources
//!
//! ## Flow
//!
//! raw resources → `dedupe` → for each unique resource, in order:
//! region (explicit or derived from the zone) → `PricingResolver`
//! (cache → live → static) → `annotate` → report with the total.
//!
//! Resources are processed one at a time; there is no fan-out across
//! resources or lookups.
//!
//! ## What Never Aborts a Run
//!
//! Invalid pricing mode, live lookup failures, unknown kinds and duplicates
//! are recovered and reported as `EstimateWarning`s. Only a resource missing an
//! attribute its cost formula needs fails the run.

mod annotate;
mod dedupe;

pub use annotate::{aggregate, annotate, raw_monthly_cost, require_attributes, round_cents, HOURS_PER_MONTH};
pub use dedupe::{dedupe, Deduped};

use crate::config::Config;
use crate::error::Result;
use crate::pricing::aws::AwsPricingSource;
use crate::pricing::{PriceCache, PriceOrigin, PricingMode, PricingResolver, PricingTable};
use crate::resources::{AnnotatedResource, Resource};
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A recovered anomaly recorded during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum EstimateWarning {
    /// Pricing mode was not `static` or `live`; static pricing was used
    InvalidPricingMode { value: String },
    /// A repeated `(kind, id)` was dropped
    DuplicateResource { kind: String, id: String },
    /// Live pricing produced nothing usable; static pricing was used
    LiveLookupFailed {
        kind: String,
        id: String,
        variant: Option<String>,
        region: Option<String>,
    },
    /// No cost formula for this kind; costed at zero
    UnknownKind { kind: String, id: String },
}

/// Outcome of one estimation run
#[derive(Debug, Clone, Serialize)]
pub struct EstimateReport {
    pub pricing_mode: PricingMode,
    pub resources: Vec<AnnotatedResource>,
    /// Rounded sum of unrounded per-resource costs
    pub total: f64,
    pub warnings: Vec<EstimateWarning>,
}

/// Per-invocation state, discarded when the report is returned
struct EstimationRun {
    mode: PricingMode,
    annotated: Vec<AnnotatedResource>,
    raw_costs: Vec<f64>,
    warnings: Vec<EstimateWarning>,
}

impl EstimationRun {
    fn start(raw_mode: &str) -> Self {
        let mut warnings = Vec::new();
        let mode = raw_mode.parse::<PricingMode>().unwrap_or_else(|_| {
            warn!("Invalid pricing mode '{}'; using static pricing", raw_mode);
            warnings.push(EstimateWarning::InvalidPricingMode {
                value: raw_mode.to_string(),
            });
            PricingMode::Static
        });

        Self {
            mode,
            annotated: Vec::new(),
            raw_costs: Vec::new(),
            warnings,
        }
    }

    fn push(&mut self, resource: &Resource, raw_cost: f64) {
        self.annotated.push(annotate(resource, raw_cost));
        self.raw_costs.push(raw_cost);
    }

    fn finish(self) -> EstimateReport {
        EstimateReport {
            pricing_mode: self.mode,
            total: aggregate(self.raw_costs),
            resources: self.annotated,
            warnings: self.warnings,
        }
    }
}

/// The estimation engine
///
/// Construct once and reuse: the resolver's price cache lives as long as the
/// estimator does.
pub struct CostEstimator {
    resolver: PricingResolver,
    pricing_mode: String,
}

impl CostEstimator {
    pub fn new(resolver: PricingResolver, pricing_mode: impl Into<String>) -> Self {
        Self {
            resolver,
            pricing_mode: pricing_mode.into(),
        }
    }

    /// Build from configuration
    ///
    /// Resolves the static table and, when the configured mode is `live`,
    /// constructs the AWS pricing client up front.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let (table, origin) = PricingTable::from_config(&config.pricing)?;
        debug!("Static pricing table: {:?}", origin);

        let cache = PriceCache::new(
            Duration::seconds(config.cache.ttl_secs as i64),
            config.cache.max_size,
        );
        let mut resolver = PricingResolver::new(table, cache);

        if config.pricing.mode.parse::<PricingMode>().ok() == Some(PricingMode::Live) {
            let source = AwsPricingSource::from_config(&config.live).await;
            resolver = resolver.with_source(Arc::new(source));
        }

        Ok(Self::new(resolver, config.pricing.mode.clone()))
    }

    pub fn resolver(&self) -> &PricingResolver {
        &self.resolver
    }

    /// Estimate with the configured pricing mode
    pub async fn estimate(&self, resources: &[Resource]) -> Result<EstimateReport> {
        self.estimate_with_mode(resources, &self.pricing_mode).await
    }

    /// Estimate with an explicit pricing mode, normalized once for the run
    pub async fn estimate_with_mode(
        &self,
        resources: &[Resource],
        pricing_mode: &str,
    ) -> Result<EstimateReport> {
        let mut run = EstimationRun::start(pricing_mode);

        let deduped = dedupe(resources);
        run.warnings
            .extend(deduped.duplicates.iter().map(|r| EstimateWarning::DuplicateResource {
                kind: r.kind.to_string(),
                id: r.id.clone(),
            }));

        for resource in deduped.unique {
            let raw_cost = self.cost_one(resource, &mut run).await?;
            run.push(resource, raw_cost);
        }

        let report = run.finish();
        info!(
            "Estimated {} resources ({} pricing): ${:.2}/month, {} warnings",
            report.resources.len(),
            report.pricing_mode,
            report.total,
            report.warnings.len()
        );
        Ok(report)
    }

    async fn cost_one(&self, resource: &Resource, run: &mut EstimationRun) -> Result<f64> {
        require_attributes(resource)?;

        let region = resource.effective_region();
        let resolved = self
            .resolver
            .resolve_price(&resource.kind, resource.variant(), region.as_deref(), run.mode)
            .await;

        let Some(resolved) = resolved else {
            warn!(
                "Unknown resource kind {} for {}; costing at 0",
                resource.kind, resource.id
            );
            run.warnings.push(EstimateWarning::UnknownKind {
                kind: resource.kind.to_string(),
                id: resource.id.clone(),
            });
            return Ok(0.0);
        };

        if resolved.origin == PriceOrigin::StaticFallback {
            run.warnings.push(EstimateWarning::LiveLookupFailed {
                kind: resource.kind.to_string(),
                id: resource.id.clone(),
                variant: resource.variant().map(str::to_string),
                region,
            });
        }

        raw_monthly_cost(resource, resolved.price)
    }
}
