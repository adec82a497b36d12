//! Unit price resolution
//!
//! ## Module Organization
//!
//! - `table`: static fallback pricing table and its override chain
//! - `cache`: TTL and size bounded cache of live lookups
//! - `source`: the `PricingSource` capability the resolver calls for live prices
//! - `aws`: `PricingSource` backed by the AWS Price List API
//! - `resolver`: cache, then live, then static; never fails
//!
//! Prices travel as `UnitPrice` so the unit (per GB-month, hourly, monthly)
//! stays attached to the number until the annotator turns it into a monthly cost.

pub mod aws;
pub mod cache;
pub mod resolver;
pub mod source;
pub mod table;

pub use cache::{PriceCache, PriceCacheEntry};
pub use resolver::{PriceOrigin, PricingResolver, ResolvedPrice};
pub use source::PricingSource;
pub use table::{PricingTable, TableOrigin};

use crate::error::WastectlError;
use crate::resources::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How unit prices are resolved for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    #[default]
    Static,
    Live,
}

impl FromStr for PricingMode {
    type Err = WastectlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(PricingMode::Static),
            "live" => Ok(PricingMode::Live),
            _ => Err(WastectlError::Validation {
                field: "pricing_mode".to_string(),
                reason: format!("expected 'static' or 'live', got '{}'", s),
            }),
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Static => f.write_str("static"),
            PricingMode::Live => f.write_str("live"),
        }
    }
}

/// A price with its billing unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "usd", rename_all = "snake_case")]
pub enum UnitPrice {
    /// Storage price, multiplied by the volume size
    PerGbMonth(f64),
    /// On-demand hourly price, multiplied by `HOURS_PER_MONTH`
    Hourly(f64),
    /// Flat monthly price
    Monthly(f64),
}

/// Cache key for a live lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub kind: ResourceKind,
    pub variant: Option<String>,
    pub region: String,
}

impl PriceKey {
    pub fn new(kind: ResourceKind, variant: Option<&str>, region: impl Into<String>) -> Self {
        Self {
            kind,
            variant: variant.map(str::to_string),
            region: region.into(),
        }
    }
}

impl fmt::Display for PriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.kind,
            self.variant.as_deref().unwrap_or("-"),
            self.region
        )
    }
}
