//! Live pricing capability
//!
//! The resolver only talks to this trait, so tests substitute a double and the
//! AWS-backed implementation is wired in at construction time.

use crate::error::Result;
use crate::pricing::PriceKey;
use async_trait::async_trait;

/// External source of live unit prices
///
/// Prices are returned in the source's native unit: USD per GB-month for EBS,
/// USD per hour for EC2 and ELB. `Ok(None)` means the source has no price for
/// the key. Errors and panics are absorbed by the resolver.
#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Provider name for logs (e.g. "aws")
    fn name(&self) -> &'static str;

    async fn fetch_unit_price(&self, key: &PriceKey) -> Result<Option<f64>>;
}
