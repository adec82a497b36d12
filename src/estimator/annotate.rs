//! Cost annotation
//!
//! Turns a resolved unit price into a monthly cost for one resource. The run
//! total is the rounded sum of the *unrounded* per-resource costs, so it can
//! differ by a cent from the sum of the rounded per-line values.

use crate::error::{Result, WastectlError};
use crate::pricing::UnitPrice;
use crate::resources::{AnnotatedResource, Resource, ResourceKind};

/// Hours used to turn an hourly rate into a monthly one
pub const HOURS_PER_MONTH: f64 = 730.0;

const MONTHLY_COST_KEY: &str = "monthly_cost";

/// Round to cents
///
/// Rounds the exact binary value, so 0.045 (stored just below the half cent)
/// becomes 0.04. Exact ties go to the even cent.
pub fn round_cents(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Fail if the resource lacks an attribute its cost formula depends on
pub fn require_attributes(resource: &Resource) -> Result<()> {
    match resource.kind {
        ResourceKind::Ebs => match resource.size_gb {
            None => Err(missing(resource, "size_gb")),
            Some(size) if !size.is_finite() || size < 0.0 => Err(WastectlError::Validation {
                field: format!("{}.size_gb", resource.id),
                reason: format!("must be a non-negative number, got {}", size),
            }),
            Some(_) => Ok(()),
        },
        ResourceKind::Ec2 if resource.instance_type.as_deref().map_or(true, str::is_empty) => {
            Err(missing(resource, "instance_type"))
        }
        _ => Ok(()),
    }
}

fn missing(resource: &Resource, attribute: &'static str) -> WastectlError {
    WastectlError::MissingAttribute {
        kind: resource.kind.to_string(),
        resource_id: resource.id.clone(),
        attribute,
    }
}

/// Unrounded monthly cost of a resource at a unit price
pub fn raw_monthly_cost(resource: &Resource, price: UnitPrice) -> Result<f64> {
    match price {
        UnitPrice::PerGbMonth(per_gb) => {
            let size_gb = resource.size_gb.ok_or_else(|| missing(resource, "size_gb"))?;
            Ok(size_gb * per_gb)
        }
        UnitPrice::Hourly(hourly) => Ok(hourly * HOURS_PER_MONTH),
        UnitPrice::Monthly(monthly) => Ok(monthly),
    }
}

/// Costed copy of a resource; the input is left untouched
///
/// A `monthly_cost` carried in from an earlier report is dropped so the
/// serialized record holds only the fresh value.
pub fn annotate(resource: &Resource, raw_cost: f64) -> AnnotatedResource {
    let mut resource = resource.clone();
    resource.extra.remove(MONTHLY_COST_KEY);
    AnnotatedResource {
        resource,
        monthly_cost: round_cents(raw_cost),
    }
}

/// Rounded sum of unrounded per-resource costs
pub fn aggregate<I>(raw_costs: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    round_cents(raw_costs.into_iter().sum())
}
