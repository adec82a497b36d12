//! AWS Price List API pricing source
//!
//! Queries `GetProducts` with term-match filters and reads the first on-demand
//! USD price out of the returned price list documents. Retries and timeouts
//! live in the SDK client config (adaptive retry mode); this module never
//! retries on its own.

use crate::config::LiveConfig;
use crate::error::{Result, WastectlError};
use crate::pricing::{PriceKey, PricingSource};
use crate::resources::ResourceKind;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_pricing::config::Region;
use aws_sdk_pricing::types::{Filter, FilterType};
use aws_sdk_pricing::Client as PricingClient;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Region code to the location name the Price List API filters on
const PRICING_REGION_MAP: &[(&str, &str)] = &[
    ("us-east-1", "US East (N. Virginia)"),
    ("us-east-2", "US East (Ohio)"),
    ("us-west-1", "US West (N. California)"),
    ("us-west-2", "US West (Oregon)"),
    ("eu-west-1", "EU (Ireland)"),
    ("eu-west-2", "EU (London)"),
    ("eu-west-3", "EU (Paris)"),
    ("eu-central-1", "EU (Frankfurt)"),
    ("ap-south-1", "Asia Pacific (Mumbai)"),
    ("ap-southeast-1", "Asia Pacific (Singapore)"),
    ("ap-southeast-2", "Asia Pacific (Sydney)"),
    ("ap-northeast-1", "Asia Pacific (Tokyo)"),
    ("ap-northeast-2", "Asia Pacific (Seoul)"),
    ("sa-east-1", "South America (Sao Paulo)"),
    ("ca-central-1", "Canada (Central)"),
];

/// Pricing location for a region; unmapped regions pass through unchanged
pub fn pricing_location(region: &str) -> Option<&str> {
    if region.is_empty() {
        return None;
    }
    Some(
        PRICING_REGION_MAP
            .iter()
            .find(|(code, _)| *code == region)
            .map(|(_, location)| *location)
            .unwrap_or(region),
    )
}

/// EBS volume type to the Price List `volumeType` family
pub fn ebs_volume_family(volume_type: Option<&str>) -> &'static str {
    match volume_type {
        Some("gp2") | Some("gp3") => "General Purpose",
        Some("io1") | Some("io2") => "Provisioned IOPS",
        Some("st1") => "Throughput Optimized HDD",
        Some("sc1") => "Cold HDD",
        Some("standard") => "Magnetic",
        _ => "General Purpose",
    }
}

/// First on-demand USD price found in a list of price list documents
///
/// Documents that are not valid JSON are skipped.
pub fn extract_price_per_unit(price_list: &[String]) -> Option<f64> {
    for item in price_list {
        let data: Value = match serde_json::from_str(item) {
            Ok(v) => v,
            Err(e) => {
                debug!("Skipping unparseable price list item: {}", e);
                continue;
            }
        };

        let Some(terms) = data
            .get("terms")
            .and_then(|t| t.get("OnDemand"))
            .and_then(|t| t.as_object())
        else {
            continue;
        };

        for offer in terms.values() {
            let Some(dimensions) = offer.get("priceDimensions").and_then(|d| d.as_object()) else {
                continue;
            };
            for dim in dimensions.values() {
                let usd = dim.get("pricePerUnit").and_then(|p| p.get("USD"));
                let price = match usd {
                    Some(Value::String(s)) => s.parse::<f64>().ok(),
                    Some(Value::Number(n)) => n.as_f64(),
                    _ => None,
                };
                if price.is_some() {
                    return price;
                }
            }
        }
    }
    None
}

/// Service code and term-match filters for a key, `None` for kinds with no live pricing
fn product_query(key: &PriceKey, location: &str) -> Option<(&'static str, Vec<(&'static str, String)>)> {
    let location = ("location", location.to_string());
    match key.kind {
        ResourceKind::Ec2 => {
            let instance_type = key.variant.clone()?;
            Some((
                "AmazonEC2",
                vec![
                    location,
                    ("instanceType", instance_type),
                    ("operatingSystem", "Linux".to_string()),
                    ("tenancy", "Shared".to_string()),
                    ("preInstalledSw", "NA".to_string()),
                    ("capacitystatus", "Used".to_string()),
                    ("licenseModel", "No License required".to_string()),
                ],
            ))
        }
        ResourceKind::Ebs => Some((
            "AmazonEC2",
            vec![
                location,
                ("productFamily", "Storage".to_string()),
                (
                    "volumeType",
                    ebs_volume_family(key.variant.as_deref()).to_string(),
                ),
            ],
        )),
        ResourceKind::Elb => Some((
            "AWSELB",
            vec![
                location,
                ("productFamily", "Load Balancer".to_string()),
                ("loadBalancerType", "Application".to_string()),
                ("operation", "LoadBalancing:Application".to_string()),
            ],
        )),
        // No live pricing for RDS: it would need instance class metadata
        _ => None,
    }
}

/// Live prices from the AWS Price List API
pub struct AwsPricingSource {
    client: PricingClient,
}

impl AwsPricingSource {
    pub fn new(client: PricingClient) -> Self {
        Self { client }
    }

    /// Build a client with adaptive retries and connect/read timeouts
    pub async fn from_config(live: &LiveConfig) -> Self {
        let retry = RetryConfig::adaptive().with_max_attempts(live.max_attempts);
        let timeout = TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs(live.connect_timeout_secs))
            .read_timeout(Duration::from_secs(live.read_timeout_secs))
            .build();

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(live.pricing_region.clone()))
            .retry_config(retry)
            .timeout_config(timeout)
            .load()
            .await;

        Self::new(PricingClient::new(&sdk_config))
    }
}

#[async_trait]
impl PricingSource for AwsPricingSource {
    fn name(&self) -> &'static str {
        "aws"
    }

    async fn fetch_unit_price(&self, key: &PriceKey) -> Result<Option<f64>> {
        let Some(location) = pricing_location(&key.region) else {
            return Ok(None);
        };
        let Some((service_code, terms)) = product_query(key, location) else {
            return Ok(None);
        };

        let mut filters = Vec::with_capacity(terms.len());
        for (field, value) in terms {
            let filter = Filter::builder()
                .r#type(FilterType::TermMatch)
                .field(field)
                .value(value)
                .build()
                .map_err(|e| WastectlError::pricing_source("aws", "invalid product filter", e))?;
            filters.push(filter);
        }

        debug!("GetProducts {} for {}", service_code, key);
        let response = self
            .client
            .get_products()
            .service_code(service_code)
            .set_filters(Some(filters))
            .max_results(1)
            .send()
            .await
            .map_err(|e| WastectlError::PricingSource {
                provider: "aws".to_string(),
                message: format!("GetProducts failed: {}", e),
                source: None,
            })?;

        Ok(extract_price_per_unit(response.price_list()))
    }
}
