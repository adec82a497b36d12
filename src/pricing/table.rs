//! Static pricing table
//!
//! The table is resolved from, in priority order: inline JSON (`PRICING_JSON`),
//! a JSON file (`PRICING_FILE`, only if it exists), or the built-in snapshot.
//! Keys missing from an override keep their built-in values.
//!
//! ```json
//! {"EBS": 0.10, "EC2": {"t3.micro": 8.50}, "ELB": 18.00, "RDS": 120.00}
//! ```

use crate::config::PricingConfig;
use crate::error::{ConfigError, Result};
use crate::pricing::UnitPrice;
use crate::resources::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Monthly price for EC2 instance types missing from the table
pub const DEFAULT_EC2_MONTHLY: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingTable {
    /// USD per GB-month
    #[serde(rename = "EBS")]
    pub ebs_gb_month: f64,
    /// USD per month by instance type
    #[serde(rename = "EC2")]
    pub ec2_monthly: HashMap<String, f64>,
    /// USD per month for instance types not in `ec2_monthly`
    #[serde(rename = "EC2_DEFAULT")]
    pub ec2_default_monthly: f64,
    /// USD per load balancer-month
    #[serde(rename = "ELB")]
    pub elb_monthly: f64,
    /// USD per stopped database-month
    #[serde(rename = "RDS")]
    pub rds_monthly: f64,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            ebs_gb_month: 0.10, // gp3 approx
            ec2_monthly: HashMap::from([
                ("t3.micro".to_string(), 8.50),
                ("t3.small".to_string(), 17.00),
                ("t3.medium".to_string(), 34.00),
            ]),
            ec2_default_monthly: DEFAULT_EC2_MONTHLY,
            elb_monthly: 18.00,
            rds_monthly: 120.00,
        }
    }
}

/// Where the active table came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOrigin {
    Inline,
    File(String),
    BuiltIn,
}

impl PricingTable {
    /// Resolve the table from the override chain
    pub fn load(inline: Option<&str>, file: Option<&Path>) -> Result<(Self, TableOrigin)> {
        if let Some(json) = inline.filter(|s| !s.trim().is_empty()) {
            let table = Self::from_json(json, "PRICING_JSON")?;
            debug!("Using inline pricing table");
            return Ok((table, TableOrigin::Inline));
        }

        if let Some(path) = file {
            if path.exists() {
                let content =
                    std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                let table = Self::from_json(&content, &path.display().to_string())?;
                debug!("Using pricing table from {}", path.display());
                return Ok((table, TableOrigin::File(path.display().to_string())));
            }
            warn!(
                "Pricing file {} does not exist; using built-in pricing",
                path.display()
            );
        }

        Ok((Self::default(), TableOrigin::BuiltIn))
    }

    pub fn from_config(config: &PricingConfig) -> Result<(Self, TableOrigin)> {
        Self::load(config.json.as_deref(), config.file.as_deref())
    }

    pub fn from_json(json: &str, origin: &str) -> Result<Self> {
        let table: PricingTable =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;
        table.validate(origin)?;
        Ok(table)
    }

    fn validate(&self, origin: &str) -> Result<()> {
        let flat = [
            ("EBS", self.ebs_gb_month),
            ("EC2_DEFAULT", self.ec2_default_monthly),
            ("ELB", self.elb_monthly),
            ("RDS", self.rds_monthly),
        ];
        let variants = self
            .ec2_monthly
            .iter()
            .map(|(k, v)| (k.as_str(), *v));

        for (name, price) in flat.into_iter().chain(variants) {
            if !price.is_finite() || price < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("{} ({})", name, origin),
                    reason: format!("price must be a non-negative number, got {}", price),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Static unit price for a kind, `None` when the kind has no formula
    ///
    /// The EBS rate ignores the volume type. EC2 types missing from the table
    /// get `ec2_default_monthly`.
    pub fn price_for(&self, kind: &ResourceKind, variant: Option<&str>) -> Option<UnitPrice> {
        match kind {
            ResourceKind::Ebs => Some(UnitPrice::PerGbMonth(self.ebs_gb_month)),
            ResourceKind::Ec2 => Some(UnitPrice::Monthly(
                variant
                    .and_then(|v| self.ec2_monthly.get(v).copied())
                    .unwrap_or(self.ec2_default_monthly),
            )),
            ResourceKind::Elb => Some(UnitPrice::Monthly(self.elb_monthly)),
            _ if kind.is_rds() => Some(UnitPrice::Monthly(self.rds_monthly)),
            _ => None,
        }
    }
}
