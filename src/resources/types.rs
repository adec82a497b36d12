//! Type definitions for flagged resources
//!
//! Contains the records scanners hand to the estimator and the costed copies
//! the estimator hands back. Field names match the scanner JSON (`type`, `id`,
//! `size_gb`, ...); anything a scanner adds beyond the known attributes is kept
//! in `extra` and passed through untouched.

use crate::region::resolve_region;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Kind of a flagged resource
///
/// Open-ended: kinds the estimator has no formula for are kept as `Other`
/// and costed at zero rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Ebs,
    Ec2,
    Elb,
    RdsCluster,
    RdsInstance,
    /// Emitted by older scanners that did not split clusters from instances
    Rds,
    Other(String),
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Ebs => "EBS",
            ResourceKind::Ec2 => "EC2",
            ResourceKind::Elb => "ELB",
            ResourceKind::RdsCluster => "RDS_CLUSTER",
            ResourceKind::RdsInstance => "RDS_INSTANCE",
            ResourceKind::Rds => "RDS",
            ResourceKind::Other(s) => s,
        }
    }

    pub fn is_rds(&self) -> bool {
        matches!(
            self,
            ResourceKind::Rds | ResourceKind::RdsCluster | ResourceKind::RdsInstance
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ResourceKind::Other(_))
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        match s {
            "EBS" => ResourceKind::Ebs,
            "EC2" => ResourceKind::Ec2,
            "ELB" => ResourceKind::Elb,
            "RDS_CLUSTER" => ResourceKind::RdsCluster,
            "RDS_INSTANCE" => ResourceKind::RdsInstance,
            "RDS" => ResourceKind::Rds,
            other => ResourceKind::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceKind {
    fn from(s: String) -> Self {
        match ResourceKind::from(s.as_str()) {
            ResourceKind::Other(_) => ResourceKind::Other(s),
            known => known,
        }
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flagged resource as produced by a scanner
///
/// The estimator never mutates these; it produces `AnnotatedResource` copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// EBS volume size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<f64>,
    /// EBS volume type (gp2, gp3, io1, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    /// EC2 instance type (t3.micro, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    pub fn new(kind: impl Into<ResourceKind>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            region: None,
            availability_zone: None,
            size_gb: None,
            volume_type: None,
            instance_type: None,
            tags: HashMap::new(),
            extra: Map::new(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_availability_zone(mut self, az: impl Into<String>) -> Self {
        self.availability_zone = Some(az.into());
        self
    }

    pub fn with_size_gb(mut self, size_gb: f64) -> Self {
        self.size_gb = Some(size_gb);
        self
    }

    pub fn with_volume_type(mut self, volume_type: impl Into<String>) -> Self {
        self.volume_type = Some(volume_type.into());
        self
    }

    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = Some(instance_type.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Identity used for deduplication
    pub fn identity(&self) -> (&ResourceKind, &str) {
        (&self.kind, &self.id)
    }

    /// Region of the resource: the explicit `region`, else derived from the zone
    pub fn effective_region(&self) -> Option<String> {
        match self.region.as_deref() {
            Some(r) if !r.is_empty() => Some(r.to_string()),
            _ => resolve_region(self.availability_zone.as_deref()),
        }
    }

    /// Pricing variant for kinds whose price depends on a sub-type
    pub fn variant(&self) -> Option<&str> {
        match self.kind {
            ResourceKind::Ebs => self.volume_type.as_deref(),
            ResourceKind::Ec2 => self.instance_type.as_deref(),
            _ => None,
        }
    }
}

/// A resource plus its estimated monthly cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedResource {
    #[serde(flatten)]
    pub resource: Resource,
    /// Monthly cost in USD, rounded to cents
    pub monthly_cost: f64,
}
