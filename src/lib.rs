//! wastectl library
//!
//! Estimates the monthly cost of idle or unattached cloud resources so they
//! can be prioritized for cleanup.

pub mod config;
pub mod error;
pub mod estimator;
pub mod exit_codes;
pub mod output;
pub mod pricing;
pub mod region;
pub mod resources;

// Re-export commonly used types
pub use estimator::{CostEstimator, EstimateReport, EstimateWarning};
pub use resources::{AnnotatedResource, Resource, ResourceKind};
