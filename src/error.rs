//! Error types for wastectl
//!
//! This module defines the error handling strategy for wastectl. There are two
//! error types: `WastectlError` (main error enum) and `ConfigError` (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `WastectlError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling. The conversion
//! happens at the CLI boundary, where `exit_codes::exit_code_for_error` picks the
//! process exit status.
//!
//! ## Recovered vs Fatal
//!
//! Most anomalies an estimation run meets are recovered in place and reported as
//! `EstimateWarning`s (see `estimator::EstimateWarning`), not as errors:
//!
//! - invalid pricing mode: normalized to static
//! - live lookup failure: static fallback, never cached
//! - unknown resource kind: zero cost, resource still emitted
//! - malformed availability zone: passed through as the region
//!
//! Only the following abort a run or a command:
//!
//! - `MissingAttribute`: a resource lacks the attribute its cost formula needs
//!   (e.g. an EBS volume without `size_gb`). No correct cost exists, so this is
//!   never replaced with zero.
//! - `Config`: a pricing override or config file that cannot be parsed, or
//!   limits that make no sense (zero TTL, zero cache size).
//! - `Validation`/`Io`/`Json`: bad CLI input.
//!
//! `PricingSource` is produced by `PricingSource` implementations and is always
//! absorbed by the resolver; it never escapes `CostEstimator::estimate`.

use thiserror::Error;

/// Main error type for wastectl
#[derive(Error, Debug)]
pub enum WastectlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required attribute: {kind} {resource_id} has no '{attribute}'")]
    MissingAttribute {
        kind: String,
        resource_id: String,
        attribute: &'static str,
    },

    #[error("Pricing source error: {provider} - {message}")]
    PricingSource {
        provider: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse {origin}: {reason}")]
    ParseError { origin: String, reason: String },

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WastectlError>;

impl WastectlError {
    /// Build a `PricingSource` error from any source error
    pub fn pricing_source<E>(provider: &str, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WastectlError::PricingSource {
            provider: provider.to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
