//! Flagged resource records
//!
//! Scanners (outside this crate) emit `Resource` records; the estimator turns
//! them into `AnnotatedResource`s. `load_resources` reads a scanner dump.

mod types;

pub use types::{AnnotatedResource, Resource, ResourceKind};

use crate::error::{Result, WastectlError};
use std::io::Read;
use std::path::Path;

/// Read a JSON array of resource records from a file, or stdin when `path` is `None`
pub fn load_resources(path: Option<&Path>) -> Result<Vec<Resource>> {
    let content = match path {
        Some(p) => std::fs::read_to_string(p)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    parse_resources(&content)
}

/// Parse a JSON array of resource records
pub fn parse_resources(content: &str) -> Result<Vec<Resource>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if !value.is_array() {
        return Err(WastectlError::Validation {
            field: "input".to_string(),
            reason: "expected a JSON array of resource records".to_string(),
        });
    }
    Ok(serde_json::from_value(value)?)
}
