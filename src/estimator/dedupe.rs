//! Resource deduplication
//!
//! Scanners can report the same resource twice (overlapping scans, retries).
//! Identity is `(kind, id)`; the first occurrence wins and order is preserved.

use crate::resources::{Resource, ResourceKind};
use std::collections::HashSet;
use tracing::warn;

/// Result of deduplicating a resource list
#[derive(Debug, Default)]
pub struct Deduped<'a> {
    pub unique: Vec<&'a Resource>,
    pub duplicates: Vec<&'a Resource>,
}

pub fn dedupe(resources: &[Resource]) -> Deduped<'_> {
    let mut seen: HashSet<(&ResourceKind, &str)> = HashSet::with_capacity(resources.len());
    let mut out = Deduped::default();

    for resource in resources {
        if seen.insert(resource.identity()) {
            out.unique.push(resource);
        } else {
            warn!("Dropping duplicate resource {} {}", resource.kind, resource.id);
            out.duplicates.push(resource);
        }
    }

    out
}
