//! Sorting merged hit groups.

use std::cmp::Ordering;

use crate::error::{PhalanxError, Result};
use crate::model::HitGroup;
use crate::ordering::collator::{Collator, DefaultCollator};

/// What to sort groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKey {
    /// Number of hits, largest first.
    Size,
    /// Identity, alphabetically.
    Identity,
    /// Number of documents, largest first.
    NumberOfDocs,
}

/// Order for merged hit groups, parsed from a group sort spec
/// (`size`, `identity` or `numberofdocs`, optionally prefixed with `-`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOrdering {
    key: GroupKey,
    reverse: bool,
}

impl GroupOrdering {
    /// Parse a group sort spec. An empty spec sorts by size.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (reverse, name) = match spec.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        let key = match name.to_ascii_lowercase().as_str() {
            "" | "size" => GroupKey::Size,
            "identity" => GroupKey::Identity,
            "numberofdocs" => GroupKey::NumberOfDocs,
            other => {
                return Err(PhalanxError::invalid_sort(format!(
                    "unknown group sort '{other}'"
                )));
            }
        };
        Ok(Self { key, reverse })
    }

    /// Compare two groups.
    pub fn compare(&self, a: &HitGroup, b: &HitGroup) -> Ordering {
        let ord = match self.key {
            GroupKey::Size => b.size.cmp(&a.size),
            GroupKey::NumberOfDocs => b.number_of_docs.cmp(&a.number_of_docs),
            GroupKey::Identity => DefaultCollator.compare(&a.identity_display, &b.identity_display),
        };
        // Identity breaks ties so the order is stable across requests
        let ord = ord.then_with(|| a.identity.cmp(&b.identity));
        if self.reverse { ord.reverse() } else { ord }
    }

    /// Sort groups in place.
    pub fn sort(&self, groups: &mut [HitGroup]) {
        groups.sort_by(|a, b| self.compare(a, b));
    }
}
