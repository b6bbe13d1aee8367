//! String collation for metadata field sorting.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::model::hit::fold;

/// Locale-aware string comparison.
pub trait Collator: Send + Sync + Debug {
    /// Compare two strings.
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Collates on case- and diacritic-folded text first, then on the raw text
/// so that the order stays total.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCollator;

impl Collator for DefaultCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
    }
}
