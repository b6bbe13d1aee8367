//! Identity of a distributed search, and cache policy.

use std::str::FromStr;

use crate::error::PhalanxError;

/// Identity of one logical distributed query, used as the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchKey {
    /// Corpus to search.
    pub corpus: String,
    /// Query pattern.
    pub pattern: String,
    /// Hit sort spec.
    pub sort: String,
    /// Group spec.
    pub group: String,
    /// Group to view (the hits of one group of a grouped search).
    pub view_group: String,
}

impl SearchKey {
    /// Create a key for an unsorted, ungrouped search.
    pub fn new<C: Into<String>, P: Into<String>>(corpus: C, pattern: P) -> Self {
        Self {
            corpus: corpus.into(),
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    /// Set the sort spec.
    pub fn with_sort<S: Into<String>>(mut self, sort: S) -> Self {
        self.sort = sort.into();
        self
    }

    /// Set the group spec.
    pub fn with_group<S: Into<String>>(mut self, group: S) -> Self {
        self.group = group.into();
        self
    }

    /// Set the group to view.
    pub fn with_view_group<S: Into<String>>(mut self, view_group: S) -> Self {
        self.view_group = view_group.into();
        self
    }

    /// Is this a grouped request (groups, rather than hits, are returned)?
    pub fn is_grouped(&self) -> bool {
        !self.group.is_empty() && self.view_group.is_empty()
    }
}

/// Whether to use cached results, on the aggregator and/or on the nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UseCache {
    /// Use caches everywhere.
    #[default]
    Yes,
    /// Don't use any cache.
    No,
    /// Use the nodes' caches, but not the aggregator's.
    NodesOnly,
}

impl UseCache {
    /// Parse a `usecache` parameter value. Unknown values mean [`UseCache::Yes`].
    pub fn from_param(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "nodes" => UseCache::NodesOnly,
            "no" | "false" | "0" => UseCache::No,
            _ => UseCache::Yes,
        }
    }

    /// May the aggregator reuse cached searches?
    pub fn on_aggregator(self) -> bool {
        self == UseCache::Yes
    }

    /// May the nodes use their caches?
    pub fn on_nodes(self) -> bool {
        self != UseCache::No
    }
}

impl FromStr for UseCache {
    type Err = PhalanxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(UseCache::from_param(s))
    }
}
