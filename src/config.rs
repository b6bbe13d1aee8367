//! Configuration for the aggregator.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PhalanxError, Result};

/// Configuration for the aggregator and the searches it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Base URLs of the search nodes. Their order is the enumeration order
    /// used to break ties while merging.
    pub nodes: Vec<String>,

    /// Page size policy for node requests.
    pub paging: PagingConfig,

    /// Start a new merge page once the current one holds this many hits
    /// (and the next hit starts a new document).
    pub merge_page_size: usize,

    /// How old a node's running summary may be before a count request refreshes it.
    pub summary_max_age: Duration,

    /// Search cache settings.
    pub cache: CacheConfig,

    /// Timeout for individual node requests. None waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            paging: PagingConfig::default(),
            merge_page_size: 1000,
            summary_max_age: Duration::from_millis(600),
            cache: CacheConfig::default(),
            request_timeout: None,
        }
    }
}

impl AggregatorConfig {
    /// Create a configuration for the given nodes with default settings.
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Read a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: AggregatorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the paging policy.
    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging;
        self
    }

    /// Set the merge page size.
    pub fn with_merge_page_size(mut self, size: usize) -> Self {
        self.merge_page_size = size;
        self
    }

    /// Set the maximum age of a running summary.
    pub fn with_summary_max_age(mut self, age: Duration) -> Self {
        self.summary_max_age = age;
        self
    }

    /// Set how long an idle search stays cached.
    pub fn with_cache_max_age(mut self, age: Duration) -> Self {
        self.cache.max_age = age;
        self
    }

    /// Set the node request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(PhalanxError::invalid_config("at least one node is required"));
        }
        if let Some(node) = self.nodes.iter().find(|n| n.trim().is_empty()) {
            return Err(PhalanxError::invalid_config(format!(
                "empty node url: {node:?}"
            )));
        }
        if self.merge_page_size == 0 {
            return Err(PhalanxError::invalid_config(
                "merge_page_size must be greater than 0",
            ));
        }
        self.paging.validate()
    }
}

/// Adaptive page size policy for node requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Minimum page size. Very small pages cause too much request overhead.
    pub min_page_size: usize,

    /// Maximum page size. Very large pages make us wait for more than we need.
    pub max_page_size: usize,

    /// Each subsequent page is this much bigger than the last.
    pub growth_factor: f64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            min_page_size: 20,
            max_page_size: 300,
            growth_factor: 1.2,
        }
    }
}

impl PagingConfig {
    /// Clamp a page size to the configured bounds.
    pub fn clamp(&self, size: u64) -> usize {
        let size = usize::try_from(size).unwrap_or(usize::MAX);
        size.clamp(self.min_page_size, self.max_page_size)
    }

    /// Page size to use after a page of `current` hits was received.
    pub fn grow(&self, current: usize) -> usize {
        let grown = (current as f64 * self.growth_factor).round() as usize;
        grown.min(self.max_page_size)
    }

    /// Initial page size for one node, given the number of hits the first
    /// request needs from the whole cluster.
    ///
    /// We guess twice the share each node would contribute if hits were
    /// spread evenly.
    pub fn initial_page_size(&self, total_hits_needed: u64, number_of_nodes: usize) -> usize {
        let nodes = number_of_nodes.max(1) as u64;
        self.clamp(total_hits_needed.saturating_mul(2) / nodes)
    }

    fn validate(&self) -> Result<()> {
        if self.min_page_size == 0 {
            return Err(PhalanxError::invalid_config(
                "min_page_size must be greater than 0",
            ));
        }
        if self.min_page_size > self.max_page_size {
            return Err(PhalanxError::invalid_config(format!(
                "min_page_size ({}) exceeds max_page_size ({})",
                self.min_page_size, self.max_page_size
            )));
        }
        if self.growth_factor < 1.0 {
            return Err(PhalanxError::invalid_config(
                "growth_factor must be at least 1.0",
            ));
        }
        Ok(())
    }
}

/// Search cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Searches not accessed for this long are evicted.
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(5 * 60),
        }
    }
}
