//! Shared collaborators for all searches.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::AggregatorConfig;
use crate::node::NodeClient;
use crate::ordering::{Collator, DefaultCollator};

/// Everything a search needs from its environment.
#[derive(Debug, Clone)]
pub struct SearchContext {
    /// Aggregator configuration.
    pub config: Arc<AggregatorConfig>,
    /// Transport to the nodes.
    pub client: Arc<dyn NodeClient>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Collator for metadata field sorting.
    pub collator: Arc<dyn Collator>,
}

impl SearchContext {
    /// Create a context using the system clock and the default collator.
    pub fn new(config: AggregatorConfig, client: Arc<dyn NodeClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            clock: Arc::new(SystemClock),
            collator: Arc::new(DefaultCollator),
        }
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different collator.
    pub fn with_collator(mut self, collator: Arc<dyn Collator>) -> Self {
        self.collator = collator;
        self
    }
}
