//! # Phalanx
//!
//! An aggregator that makes a cluster of corpus search nodes look like a
//! single node.
//!
//! ## Features
//!
//! - Merges hit streams from every node into one consistent, pageable list
//! - Sorted merges on hit position, context, document metadata and more
//! - Adaptive, prefetching page requests to each node
//! - Caches running searches between requests
//! - Merges grouped results across nodes
//!
//! ## Example
//!
//! ```no_run
//! use phalanx::aggregator::{Aggregator, HitsQuery};
//! use phalanx::config::AggregatorConfig;
//! use phalanx::search::SearchKey;
//!
//! # async fn run() -> phalanx::error::Result<()> {
//! let config = AggregatorConfig::new(["http://node1:8080/bls", "http://node2:8080/bls"]);
//! let aggregator = Aggregator::new(config)?;
//!
//! let key = SearchKey::new("opensonar", "[lemma=\"cat\"]").with_sort("field:year");
//! let results = aggregator.hits(HitsQuery::new(key, 20)).await?;
//! println!("{} hits", results.summary.number_of_hits);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod aggregator;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod node;
pub mod ordering;
pub mod search;

pub mod prelude {
    pub use crate::aggregator::{Aggregator, HitsQuery};
    pub use crate::config::AggregatorConfig;
    pub use crate::error::{PhalanxError, Result};
    pub use crate::model::{DocInfo, Hit, HitsResults, SearchSummary};
    pub use crate::search::{DistributedSearch, SearchKey, SearchRegistry, UseCache};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
