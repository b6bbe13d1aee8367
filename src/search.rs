//! Distributed hits searches and the cache that keeps them alive between requests.

pub mod context;
pub mod distributed;
pub mod key;
pub mod registry;

pub use context::SearchContext;
pub use distributed::{DistributedSearch, MergePage};
pub use key::{SearchKey, UseCache};
pub use registry::SearchRegistry;
