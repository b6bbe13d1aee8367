//! Talking to a single search node.
//!
//! [`NodeClient`] is the transport seam: [`HttpNodeClient`] issues real HTTP
//! requests, [`MockNodeClient`] serves scripted results in memory.
//! [`NodeQuery`] drives the paginated, prefetching retrieval of one search's
//! hits from one node, and [`HitCursor`] walks over them.

pub mod client;
pub mod cursor;
pub mod http;
pub mod mock;
pub mod query;

pub use client::{HitsRequest, NodeClient, NodeReply};
pub use cursor::HitCursor;
pub use http::HttpNodeClient;
pub use mock::MockNodeClient;
pub use query::NodeQuery;
