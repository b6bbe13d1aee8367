//! The per-node hits request and the transport seam.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ErrorResponse, HitsResults};
use crate::search::SearchKey;

/// A hits request to one node:
/// `GET {node}/{corpus}/hits?patt&sort&group&viewgroup&first&number&usecache`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitsRequest {
    /// Base URL of the node.
    pub node_url: String,
    /// Corpus to search.
    pub corpus: String,
    /// Query pattern.
    pub patt: String,
    /// Sort spec.
    pub sort: String,
    /// Group spec.
    pub group: String,
    /// Group to view.
    pub view_group: String,
    /// Index of the first hit (or group) to return.
    pub first: u64,
    /// Number of hits (or groups) to return.
    pub number: u64,
    /// May the node use its cache?
    pub use_cache: bool,
}

impl HitsRequest {
    /// Request a window of the hits for `key` from a node.
    pub fn for_key(node_url: &str, key: &SearchKey, first: u64, number: u64, use_cache: bool) -> Self {
        Self {
            node_url: node_url.to_string(),
            corpus: key.corpus.clone(),
            patt: key.pattern.clone(),
            sort: key.sort.clone(),
            group: key.group.clone(),
            view_group: key.view_group.clone(),
            first,
            number,
            use_cache,
        }
    }

    /// Endpoint URL, without query parameters.
    pub fn url(&self) -> String {
        format!("{}/{}/hits", self.node_url.trim_end_matches('/'), self.corpus)
    }

    /// Query parameters. Empty values are left out, as is `usecache` when it
    /// has its default value.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(8);
        for (name, value) in [
            ("patt", &self.patt),
            ("sort", &self.sort),
            ("group", &self.group),
            ("viewgroup", &self.view_group),
        ] {
            if !value.is_empty() {
                params.push((name, value.clone()));
            }
        }
        params.push(("first", self.first.to_string()));
        params.push(("number", self.number.to_string()));
        if !self.use_cache {
            params.push(("usecache", "false".to_string()));
        }
        params
    }
}

/// What a node answered.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeReply {
    /// Successful response.
    Page(HitsResults),
    /// Non-success status with an error body.
    Error {
        /// HTTP status.
        status: u16,
        /// Error body.
        error: ErrorResponse,
    },
}

/// Issues hits requests to nodes.
///
/// An `Err` means no response was obtained at all (connection failure, bad
/// body); a node that answered with an error status yields
/// [`NodeReply::Error`].
#[async_trait]
pub trait NodeClient: Send + Sync + Debug {
    /// Perform a hits request.
    async fn fetch_hits(&self, request: HitsRequest) -> Result<NodeReply>;
}
