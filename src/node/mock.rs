//! In-memory node client for testing the aggregator without a cluster.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{PhalanxError, Result};
use crate::model::{DocInfo, ErrorResponse, Hit, HitGroup, HitsResults, SearchSummary};
use crate::node::client::{HitsRequest, NodeClient, NodeReply};

/// Scripted contents of one mock node.
#[derive(Debug, Clone, Default)]
struct MockNode {
    hits: Vec<Hit>,
    doc_infos: HashMap<String, DocInfo>,
    groups: Vec<HitGroup>,
    failure: Option<(u16, ErrorResponse)>,
    still_counting: bool,
}

/// A [`NodeClient`] serving fixed hit lists per node URL.
///
/// Every request is recorded so tests can check how many pages were fetched.
/// Requests to an unknown node fail as if the connection was refused.
#[derive(Debug, Default)]
pub struct MockNodeClient {
    nodes: Mutex<HashMap<String, MockNode>>,
    requests: Mutex<Vec<HitsRequest>>,
    latency: Mutex<Duration>,
}

impl MockNodeClient {
    /// Create a client without nodes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the given hits, in the order the node returns them.
    pub fn with_hits<S: Into<String>>(self, node_url: S, hits: Vec<Hit>) -> Self {
        self.nodes.lock().entry(node_url.into()).or_default().hits = hits;
        self
    }

    /// Add document metadata on a node.
    pub fn with_doc_info<S: Into<String>>(self, node_url: S, info: DocInfo) -> Self {
        self.nodes
            .lock()
            .entry(node_url.into())
            .or_default()
            .doc_infos
            .insert(info.pid.clone(), info);
        self
    }

    /// Set the groups a node returns for grouped requests.
    pub fn with_groups<S: Into<String>>(self, node_url: S, groups: Vec<HitGroup>) -> Self {
        self.nodes.lock().entry(node_url.into()).or_default().groups = groups;
        self
    }

    /// Make a node report that it is still counting.
    pub fn with_still_counting<S: Into<String>>(self, node_url: S) -> Self {
        self.nodes.lock().entry(node_url.into()).or_default().still_counting = true;
        self
    }

    /// Delay every reply by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock() = latency;
        self
    }

    /// Make a node answer every request with an error.
    pub fn with_error<S, C, M>(self, node_url: S, status: u16, code: C, message: M) -> Self
    where
        S: Into<String>,
        C: Into<String>,
        M: Into<String>,
    {
        self.set_error(node_url, status, code, message);
        self
    }

    /// Make a node answer every request with an error from now on.
    pub fn set_error<S, C, M>(&self, node_url: S, status: u16, code: C, message: M)
    where
        S: Into<String>,
        C: Into<String>,
        M: Into<String>,
    {
        self.nodes.lock().entry(node_url.into()).or_default().failure =
            Some((status, ErrorResponse::new(code, message)));
    }

    /// Let a failing node answer normally again.
    pub fn clear_error(&self, node_url: &str) {
        if let Some(node) = self.nodes.lock().get_mut(node_url) {
            node.failure = None;
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<HitsRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests for a non-empty window of hits sent to a node.
    pub fn page_requests(&self, node_url: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.node_url == node_url && r.number > 0)
            .count()
    }

    fn hits_page(node: &MockNode, request: &HitsRequest) -> HitsResults {
        let total = node.hits.len();
        let first = usize::try_from(request.first).unwrap_or(usize::MAX).min(total);
        let number = usize::try_from(request.number).unwrap_or(usize::MAX);
        let end = first.saturating_add(number).min(total);
        let hits = node.hits[first..end].to_vec();

        let mut seen = HashSet::new();
        let doc_infos = hits
            .iter()
            .filter(|h| seen.insert(h.doc_pid.clone()))
            .map(|h| {
                node.doc_infos
                    .get(&h.doc_pid)
                    .cloned()
                    .unwrap_or_else(|| DocInfo::new(h.doc_pid.clone()))
            })
            .collect();

        let docs: HashSet<&str> = node.hits.iter().map(|h| h.doc_pid.as_str()).collect();
        let mut summary = SearchSummary {
            number_of_hits: total as i64,
            number_of_hits_retrieved: total as i64,
            number_of_docs: docs.len() as i64,
            number_of_docs_retrieved: docs.len() as i64,
            still_counting: node.still_counting,
            ..Default::default()
        };
        summary.set_window(
            first as u64,
            request.number,
            (end - first) as u64,
            end < total,
        );
        HitsResults::with_hits(summary, hits, doc_infos)
    }

    fn groups_page(node: &MockNode) -> HitsResults {
        let summary = SearchSummary {
            number_of_hits: node.groups.iter().map(|g| g.size).sum(),
            number_of_groups: Some(node.groups.len() as i64),
            ..Default::default()
        };
        HitsResults::with_groups(summary, node.groups.clone())
    }
}

#[async_trait]
impl NodeClient for MockNodeClient {
    async fn fetch_hits(&self, request: HitsRequest) -> Result<NodeReply> {
        self.requests.lock().push(request.clone());

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let nodes = self.nodes.lock();
        let node = nodes
            .get(&request.node_url)
            .ok_or_else(|| PhalanxError::transport(format!("connection refused: {}", request.node_url)))?;

        if let Some((status, error)) = &node.failure {
            return Ok(NodeReply::Error {
                status: *status,
                error: error.clone(),
            });
        }

        let grouped = !request.group.is_empty() && request.view_group.is_empty();
        let results = if grouped {
            Self::groups_page(node)
        } else {
            Self::hits_page(node, &request)
        };
        Ok(NodeReply::Page(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchKey;

    #[tokio::test]
    async fn test_pages_and_request_log() {
        let client = MockNodeClient::new().with_hits(
            "http://a",
            (0..5).map(|i| Hit::new(format!("d{}", i / 2), i, i + 1)).collect(),
        );
        let key = SearchKey::new("c", "p");

        let reply = client
            .fetch_hits(HitsRequest::for_key("http://a", &key, 3, 10, true))
            .await
            .unwrap();
        let NodeReply::Page(page) = reply else {
            panic!("expected a page");
        };
        assert_eq!(page.hits.as_ref().map(Vec::len), Some(2));
        assert!(!page.summary.window_has_next);
        assert_eq!(page.summary.number_of_hits, 5);
        assert_eq!(page.doc_infos.as_ref().map(Vec::len), Some(2));

        assert_eq!(client.page_requests("http://a"), 1);
        assert!(client.fetch_hits(HitsRequest::for_key("http://b", &key, 0, 1, true)).await.is_err());
        assert_eq!(client.request_count(), 2);
    }
}
