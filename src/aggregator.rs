//! The aggregator front door: answers hits requests for the whole cluster.

use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, info};

use crate::aggregation::merge_hits_grouped;
use crate::config::AggregatorConfig;
use crate::error::{PhalanxError, Result, translate_node_error};
use crate::model::HitsResults;
use crate::node::{HitsRequest, HttpNodeClient, NodeClient, NodeReply};
use crate::ordering::GroupOrdering;
use crate::search::{SearchContext, SearchKey, SearchRegistry, UseCache};

/// Number of groups requested from each node; effectively "all of them".
pub const MAX_GROUPS_TO_GET: u64 = (i32::MAX - 10) as u64;

/// A hits request to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitsQuery {
    /// What to search for.
    pub key: SearchKey,
    /// First hit (or group) of the window.
    pub first: i64,
    /// Size of the window.
    pub number: i64,
    /// Cache policy.
    pub use_cache: UseCache,
}

impl HitsQuery {
    /// Request the first `number` results for `key`.
    pub fn new(key: SearchKey, number: i64) -> Self {
        Self {
            key,
            first: 0,
            number,
            use_cache: UseCache::Yes,
        }
    }

    /// Start the window at `first`.
    pub fn with_first(mut self, first: i64) -> Self {
        self.first = first;
        self
    }

    /// Set the cache policy.
    pub fn with_use_cache(mut self, use_cache: UseCache) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// Answers hits requests by distributing them over the configured nodes.
#[derive(Debug)]
pub struct Aggregator {
    registry: SearchRegistry,
}

impl Aggregator {
    /// Create an aggregator talking HTTP to the configured nodes.
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpNodeClient::new(&config)?;
        info!("Aggregating {} nodes", config.nodes.len());
        Ok(Self::with_context(SearchContext::new(config, Arc::new(client))))
    }

    /// Create an aggregator with explicit collaborators.
    pub fn with_context(context: SearchContext) -> Self {
        Self {
            registry: SearchRegistry::new(context),
        }
    }

    /// The search cache.
    pub fn registry(&self) -> &SearchRegistry {
        &self.registry
    }

    /// Get a window of hits, or of groups for a grouped request.
    pub async fn hits(&self, query: HitsQuery) -> Result<HitsResults> {
        if query.first < 0 || query.number < 0 {
            return Err(PhalanxError::invalid_argument(format!(
                "Illegal values for window: first={}, number={}",
                query.first, query.number
            )));
        }
        if query.key.is_grouped() {
            return self.grouped_hits(query).await;
        }

        let hint = query.first.saturating_add(query.number) as u64;
        let search = self.registry.get(query.key, query.use_cache, hint)?;
        search.window(query.first, query.number).await
    }

    /// Fetch all groups from every node, merge, sort and window them.
    async fn grouped_hits(&self, query: HitsQuery) -> Result<HitsResults> {
        let context = self.registry.context();
        let mut key = query.key;
        if key.sort.trim().is_empty() {
            key.sort = "size".to_string();
        }
        let ordering = GroupOrdering::parse(&key.sort)?;

        debug!(
            "Grouped request on {} nodes: corpus={}, group={}",
            context.config.nodes.len(),
            key.corpus,
            key.group
        );
        let requests = context.config.nodes.iter().map(|node_url| {
            let request = HitsRequest::for_key(
                node_url,
                &key,
                0,
                MAX_GROUPS_TO_GET,
                query.use_cache.on_nodes(),
            );
            fetch_groups(Arc::clone(&context.client), request)
        });
        let responses = try_join_all(requests).await?;

        let mut responses = responses.into_iter();
        let first_response = responses
            .next()
            .ok_or_else(|| PhalanxError::invalid_config("no nodes configured"))?;
        let mut results = responses.try_fold(first_response, |acc, r| merge_hits_grouped(&acc, &r))?;

        let mut groups = results.hit_groups.take().unwrap_or_default();
        ordering.sort(&mut groups);

        let total = groups.len();
        let first = (query.first as usize).min(total);
        let end = first.saturating_add(query.number as usize).min(total);
        let window: Vec<_> = groups.drain(first..end).collect();

        results.summary.set_window(
            query.first as u64,
            query.number as u64,
            window.len() as u64,
            end < total,
        );
        results.hit_groups = Some(window);
        Ok(results)
    }
}

async fn fetch_groups(client: Arc<dyn NodeClient>, request: HitsRequest) -> Result<HitsResults> {
    let node_url = request.node_url.clone();
    let reply = client
        .fetch_hits(request)
        .await
        .map_err(|e| translate_node_error(&node_url, e))?;
    match reply {
        NodeReply::Page(results) => Ok(results),
        NodeReply::Error { status, error } => Err(PhalanxError::node(
            node_url,
            status,
            error.error.code,
            error.error.message,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hit, HitGroup};
    use crate::node::MockNodeClient;

    fn aggregator(client: MockNodeClient) -> (Aggregator, Arc<MockNodeClient>) {
        let client = Arc::new(client);
        let config = AggregatorConfig::new(["http://a", "http://b"]);
        let context = SearchContext::new(config, client.clone());
        (Aggregator::with_context(context), client)
    }

    #[tokio::test]
    async fn test_grouped_request_merges_and_windows() {
        let (aggregator, client) = aggregator(
            MockNodeClient::new()
                .with_groups(
                    "http://a",
                    vec![HitGroup::new("cat", 5, 2), HitGroup::new("dog", 1, 1)],
                )
                .with_groups(
                    "http://b",
                    vec![HitGroup::new("dog", 7, 3), HitGroup::new("eel", 2, 1)],
                ),
        );
        let key = SearchKey::new("corpus", "[]").with_group("hit:word");
        let results = aggregator.hits(HitsQuery::new(key, 2)).await.unwrap();

        let groups = results.hit_groups.unwrap();
        let ids: Vec<(&str, i64)> = groups.iter().map(|g| (g.identity.as_str(), g.size)).collect();
        assert_eq!(ids, [("dog", 8), ("cat", 5)]);
        assert_eq!(results.summary.number_of_groups, Some(3));
        assert_eq!(results.summary.largest_group_size, Some(8));
        assert_eq!(results.summary.actual_window_size, 2);
        assert!(results.summary.window_has_next);
        assert!(results.hits.is_none());

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.number == MAX_GROUPS_TO_GET && r.sort == "size"));
        // Grouped requests aren't cached
        assert!(aggregator.registry().is_empty());
    }

    #[tokio::test]
    async fn test_grouped_request_fails_on_any_node() {
        let (aggregator, _) = aggregator(
            MockNodeClient::new()
                .with_groups("http://a", vec![HitGroup::new("cat", 5, 2)])
                .with_error("http://b", 500, "INTERNAL_ERROR", "out of memory"),
        );
        let key = SearchKey::new("corpus", "[]").with_group("hit:word");
        let err = aggregator.hits(HitsQuery::new(key, 10)).await.unwrap_err();
        assert_eq!(err.node_url(), Some("http://b"));
    }

    #[tokio::test]
    async fn test_hits_request_uses_registry() {
        let (aggregator, _) = aggregator(
            MockNodeClient::new()
                .with_hits("http://a", vec![Hit::new("d1", 1, 2)])
                .with_hits("http://b", vec![Hit::new("d2", 3, 4)]),
        );
        let key = SearchKey::new("corpus", "\"x\"");
        let results = aggregator
            .hits(HitsQuery::new(key.clone(), 10))
            .await
            .unwrap();
        assert_eq!(results.hits.unwrap().len(), 2);
        assert_eq!(results.summary.number_of_hits, 2);
        assert_eq!(aggregator.registry().len(), 1);

        let results = aggregator
            .hits(HitsQuery::new(key, 10).with_first(1).with_use_cache(UseCache::No))
            .await
            .unwrap();
        assert_eq!(results.hits.unwrap().len(), 1);
        assert!(aggregator.registry().is_empty());
    }

    #[tokio::test]
    async fn test_negative_window_rejected() {
        let (aggregator, _) = aggregator(MockNodeClient::new());
        let err = aggregator
            .hits(HitsQuery::new(SearchKey::new("c", "p"), -1))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
