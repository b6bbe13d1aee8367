//! Paginated, prefetching retrieval of one search's hits from one node.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::PagingConfig;
use crate::error::{GROUP_NOT_FOUND, PhalanxError, Result, translate_node_error};
use crate::model::{DocInfo, Hit, SearchSummary};
use crate::node::client::{HitsRequest, NodeClient, NodeReply};
use crate::search::{SearchContext, SearchKey};

/// Mutable state of a node query. Only touched while holding the lock.
struct NodeState {
    /// The hits we've received so far.
    hits: Vec<Arc<Hit>>,

    /// The doc infos we've received so far.
    doc_infos: HashMap<String, Arc<DocInfo>>,

    /// Are we still fetching, or do we have all the hits?
    fetching: bool,

    /// Size of the next page to request. Starts small for a quick first
    /// response and grows for efficiency.
    page_size: usize,

    /// The next page, if it has been requested and we're waiting for it.
    pending: Option<JoinHandle<Result<NodeReply>>>,

    /// Latest summary received, giving us e.g. the running count.
    latest_summary: Option<SearchSummary>,

    /// When the latest summary was received.
    latest_summary_at: Option<Instant>,
}

/// One distributed search's view of a single node.
pub struct NodeQuery {
    node_url: String,
    key: Arc<SearchKey>,
    use_cache: bool,
    client: Arc<dyn NodeClient>,
    clock: Arc<dyn Clock>,
    paging: PagingConfig,
    summary_max_age: Duration,
    state: Mutex<NodeState>,
}

impl NodeQuery {
    /// Create a query for `key` on one node. Nothing is requested until hits
    /// are needed or [`NodeQuery::prefetch`] is called.
    pub fn new(
        node_url: String,
        key: Arc<SearchKey>,
        use_cache: bool,
        initial_page_size: usize,
        context: &SearchContext,
    ) -> Self {
        let paging = context.config.paging.clone();
        let page_size = paging.clamp(initial_page_size as u64);
        Self {
            node_url,
            key,
            use_cache,
            client: Arc::clone(&context.client),
            clock: Arc::clone(&context.clock),
            paging,
            summary_max_age: context.config.summary_max_age,
            state: Mutex::new(NodeState {
                hits: Vec::new(),
                doc_infos: HashMap::new(),
                fetching: true,
                page_size,
                pending: None,
                latest_summary: None,
                latest_summary_at: None,
            }),
        }
    }

    /// Address of the node.
    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    fn request(&self, first: usize, number: usize) -> HitsRequest {
        HitsRequest::for_key(
            &self.node_url,
            &self.key,
            first as u64,
            number as u64,
            self.use_cache,
        )
    }

    /// Request the next page unless a request is already in flight.
    fn start_next_page(&self, state: &mut NodeState) {
        if state.pending.is_some() {
            return;
        }
        let request = self.request(state.hits.len(), state.page_size);
        debug!(
            "Requesting hits {}..{} from {}",
            request.first,
            request.first + request.number,
            self.node_url
        );
        let client = Arc::clone(&self.client);
        state.pending = Some(tokio::spawn(async move { client.fetch_hits(request).await }));
    }

    /// Start fetching the first page so it's (hopefully) there when we need it.
    pub async fn prefetch(&self) {
        let mut state = self.state.lock().await;
        if state.fetching && state.hits.is_empty() {
            self.start_next_page(&mut state);
        }
    }

    /// Wait for the next page and add its hits.
    async fn process_next_page(&self, state: &mut NodeState) -> Result<()> {
        if !state.fetching {
            return Err(PhalanxError::internal(
                "process_next_page called but already done fetching hits",
            ));
        }
        self.start_next_page(state);
        let Some(pending) = state.pending.take() else {
            return Err(PhalanxError::internal("no page request in flight"));
        };

        let reply = match pending.await {
            Ok(reply) => reply,
            Err(e) if e.is_cancelled() => {
                // The runtime that ran the prefetch is gone; ask again
                debug!("Page request to {} was cancelled, retrying", self.node_url);
                let request = self.request(state.hits.len(), state.page_size);
                self.client.fetch_hits(request).await
            }
            Err(e) => Err(PhalanxError::internal(format!(
                "page request task failed: {e}"
            ))),
        }
        .map_err(|e| translate_node_error(&self.node_url, e))?;

        match reply {
            NodeReply::Page(results) => {
                for info in results.doc_infos.unwrap_or_default() {
                    state
                        .doc_infos
                        .entry(info.pid.clone())
                        .or_insert_with(|| Arc::new(info));
                }
                let hits = results.hits.unwrap_or_default();
                state.hits.extend(hits.into_iter().map(Arc::new));

                let has_next = results.summary.window_has_next;
                state.latest_summary = Some(results.summary);
                state.latest_summary_at = Some(self.clock.now());

                if has_next {
                    // Prefetch the next, slightly larger, page right away
                    state.page_size = self.paging.grow(state.page_size);
                    self.start_next_page(state);
                } else {
                    debug!(
                        "All {} hits received from {}",
                        state.hits.len(),
                        self.node_url
                    );
                    state.fetching = false;
                }
                Ok(())
            }
            NodeReply::Error { status, error } => {
                if error.error.code == GROUP_NOT_FOUND {
                    // The viewed group doesn't occur on this node: it contributes nothing.
                    info!(
                        "Group not found on {}, treating as empty: {}",
                        self.node_url, error.error.message
                    );
                    state.fetching = false;
                    Ok(())
                } else {
                    warn!(
                        "Node {} returned {} {}: {}",
                        self.node_url, status, error.error.code, error.error.message
                    );
                    Err(PhalanxError::node(
                        &self.node_url,
                        status,
                        error.error.code,
                        error.error.message,
                    ))
                }
            }
        }
    }

    /// Make sure hit `i` is available if it exists, fetching pages as needed.
    ///
    /// Returns whether the hit exists.
    pub async fn ensure_hit_available(&self, i: usize) -> Result<bool> {
        let mut state = self.state.lock().await;
        while state.hits.len() <= i && state.fetching {
            self.process_next_page(&mut state).await?;
        }
        Ok(state.hits.len() > i)
    }

    /// Hit `i`, or None if the node doesn't have that many.
    pub async fn hit(&self, i: usize) -> Result<Option<Arc<Hit>>> {
        self.ensure_hit_available(i).await?;
        let state = self.state.lock().await;
        Ok(state.hits.get(i).cloned())
    }

    /// Metadata for a document this node returned hits in.
    pub async fn doc_info(&self, pid: &str) -> Option<Arc<DocInfo>> {
        self.state.lock().await.doc_infos.get(pid).cloned()
    }

    /// Most recent summary received from the node.
    pub async fn latest_summary(&self) -> Option<SearchSummary> {
        self.state.lock().await.latest_summary.clone()
    }

    /// Return a summary no older than the configured maximum age, asking the
    /// node for a fresh count (a zero-hit request) if ours is stale.
    pub async fn ensure_recent_summary(&self) -> Result<Option<SearchSummary>> {
        let now = self.clock.now();
        {
            let state = self.state.lock().await;
            if let (Some(summary), Some(at)) = (&state.latest_summary, state.latest_summary_at) {
                if now.duration_since(at) < self.summary_max_age {
                    return Ok(Some(summary.clone()));
                }
            }
        }

        debug!("Refreshing summary from {}", self.node_url);
        let reply = self
            .client
            .fetch_hits(self.request(0, 0))
            .await
            .map_err(|e| translate_node_error(&self.node_url, e))?;

        match reply {
            NodeReply::Page(results) => {
                let mut state = self.state.lock().await;
                state.latest_summary = Some(results.summary.clone());
                state.latest_summary_at = Some(self.clock.now());
                Ok(Some(results.summary))
            }
            NodeReply::Error { error, .. } if error.error.code == GROUP_NOT_FOUND => {
                Ok(self.latest_summary().await)
            }
            NodeReply::Error { status, error } => Err(PhalanxError::node(
                &self.node_url,
                status,
                error.error.code,
                error.error.message,
            )),
        }
    }

    /// Number of hits received so far.
    pub async fn buffered(&self) -> usize {
        self.state.lock().await.hits.len()
    }

    /// Size of the next page that will be requested.
    pub async fn page_size(&self) -> usize {
        self.state.lock().await.page_size
    }

    /// Have all hits been received?
    pub async fn is_done(&self) -> bool {
        !self.state.lock().await.fetching
    }
}
