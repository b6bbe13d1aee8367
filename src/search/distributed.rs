//! A hits search across all nodes, merged into one windowable hit list.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, try_join_all};
use log::debug;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::aggregation::merge_search_summary;
use crate::clock::Clock;
use crate::error::{PhalanxError, Result};
use crate::model::{DocInfo, Hit, HitsResults, SearchSummary};
use crate::node::{HitCursor, NodeQuery};
use crate::ordering::{HitOrdering, SortableHit};
use crate::search::context::SearchContext;
use crate::search::key::SearchKey;

/// How a contiguous run of the merged hits was assembled.
///
/// Pages end at document boundaries and record where each node's cursor
/// was when the page started.
#[derive(Debug, Clone)]
pub struct MergePage {
    start: usize,
    node_offsets: Vec<Option<usize>>,
    hits: Vec<Arc<Hit>>,
}

impl MergePage {
    fn new(start: usize, node_offsets: Vec<Option<usize>>) -> Self {
        Self {
            start,
            node_offsets,
            hits: Vec::new(),
        }
    }

    /// Index of the first hit on this page in the merged list.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of hits on this page.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Is this page empty?
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Cursor index on each node at the start of this page (None if unstarted).
    pub fn node_offsets(&self) -> &[Option<usize>] {
        &self.node_offsets
    }

    fn end(&self) -> usize {
        self.start + self.hits.len()
    }
}

/// The merge state: the merged hits and the cursors that produced them.
struct MergeState {
    pages: Vec<MergePage>,
    cursors: Vec<HitCursor>,
    doc_infos: HashMap<String, Arc<DocInfo>>,
}

impl MergeState {
    fn len(&self) -> usize {
        self.pages.last().map_or(0, MergePage::end)
    }

    fn last_doc(&self) -> Option<String> {
        self.pages
            .last()
            .and_then(|page| page.hits.last())
            .map(|hit| hit.doc_pid.clone())
    }

    fn append(&mut self, hit: Arc<Hit>, previous_doc: Option<&str>, merge_page_size: usize) {
        let new_doc = previous_doc != Some(hit.doc_pid.as_str());
        let page_full = self
            .pages
            .last()
            .is_none_or(|page| page.len() >= merge_page_size);
        if page_full && new_doc {
            let offsets = self.cursors.iter().map(HitCursor::hit_index).collect();
            self.pages.push(MergePage::new(self.len(), offsets));
        }
        if let Some(page) = self.pages.last_mut() {
            page.hits.push(hit);
        }
    }

    /// Hits `first..first + number`. The caller makes sure they exist.
    fn slice(&self, first: usize, number: usize) -> Vec<Arc<Hit>> {
        let end = first + number;
        let mut result = Vec::with_capacity(number);
        let start_page = self.pages.partition_point(|page| page.end() <= first);
        for page in &self.pages[start_page..] {
            if page.start >= end {
                break;
            }
            let from = first.saturating_sub(page.start);
            let to = (end - page.start).min(page.len());
            result.extend(page.hits[from..to].iter().cloned());
        }
        result
    }
}

/// A node's current hit, competing to be merged next.
struct Candidate {
    node: usize,
    consumed: usize,
    hit: Arc<Hit>,
    doc: Option<Arc<DocInfo>>,
}

impl Candidate {
    fn sortable(&self) -> SortableHit<'_> {
        SortableHit::new(&self.hit, self.doc.as_deref())
    }
}

/// A distributed hits search.
///
/// Keeps one [`NodeQuery`] per node and merges their hits, on demand, into a
/// single list that only ever grows. With a sort, the merged list follows
/// that sort; without one, hits from the same document are kept together.
pub struct DistributedSearch {
    id: Uuid,
    key: Arc<SearchKey>,
    nodes: Vec<NodeQuery>,
    ordering: Option<HitOrdering>,
    merge_page_size: usize,
    clock: Arc<dyn Clock>,
    last_access: SyncMutex<Instant>,
    state: Mutex<MergeState>,
}

impl fmt::Debug for DistributedSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedSearch")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl DistributedSearch {
    /// Create a search over all configured nodes.
    ///
    /// `initial_hits` is the number of hits the first request needs; it
    /// determines the first page size on each node.
    pub fn new(
        key: SearchKey,
        ordering: Option<HitOrdering>,
        use_cache_on_nodes: bool,
        initial_hits: u64,
        context: &SearchContext,
    ) -> Self {
        let key = Arc::new(key);
        let node_urls = &context.config.nodes;
        let page_size = context
            .config
            .paging
            .initial_page_size(initial_hits, node_urls.len());
        let nodes: Vec<NodeQuery> = node_urls
            .iter()
            .map(|url| {
                NodeQuery::new(
                    url.clone(),
                    Arc::clone(&key),
                    use_cache_on_nodes,
                    page_size,
                    context,
                )
            })
            .collect();

        let id = Uuid::new_v4();
        debug!(
            "Created search {id} for corpus '{}' on {} nodes (first page size {page_size})",
            key.corpus,
            nodes.len()
        );

        let state = MergeState {
            pages: vec![MergePage::new(0, vec![None; nodes.len()])],
            cursors: vec![HitCursor::new(); nodes.len()],
            doc_infos: HashMap::new(),
        };

        Self {
            id,
            key,
            nodes,
            ordering,
            merge_page_size: context.config.merge_page_size,
            last_access: SyncMutex::new(context.clock.now()),
            clock: Arc::clone(&context.clock),
            state: Mutex::new(state),
        }
    }

    /// Unique id of this search, for logging.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The search's identity.
    pub fn key(&self) -> &SearchKey {
        &self.key
    }

    /// The per-node queries, in node enumeration order.
    pub fn nodes(&self) -> &[NodeQuery] {
        &self.nodes
    }

    /// When a client last asked for this search.
    pub fn last_access(&self) -> Instant {
        *self.last_access.lock()
    }

    /// Record an access now.
    pub fn touch(&self) {
        *self.last_access.lock() = self.clock.now();
    }

    /// Number of hits merged so far.
    pub async fn merged_count(&self) -> usize {
        self.state.lock().await.len()
    }

    /// The merge page log so far.
    pub async fn merge_pages(&self) -> Vec<MergePage> {
        self.state.lock().await.pages.clone()
    }

    /// Pick the candidate to merge next.
    fn select(&self, candidates: &[Candidate], previous_doc: Option<&str>) -> Option<usize> {
        match &self.ordering {
            Some(ordering) => {
                // Smallest hit wins; on ties the earliest node
                let mut best: Option<usize> = None;
                for (i, candidate) in candidates.iter().enumerate() {
                    let better = match best {
                        None => true,
                        Some(b) => {
                            ordering.compare(&candidate.sortable(), &candidates[b].sortable())
                                == Ordering::Less
                        }
                    };
                    if better {
                        best = Some(i);
                    }
                }
                best
            }
            None => candidates
                .iter()
                .position(|c| Some(c.hit.doc_pid.as_str()) == previous_doc)
                // Otherwise the least-advanced node
                .or_else(|| {
                    candidates
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, c)| c.consumed)
                        .map(|(i, _)| i)
                }),
        }
    }

    /// Merge until more than `target` hits are available or all nodes are exhausted.
    async fn ensure_results_read(&self, state: &mut MergeState, target: usize) -> Result<()> {
        if state.len() > target {
            return Ok(());
        }
        for node in &self.nodes {
            node.prefetch().await;
        }

        let mut previous_doc = state.last_doc();
        while state.len() <= target {
            let mut candidates = Vec::with_capacity(self.nodes.len());
            for (i, node) in self.nodes.iter().enumerate() {
                let cursor = &mut state.cursors[i];
                if !cursor.was_nexted() {
                    if !cursor.has_next(node).await? {
                        continue;
                    }
                    cursor.next(node).await?;
                }
                let Some(hit) = cursor.current(node).await? else {
                    continue; // no more hits from this node
                };
                let doc = if self.ordering.is_some() {
                    node.doc_info(&hit.doc_pid).await
                } else {
                    None
                };
                candidates.push(Candidate {
                    node: i,
                    consumed: cursor.hit_index().unwrap_or(0),
                    hit,
                    doc,
                });
            }

            let Some(winner) = self.select(&candidates, previous_doc.as_deref()) else {
                // Nothing left on any node right now
                break;
            };
            let Candidate { node: i, hit, doc, .. } = candidates.swap_remove(winner);
            let doc = match doc {
                Some(doc) => Some(doc),
                None if !state.doc_infos.contains_key(&hit.doc_pid) => {
                    self.nodes[i].doc_info(&hit.doc_pid).await
                }
                None => None,
            };

            // No awaits from here on: the merged hit and its cursor move together
            state.append(Arc::clone(&hit), previous_doc.as_deref(), self.merge_page_size);
            if let Some(info) = doc {
                state.doc_infos.entry(hit.doc_pid.clone()).or_insert(info);
            }
            state.cursors[i].advance();
            previous_doc = Some(hit.doc_pid.clone());
        }
        Ok(())
    }

    /// Get a window of the merged hits, with the merged summary and the
    /// metadata of the documents in the window.
    ///
    /// A window with `number == 0` refreshes every node's running count first.
    pub async fn window(&self, first: i64, number: i64) -> Result<HitsResults> {
        if first < 0 || number < 0 {
            return Err(PhalanxError::invalid_argument(format!(
                "Illegal values for window: first={first}, number={number}"
            )));
        }
        let (first, number) = (first as usize, number as usize);

        let mut state = self.state.lock().await;

        // One extra hit tells us whether there is a next page
        self.ensure_results_read(&mut state, first.saturating_add(number))
            .await?;

        let size = state.len();
        let actual = size.saturating_sub(first).min(number);

        let summaries: Vec<Option<SearchSummary>> = if number == 0 {
            try_join_all(self.nodes.iter().map(NodeQuery::ensure_recent_summary)).await?
        } else {
            join_all(self.nodes.iter().map(NodeQuery::latest_summary)).await
        };
        let mut summary = summaries
            .iter()
            .flatten()
            .fold(None::<SearchSummary>, |acc, s| match acc {
                Some(acc) => Some(merge_search_summary(&acc, s)),
                None => Some(s.clone()),
            })
            .unwrap_or_default();
        summary.set_window(
            first as u64,
            number as u64,
            actual as u64,
            size > first.saturating_add(number),
        );

        let hits = state.slice(first, actual);
        let mut seen = HashSet::new();
        let doc_infos: Vec<DocInfo> = hits
            .iter()
            .filter(|hit| seen.insert(hit.doc_pid.as_str()))
            .filter_map(|hit| state.doc_infos.get(&hit.doc_pid))
            .map(|info| info.as_ref().clone())
            .collect();
        let hits: Vec<Hit> = hits.iter().map(|hit| hit.as_ref().clone()).collect();

        debug!(
            "Search {}: window {first}+{number} -> {actual} hits ({size} merged)",
            self.id
        );
        Ok(HitsResults::with_hits(summary, hits, doc_infos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatorConfig;
    use crate::node::MockNodeClient;

    fn search(client: MockNodeClient, nodes: &[&str], sort: &str, merge_page_size: usize) -> DistributedSearch {
        let config = AggregatorConfig::new(nodes.iter().copied()).with_merge_page_size(merge_page_size);
        let context = SearchContext::new(config, Arc::new(client));
        let ordering = HitOrdering::parse(sort).unwrap();
        DistributedSearch::new(
            SearchKey::new("corpus", "p").with_sort(sort),
            ordering,
            true,
            20,
            &context,
        )
    }

    fn pids(results: &HitsResults) -> Vec<String> {
        results
            .hits
            .as_ref()
            .unwrap()
            .iter()
            .map(|h| format!("{}@{}", h.doc_pid, h.start))
            .collect()
    }

    #[tokio::test]
    async fn test_merge_pages_split_at_document_boundary() {
        // Three hits per document, page threshold of 4
        let hits = (0..12).map(|i| Hit::new(format!("d{}", i / 3), i, i + 1)).collect();
        let client = MockNodeClient::new().with_hits("http://a", hits);
        let search = search(client, &["http://a"], "", 4);

        search.window(0, 12).await.unwrap();
        let pages = search.merge_pages().await;
        let layout: Vec<(usize, usize)> = pages.iter().map(|p| (p.start(), p.len())).collect();
        assert_eq!(layout, vec![(0, 6), (6, 6)]);
        assert_eq!(pages[1].node_offsets(), &[Some(6)]);
    }

    #[tokio::test]
    async fn test_slice_across_pages() {
        let hits = (0..12).map(|i| Hit::new(format!("d{}", i / 3), i, i + 1)).collect();
        let client = MockNodeClient::new().with_hits("http://a", hits);
        let search = search(client, &["http://a"], "", 4);

        let results = search.window(4, 5).await.unwrap();
        let starts: Vec<i64> = results.hits.unwrap().iter().map(|h| h.start).collect();
        assert_eq!(starts, vec![4, 5, 6, 7, 8]);
        assert_eq!(results.doc_infos.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sorted_merge_ties_prefer_first_node() {
        let client = MockNodeClient::new()
            .with_hits("http://a", vec![Hit::new("a1", 1, 2), Hit::new("a2", 3, 4)])
            .with_hits("http://b", vec![Hit::new("b1", 1, 2), Hit::new("b2", 2, 3)]);
        let search = search(client, &["http://a", "http://b"], "hitposition", 1000);

        let results = search.window(0, 10).await.unwrap();
        assert_eq!(pids(&results), ["a1@1", "b1@1", "b2@2", "a2@3"]);
    }

    #[tokio::test]
    async fn test_negative_window_rejected() {
        let client = MockNodeClient::new().with_hits("http://a", vec![]);
        let search = search(client, &["http://a"], "", 1000);
        assert!(matches!(
            search.window(-1, 10).await,
            Err(PhalanxError::InvalidArgument(_))
        ));
        assert!(matches!(
            search.window(0, -5).await,
            Err(PhalanxError::InvalidArgument(_))
        ));
    }
}
