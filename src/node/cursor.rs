//! Forward-only cursor over a node's hits.

use std::sync::Arc;

use crate::error::Result;
use crate::model::{DocInfo, Hit};
use crate::node::query::NodeQuery;

/// Position in one node's hit stream.
///
/// A cursor is either unstarted (never advanced), positioned on a hit, or
/// exhausted (advanced past the node's last hit). Pages are fetched as the
/// cursor moves, so every operation may wait for the node; errors are
/// tagged with the node's address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitCursor {
    index: Option<usize>,
}

impl HitCursor {
    /// Create an unstarted cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Has [`HitCursor::next`] ever been called?
    pub fn was_nexted(&self) -> bool {
        self.index.is_some()
    }

    /// Index of the current hit on the node (the number of hits consumed
    /// before it), or None if unstarted.
    pub fn hit_index(&self) -> Option<usize> {
        self.index
    }

    fn next_index(&self) -> usize {
        self.index.map_or(0, |i| i + 1)
    }

    /// Is there a hit after the current one? Doesn't move the cursor.
    pub async fn has_next(&self, node: &NodeQuery) -> Result<bool> {
        node.ensure_hit_available(self.next_index()).await
    }

    /// Move to the next hit.
    pub async fn next(&mut self, node: &NodeQuery) -> Result<()> {
        let index = self.next_index();
        self.index = Some(index);
        node.ensure_hit_available(index).await?;
        Ok(())
    }

    /// Move past the current hit without waiting for the next one. It is
    /// fetched when the cursor is next read.
    pub fn advance(&mut self) {
        self.index = Some(self.next_index());
    }

    /// The current hit, or None if unstarted or exhausted.
    pub async fn current(&self, node: &NodeQuery) -> Result<Option<Arc<Hit>>> {
        match self.index {
            Some(i) => node.hit(i).await,
            None => Ok(None),
        }
    }

    /// Metadata of the current hit's document.
    pub async fn current_doc_info(&self, node: &NodeQuery) -> Result<Option<Arc<DocInfo>>> {
        match self.current(node).await? {
            Some(hit) => Ok(node.doc_info(&hit.doc_pid).await),
            None => Ok(None),
        }
    }
}
