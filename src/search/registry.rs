//! Cache of running distributed searches.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

use crate::error::Result;
use crate::ordering::HitOrdering;
use crate::search::context::SearchContext;
use crate::search::distributed::DistributedSearch;
use crate::search::key::{SearchKey, UseCache};

/// Keeps distributed searches alive between requests, so paging through
/// results doesn't restart the search on every node.
///
/// Searches not accessed for the configured maximum age are evicted after
/// each lookup, so the requested search itself is always kept.
/// Lookup, eviction and clearing happen under one lock.
#[derive(Debug)]
pub struct SearchRegistry {
    context: SearchContext,
    searches: Mutex<HashMap<SearchKey, Arc<DistributedSearch>>>,
}

impl SearchRegistry {
    /// Create an empty registry.
    pub fn new(context: SearchContext) -> Self {
        Self {
            context,
            searches: Mutex::new(HashMap::new()),
        }
    }

    /// The context searches are created with.
    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    /// Get the search for `key`, creating it if it isn't cached.
    ///
    /// `initial_hits` is the number of hits the caller is about to request;
    /// it sizes the first node pages of a new search. If `use_cache` doesn't
    /// allow reusing searches, every cached search is discarded and a fresh
    /// one is returned without caching it.
    pub fn get(
        &self,
        key: SearchKey,
        use_cache: UseCache,
        initial_hits: u64,
    ) -> Result<Arc<DistributedSearch>> {
        let ordering = HitOrdering::parse_with_collator(&key.sort, Arc::clone(&self.context.collator))?;
        let new_search = |key: SearchKey, ordering| {
            Arc::new(DistributedSearch::new(
                key,
                ordering,
                use_cache.on_nodes(),
                initial_hits,
                &self.context,
            ))
        };

        let mut searches = self.searches.lock();
        if !use_cache.on_aggregator() {
            if !searches.is_empty() {
                info!("Cache bypassed, discarding {} cached searches", searches.len());
            }
            searches.clear();
            return Ok(new_search(key, ordering));
        }

        let search = match searches.get(&key) {
            Some(search) => Arc::clone(search),
            None => {
                let search = new_search(key.clone(), ordering);
                searches.insert(key, Arc::clone(&search));
                search
            }
        };
        search.touch();
        self.evict_idle(&mut searches);
        Ok(search)
    }

    fn evict_idle(&self, searches: &mut HashMap<SearchKey, Arc<DistributedSearch>>) {
        let now = self.context.clock.now();
        let max_age = self.context.config.cache.max_age;
        searches.retain(|_, search| {
            let keep = now.saturating_duration_since(search.last_access()) < max_age;
            if !keep {
                debug!("Evicting idle search {}", search.id());
            }
            keep
        });
    }

    /// Number of cached searches.
    pub fn len(&self) -> usize {
        self.searches.lock().len()
    }

    /// Is the cache empty?
    pub fn is_empty(&self) -> bool {
        self.searches.lock().is_empty()
    }

    /// Discard all cached searches.
    pub fn clear(&self) {
        self.searches.lock().clear();
    }
}
