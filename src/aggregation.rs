//! Combining partial results from several nodes.
//!
//! All merges here are associative, so any number of node responses can be
//! folded pairwise.

use std::collections::BTreeMap;

use crate::error::{PhalanxError, Result};
use crate::model::{HitGroup, HitsResults, SearchSummary};

/// Merge the search summaries from two nodes.
///
/// Counts are summed, flags are OR-ed and timings take the maximum.
/// `numberOfGroups` is left alone: groups with the same identity merge, so
/// the total can only be determined after merging the groups themselves.
pub fn merge_search_summary(a: &SearchSummary, b: &SearchSummary) -> SearchSummary {
    let mut result = a.clone();

    result.number_of_hits = a.number_of_hits + b.number_of_hits;
    result.number_of_hits_retrieved = a.number_of_hits_retrieved + b.number_of_hits_retrieved;
    result.number_of_docs = a.number_of_docs + b.number_of_docs;
    result.number_of_docs_retrieved = a.number_of_docs_retrieved + b.number_of_docs_retrieved;
    result.stopped_counting_hits = a.stopped_counting_hits || b.stopped_counting_hits;
    result.stopped_retrieving_hits = a.stopped_retrieving_hits || b.stopped_retrieving_hits;
    result.still_counting = a.still_counting || b.still_counting;

    result.largest_group_size = combine(a.largest_group_size, b.largest_group_size, i64::max);
    result.search_time = a.search_time.max(b.search_time);
    result.count_time = combine(a.count_time, b.count_time, i64::max);

    result.subcorpus_size = merge_count_maps(a.subcorpus_size.as_ref(), b.subcorpus_size.as_ref());

    result
}

fn combine<F>(x: Option<i64>, y: Option<i64>, op: F) -> Option<i64>
where
    F: Fn(i64, i64) -> i64,
{
    match (x, y) {
        (Some(x), Some(y)) => Some(op(x, y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn merge_count_maps(
    a: Option<&BTreeMap<String, i64>>,
    b: Option<&BTreeMap<String, i64>>,
) -> Option<BTreeMap<String, i64>> {
    match (a, b) {
        (None, None) => None,
        (Some(m), None) | (None, Some(m)) => Some(m.clone()),
        (Some(a), Some(b)) => {
            let mut merged = a.clone();
            for (key, value) in b {
                *merged.entry(key.clone()).or_insert(0) += value;
            }
            Some(merged)
        }
    }
}

/// Merge two groups with the same identity.
pub fn merge_hit_groups(a: &HitGroup, b: &HitGroup) -> HitGroup {
    HitGroup {
        identity: a.identity.clone(),
        identity_display: a.identity_display.clone(),
        size: a.size + b.size,
        properties: a.properties.clone(),
        number_of_docs: a.number_of_docs + b.number_of_docs,
        subcorpus_size: merge_count_maps(a.subcorpus_size.as_ref(), b.subcorpus_size.as_ref()),
    }
}

/// Merge two grouped responses.
///
/// Groups are matched on identity. The result is ordered by identity; the
/// caller applies the requested group sort afterwards.
pub fn merge_hits_grouped(a: &HitsResults, b: &HitsResults) -> Result<HitsResults> {
    if a.hits.is_some() || b.hits.is_some() {
        return Err(PhalanxError::internal(
            "Merging grouped results but there are hits",
        ));
    }

    let mut groups: BTreeMap<String, HitGroup> = BTreeMap::new();
    for group in a.hit_groups.iter().chain(b.hit_groups.iter()).flatten() {
        match groups.get_mut(&group.identity) {
            Some(existing) => *existing = merge_hit_groups(existing, group),
            None => {
                groups.insert(group.identity.clone(), group.clone());
            }
        }
    }

    let mut summary = merge_search_summary(&a.summary, &b.summary);
    summary.number_of_groups = Some(groups.len() as i64);
    summary.largest_group_size = groups.values().map(|g| g.size).max();

    Ok(HitsResults::with_groups(summary, groups.into_values().collect()))
}
