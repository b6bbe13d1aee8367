//! Running totals and window metadata for a hits search.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Summary of a (partial) hits search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSummary {
    /// Time the search took, in ms.
    pub search_time: i64,

    /// Time counting took so far, in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_time: Option<i64>,

    /// Is the node still counting hits?
    pub still_counting: bool,

    /// Hits counted so far.
    pub number_of_hits: i64,

    /// Hits retrieved so far.
    pub number_of_hits_retrieved: i64,

    /// Did we stop counting because of a limit?
    pub stopped_counting_hits: bool,

    /// Did we stop retrieving because of a limit?
    pub stopped_retrieving_hits: bool,

    /// Documents counted so far.
    pub number_of_docs: i64,

    /// Documents retrieved so far.
    pub number_of_docs_retrieved: i64,

    /// Number of groups (grouped requests only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_groups: Option<i64>,

    /// Size of the largest group (grouped requests only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest_group_size: Option<i64>,

    /// Size of the subcorpus searched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcorpus_size: Option<BTreeMap<String, i64>>,

    /// Index of the first result in the window.
    pub window_first_result: i64,

    /// Number of results requested.
    pub requested_window_size: i64,

    /// Number of results actually in the window.
    pub actual_window_size: i64,

    /// Are there results after this window?
    pub window_has_next: bool,

    /// Are there results before this window?
    pub window_has_previous: bool,
}

impl SearchSummary {
    /// Set the window metadata.
    pub fn set_window(&mut self, first: u64, requested: u64, actual: u64, has_next: bool) {
        self.window_first_result = first as i64;
        self.requested_window_size = requested as i64;
        self.actual_window_size = actual as i64;
        self.window_has_next = has_next;
        self.window_has_previous = first > 0;
    }
}
