//! A group of hits with a shared identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One group in a grouped hits response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitGroup {
    /// Serialized group identity; groups with equal identity are merged.
    pub identity: String,

    /// Human-readable identity.
    #[serde(default)]
    pub identity_display: String,

    /// Number of hits in the group.
    pub size: i64,

    /// Properties the group was formed on, passed through as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,

    /// Number of documents with hits in this group.
    #[serde(default)]
    pub number_of_docs: i64,

    /// Size of the subcorpus this group represents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcorpus_size: Option<BTreeMap<String, i64>>,
}

impl HitGroup {
    /// Create a group.
    pub fn new<S: Into<String>>(identity: S, size: i64, number_of_docs: i64) -> Self {
        let identity = identity.into();
        Self {
            identity_display: identity.clone(),
            identity,
            size,
            properties: None,
            number_of_docs,
            subcorpus_size: None,
        }
    }
}
