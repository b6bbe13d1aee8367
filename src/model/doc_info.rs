//! Document metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata for one document, keyed by its pid.
///
/// On the wire, document infos are an object keyed by pid; the pid itself is
/// not part of the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocInfo {
    /// Persistent identifier of the document.
    #[serde(skip)]
    pub pid: String,

    /// Document length in tokens.
    #[serde(
        rename = "lengthInTokens",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub length_in_tokens: Option<u64>,

    /// Whether the user may view the full document.
    #[serde(rename = "mayView", default, skip_serializing_if = "Option::is_none")]
    pub may_view: Option<bool>,

    /// Metadata field values.
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Vec<String>>,
}

impl DocInfo {
    /// Create an empty doc info for a pid.
    pub fn new<S: Into<String>>(pid: S) -> Self {
        Self {
            pid: pid.into(),
            ..Default::default()
        }
    }

    /// Add a metadata field.
    pub fn with_field<F, I, V>(mut self, field: F, values: I) -> Self
    where
        F: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.metadata
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// First value of a metadata field.
    pub fn first_value(&self, field: &str) -> Option<&str> {
        self.metadata
            .get(field)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}
