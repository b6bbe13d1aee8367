//! Hits responses and error responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PhalanxError;
use crate::model::{DocInfo, Hit, HitGroup, SearchSummary};

/// Response to a hits request: a summary plus either hits or groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitsResults {
    /// Running totals and window information.
    #[serde(default)]
    pub summary: SearchSummary,

    /// Hits in the requested window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<Vec<Hit>>,

    /// Metadata for the documents the hits occur in.
    #[serde(
        default,
        with = "doc_info_map",
        skip_serializing_if = "Option::is_none"
    )]
    pub doc_infos: Option<Vec<DocInfo>>,

    /// Groups in the requested window (grouped requests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_groups: Option<Vec<HitGroup>>,
}

impl HitsResults {
    /// Create a hits response.
    pub fn with_hits(summary: SearchSummary, hits: Vec<Hit>, doc_infos: Vec<DocInfo>) -> Self {
        Self {
            summary,
            hits: Some(hits),
            doc_infos: Some(doc_infos),
            hit_groups: None,
        }
    }

    /// Create a grouped response.
    pub fn with_groups(summary: SearchSummary, groups: Vec<HitGroup>) -> Self {
        Self {
            summary,
            hits: None,
            doc_infos: None,
            hit_groups: Some(groups),
        }
    }
}

/// Reads and writes `docInfos` as an object keyed by pid.
mod doc_info_map {
    use super::*;

    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    /// Not a document, but some node versions put it among the doc infos.
    const METADATA_FIELD_GROUPS: &str = "metadataFieldGroups";

    pub fn serialize<S>(infos: &Option<Vec<DocInfo>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let infos = infos.as_deref().unwrap_or_default();
        let mut map = serializer.serialize_map(Some(infos.len()))?;
        for info in infos {
            let pid = if info.pid.is_empty() {
                "UNKNOWN"
            } else {
                info.pid.as_str()
            };
            map.serialize_entry(pid, info)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<DocInfo>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let mut infos = Vec::with_capacity(raw.len());
        for (pid, value) in raw {
            if pid == METADATA_FIELD_GROUPS {
                continue;
            }
            let mut info: DocInfo = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            info.pid = pid;
            infos.push(info);
        }
        Ok(Some(infos))
    }
}

/// Error body as returned by a node (and by us).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// Machine-readable error code.
    pub code: String,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Stack trace, if the node sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,

    /// Node the error occurred on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_url: Option<String>,
}

/// `{"error": {...}}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The error.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response.
    pub fn new<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self {
            error: ErrorInfo {
                code: code.into(),
                message: message.into(),
                stack_trace: None,
                node_url: None,
            },
        }
    }
}

impl From<&PhalanxError> for ErrorResponse {
    fn from(err: &PhalanxError) -> Self {
        match err {
            PhalanxError::Node {
                node_url,
                code,
                message,
                ..
            } => {
                let mut response = ErrorResponse::new(code.as_str(), message.as_str());
                response.error.node_url = Some(node_url.clone());
                response
            }
            PhalanxError::InvalidArgument(msg) => ErrorResponse::new("ILLEGAL_ARGUMENT", msg.as_str()),
            PhalanxError::InvalidSort(msg) => ErrorResponse::new("UNKNOWN_SORT", msg.as_str()),
            other => ErrorResponse::new("INTERNAL_ERROR", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_page() {
        let json = r#"{
            "summary": {"numberOfHits": 2, "windowHasNext": false},
            "hits": [
                {"docPid": "a", "start": 1, "end": 2},
                {"docPid": "b", "start": 5, "end": 6}
            ],
            "docInfos": {
                "a": {"title": ["A"], "lengthInTokens": 10},
                "b": {"title": ["B"]},
                "metadataFieldGroups": [{"name": "Text", "fields": ["title"]}]
            }
        }"#;
        let results: HitsResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.hits.as_ref().map(Vec::len), Some(2));
        let infos = results.doc_infos.unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].pid, "a");
        assert_eq!(infos[0].length_in_tokens, Some(10));
        assert_eq!(infos[1].first_value("title"), Some("B"));
    }

    #[test]
    fn test_serialize_doc_infos_keyed_by_pid() {
        let results = HitsResults::with_hits(
            SearchSummary::default(),
            vec![Hit::new("a", 0, 1)],
            vec![DocInfo::new("a").with_field("title", ["A"])],
        );
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["docInfos"]["a"]["title"][0], "A");
        assert!(value.get("hitGroups").is_none());
    }

    #[test]
    fn test_error_response() {
        let json = r#"{"error": {"code": "GROUP_NOT_FOUND", "message": "Group not found: x"}}"#;
        let response: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.error.code, "GROUP_NOT_FOUND");

        let err = PhalanxError::node("http://n1", 500, "INTERNAL_ERROR", "boom");
        let response = ErrorResponse::from(&err);
        assert_eq!(response.error.node_url.as_deref(), Some("http://n1"));
        assert_eq!(response.error.code, "INTERNAL_ERROR");
    }
}
