//! Parsing hit sort specs into a comparison function.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{PhalanxError, Result};
use crate::model::{DocInfo, Hit};
use crate::ordering::collator::{Collator, DefaultCollator};
use crate::ordering::property::HitProperty;

/// A hit together with the metadata of its document, if known.
#[derive(Debug, Clone, Copy)]
pub struct SortableHit<'a> {
    /// The hit.
    pub hit: &'a Hit,
    /// Metadata of the hit's document.
    pub doc: Option<&'a DocInfo>,
}

impl<'a> SortableHit<'a> {
    /// Pair a hit with its document metadata.
    pub fn new(hit: &'a Hit, doc: Option<&'a DocInfo>) -> Self {
        Self { hit, doc }
    }

    /// First value of a metadata field of the hit's document.
    pub fn field_value(&self, field: &str) -> Option<&'a str> {
        self.doc.and_then(|doc| doc.first_value(field))
    }
}

#[derive(Debug, Clone)]
enum SortNode {
    Property { property: HitProperty, reverse: bool },
    Chain { nodes: Vec<SortNode>, reverse: bool },
}

impl SortNode {
    fn compare(&self, a: &SortableHit<'_>, b: &SortableHit<'_>, collator: &dyn Collator) -> Ordering {
        let (ord, reverse) = match self {
            SortNode::Property { property, reverse } => (property.compare(a, b, collator), *reverse),
            SortNode::Chain { nodes, reverse } => {
                let ord = nodes
                    .iter()
                    .map(|node| node.compare(a, b, collator))
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal);
                (ord, *reverse)
            }
        };
        if reverse { ord.reverse() } else { ord }
    }
}

/// A total order over hits, parsed from a sort spec.
///
/// Grammar:
/// - `(spec1,spec2,...)`, optionally prefixed with `-` to reverse the whole
///   chain; later specs break ties of earlier ones
/// - `type:info`, where a `-` before `type` reverses just that property
#[derive(Debug, Clone)]
pub struct HitOrdering {
    root: SortNode,
    collator: Arc<dyn Collator>,
}

impl HitOrdering {
    /// Parse a sort spec. An empty spec means "no ordering".
    pub fn parse(spec: &str) -> Result<Option<Self>> {
        Self::parse_with_collator(spec, Arc::new(DefaultCollator))
    }

    /// Parse a sort spec, using `collator` for metadata field comparisons.
    pub fn parse_with_collator(spec: &str, collator: Arc<dyn Collator>) -> Result<Option<Self>> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(None);
        }
        let root = parse_node(spec)?;
        Ok(Some(Self { root, collator }))
    }

    /// Compare two hits.
    pub fn compare(&self, a: &SortableHit<'_>, b: &SortableHit<'_>) -> Ordering {
        self.root.compare(a, b, self.collator.as_ref())
    }
}

fn parse_node(spec: &str) -> Result<SortNode> {
    let spec = spec.trim();
    let (reverse, body) = match spec.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, spec),
    };

    if let Some(inner) = body.strip_prefix('(') {
        let inner = inner
            .strip_suffix(')')
            .ok_or_else(|| PhalanxError::invalid_sort(format!("unbalanced parentheses in '{spec}'")))?;
        let nodes = split_top_level(inner)?
            .into_iter()
            .map(parse_node)
            .collect::<Result<Vec<_>>>()?;
        if nodes.is_empty() {
            return Err(PhalanxError::invalid_sort(format!("empty sort chain '{spec}'")));
        }
        return Ok(SortNode::Chain { nodes, reverse });
    }

    if body.contains(',') {
        return Err(PhalanxError::invalid_sort(format!(
            "multiple sort properties must be parenthesised: '({body})'"
        )));
    }
    let (kind, info) = body.split_once(':').unwrap_or((body, ""));
    let property = HitProperty::parse(kind.trim(), info.trim())?;
    Ok(SortNode::Property { property, reverse })
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(spec: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in spec.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    PhalanxError::invalid_sort(format!("unbalanced parentheses in '{spec}'"))
                })?;
            }
            ',' if depth == 0 => {
                parts.push(&spec[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(PhalanxError::invalid_sort(format!(
            "unbalanced parentheses in '{spec}'"
        )));
    }
    parts.push(&spec[start..]);
    Ok(parts.into_iter().filter(|p| !p.trim().is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::ContextPart;

    fn sorted<'a>(ordering: &HitOrdering, hits: &'a [(Hit, DocInfo)]) -> Vec<&'a str> {
        let mut refs: Vec<SortableHit<'a>> =
            hits.iter().map(|(h, d)| SortableHit::new(h, Some(d))).collect();
        refs.sort_by(|a, b| ordering.compare(a, b));
        refs.iter().map(|h| h.hit.doc_pid.as_str()).collect()
    }

    fn doc(pid: &str, year: &str, title: &str) -> (Hit, DocInfo) {
        (
            Hit::new(pid, 0, 1),
            DocInfo::new(pid)
                .with_field("year", [year])
                .with_field("title", [title]),
        )
    }

    #[test]
    fn test_empty_spec_is_no_ordering() {
        assert!(HitOrdering::parse("").unwrap().is_none());
        assert!(HitOrdering::parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_unknown_type_is_error() {
        let err = HitOrdering::parse("bogus:x").unwrap_err();
        assert!(matches!(err, PhalanxError::InvalidSort(_)));
        assert!(HitOrdering::parse("(field:a").is_err());
        assert!(HitOrdering::parse("()").is_err());
    }

    #[test]
    fn test_bare_comma_list_is_error() {
        for spec in ["field:year,hitposition", "-hitposition,docid"] {
            let err = HitOrdering::parse(spec).unwrap_err();
            assert!(matches!(err, PhalanxError::InvalidSort(_)), "{spec}");
        }

        let hits = vec![doc("d1", "2000", "a"), doc("d2", "1990", "b")];
        let ordering = HitOrdering::parse("(field:year,hitposition)").unwrap().unwrap();
        assert_eq!(sorted(&ordering, &hits), ["d2", "d1"]);
    }

    #[test]
    fn test_hit_position() {
        let ordering = HitOrdering::parse("hitposition").unwrap().unwrap();
        let a = Hit::new("x", 5, 6);
        let b = Hit::new("y", 2, 3);
        assert_eq!(
            ordering.compare(&SortableHit::new(&a, None), &SortableHit::new(&b, None)),
            Ordering::Greater
        );

        let ordering = HitOrdering::parse("-hitposition").unwrap().unwrap();
        assert_eq!(
            ordering.compare(&SortableHit::new(&a, None), &SortableHit::new(&b, None)),
            Ordering::Less
        );
    }

    #[test]
    fn test_decade_then_title() {
        let hits = vec![
            doc("d1", "1989", "b"),
            doc("d2", "1981", "a"),
            doc("d3", "1975", "z"),
            doc("d4", "unknown", "a"),
        ];
        let ordering = HitOrdering::parse("(decade:year,field:title)").unwrap().unwrap();
        assert_eq!(sorted(&ordering, &hits), ["d3", "d2", "d1", "d4"]);
    }

    #[test]
    fn test_reverse_whole_chain_vs_single_key() {
        let hits = vec![
            doc("d1", "1989", "b"),
            doc("d2", "1981", "a"),
            doc("d3", "1975", "z"),
        ];
        let chain = HitOrdering::parse("-(decade:year,field:title)").unwrap().unwrap();
        assert_eq!(sorted(&chain, &hits), ["d1", "d2", "d3"]);

        let single = HitOrdering::parse("(decade:year,-field:title)").unwrap().unwrap();
        assert_eq!(sorted(&single, &hits), ["d3", "d1", "d2"]);
    }

    #[test]
    fn test_missing_field_sorts_as_empty() {
        let with_title = (Hit::new("a", 0, 1), DocInfo::new("a").with_field("title", ["x"]));
        let without = (Hit::new("b", 0, 1), DocInfo::new("b"));
        let ordering = HitOrdering::parse("field:title").unwrap().unwrap();
        assert_eq!(sorted(&ordering, &[with_title, without]), ["b", "a"]);
    }

    #[test]
    fn test_nested_chain_and_context() {
        let a = Hit::new("a", 0, 1).with_context(ContextPart::Match, "word", ["Cat"]);
        let b = Hit::new("b", 3, 4).with_context(ContextPart::Match, "word", ["cat"]);
        let ordering = HitOrdering::parse("((hit:word:i),docid)").unwrap().unwrap();
        let ord = ordering.compare(&SortableHit::new(&b, None), &SortableHit::new(&a, None));
        // Equal under insensitive text, so docid decides
        assert_eq!(ord, Ordering::Greater);
    }
}
