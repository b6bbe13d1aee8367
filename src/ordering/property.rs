//! Hit properties that can be sorted on.

use std::cmp::Ordering;

use crate::error::{PhalanxError, Result};
use crate::model::{ContextPart, MatchSensitivity, compare_hit_text};
use crate::ordering::collator::Collator;
use crate::ordering::hit::SortableHit;

/// Annotation used when a context property doesn't name one.
const DEFAULT_ANNOTATION: &str = "word";

/// Which context text a [`HitProperty::Context`] compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Full left context, read from the match outwards.
    Left,
    /// Full right context.
    Right,
    /// Only the word directly left of the match.
    WordLeft,
    /// Only the word directly right of the match.
    WordRight,
    /// The matched text.
    Hit,
}

impl ContextKind {
    fn part(self) -> ContextPart {
        match self {
            ContextKind::Left | ContextKind::WordLeft => ContextPart::Left,
            ContextKind::Right | ContextKind::WordRight => ContextPart::Right,
            ContextKind::Hit => ContextPart::Match,
        }
    }

    fn from_start(self) -> bool {
        !matches!(self, ContextKind::Left | ContextKind::WordLeft)
    }

    fn one_word(self) -> bool {
        matches!(self, ContextKind::WordLeft | ContextKind::WordRight)
    }
}

/// A property of a hit to sort on, with its parsed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitProperty {
    /// Start position of the hit.
    HitPosition,
    /// Decade of an integer year metadata field.
    Decade { field: String },
    /// First value of a metadata field.
    Field { field: String },
    /// Document pid.
    DocId,
    /// Context text.
    Context {
        kind: ContextKind,
        annotation: String,
        sensitivity: MatchSensitivity,
    },
}

type PropertyParser = fn(&str) -> Result<HitProperty>;

/// Sort spec `type` tokens and how to parse their `info`.
const PROPERTY_PARSERS: &[(&str, PropertyParser)] = &[
    ("hitposition", parse_hit_position),
    ("decade", parse_decade),
    ("field", parse_field),
    ("doc", parse_doc_id),
    ("docid", parse_doc_id),
    ("left", parse_left),
    ("right", parse_right),
    ("wordleft", parse_word_left),
    ("wordright", parse_word_right),
    ("hit", parse_hit_text),
];

fn parse_hit_position(_: &str) -> Result<HitProperty> {
    Ok(HitProperty::HitPosition)
}

fn parse_doc_id(_: &str) -> Result<HitProperty> {
    Ok(HitProperty::DocId)
}

fn required_field(kind: &str, info: &str) -> Result<String> {
    if info.is_empty() {
        return Err(PhalanxError::invalid_sort(format!(
            "sort '{kind}' requires a metadata field name"
        )));
    }
    Ok(info.to_string())
}

fn parse_decade(info: &str) -> Result<HitProperty> {
    Ok(HitProperty::Decade {
        field: required_field("decade", info)?,
    })
}

fn parse_field(info: &str) -> Result<HitProperty> {
    Ok(HitProperty::Field {
        field: required_field("field", info)?,
    })
}

/// Parse `annotationName:sensitivityFlag`. Sensitive unless a flag other than `s` is given.
fn parse_context(kind: ContextKind, info: &str) -> Result<HitProperty> {
    let (annotation, flag) = match info.split_once(':') {
        Some((annotation, flag)) => (annotation, Some(flag)),
        None => (info, None),
    };
    let annotation = if annotation.is_empty() {
        DEFAULT_ANNOTATION
    } else {
        annotation
    };
    let sensitivity = match flag {
        Some(flag) if flag != "s" => MatchSensitivity::Insensitive,
        _ => MatchSensitivity::Sensitive,
    };
    Ok(HitProperty::Context {
        kind,
        annotation: annotation.to_string(),
        sensitivity,
    })
}

fn parse_left(info: &str) -> Result<HitProperty> {
    parse_context(ContextKind::Left, info)
}

fn parse_right(info: &str) -> Result<HitProperty> {
    parse_context(ContextKind::Right, info)
}

fn parse_word_left(info: &str) -> Result<HitProperty> {
    parse_context(ContextKind::WordLeft, info)
}

fn parse_word_right(info: &str) -> Result<HitProperty> {
    parse_context(ContextKind::WordRight, info)
}

fn parse_hit_text(info: &str) -> Result<HitProperty> {
    parse_context(ContextKind::Hit, info)
}

impl HitProperty {
    /// Parse a property from its `type` token and `info` string.
    pub fn parse(kind: &str, info: &str) -> Result<Self> {
        let kind_lower = kind.to_ascii_lowercase();
        PROPERTY_PARSERS
            .iter()
            .find(|(name, _)| *name == kind_lower)
            .map(|(_, parser)| parser(info))
            .unwrap_or_else(|| {
                Err(PhalanxError::invalid_sort(format!(
                    "unknown hit property '{kind}'"
                )))
            })
    }

    /// Compare two hits on this property.
    pub fn compare(&self, a: &SortableHit<'_>, b: &SortableHit<'_>, collator: &dyn Collator) -> Ordering {
        match self {
            HitProperty::HitPosition => a
                .hit
                .start
                .cmp(&b.hit.start)
                .then_with(|| a.hit.end.cmp(&b.hit.end)),
            HitProperty::DocId => a.hit.doc_pid.cmp(&b.hit.doc_pid),
            HitProperty::Field { field } => {
                let va = a.field_value(field).unwrap_or("");
                let vb = b.field_value(field).unwrap_or("");
                collator.compare(va, vb)
            }
            HitProperty::Decade { field } => {
                // Missing or unparsable years go after every known decade
                match (decade(a, field), decade(b, field)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            HitProperty::Context {
                kind,
                annotation,
                sensitivity,
            } => compare_hit_text(
                a.hit,
                b.hit,
                kind.part(),
                annotation,
                *sensitivity,
                kind.from_start(),
                kind.one_word(),
            ),
        }
    }
}

fn decade(hit: &SortableHit<'_>, field: &str) -> Option<i64> {
    hit.field_value(field)
        .and_then(|year| year.trim().parse::<i64>().ok())
        .map(|year| year.div_euclid(10))
}
