//! Output formatting for the Phalanx CLI.

use serde::Serialize;

use crate::cli::args::{OutputFormat, PhalanxArgs};
use crate::error::Result;
use crate::model::{ContextPart, Hit, HitsResults};

/// Annotation shown in the human-readable concordance.
const DISPLAY_ANNOTATION: &str = "word";

/// Print hits results in the requested format.
pub fn output_hits(results: &HitsResults, args: &PhalanxArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(results, args),
        OutputFormat::Human => {
            print!("{}", format_hits_human(results, args.verbosity() > 1));
            Ok(())
        }
    }
}

/// Output in JSON format.
pub fn output_json<T: Serialize>(result: &T, args: &PhalanxArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Render results as a keyword-in-context listing, or a group table.
pub fn format_hits_human(results: &HitsResults, show_summary: bool) -> String {
    let summary = &results.summary;
    let mut out = String::new();
    if show_summary {
        out.push_str(&format!(
            "{} hits in {} documents{}\n",
            summary.number_of_hits,
            summary.number_of_docs,
            if summary.still_counting { " (still counting)" } else { "" }
        ));
    }

    if let Some(groups) = &results.hit_groups {
        for group in groups {
            out.push_str(&format!(
                "{:>8}  {}\n",
                group.size, group.identity_display
            ));
        }
    }

    if let Some(hits) = &results.hits {
        for hit in hits {
            out.push_str(&format_hit(hit));
            out.push('\n');
        }
    }

    if summary.window_has_next {
        let next = summary.window_first_result + summary.actual_window_size;
        out.push_str(&format!("... more results from {next}\n"));
    }
    out
}

fn format_hit(hit: &Hit) -> String {
    let words = |part: ContextPart| hit.context(part, DISPLAY_ANNOTATION).join(" ");
    let matched = words(ContextPart::Match);
    let matched = if matched.is_empty() {
        format!("{}-{}", hit.start, hit.end)
    } else {
        matched
    };
    format!(
        "{}: {} [{}] {}",
        hit.doc_pid,
        words(ContextPart::Left),
        matched,
        words(ContextPart::Right)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HitGroup, SearchSummary};

    #[test]
    fn test_concordance_lines() {
        let hit = Hit::new("doc1", 3, 4)
            .with_context(ContextPart::Left, "word", ["the", "black"])
            .with_context(ContextPart::Match, "word", ["cat"])
            .with_context(ContextPart::Right, "word", ["sat"]);
        let mut summary = SearchSummary {
            number_of_hits: 12,
            number_of_docs: 3,
            ..Default::default()
        };
        summary.set_window(0, 1, 1, true);
        let results = HitsResults::with_hits(summary, vec![hit, Hit::new("doc2", 7, 8)], vec![]);

        let text = format_hits_human(&results, true);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "12 hits in 3 documents");
        assert_eq!(lines[1], "doc1: the black [cat] sat");
        assert_eq!(lines[2], "doc2:  [7-8] ");
        assert_eq!(lines[3], "... more results from 1");
    }

    #[test]
    fn test_group_table() {
        let results = HitsResults::with_groups(
            SearchSummary::default(),
            vec![HitGroup::new("cat", 10, 2)],
        );
        assert_eq!(format_hits_human(&results, false), "      10  cat\n");
    }
}
