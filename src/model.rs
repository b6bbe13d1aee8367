//! Wire representation of node responses and aggregated results.
//!
//! These types mirror the JSON a search node returns for a hits request, so
//! the same structures serve both for reading node pages and for producing
//! the aggregated response.

pub mod doc_info;
pub mod group;
pub mod hit;
pub mod results;
pub mod summary;

pub use doc_info::DocInfo;
pub use group::HitGroup;
pub use hit::{ContextPart, ContextTokens, Hit, MatchSensitivity, compare_hit_text};
pub use results::{ErrorInfo, ErrorResponse, HitsResults};
pub use summary::SearchSummary;
