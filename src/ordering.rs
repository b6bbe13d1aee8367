//! Sort specifications for hits and groups.
//!
//! A hit sort spec such as `(field:year,-left:word:i)` is parsed into a
//! [`HitOrdering`], a total order over hits that the merge uses to pick the
//! next hit across all nodes.

pub mod collator;
pub mod group;
pub mod hit;
pub mod property;

pub use collator::{Collator, DefaultCollator};
pub use group::GroupOrdering;
pub use hit::{HitOrdering, SortableHit};
pub use property::{ContextKind, HitProperty};
