//! Read partitions: declarative filters over vertex label sets.
//!
//! A partition restricts which server vertices the session may observe and
//! contributes fragments to generated statements: labels inlined into MATCH
//! node patterns, and predicates appended to WHERE clauses.
//!
//! - [`UnrestrictedPartition`] - every vertex is visible
//! - [`AllLabelsPartition`] - a vertex is visible iff it carries all
//!   partition labels
//! - [`AnyLabelPartition`] - a vertex is visible iff it carries at least one
//!   partition label

use std::collections::BTreeSet;

use trellis_core::Label;

mod all_labels;
mod any_label;

pub use all_labels::AllLabelsPartition;
pub use any_label::AnyLabelPartition;

/// A declarative filter over vertex label sets.
pub trait ReadPartition: Send + Sync {
    /// Checks whether the given label may be added to or removed from a
    /// vertex without breaking partition membership.
    fn validate_label(&self, label: &Label) -> bool;

    /// Checks whether a vertex with the given label set belongs to the
    /// partition.
    fn contains_vertex(&self, labels: &BTreeSet<Label>) -> bool;

    /// Labels to inline into a MATCH node pattern.
    fn match_pattern_labels(&self) -> Vec<Label>;

    /// A predicate to append to the WHERE clause, if the pattern labels
    /// alone do not enforce membership.
    fn match_predicate(&self, alias: &str) -> Option<String>;
}

/// The partition that accepts every label and every vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnrestrictedPartition;

impl UnrestrictedPartition {
    /// Create the unrestricted partition.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ReadPartition for UnrestrictedPartition {
    fn validate_label(&self, _label: &Label) -> bool {
        true
    }

    fn contains_vertex(&self, _labels: &BTreeSet<Label>) -> bool {
        true
    }

    fn match_pattern_labels(&self) -> Vec<Label> {
        Vec::new()
    }

    fn match_predicate(&self, _alias: &str) -> Option<String> {
        None
    }
}
