//! Partition requiring every partition label on each visible vertex.

use std::collections::BTreeSet;

use trellis_core::Label;

use super::ReadPartition;

/// A partition where every visible vertex carries all of the partition
/// labels.
///
/// The partition labels themselves cannot be added to or removed from a
/// vertex, since that would move the vertex in or out of the partition
/// behind the session's back. All labels are inlined into MATCH patterns, so
/// no WHERE predicate is needed.
#[derive(Debug, Clone)]
pub struct AllLabelsPartition {
    labels: BTreeSet<Label>,
}

impl AllLabelsPartition {
    /// Create a partition from the required labels.
    #[must_use]
    pub fn new(labels: &[&str]) -> Self {
        Self { labels: labels.iter().map(|label| Label::new(*label)).collect() }
    }
}

impl ReadPartition for AllLabelsPartition {
    fn validate_label(&self, label: &Label) -> bool {
        !self.labels.contains(label)
    }

    fn contains_vertex(&self, labels: &BTreeSet<Label>) -> bool {
        self.labels.iter().all(|label| labels.contains(label))
    }

    fn match_pattern_labels(&self) -> Vec<Label> {
        self.labels.iter().cloned().collect()
    }

    fn match_predicate(&self, _alias: &str) -> Option<String> {
        None
    }
}
