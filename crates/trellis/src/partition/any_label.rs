//! Partition requiring at least one partition label on each visible vertex.

use std::collections::BTreeSet;

use trellis_core::Label;

use super::ReadPartition;
use crate::cypher;

/// A partition where every visible vertex carries at least one of the
/// partition labels.
///
/// With a single label the label is inlined into MATCH patterns; with more,
/// membership is enforced through a disjunction predicate of the form
/// `` (alias:`L1` OR alias:`L2`) `` appended to the WHERE clause.
#[derive(Debug, Clone)]
pub struct AnyLabelPartition {
    labels: BTreeSet<Label>,
}

impl AnyLabelPartition {
    /// Create a partition from the alternative labels.
    #[must_use]
    pub fn new(labels: &[&str]) -> Self {
        Self { labels: labels.iter().map(|label| Label::new(*label)).collect() }
    }

    /// Checks if the partition contains the given label.
    #[must_use]
    pub fn contains_label(&self, label: &Label) -> bool {
        self.labels.contains(label)
    }
}

impl ReadPartition for AnyLabelPartition {
    fn validate_label(&self, _label: &Label) -> bool {
        true
    }

    fn contains_vertex(&self, labels: &BTreeSet<Label>) -> bool {
        self.labels.iter().any(|label| labels.contains(label))
    }

    fn match_pattern_labels(&self) -> Vec<Label> {
        if self.labels.len() == 1 {
            self.labels.iter().cloned().collect()
        } else {
            Vec::new()
        }
    }

    fn match_predicate(&self, alias: &str) -> Option<String> {
        if self.labels.len() <= 1 {
            return None;
        }
        let disjunction = self
            .labels
            .iter()
            .map(|label| format!("{alias}:{}", cypher::quote(label)))
            .collect::<Vec<_>>()
            .join(" OR ");
        Some(format!("({disjunction})"))
    }
}
