//! Labels for vertices and edges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Delimiter used when joining a vertex's labels into a single string.
pub const LABEL_DELIMITER: &str = "::";

/// A label that categorizes a vertex or names an edge relationship.
///
/// Labels are ordered so a vertex's label set has a stable serialized form
/// (labels joined with [`LABEL_DELIMITER`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(String);

impl Label {
    /// Create a new label.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the label name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the label is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Join an ordered collection of labels into the `::`-delimited form.
#[must_use]
pub fn join_labels<'a>(labels: impl IntoIterator<Item = &'a Label>) -> String {
    labels.into_iter().map(Label::as_str).collect::<Vec<_>>().join(LABEL_DELIMITER)
}
