//! Cardinality of a vertex property key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How many values a vertex property key may hold, and how additions behave.
///
/// - `Single`: one value; setting replaces it.
/// - `List`: an ordered sequence; setting appends.
/// - `Set`: a collection unique by `(id, key, value)`; setting adds only if
///   absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// A single value per key.
    Single,
    /// An ordered sequence of values per key.
    List,
    /// A collection of distinct values per key.
    Set,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::List => f.write_str("list"),
            Self::Set => f.write_str("set"),
        }
    }
}
