//! Traversal direction for incident edges and neighbor lookups.

use serde::{Deserialize, Serialize};

/// The direction of an edge relative to a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Edges leaving the vertex.
    Outgoing,
    /// Edges arriving at the vertex.
    Incoming,
    /// Edges in either direction.
    Both,
}

impl Direction {
    /// Returns `true` if this direction covers outgoing edges.
    #[inline]
    #[must_use]
    pub const fn includes_outgoing(self) -> bool {
        matches!(self, Self::Outgoing | Self::Both)
    }

    /// Returns `true` if this direction covers incoming edges.
    #[inline]
    #[must_use]
    pub const fn includes_incoming(self) -> bool {
        matches!(self, Self::Incoming | Self::Both)
    }

    /// The opposite direction. [`Direction::Both`] is its own opposite.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
            Self::Both => Self::Both,
        }
    }
}
