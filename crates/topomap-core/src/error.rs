//! Error types for the topology core
//!
//! Interactive paths degrade silently (unknown parents become roots, missing
//! positions get defaults). The errors here cover what cannot degrade:
//! - Non-finite coordinates reaching clamp/snap/normalize
//! - Structural problems reported by the strict builders
//! - Edit operations on nodes that do not exist

use crate::types::NodeId;
use std::fmt;

/// Coordinate axis, used to point at the offending component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal
    X,
    /// Vertical
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Main topology error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    /// A coordinate was NaN or infinite
    #[error("invalid coordinate: {axis} = {value}")]
    InvalidCoordinate { axis: Axis, value: f64 },

    /// Primary-parent links form a cycle
    #[error("primary parent cycle through {members:?}")]
    CycleDetected { members: Vec<NodeId> },

    /// Node id is not in the store
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node id is already in the store
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Nodes must carry a display name
    #[error("node name must not be empty")]
    EmptyName,
}

impl TopologyError {
    /// Build an `InvalidCoordinate` error
    #[inline]
    #[must_use]
    pub fn invalid_coordinate(axis: Axis, value: f64) -> Self {
        Self::InvalidCoordinate { axis, value }
    }

    /// Errors caused by the shape of the node graph rather than by a single
    /// request
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::CycleDetected { .. } | Self::DuplicateNode(_))
    }

    /// Whether the caller can simply drop the offending input and carry on
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::DuplicateNode(_))
    }
}

/// Check a coordinate component, passing finite values through
pub(crate) fn finite(axis: Axis, value: f64) -> Result<f64, TopologyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TopologyError::invalid_coordinate(axis, value))
    }
}
