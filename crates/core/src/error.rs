//! Error types for the perimeter engine.
//!
//! Geometry never fails: degenerate inputs produce `None` or infinite values that
//! callers check for. Errors only exist at the topology, configuration, model and
//! coupling layers, and at the step boundary where topology failures are escalated.

use crate::core_types::{AtomId, FrontId, MarkerId};

/// Inconsistency detected in the marker graph or front tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyError {
    /// Handle does not refer to a live marker
    UnknownMarker(MarkerId),
    /// Handle does not refer to a live front
    UnknownFront(FrontId),
    /// Marker has exactly one neighbour while it is being stepped
    OpenChain { marker: AtomId },
    /// Walking a front never returned to its head
    BrokenCycle { front: AtomId, walked: usize },
    /// Marker is not linked into any front
    Detached { marker: AtomId },
    /// Operation requires markers of the same front (or of different fronts)
    FrontMismatch { first: AtomId, second: AtomId },
    /// Cutting a cycle between neighbours would leave a single-marker front
    AdjacentMarkers { first: AtomId, second: AtomId },
    /// The root front cannot be removed or given markers
    RootFront,
    /// Restore was requested before any backup was taken
    NoBackup,
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMarker(id) => write!(f, "Unknown marker handle {id:?}"),
            Self::UnknownFront(id) => write!(f, "Unknown front handle {id:?}"),
            Self::OpenChain { marker } => {
                write!(f, "Marker {marker} has a single neighbour during a step")
            }
            Self::BrokenCycle { front, walked } => write!(
                f,
                "Front {front} does not close on itself after {walked} markers"
            ),
            Self::Detached { marker } => write!(f, "Marker {marker} belongs to no front"),
            Self::FrontMismatch { first, second } => write!(
                f,
                "Markers {first} and {second} do not satisfy the front requirement"
            ),
            Self::AdjacentMarkers { first, second } => {
                write!(f, "Markers {first} and {second} are neighbours")
            }
            Self::RootFront => write!(f, "Operation not allowed on the root front"),
            Self::NoBackup => write!(f, "No validated state to restore"),
        }
    }
}

impl std::error::Error for TopologyError {}

/// Failure of [`crate::Domain::step_to`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepError {
    /// Topology failed and no backup existed to recover from
    Topology(TopologyError),
    /// The safe-mode retry failed as well; the owning process must stop
    Unrecoverable {
        domain_id: u32,
        time: f64,
        source: TopologyError,
    },
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Topology(err) => write!(f, "Topology error without recovery point: {err}"),
            Self::Unrecoverable {
                domain_id,
                time,
                source,
            } => write!(
                f,
                "Domain {domain_id} failed to reach t={time} even in safe topology mode: {source}"
            ),
        }
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Topology(err) | Self::Unrecoverable { source: err, .. } => Some(err),
        }
    }
}

impl From<TopologyError> for StepError {
    fn from(err: TopologyError) -> Self {
        Self::Topology(err)
    }
}

/// Invalid simulation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub parameter: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub fn new(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self {
            parameter,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid parameter '{}': {}", self.parameter, self.reason)
    }
}

impl std::error::Error for ConfigError {}

/// Propagation or flux model lookup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// No model registered under that name
    UnknownName(String),
    /// No model registered at that index
    UnknownIndex(usize),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownName(name) => write!(f, "No model registered as '{name}'"),
            Self::UnknownIndex(index) => write!(f, "No model registered at index {index}"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Failure of the distributed exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum CouplingError {
    /// Rank outside `0..world_size`
    InvalidRank { rank: usize, world_size: usize },
    /// Underlying channel could not deliver or receive
    Channel(String),
    /// Payload ended early or had an impossible length
    Truncated { expected: usize, found: usize },
    /// Payload header describes a different grid layout
    LayoutMismatch {
        expected: [u64; 4],
        found: [u64; 4],
    },
    /// Cell coordinates in a payload fall outside the grid
    CellOutOfRange { i: i32, j: i32 },
    /// Scalar name was not valid UTF-8
    InvalidScalarName,
}

impl std::fmt::Display for CouplingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRank { rank, world_size } => {
                write!(f, "Rank {rank} outside world of size {world_size}")
            }
            Self::Channel(msg) => write!(f, "Channel failure: {msg}"),
            Self::Truncated { expected, found } => write!(
                f,
                "Payload truncated: expected {expected} bytes, found {found}"
            ),
            Self::LayoutMismatch { expected, found } => write!(
                f,
                "Payload layout {found:?} does not match local layout {expected:?}"
            ),
            Self::CellOutOfRange { i, j } => write!(f, "Payload cell ({i}, {j}) out of range"),
            Self::InvalidScalarName => write!(f, "Scalar name is not valid UTF-8"),
        }
    }
}

impl std::error::Error for CouplingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unrecoverable_exposes_source() {
        let err = StepError::Unrecoverable {
            domain_id: 3,
            time: 12.5,
            source: TopologyError::OpenChain {
                marker: AtomId::new(3, 9),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("Domain 3"));
        assert!(msg.contains("3:9"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_names_parameter() {
        let err = ConfigError::new("perimeter_resolution", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'perimeter_resolution': must be positive"
        );
    }
}
