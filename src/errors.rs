//! Slicing errors
//!
//! Degenerate geometry (an empty mesh, a zero-length plane normal, a plane that
//! misses everything) is never an error: those cases produce empty results.
//! The variants below cover construction and configuration mistakes and
//! misuse of the slice session state machine.

use crate::float_types::{Real, parry3d::shape::TriMeshBuilderError};

/// All the ways a slicing operation can be rejected
#[derive(Debug, thiserror::Error)]
pub enum SliceError {
    /// A configuration value is out of range or not finite
    #[error("(InvalidConfig) {0}")]
    InvalidConfig(String),

    /// A triangle references a vertex that does not exist
    #[error("(IndexOutOfRange) vertex index {index} is out of range (vertices.len = {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// A vertex coordinate is NaN or infinite
    #[error("(InvalidCoordinate) vertex {index} has a NaN or infinite coordinate: {value}")]
    InvalidCoordinate { index: usize, value: Real },

    /// A slice was requested while another one is committed or in progress
    #[error("(SessionActive) a slice session is already active")]
    SessionActive,

    /// The requested action is not valid in the current session state
    #[error("(InvalidTransition) cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    /// Parry rejected the triangles handed to it
    #[error(transparent)]
    TriMesh(#[from] TriMeshBuilderError),

    /// Reading or writing mesh data failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SliceError>;
