//! Error types for shape volume operations

use thiserror::Error;

use gshape_algos::GeomError;

/// Errors that can occur when building or manipulating shape volumes
#[derive(Error, Debug, Clone)]
pub enum VolumeError {
    /// Atom index is out of bounds
    #[error("Atom index {0} is out of bounds (atom count: {1})")]
    AtomIndexOutOfBounds(usize, usize),

    /// A pharmacophore feature must reference at least one atom
    #[error("Feature of kind {0} has no anchor atoms")]
    NoAnchors(String),

    /// Coordinate count doesn't match atom count
    #[error("Coordinate count mismatch: expected {expected}, got {actual}")]
    CoordinateMismatch { expected: usize, actual: usize },

    /// The volume has no atom Gaussians to define a frame
    #[error("Shape volume has no atom Gaussians")]
    EmptyVolume,

    /// Conformer index is out of bounds in an ensemble
    #[error("Conformer index {0} is out of bounds (conformer count: {1})")]
    ConformerOutOfBounds(usize, usize),

    /// Underlying geometry failure
    #[error(transparent)]
    Geometry(#[from] GeomError),
}

/// Result type for shape volume operations
pub type VolumeResult<T> = Result<T, VolumeError>;
