//! Computational algorithms for gshape-rs
//!
//! This crate provides the numerical building blocks used by the shape
//! alignment crates:
//! - Row-major 3×3 matrix helpers (products, determinants, rotations)
//! - Symmetric 3×3 eigendecomposition (Jacobi) for principal axes
//! - Analytical 3×3 SVD decomposition
//! - Weighted Kabsch algorithm for optimal rigid-body superposition

pub mod kabsch;
pub mod linalg;

pub use kabsch::{kabsch, KabschResult};
pub use linalg::{symmetric_eigen, svd3, Mat3, Svd3, SymmetricEigen};

/// Errors from geometric algorithms
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeomError {
    #[error("Coordinate arrays have different lengths: {0} vs {1}")]
    LengthMismatch(usize, usize),

    #[error("Not enough points for superposition (need at least 3, got {0})")]
    TooFewPoints(usize),

    #[error("Weights must be non-negative with a positive sum")]
    InvalidWeights,

    #[error("Non-finite value in input coordinates")]
    NonFinite,
}

/// Result type for geometric algorithms
pub type GeomResult<T> = Result<T, GeomError>;
