//! Linear algebra utilities
//!
//! - [`mat3`] - 3×3 row-major matrix operations (multiply, transpose, rotate)
//! - [`eigen3`] - Symmetric 3×3 eigendecomposition (cyclic Jacobi)
//! - [`svd3`] - Analytical 3×3 SVD decomposition built on [`eigen3`]

pub mod eigen3;
pub mod mat3;
pub mod svd3;

pub use eigen3::{symmetric_eigen, SymmetricEigen};
pub use mat3::Mat3;
pub use svd3::{svd3, Svd3};
