//! Candidate search and ranking for Gaussian shape alignment
//!
//! This crate finds the rigid motion that best superimposes a fit shape
//! onto a reference shape:
//!
//! - [`AlignmentEngine`] - Seeds, budgeted refinement and ranking over
//!   conformer cross products
//! - [`PoseSeeder`] - Triangle matching and canonical-axis seeds
//! - [`PoseRefiner`] - Local optimization of Gaussian overlap similarity
//! - [`RankedPool`] - Results ordered by similarity
//! - [`AlignConfig`] - Budgets, weights and tie handling
//!
//! # Example
//!
//! ```rust
//! use gshape_align::{AlignConfig, AlignmentEngine};
//! use gshape_volume::{Element, ShapeMolecule};
//! use lin_alg::f64::Vec3;
//!
//! let mut reference = ShapeMolecule::new("ref");
//! for (i, p) in [(0.0, 0.0, 0.0), (1.5, 0.0, 0.0), (2.2, 1.3, 0.0), (3.6, 1.3, 0.4)].iter().enumerate() {
//!     let element = if i == 2 { Element::Oxygen } else { Element::Carbon };
//!     reference.add_atom(element, Vec3::new(p.0, p.1, p.2));
//! }
//! let mut fit = reference.clone();
//!
//! let engine = AlignmentEngine::new(AlignConfig::default().with_budgets(10, 5)).unwrap();
//! let similarity = engine.align_two_mols_in_place(&reference, &mut fit, 0.5).unwrap();
//! assert!(similarity > 0.99);
//! ```

mod cancel;
mod config;
mod engine;
mod error;
mod frame;
pub mod overlap;
pub mod refine;
mod result;
pub mod seed;

pub use cancel::CancelToken;
pub use config::AlignConfig;
pub use engine::{AlignmentEngine, EnsembleAlignment, SearchOptions};
pub use error::{AlignError, AlignResult};
pub use frame::FrameGuard;
pub use refine::{OverlapRefiner, PoseRefiner, Refinement, RefinerParams};
pub use result::{AlignmentResult, RankedPool, Scored, SimilarityBreakdown, TiePolicy};
pub use seed::{InertiaSeedSet, PoseSeeder, Seed, StandardSeeder, TriangleParams};

use gshape_volume::ShapeMolecule;

/// Align `fit` onto `reference` with the default configuration and move
/// its coordinates into the reference's frame. Returns the similarity.
pub fn align_two_mols_in_place(reference: &ShapeMolecule, fit: &mut ShapeMolecule) -> AlignResult<f64> {
    let engine = AlignmentEngine::new(AlignConfig::default())?;
    let pp_weight = engine.config().pp_weight;
    engine.align_two_mols_in_place(reference, fit, pp_weight)
}
