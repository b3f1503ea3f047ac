//! Seed pose generation
//!
//! Two strategies propose starting poses for refinement: pharmacophore
//! triangle matching ([`triangle`]) and canonical-axis enumeration
//! ([`inertia`]). [`PoseSeeder`] is the seam the engine calls through.

pub mod inertia;
pub mod triangle;

pub use inertia::{InertiaSeedSet, InertiaSeeder};
pub use triangle::{TriangleMatcher, TriangleParams};

use gshape_volume::{ShapeVolume, TransformSequence};

use crate::config::AlignConfig;
use crate::error::AlignResult;
use crate::result::Scored;

/// Candidate starting pose with its triangle-match quality
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    /// Pose moving the fit onto the reference
    pub transform: TransformSequence,
    pub score: f64,
}

impl Seed {
    pub fn new(transform: TransformSequence, score: f64) -> Self {
        Self { transform, score }
    }
}

impl Scored for Seed {
    fn score(&self) -> f64 {
        self.score
    }
}

/// Source of seed poses for one reference/fit pair
pub trait PoseSeeder: Send + Sync {
    /// Poses from matched pharmacophore triangles, scored by match quality.
    /// An empty list is a normal outcome.
    fn triangle_match(
        &self,
        reference: &ShapeVolume,
        fit: &ShapeVolume,
        use_directionality: bool,
    ) -> AlignResult<Vec<Seed>>;

    /// Fixed enumeration of canonical-axis poses
    fn canonical_axis_seeds(&self, reference: &ShapeVolume, fit: &ShapeVolume) -> AlignResult<Vec<TransformSequence>>;
}

/// Triangle matcher plus canonical-axis enumeration
#[derive(Debug, Clone, Default)]
pub struct StandardSeeder {
    triangles: TriangleMatcher,
    inertia: InertiaSeeder,
}

impl StandardSeeder {
    pub fn new(triangles: TriangleMatcher, inertia: InertiaSeeder) -> Self {
        Self { triangles, inertia }
    }

    pub fn from_config(config: &AlignConfig) -> Self {
        Self::new(
            TriangleMatcher::new(config.triangles),
            InertiaSeeder::new(config.inertia_seeds, config.diversify_inertia_seeds),
        )
    }
}

impl PoseSeeder for StandardSeeder {
    fn triangle_match(
        &self,
        reference: &ShapeVolume,
        fit: &ShapeVolume,
        use_directionality: bool,
    ) -> AlignResult<Vec<Seed>> {
        Ok(self.triangles.match_shapes(reference, fit, use_directionality))
    }

    fn canonical_axis_seeds(&self, reference: &ShapeVolume, fit: &ShapeVolume) -> AlignResult<Vec<TransformSequence>> {
        Ok(self.inertia.seeds(reference, fit))
    }
}
