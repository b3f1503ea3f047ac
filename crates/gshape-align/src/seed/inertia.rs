//! Canonical-axis seeds
//!
//! After pre-processing both shapes sit in their principal-axes frame, so
//! the candidate orientations of the fit are the proper signed permutations
//! of the coordinate axes. The enumeration does not depend on the shapes;
//! only the centering translation does.

use lin_alg::f64::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use gshape_algos::linalg::mat3::{self, Mat3};
use gshape_volume::{RigidTransform, ShapeVolume, TransformSequence};

/// RNG seed of the diversification sampler
const DIVERSIFY_SEED: u64 = 12345;

/// Maximum number of reference atoms used as extra seed centers
const DIVERSIFY_POINTS: usize = 10;

/// Which canonical rotations to try
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InertiaSeedSet {
    /// Principal axes matched as they are
    Identity,
    /// Identity and the three 180° flips about a principal axis
    Flips,
    /// All 24 proper signed permutations of the axes
    #[default]
    AxisPermutations,
}

impl InertiaSeedSet {
    pub fn len(&self) -> usize {
        match self {
            InertiaSeedSet::Identity => 1,
            InertiaSeedSet::Flips => 4,
            InertiaSeedSet::AxisPermutations => 24,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rotation matrices of the set, identity first
    pub fn rotations(&self) -> Vec<Mat3> {
        match self {
            InertiaSeedSet::Identity => vec![mat3::IDENTITY],
            InertiaSeedSet::Flips => vec![
                mat3::IDENTITY,
                mat3::diag([1.0, -1.0, -1.0]),
                mat3::diag([-1.0, 1.0, -1.0]),
                mat3::diag([-1.0, -1.0, 1.0]),
            ],
            InertiaSeedSet::AxisPermutations => signed_permutations(),
        }
    }
}

fn signed_permutations() -> Vec<Mat3> {
    const AXES: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let mut out = Vec::with_capacity(24);
    for axes in AXES {
        for signs in 0..8u8 {
            let mut m = [[0.0; 3]; 3];
            for (row, &col) in axes.iter().enumerate() {
                m[row][col] = if signs & (1 << row) == 0 { 1.0 } else { -1.0 };
            }
            if mat3::det(&m) > 0.0 {
                out.push(m);
            }
        }
    }
    out
}

/// Canonical-axis seeder
#[derive(Debug, Clone, Default)]
pub struct InertiaSeeder {
    set: InertiaSeedSet,
    diversify: bool,
}

impl InertiaSeeder {
    pub fn new(set: InertiaSeedSet, diversify: bool) -> Self {
        Self { set, diversify }
    }

    pub fn set(&self) -> InertiaSeedSet {
        self.set
    }

    /// Seed poses for `fit` onto `reference`: each rotation is applied
    /// about the fit's center of mass and the result placed on the
    /// reference's center of mass. With diversification on, every rotation
    /// is repeated centered on a sample of reference atoms.
    pub fn seeds(&self, reference: &ShapeVolume, fit: &ShapeVolume) -> Vec<TransformSequence> {
        let fit_com = fit.center_of_mass();
        let mut centers = vec![reference.center_of_mass()];
        if self.diversify {
            centers.extend(sample_centers(reference));
        }

        let rotations = self.set.rotations();
        let mut out = Vec::with_capacity(rotations.len() * centers.len());
        for &center in &centers {
            for rot in &rotations {
                let t = RigidTransform::new(*rot, center - mat3::mul_vec(rot, fit_com));
                out.push(t.into());
            }
        }
        out
    }
}

/// Up to [`DIVERSIFY_POINTS`] distinct reference atom centers, drawn with a
/// fixed seed so runs stay reproducible
fn sample_centers(reference: &ShapeVolume) -> Vec<Vec3> {
    let atoms = reference.atom_gaussians();
    let mut rng = StdRng::seed_from_u64(DIVERSIFY_SEED);
    let amount = atoms.len().min(DIVERSIFY_POINTS);
    rand::seq::index::sample(&mut rng, atoms.len(), amount)
        .into_iter()
        .map(|i| atoms[i].center)
        .collect()
}
