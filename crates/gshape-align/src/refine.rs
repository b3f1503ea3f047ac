//! Local refinement of seed poses
//!
//! [`PoseRefiner`] is the seam the engine calls for every surviving seed.
//! [`OverlapRefiner`] maximizes the Gaussian overlap similarity with a
//! deterministic pattern search over a rotation vector (about the fit's
//! center of mass) and a translation.

use serde::{Deserialize, Serialize};

use gshape_algos::linalg::mat3;
use gshape_volume::{AtomGaussian, PharmacophoreGaussian, RigidTransform, ShapeVolume, TransformSequence};
use lin_alg::f64::Vec3;

use crate::error::{AlignError, AlignResult};
use crate::overlap::OverlapScorer;
use crate::result::SimilarityBreakdown;

/// Outcome of refining one posed fit shape
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    pub similarity: f64,
    pub contributions: SimilarityBreakdown,
    /// Correction to append after the seed pose
    pub correction: TransformSequence,
}

/// Local optimizer of the overlap similarity
pub trait PoseRefiner: Send + Sync {
    /// Refine `fit` (already moved by its seed pose) against `reference`.
    /// With `optimize` off the pose is only scored and the correction is
    /// the identity.
    fn refine(
        &self,
        reference: &ShapeVolume,
        fit: &ShapeVolume,
        pp_weight: f64,
        optimize: bool,
        tversky: bool,
    ) -> AlignResult<Refinement>;
}

/// Parameters for [`OverlapRefiner`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerParams {
    /// Weight of the fit self-overlap in Tversky scoring
    pub tversky_alpha: f64,
    /// Initial rotation step (radians)
    pub rotation_step: f64,
    /// Initial translation step (Å)
    pub translation_step: f64,
    pub min_rotation_step: f64,
    pub min_translation_step: f64,
    /// Upper bound on pattern-search sweeps
    pub max_iterations: usize,
}

impl Default for RefinerParams {
    fn default() -> Self {
        Self {
            tversky_alpha: 0.95,
            rotation_step: 0.1,
            translation_step: 0.3,
            min_rotation_step: 1e-3,
            min_translation_step: 1e-3,
            max_iterations: 500,
        }
    }
}

impl RefinerParams {
    pub fn validate(&self) -> AlignResult<()> {
        if !(0.0..=1.0).contains(&self.tversky_alpha) {
            return Err(AlignError::InvalidConfig(format!(
                "refiner.tversky_alpha must be within [0, 1], got {}",
                self.tversky_alpha
            )));
        }
        let steps = [
            ("rotation_step", self.rotation_step),
            ("translation_step", self.translation_step),
            ("min_rotation_step", self.min_rotation_step),
            ("min_translation_step", self.min_translation_step),
        ];
        for (name, value) in steps {
            if !(value.is_finite() && value > 0.0) {
                return Err(AlignError::InvalidConfig(format!(
                    "refiner.{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Pattern-search refiner over the Gaussian overlap similarity
#[derive(Debug, Clone, Default)]
pub struct OverlapRefiner {
    params: RefinerParams,
}

/// Pose parameters: rotation vector, then translation
type PoseVector = [f64; 6];

impl OverlapRefiner {
    pub fn new(params: RefinerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RefinerParams {
        &self.params
    }

    fn pose(x: &PoseVector, center: Vec3) -> RigidTransform {
        let rotation = mat3::from_rotation_vector(Vec3::new(x[0], x[1], x[2]));
        RigidTransform::about_center(rotation, center)
            .then(&RigidTransform::from_translation(Vec3::new(x[3], x[4], x[5])))
    }
}

/// Fit Gaussians moved by a candidate pose, reusing the buffers
struct PosedFit<'a> {
    atoms: &'a [AtomGaussian],
    features: &'a [PharmacophoreGaussian],
    moved_atoms: Vec<AtomGaussian>,
    moved_features: Vec<PharmacophoreGaussian>,
}

impl<'a> PosedFit<'a> {
    fn new(fit: &'a ShapeVolume) -> Self {
        Self {
            atoms: fit.atom_gaussians(),
            features: fit.pp_gaussians(),
            moved_atoms: fit.atom_gaussians().to_vec(),
            moved_features: fit.pp_gaussians().to_vec(),
        }
    }

    fn score(&mut self, scorer: &OverlapScorer, reference: &ShapeVolume, pose: &RigidTransform) -> SimilarityBreakdown {
        for (dst, src) in self.moved_atoms.iter_mut().zip(self.atoms) {
            *dst = *src;
            dst.transform(pose);
        }
        for (dst, src) in self.moved_features.iter_mut().zip(self.features) {
            *dst = *src;
            dst.transform(pose);
        }
        scorer.score(reference, &self.moved_atoms, &self.moved_features)
    }
}

impl PoseRefiner for OverlapRefiner {
    fn refine(
        &self,
        reference: &ShapeVolume,
        fit: &ShapeVolume,
        pp_weight: f64,
        optimize: bool,
        tversky: bool,
    ) -> AlignResult<Refinement> {
        if reference.atom_gaussians().is_empty() || fit.atom_gaussians().is_empty() {
            return Err(AlignError::Refinement("shape has no atom Gaussians".into()));
        }
        let alpha = tversky.then_some(self.params.tversky_alpha);
        let scorer = OverlapScorer::new(reference, fit, pp_weight, alpha);

        if !optimize {
            let contributions = scorer.score_volume(reference, fit);
            return Ok(Refinement {
                similarity: contributions.overall,
                contributions,
                correction: TransformSequence::new(),
            });
        }

        let center = fit.center_of_mass();
        let mut posed = PosedFit::new(fit);
        let mut x: PoseVector = [0.0; 6];
        let mut best = scorer.score_volume(reference, fit);
        let mut rotation_step = self.params.rotation_step;
        let mut translation_step = self.params.translation_step;

        for _ in 0..self.params.max_iterations {
            let rotation_live = rotation_step >= self.params.min_rotation_step;
            let translation_live = translation_step >= self.params.min_translation_step;
            if !rotation_live && !translation_live {
                break;
            }

            let mut improved = false;
            for dim in 0..6 {
                let (step, live) = if dim < 3 {
                    (rotation_step, rotation_live)
                } else {
                    (translation_step, translation_live)
                };
                if !live {
                    continue;
                }
                for sign in [1.0, -1.0] {
                    let mut trial = x;
                    trial[dim] += sign * step;
                    let s = posed.score(&scorer, reference, &Self::pose(&trial, center));
                    if s.overall > best.overall + 1e-12 {
                        x = trial;
                        best = s;
                        improved = true;
                        break;
                    }
                }
            }
            if !improved {
                rotation_step *= 0.5;
                translation_step *= 0.5;
            }
        }

        Ok(Refinement {
            similarity: best.overall,
            contributions: best,
            correction: Self::pose(&x, center).into(),
        })
    }
}
