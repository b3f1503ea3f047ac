//! Gaussian overlap similarity
//!
//! Shape similarity compares the atom Gaussian fields of two volumes;
//! pharmacophore similarity compares same-kind feature Gaussians, scaled by
//! direction agreement and by the reference's weight for that feature kind.
//! The fit's self overlap is taken under the same kind weights, so an exact
//! copy of the reference still scores 1 however its features are weighted.
//! Both use Tanimoto
//! `O_rf / (O_rr + O_ff - O_rf)` or, for asymmetric searches, Tversky
//! `O_rf / (α·O_ff + (1-α)·O_rr)`.

use ahash::AHashMap;

use gshape_volume::{AtomGaussian, FeatureKind, PharmacophoreGaussian, ShapeVolume};

use crate::result::SimilarityBreakdown;

/// Total pairwise overlap of two atom Gaussian sets
pub fn shape_overlap(a: &[AtomGaussian], b: &[AtomGaussian]) -> f64 {
    a.iter()
        .map(|ga| b.iter().map(|gb| ga.overlap(gb)).sum::<f64>())
        .sum()
}

/// Total pairwise overlap of two feature sets (same kinds only), each pair
/// weighted by its feature from `a`
pub fn pp_overlap(a: &[PharmacophoreGaussian], b: &[PharmacophoreGaussian]) -> f64 {
    a.iter()
        .map(|fa| b.iter().map(|fb| fa.overlap(fb)).sum::<f64>())
        .sum()
}

/// Self overlaps; invariant under rigid motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfOverlap {
    pub shape: f64,
    pub pp: f64,
}

impl SelfOverlap {
    pub fn of(volume: &ShapeVolume) -> Self {
        Self {
            shape: shape_overlap(volume.atom_gaussians(), volume.atom_gaussians()),
            pp: pp_overlap(volume.pp_gaussians(), volume.pp_gaussians()),
        }
    }
}

/// Largest weight the reference gives each feature kind it carries
fn kind_weights(reference: &ShapeVolume) -> AHashMap<FeatureKind, f64> {
    let mut weights: AHashMap<FeatureKind, f64> = AHashMap::new();
    for f in reference.pp_gaussians() {
        let w = weights.entry(f.kind).or_insert(f.weight);
        *w = w.max(f.weight);
    }
    weights
}

/// Fit features re-weighted by kind as the reference weights them; kinds
/// the reference lacks keep unit weight
fn reweighted(features: &[PharmacophoreGaussian], weights: &AHashMap<FeatureKind, f64>) -> Vec<PharmacophoreGaussian> {
    features
        .iter()
        .map(|f| f.with_weight(weights.get(&f.kind).copied().unwrap_or(1.0)))
        .collect()
}

/// Similarity scorer for one reference/fit pair
#[derive(Debug, Clone)]
pub struct OverlapScorer {
    reference: SelfOverlap,
    fit: SelfOverlap,
    pp_weight: f64,
    /// `Some(α)` for Tversky scoring
    tversky_alpha: Option<f64>,
}

impl OverlapScorer {
    pub fn new(reference: &ShapeVolume, fit: &ShapeVolume, pp_weight: f64, tversky_alpha: Option<f64>) -> Self {
        let fit_features = reweighted(fit.pp_gaussians(), &kind_weights(reference));
        Self {
            reference: SelfOverlap::of(reference),
            fit: SelfOverlap {
                shape: shape_overlap(fit.atom_gaussians(), fit.atom_gaussians()),
                pp: pp_overlap(&fit_features, &fit_features),
            },
            pp_weight,
            tversky_alpha,
        }
    }

    fn ratio(&self, cross: f64, reference: f64, fit: f64) -> f64 {
        let denom = match self.tversky_alpha {
            Some(alpha) => alpha * fit + (1.0 - alpha) * reference,
            None => reference + fit - cross,
        };
        if denom <= 0.0 {
            return 0.0;
        }
        (cross / denom).clamp(0.0, 1.0)
    }

    /// Score a fit pose given as raw Gaussian slices
    pub fn score(
        &self,
        reference: &ShapeVolume,
        fit_atoms: &[AtomGaussian],
        fit_features: &[PharmacophoreGaussian],
    ) -> SimilarityBreakdown {
        let shape_cross = shape_overlap(reference.atom_gaussians(), fit_atoms);
        let shape = self.ratio(shape_cross, self.reference.shape, self.fit.shape);

        let has_features = self.reference.pp > 0.0 || self.fit.pp > 0.0;
        let pharmacophore = if has_features {
            let pp_cross = pp_overlap(reference.pp_gaussians(), fit_features);
            self.ratio(pp_cross, self.reference.pp, self.fit.pp)
        } else {
            0.0
        };

        let overall = if has_features {
            (1.0 - self.pp_weight) * shape + self.pp_weight * pharmacophore
        } else {
            shape
        };
        let coverage = if self.reference.shape > 0.0 {
            (shape_cross / self.reference.shape).clamp(0.0, 1.0)
        } else {
            0.0
        };

        SimilarityBreakdown {
            overall,
            pharmacophore,
            shape,
            coverage,
        }
    }

    /// Score a fit volume in its current pose
    pub fn score_volume(&self, reference: &ShapeVolume, fit: &ShapeVolume) -> SimilarityBreakdown {
        self.score(reference, fit.atom_gaussians(), fit.pp_gaussians())
    }
}
