//! Gaussian shape and pharmacophore features
//!
//! Atoms are modelled as first-order spherical Gaussians of height
//! [`GAUSSIAN_HEIGHT`] whose exponent reproduces the hard-sphere VdW volume.
//! Pharmacophore features are Gaussians tagged with a [`FeatureKind`] and an
//! optional unit direction.

use std::f64::consts::PI;
use std::fmt;

use lin_alg::f64::Vec3;

use crate::transform::RigidTransform;

/// Gaussian amplitude used for every atom and feature
pub const GAUSSIAN_HEIGHT: f64 = 2.7;

/// Exponent constant: `alpha = GAUSSIAN_KAPPA / r²`
pub const GAUSSIAN_KAPPA: f64 = 2.41798793102;

/// Width of pharmacophore feature Gaussians (Å)
pub const FEATURE_RADIUS: f64 = 1.0;

/// Below this exponent-scaled squared distance, overlap is computed;
/// beyond it the contribution is negligible.
const OVERLAP_CUTOFF: f64 = 25.0;

#[inline]
fn exponent_for_radius(radius: f64) -> f64 {
    GAUSSIAN_KAPPA / (radius * radius)
}

/// Overlap volume of two spherical Gaussians
#[inline]
pub fn gaussian_overlap(a_center: Vec3, a_alpha: f64, b_center: Vec3, b_alpha: f64) -> f64 {
    let sum = a_alpha + b_alpha;
    let d2 = (a_center - b_center).magnitude_squared();
    let exponent = a_alpha * b_alpha * d2 / sum;
    if exponent > OVERLAP_CUTOFF {
        return 0.0;
    }
    GAUSSIAN_HEIGHT * GAUSSIAN_HEIGHT * (PI / sum).powf(1.5) * (-exponent).exp()
}

/// Functional role of a pharmacophore feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    Acceptor,
    Donor,
    NegativeCharge,
    PositiveCharge,
    AromaticRing,
    LipophilicRing,
    /// Attachment/growth point of a fragment
    ExitVector,
}

impl FeatureKind {
    /// Ring-derived features (stripped for negative-image searches)
    pub fn is_ring(&self) -> bool {
        matches!(self, FeatureKind::AromaticRing | FeatureKind::LipophilicRing)
    }

    /// Ring normals have no preferred sign
    pub fn has_symmetric_direction(&self) -> bool {
        self.is_ring()
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Acceptor => "acceptor",
            FeatureKind::Donor => "donor",
            FeatureKind::NegativeCharge => "negative_charge",
            FeatureKind::PositiveCharge => "positive_charge",
            FeatureKind::AromaticRing => "aromatic_ring",
            FeatureKind::LipophilicRing => "lipophilic_ring",
            FeatureKind::ExitVector => "exit_vector",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spherical Gaussian standing in for one heavy atom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomGaussian {
    /// Index of the source atom
    pub atom: usize,
    pub center: Vec3,
    pub alpha: f64,
    pub weight: f64,
}

impl AtomGaussian {
    pub fn from_radius(atom: usize, center: Vec3, radius: f64) -> Self {
        Self {
            atom,
            center,
            alpha: exponent_for_radius(radius),
            weight: 1.0,
        }
    }

    /// Volume of this Gaussian on its own
    pub fn volume(&self) -> f64 {
        GAUSSIAN_HEIGHT * (PI / self.alpha).powf(1.5)
    }

    /// Weighted overlap with another atom Gaussian
    #[inline]
    pub fn overlap(&self, other: &AtomGaussian) -> f64 {
        self.weight * other.weight * gaussian_overlap(self.center, self.alpha, other.center, other.alpha)
    }

    pub fn transform(&mut self, t: &RigidTransform) {
        self.center = t.apply_point(self.center);
    }
}

/// Pharmacophore feature Gaussian
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PharmacophoreGaussian {
    pub kind: FeatureKind,
    pub center: Vec3,
    /// Unit direction (donor/acceptor vector, ring normal, exit bond)
    pub direction: Option<Vec3>,
    pub alpha: f64,
    pub weight: f64,
}

impl PharmacophoreGaussian {
    pub fn new(kind: FeatureKind, center: Vec3, direction: Option<Vec3>) -> Self {
        Self {
            kind,
            center,
            direction: direction.and_then(unit),
            alpha: exponent_for_radius(FEATURE_RADIUS),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Agreement of the two feature directions in `[0, 1]`; 1 when either
    /// side has no direction.
    pub fn direction_agreement(&self, other: &PharmacophoreGaussian) -> f64 {
        match (self.direction, other.direction) {
            (Some(a), Some(b)) => {
                let cos = a.dot(b).clamp(-1.0, 1.0);
                if self.kind.has_symmetric_direction() {
                    cos.abs()
                } else {
                    0.5 * (1.0 + cos)
                }
            }
            _ => 1.0,
        }
    }

    /// Direction-scaled overlap weighted by this feature's weight only;
    /// zero for different kinds. `other.weight` does not enter, so the
    /// receiver decides the weighting of the pair.
    pub fn overlap(&self, other: &PharmacophoreGaussian) -> f64 {
        if self.kind != other.kind {
            return 0.0;
        }
        let base = gaussian_overlap(self.center, self.alpha, other.center, other.alpha);
        if base == 0.0 {
            return 0.0;
        }
        self.weight * base * self.direction_agreement(other)
    }

    pub fn transform(&mut self, t: &RigidTransform) {
        self.center = t.apply_point(self.center);
        self.direction = self.direction.map(|d| t.apply_direction(d));
    }
}

fn unit(v: Vec3) -> Option<Vec3> {
    let len = v.magnitude();
    (len > 1e-9 && len.is_finite()).then(|| v * (1.0 / len))
}
