//! Rigid-body transforms
//!
//! [`RigidTransform`] is a single rotation followed by a translation.
//! [`TransformSequence`] is an ordered list of rigid transforms applied
//! front to back; appending another sequence composes in order, so a seed
//! pose followed by its refinement corrections stays one value.

use lin_alg::f64::Vec3;

use gshape_algos::linalg::mat3::{self, Mat3};

/// Rotation followed by translation: `x' = R · x + t`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Row-major proper rotation
    pub rotation: Mat3,
    pub translation: Vec3,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn new(rotation: Mat3, translation: Vec3) -> Self {
        Self { rotation, translation }
    }

    pub fn identity() -> Self {
        Self::new(mat3::IDENTITY, Vec3::new_zero())
    }

    /// Pure rotation about the origin
    pub fn from_rotation(rotation: Mat3) -> Self {
        Self::new(rotation, Vec3::new_zero())
    }

    /// Pure translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(mat3::IDENTITY, translation)
    }

    /// Rotation about `center` instead of the origin:
    /// `x' = R · (x - c) + c`
    pub fn about_center(rotation: Mat3, center: Vec3) -> Self {
        Self::new(rotation, center - mat3::mul_vec(&rotation, center))
    }

    /// Transform a point
    #[inline]
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        mat3::mul_vec(&self.rotation, p) + self.translation
    }

    /// Transform a direction (rotation only)
    #[inline]
    pub fn apply_direction(&self, d: Vec3) -> Vec3 {
        mat3::mul_vec(&self.rotation, d)
    }

    /// Composition applying `self` first, then `next`
    pub fn then(&self, next: &RigidTransform) -> RigidTransform {
        RigidTransform {
            rotation: mat3::mul(&next.rotation, &self.rotation),
            translation: mat3::mul_vec(&next.rotation, self.translation) + next.translation,
        }
    }

    /// Inverse transform: `x = Rᵀ · (x' - t)`
    pub fn inverse(&self) -> RigidTransform {
        let rt = mat3::transpose(&self.rotation);
        RigidTransform {
            rotation: rt,
            translation: -mat3::mul_vec(&rt, self.translation),
        }
    }

    /// Check if approximately identity
    pub fn is_identity(&self, tol: f64) -> bool {
        mat3::is_identity(&self.rotation, tol)
            && self.translation.x.abs() < tol
            && self.translation.y.abs() < tol
            && self.translation.z.abs() < tol
    }
}

/// Ordered sequence of rigid transforms applied front to back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformSequence {
    steps: Vec<RigidTransform>,
}

impl From<RigidTransform> for TransformSequence {
    fn from(t: RigidTransform) -> Self {
        Self { steps: vec![t] }
    }
}

impl TransformSequence {
    /// Empty sequence (identity)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transform at the end
    pub fn push(&mut self, t: RigidTransform) {
        self.steps.push(t);
    }

    /// Append all steps of `other` after the existing ones
    pub fn append(&mut self, other: &TransformSequence) {
        self.steps.extend_from_slice(&other.steps);
    }

    /// Builder-style [`append`](Self::append)
    pub fn followed_by(mut self, other: &TransformSequence) -> Self {
        self.append(other);
        self
    }

    pub fn steps(&self) -> &[RigidTransform] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Collapse into a single equivalent rigid transform
    pub fn collapse(&self) -> RigidTransform {
        self.steps
            .iter()
            .fold(RigidTransform::identity(), |acc, t| acc.then(t))
    }

    /// Sequence undoing this one (reversed order, each step inverted)
    pub fn inverse(&self) -> TransformSequence {
        TransformSequence {
            steps: self.steps.iter().rev().map(RigidTransform::inverse).collect(),
        }
    }

    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.steps.iter().fold(p, |acc, t| t.apply_point(acc))
    }

    pub fn apply_direction(&self, d: Vec3) -> Vec3 {
        self.steps.iter().fold(d, |acc, t| t.apply_direction(acc))
    }

    /// Transform raw coordinates in place
    pub fn apply_points(&self, points: &mut [Vec3]) {
        let t = self.collapse();
        for p in points.iter_mut() {
            *p = t.apply_point(*p);
        }
    }

    pub fn is_identity(&self, tol: f64) -> bool {
        self.collapse().is_identity(tol)
    }
}
