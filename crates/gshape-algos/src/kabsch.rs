//! Kabsch algorithm for optimal rigid-body superposition
//!
//! Given two sets of corresponding 3D points, finds the proper rotation
//! and translation that minimizes the (weighted) RMSD.

use lin_alg::f64::Vec3;

use crate::linalg::mat3::{self, Mat3};
use crate::linalg::svd3::svd3;
use crate::{GeomError, GeomResult};

/// Result of Kabsch superposition
#[derive(Debug, Clone)]
pub struct KabschResult {
    /// Row-major proper rotation
    pub rotation: Mat3,
    /// Translation vector (applied after rotation)
    pub translation: Vec3,
    /// Weighted RMSD after superposition
    pub rmsd: f64,
    /// Number of point pairs used
    pub n_points: usize,
}

impl KabschResult {
    /// Map a source point onto the target frame: `R · p + t`
    #[inline]
    pub fn apply(&self, p: Vec3) -> Vec3 {
        mat3::mul_vec(&self.rotation, p) + self.translation
    }
}

/// Compute optimal superposition of `source` onto `target`.
///
/// Returns the transformation that maps source → target. Both slices must
/// have the same length (≥ 3). Optional `weights` must be non-negative with
/// a positive sum.
pub fn kabsch(source: &[Vec3], target: &[Vec3], weights: Option<&[f64]>) -> GeomResult<KabschResult> {
    let n = source.len();
    if n != target.len() {
        return Err(GeomError::LengthMismatch(n, target.len()));
    }
    if n < 3 {
        return Err(GeomError::TooFewPoints(n));
    }
    if let Some(w) = weights {
        if w.len() != n {
            return Err(GeomError::LengthMismatch(n, w.len()));
        }
        if w.iter().any(|&x| x < 0.0 || !x.is_finite()) {
            return Err(GeomError::InvalidWeights);
        }
    }
    let finite = |p: &Vec3| p.x.is_finite() && p.y.is_finite() && p.z.is_finite();
    if !source.iter().all(finite) || !target.iter().all(finite) {
        return Err(GeomError::NonFinite);
    }

    let weight = |i: usize| weights.map_or(1.0, |w| w[i]);
    let total_weight: f64 = (0..n).map(weight).sum();
    if total_weight <= 0.0 {
        return Err(GeomError::InvalidWeights);
    }

    // 1. Weighted centroids
    let mut cs = Vec3::new_zero();
    let mut ct = Vec3::new_zero();
    for i in 0..n {
        cs = cs + source[i] * weight(i);
        ct = ct + target[i] * weight(i);
    }
    let centroid_src = cs * (1.0 / total_weight);
    let centroid_tgt = ct * (1.0 / total_weight);

    // 2. Cross-covariance H = Σ w_i · p_i ⊗ q_i  (H[j][k] = Σ w p_j q_k)
    let mut h = [[0.0f64; 3]; 3];
    for i in 0..n {
        let w = weight(i);
        let p = source[i] - centroid_src;
        let q = target[i] - centroid_tgt;
        let pa = [p.x, p.y, p.z];
        let qa = [q.x, q.y, q.z];
        for j in 0..3 {
            for k in 0..3 {
                h[j][k] += w * pa[j] * qa[k];
            }
        }
    }

    // 3. R = V · diag(1, 1, d) · Uᵀ with d correcting reflections
    let svd = svd3(&h);
    let d = if mat3::det(&svd.v) * mat3::det(&svd.u) < 0.0 { -1.0 } else { 1.0 };
    let vd = mat3::mul(&svd.v, &mat3::diag([1.0, 1.0, d]));
    let rotation = mat3::mul(&vd, &mat3::transpose(&svd.u));

    // 4. t = c_target - R · c_source
    let translation = centroid_tgt - mat3::mul_vec(&rotation, centroid_src);

    let mut sum_sq = 0.0;
    for i in 0..n {
        let moved = mat3::mul_vec(&rotation, source[i]) + translation;
        sum_sq += weight(i) * (moved - target[i]).magnitude_squared();
    }

    Ok(KabschResult {
        rotation,
        translation,
        rmsd: (sum_sq / total_weight).sqrt(),
        n_points: n,
    })
}
