//! Analytical 3×3 SVD decomposition
//!
//! Computes A = U · diag(S) · Vᵀ for a 3×3 matrix from the symmetric
//! eigendecomposition of AᵀA. All matrices are row-major: `m[row][col]`.

use lin_alg::f64::Vec3;

use super::eigen3::symmetric_eigen;
use super::mat3::{self, Mat3};

const SINGULAR_EPS: f64 = 1e-12;

/// Result of 3×3 SVD decomposition: A = U · diag(S) · Vᵀ
#[derive(Debug, Clone)]
pub struct Svd3 {
    /// Left singular vectors as columns
    pub u: Mat3,
    /// Singular values (sorted descending, non-negative)
    pub s: [f64; 3],
    /// Right singular vectors as columns (det = +1)
    pub v: Mat3,
}

/// Compute the SVD of a 3×3 matrix
pub fn svd3(a: &Mat3) -> Svd3 {
    let ata = mat3::mul(&mat3::transpose(a), a);
    let eig = symmetric_eigen(&ata);

    let s = [
        eig.values[0].max(0.0).sqrt(),
        eig.values[1].max(0.0).sqrt(),
        eig.values[2].max(0.0).sqrt(),
    ];
    let v = eig.vectors;
    let threshold = SINGULAR_EPS * s[0].max(1.0);

    // u_i = A · v_i / s_i
    let mut u_cols = [Vec3::new_zero(); 3];
    for i in 0..3 {
        if s[i] > threshold {
            u_cols[i] = mat3::mul_vec(a, mat3::column(&v, i)) * (1.0 / s[i]);
        }
    }

    if s[0] > threshold && s[1] > threshold && s[2] <= threshold {
        u_cols[2] = u_cols[0].cross(u_cols[1]).to_normalized();
    } else if s[0] > threshold && s[1] <= threshold {
        u_cols[1] = arbitrary_perpendicular(u_cols[0]);
        u_cols[2] = u_cols[0].cross(u_cols[1]).to_normalized();
    } else if s[0] <= threshold {
        u_cols = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
    }

    let u = mat3::transpose(&mat3::from_rows(u_cols[0], u_cols[1], u_cols[2]));
    Svd3 { u, s, v }
}

fn arbitrary_perpendicular(v: Vec3) -> Vec3 {
    let candidate = if v.x.abs() < v.y.abs() && v.x.abs() < v.z.abs() {
        Vec3::new(1.0, 0.0, 0.0)
    } else if v.y.abs() < v.z.abs() {
        Vec3::new(0.0, 1.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, 1.0)
    };
    v.cross(candidate).to_normalized()
}
