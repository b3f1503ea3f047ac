//! Symmetric 3×3 eigendecomposition
//!
//! Cyclic Jacobi rotations on a real symmetric matrix. Used for principal
//! axes of inertia and as the core of [`super::svd3`].

use super::mat3::{self, Mat3};

const MAX_SWEEPS: usize = 50;

/// Eigendecomposition `M = V · diag(values) · Vᵀ` of a symmetric matrix
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues sorted in descending order
    pub values: [f64; 3],
    /// Eigenvectors as columns (`vectors[row][col]`, column `i` belongs to
    /// `values[i]`). Always a proper rotation (det = +1).
    pub vectors: Mat3,
}

/// Decompose a symmetric 3×3 matrix. Only the upper triangle is read.
pub fn symmetric_eigen(m: &Mat3) -> SymmetricEigen {
    let mut a = [
        [m[0][0], m[0][1], m[0][2]],
        [m[0][1], m[1][1], m[1][2]],
        [m[0][2], m[1][2], m[2][2]],
    ];
    let mut v = mat3::IDENTITY;

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().max(1e-300);

    for _ in 0..MAX_SWEEPS {
        let off = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
        if off <= 1e-28 * scale {
            break;
        }
        for &(p, q) in &[(0usize, 1usize), (0, 2), (1, 2)] {
            if a[p][q].abs() < 1e-300 {
                continue;
            }
            jacobi_rotate(&mut a, &mut v, p, q);
        }
    }

    let raw = [a[0][0], a[1][1], a[2][2]];
    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| raw[j].total_cmp(&raw[i]));

    let mut vectors = [[0.0f64; 3]; 3];
    for (col, &src) in order.iter().enumerate() {
        for row in 0..3 {
            vectors[row][col] = v[row][src];
        }
    }
    if mat3::det(&vectors) < 0.0 {
        for row in vectors.iter_mut() {
            row[2] = -row[2];
        }
    }

    SymmetricEigen {
        values: [raw[order[0]], raw[order[1]], raw[order[2]]],
        vectors,
    }
}

/// Apply a single Jacobi rotation to eliminate `a[p][q]`.
fn jacobi_rotate(a: &mut Mat3, v: &mut Mat3, p: usize, q: usize) {
    let app = a[p][p];
    let aqq = a[q][q];
    let apq = a[p][q];

    let (c, s) = if (app - aqq).abs() < 1e-300 {
        let inv_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        (inv_sqrt2, if apq > 0.0 { inv_sqrt2 } else { -inv_sqrt2 })
    } else {
        let tau = (aqq - app) / (2.0 * apq);
        let t = if tau >= 0.0 {
            1.0 / (tau + (1.0 + tau * tau).sqrt())
        } else {
            -1.0 / (-tau + (1.0 + tau * tau).sqrt())
        };
        let c = 1.0 / (1.0 + t * t).sqrt();
        (c, t * c)
    };

    // A' = Gᵀ A G with G the Givens rotation in the (p, q) plane
    a[p][p] = c * c * app - 2.0 * s * c * apq + s * s * aqq;
    a[q][q] = s * s * app + 2.0 * s * c * apq + c * c * aqq;
    a[p][q] = 0.0;
    a[q][p] = 0.0;

    let r = 3 - p - q;
    let arp = a[r][p];
    let arq = a[r][q];
    a[r][p] = c * arp - s * arq;
    a[p][r] = a[r][p];
    a[r][q] = s * arp + c * arq;
    a[q][r] = a[r][q];

    // V' = V · G
    for row in v.iter_mut() {
        let vip = row[p];
        let viq = row[q];
        row[p] = c * vip - s * viq;
        row[q] = s * vip + c * viq;
    }
}
