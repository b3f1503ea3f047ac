//! 3×3 row-major matrix utilities
//!
//! Rotation matrices are stored as `m[row][col]` and act on column
//! vectors: `v' = M · v`.

use lin_alg::f64::Vec3;

/// Row-major 3×3 matrix: `m[row][col]`
pub type Mat3 = [[f64; 3]; 3];

/// The 3×3 identity matrix
pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Matrix product `a · b`
pub fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0f64; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            out[row][col] = a[row][0] * b[0][col] + a[row][1] * b[1][col] + a[row][2] * b[2][col];
        }
    }
    out
}

/// Transpose of `m` (the inverse for a proper rotation)
pub fn transpose(m: &Mat3) -> Mat3 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Apply `m` to a vector: `M · v`
#[inline]
pub fn mul_vec(m: &Mat3, v: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
        m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
        m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
    )
}

/// Determinant of `m`
pub fn det(m: &Mat3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Build a matrix whose rows are the given vectors
pub fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Mat3 {
    [[r0.x, r0.y, r0.z], [r1.x, r1.y, r1.z], [r2.x, r2.y, r2.z]]
}

/// Column `j` of `m` as a vector
pub fn column(m: &Mat3, j: usize) -> Vec3 {
    Vec3::new(m[0][j], m[1][j], m[2][j])
}

/// Row `i` of `m` as a vector
pub fn row(m: &Mat3, i: usize) -> Vec3 {
    Vec3::new(m[i][0], m[i][1], m[i][2])
}

/// Diagonal matrix
pub fn diag(d: [f64; 3]) -> Mat3 {
    [[d[0], 0.0, 0.0], [0.0, d[1], 0.0], [0.0, 0.0, d[2]]]
}

/// Rotation of `angle` radians about `axis` (Rodrigues' formula).
///
/// Returns the identity for a zero-length axis.
pub fn from_axis_angle(axis: Vec3, angle: f64) -> Mat3 {
    let len = axis.magnitude();
    if len < 1e-12 {
        return IDENTITY;
    }
    let x = axis.x / len;
    let y = axis.y / len;
    let z = axis.z / len;

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    [
        [t * x * x + c, t * x * y - z * s, t * z * x + y * s],
        [t * x * y + z * s, t * y * y + c, t * y * z - x * s],
        [t * z * x - y * s, t * y * z + x * s, t * z * z + c],
    ]
}

/// Rotation from a rotation vector (exponential map): the direction is the
/// axis, the magnitude the angle in radians.
pub fn from_rotation_vector(v: Vec3) -> Mat3 {
    from_axis_angle(v, v.magnitude())
}

/// Check if `m` is the identity within `tol` per element
pub fn is_identity(m: &Mat3, tol: f64) -> bool {
    (0..3).all(|i| (0..3).all(|j| (m[i][j] - IDENTITY[i][j]).abs() < tol))
}

/// Check if `m` is a proper rotation (orthonormal, det = +1) within `tol`
pub fn is_rotation(m: &Mat3, tol: f64) -> bool {
    let mtm = mul(&transpose(m), m);
    is_identity(&mtm, tol) && (det(m) - 1.0).abs() < tol
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_mul_identity() {
        let m = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        assert_eq!(mul(&IDENTITY, &m), m);
        assert_eq!(mul(&m, &IDENTITY), m);
    }

    #[test]
    fn test_axis_angle_quarter_turn() {
        let r = from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let v = mul_vec(&r, Vec3::new(1.0, 0.0, 0.0));
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
        assert!(is_rotation(&r, 1e-10));
    }

    #[test]
    fn test_transpose_is_inverse() {
        let r = from_axis_angle(Vec3::new(1.0, 2.0, -0.5), 0.7);
        assert!(is_identity(&mul(&r, &transpose(&r)), 1e-10));
    }

    #[test]
    fn test_zero_rotation_vector() {
        assert!(is_identity(&from_rotation_vector(Vec3::new(0.0, 0.0, 0.0)), 1e-12));
    }

    #[test]
    fn test_det_reflection() {
        assert!((det(&diag([1.0, 1.0, -1.0])) + 1.0).abs() < 1e-12);
        assert!(!is_rotation(&diag([1.0, 1.0, -1.0]), 1e-6));
    }
}
