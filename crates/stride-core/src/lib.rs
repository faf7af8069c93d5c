//! stride-core
//!
//! Fixed-size linear algebra kernels for the stride dynamics workspace:
//! 3-vectors, 3x3 matrices and quaternions over a build-time scalar type.
//! These routines are the hot kernel of the simulation loop, so everything
//! is plain scalar arithmetic on `Copy` structs. No heap, no dynamic
//! dispatch, no SIMD heroics.
//!
//! Conventions:
//! - `Real` is `f64` by default; enable the `f32` feature for single
//!   precision.
//! - Quaternions are stored `(w, x, y, z)` with `w` the scalar part and map
//!   body coordinates to world coordinates when unit.
//! - Matrices are row-major; `mul_vec` computes `M v`, `tr_mul_vec` computes
//!   `M^T v`.
//! - `normalize` on vectors and quaternions reports failure (and leaves the
//!   input untouched) when the squared norm falls below [`NORM_EPS`]; this
//!   is the shared degenerate-input policy of the whole engine.

use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Scalar type used throughout the workspace.
#[cfg(not(feature = "f32"))]
pub type Real = f64;
/// Scalar type used throughout the workspace.
#[cfg(feature = "f32")]
pub type Real = f32;

/// Pi at the working precision.
#[cfg(not(feature = "f32"))]
pub const PI: Real = core::f64::consts::PI;
/// Pi at the working precision.
#[cfg(feature = "f32")]
pub const PI: Real = core::f32::consts::PI;

/// Squared-norm threshold below which normalization refuses to divide.
pub const NORM_EPS: Real = 1e-7;

// ----------------------------- 3-vectors -----------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: Real,
    pub y: Real,
    pub z: Real,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: Real, y: Real, z: Real) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    #[inline]
    pub fn scale(self, k: Real) -> Self {
        Self { x: self.x * k, y: self.y * k, z: self.z * k }
    }

    /// `self + k * other`, the integrator's fused update pattern.
    #[inline]
    pub fn add_scaled(self, other: Self, k: Real) -> Self {
        Self {
            x: self.x + k * other.x,
            y: self.y + k * other.y,
            z: self.z + k * other.z,
        }
    }

    #[inline]
    pub fn dot(self, b: Self) -> Real {
        self.x * b.x + self.y * b.y + self.z * b.z
    }

    #[inline]
    pub fn cross(self, b: Self) -> Self {
        Self {
            x: self.y * b.z - b.y * self.z,
            y: -self.x * b.z + b.x * self.z,
            z: self.x * b.y - b.x * self.y,
        }
    }

    #[inline]
    pub fn norm_squared(self) -> Real {
        self.dot(self)
    }

    #[inline]
    pub fn norm(self) -> Real {
        self.dot(self).sqrt()
    }

    /// Normalizes in place. Returns `false` and leaves the vector unchanged
    /// when the squared norm is below [`NORM_EPS`].
    #[inline]
    pub fn normalize(&mut self) -> bool {
        let len2 = self.norm_squared();
        if len2 < NORM_EPS {
            return false;
        }
        let len = len2.sqrt();
        self.x /= len;
        self.y /= len;
        self.z /= len;
        true
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3 { x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3 { x: self.x - rhs.x, y: self.y - rhs.y, z: self.z - rhs.z }
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3 { x: -self.x, y: -self.y, z: -self.z }
    }
}

impl Mul<Real> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, k: Real) -> Vec3 {
        self.scale(k)
    }
}

// ----------------------------- 3x3 matrices -----------------------------

/// Row-major 3x3 matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mtx3 {
    pub m: [[Real; 3]; 3],
}

impl Mtx3 {
    #[inline]
    pub const fn zero() -> Self {
        Self { m: [[0.0; 3]; 3] }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }

    #[inline]
    pub const fn from_diagonal(d: Vec3) -> Self {
        Self {
            m: [
                [d.x, 0.0, 0.0],
                [0.0, d.y, 0.0],
                [0.0, 0.0, d.z],
            ],
        }
    }

    #[inline]
    pub fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self {
            m: [
                [r0.x, r0.y, r0.z],
                [r1.x, r1.y, r1.z],
                [r2.x, r2.y, r2.z],
            ],
        }
    }

    #[inline]
    pub fn row(&self, i: usize) -> Vec3 {
        Vec3::new(self.m[i][0], self.m[i][1], self.m[i][2])
    }

    #[inline]
    pub fn col(&self, j: usize) -> Vec3 {
        Vec3::new(self.m[0][j], self.m[1][j], self.m[2][j])
    }

    /// `M v`
    #[inline]
    pub fn mul_vec(&self, v: Vec3) -> Vec3 {
        Vec3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }

    /// `M^T v`
    #[inline]
    pub fn tr_mul_vec(&self, v: Vec3) -> Vec3 {
        Vec3::new(self.col(0).dot(v), self.col(1).dot(v), self.col(2).dot(v))
    }

    /// `A B`
    pub fn mul(&self, b: &Mtx3) -> Mtx3 {
        let mut out = Mtx3::zero();
        for i in 0..3 {
            for j in 0..3 {
                out.m[i][j] = self.row(i).dot(b.col(j));
            }
        }
        out
    }

    /// `A B^T`
    pub fn mul_transpose(&self, b: &Mtx3) -> Mtx3 {
        let mut out = Mtx3::zero();
        for i in 0..3 {
            for j in 0..3 {
                out.m[i][j] = self.row(i).dot(b.row(j));
            }
        }
        out
    }

    #[inline]
    pub fn transpose(&self) -> Mtx3 {
        Mtx3::from_rows(self.col(0), self.col(1), self.col(2))
    }
}

// ----------------------------- quaternions -----------------------------

/// Quaternion `(w, x, y, z)`, scalar part first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub w: Real,
    pub x: Real,
    pub y: Real,
    pub z: Real,
}

impl Quat {
    #[inline]
    pub const fn new(w: Real, x: Real, y: Real, z: Real) -> Self {
        Self { w, x, y, z }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Vector (imaginary) part.
    #[inline]
    pub fn vec(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn conj(self) -> Self {
        Self { w: self.w, x: -self.x, y: -self.y, z: -self.z }
    }

    #[inline]
    pub fn scale(self, k: Real) -> Self {
        Self { w: self.w * k, x: self.x * k, y: self.y * k, z: self.z * k }
    }

    /// Hamilton product `self * b`.
    #[inline]
    pub fn mul(self, b: Self) -> Self {
        Self {
            w: self.w * b.w - self.x * b.x - self.y * b.y - self.z * b.z,
            x: self.w * b.x + self.x * b.w + self.y * b.z - self.z * b.y,
            y: self.w * b.y - self.x * b.z + self.y * b.w + self.z * b.x,
            z: self.w * b.z + self.x * b.y - self.y * b.x + self.z * b.w,
        }
    }

    /// Product of the pure-vector quaternion `(0, omega)` with `q`. This is
    /// the building block of the attitude time-derivative
    /// `dq/dt = 1/2 (0, omega) q`.
    #[inline]
    pub fn omega_mul(omega: Vec3, q: Quat) -> Quat {
        let qv = q.vec();
        let cross = omega.cross(qv);
        Quat {
            w: -omega.dot(qv),
            x: omega.x * q.w + cross.x,
            y: omega.y * q.w + cross.y,
            z: omega.z * q.w + cross.z,
        }
    }

    /// Normalizes in place. Returns `false` and leaves the quaternion
    /// unchanged when the squared magnitude is below [`NORM_EPS`].
    #[inline]
    pub fn normalize(&mut self) -> bool {
        let mag2 = self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z;
        if mag2 < NORM_EPS {
            return false;
        }
        let mag = mag2.sqrt();
        self.w /= mag;
        self.x /= mag;
        self.y /= mag;
        self.z /= mag;
        true
    }

    pub fn from_axis_angle(axis: Vec3, angle: Real) -> Self {
        let mut n = axis;
        if !n.normalize() {
            return Quat::identity();
        }
        let half = 0.5 * angle;
        let (s, c) = half.sin_cos();
        Quat { w: c, x: n.x * s, y: n.y * s, z: n.z * s }
    }

    /// Rotation matrix of a unit quaternion.
    pub fn to_rotation(self) -> Mtx3 {
        let Quat { w, x, y, z } = self;
        Mtx3 {
            m: [
                [
                    1.0 - 2.0 * y * y - 2.0 * z * z,
                    2.0 * x * y - 2.0 * w * z,
                    2.0 * x * z + 2.0 * w * y,
                ],
                [
                    2.0 * x * y + 2.0 * w * z,
                    1.0 - 2.0 * x * x - 2.0 * z * z,
                    2.0 * y * z - 2.0 * w * x,
                ],
                [
                    2.0 * x * z - 2.0 * w * y,
                    2.0 * y * z + 2.0 * w * x,
                    1.0 - 2.0 * x * x - 2.0 * y * y,
                ],
            ],
        }
    }

    /// Rotates a vector by a unit quaternion: `q (0, v) q*`.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Quat { w: 0.0, x: v.x, y: v.y, z: v.z };
        let r = self.mul(qv).mul(self.conj());
        Vec3::new(r.x, r.y, r.z)
    }
}

impl Add for Quat {
    type Output = Quat;
    #[inline]
    fn add(self, rhs: Quat) -> Quat {
        Quat {
            w: self.w + rhs.w,
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(x), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn normalize_refuses_tiny_vectors() {
        let mut v = Vec3::new(1e-4, 0.0, 0.0); // norm^2 = 1e-8 < NORM_EPS
        assert!(!v.normalize());
        assert_eq!(v, Vec3::new(1e-4, 0.0, 0.0));

        let mut v = Vec3::new(3.0, 4.0, 0.0);
        assert!(v.normalize());
        assert_relative_eq!(v.norm(), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn matrix_vector_products() {
        let m = Mtx3::from_rows(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        let v = Vec3::new(1.0, -1.0, 2.0);
        assert_eq!(m.mul_vec(v), Vec3::new(5.0, 11.0, 17.0));
        assert_eq!(m.tr_mul_vec(v), m.transpose().mul_vec(v));
    }

    #[test]
    fn mul_transpose_matches_explicit_transpose() {
        let a = Mtx3::from_rows(
            Vec3::new(0.5, -1.0, 2.0),
            Vec3::new(3.0, 0.25, -0.75),
            Vec3::new(-2.0, 1.5, 1.0),
        );
        let b = Mtx3::from_rows(
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(0.0, -1.0, 1.0),
            Vec3::new(2.0, 0.5, 3.0),
        );
        let lhs = a.mul_transpose(&b);
        let rhs = a.mul(&b.transpose());
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(lhs.m[i][j], rhs.m[i][j], max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn quaternion_product_composes_rotations() {
        let qa = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.5 * PI);
        let qb = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.5 * PI);
        let q = qa.mul(qb); // full half turn about z
        let v = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_matrix_matches_quaternion_rotation() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5), 0.8);
        let r = q.to_rotation();
        for v in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.2, -1.3, 0.7),
            Vec3::new(0.0, 0.0, 1.0),
        ] {
            let a = r.mul_vec(v);
            let b = q.rotate(v);
            assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
            assert_relative_eq!(a.z, b.z, epsilon = 1e-12);
        }
    }

    #[test]
    fn axis_angle_to_matrix_round_trip() {
        // Rodrigues' formula as the independent reference.
        let axis = {
            let mut a = Vec3::new(0.3, -0.4, 0.866);
            assert!(a.normalize());
            a
        };
        let angle: Real = 1.1;
        let q = Quat::from_axis_angle(axis, angle);
        let r = q.to_rotation();

        let v = Vec3::new(0.7, 0.1, -0.4);
        let (s, c) = angle.sin_cos();
        let rodrigues = v.scale(c) + axis.cross(v).scale(s) + axis.scale(axis.dot(v) * (1.0 - c));
        let rotated = r.mul_vec(v);
        assert_relative_eq!(rotated.x, rodrigues.x, epsilon = 1e-7);
        assert_relative_eq!(rotated.y, rodrigues.y, epsilon = 1e-7);
        assert_relative_eq!(rotated.z, rodrigues.z, epsilon = 1e-7);
    }

    #[test]
    fn omega_product_is_pure_quaternion_product() {
        let omega = Vec3::new(0.4, -1.2, 2.0);
        let q = Quat::from_axis_angle(Vec3::new(0.1, 0.9, 0.3), -0.6);
        let direct = Quat::new(0.0, omega.x, omega.y, omega.z).mul(q);
        let fused = Quat::omega_mul(omega, q);
        assert_relative_eq!(fused.w, direct.w, epsilon = 1e-12);
        assert_relative_eq!(fused.x, direct.x, epsilon = 1e-12);
        assert_relative_eq!(fused.y, direct.y, epsilon = 1e-12);
        assert_relative_eq!(fused.z, direct.z, epsilon = 1e-12);
    }

    #[test]
    fn quaternion_normalize_failure_policy() {
        let mut q = Quat::new(1e-4, 1e-4, 0.0, 0.0);
        assert!(!q.normalize());
        assert_eq!(q, Quat::new(1e-4, 1e-4, 0.0, 0.0));

        let mut q = Quat::new(2.0, 0.0, 0.0, 0.0);
        assert!(q.normalize());
        assert_eq!(q, Quat::identity());
    }
}
