//! World storage: the single owning record for one simulation.
//!
//! All per-body, per-hinge, per-motor and per-constraint-row state lives in
//! contiguous arrays owned by [`World`], allocated once in [`World::new`]
//! and never resized. Entities reference each other by index only.

use stride_core::{Mtx3, Quat, Real, Vec3};

use crate::collision::FootContact;

/// Contact points probed per foot (bottom rim triangle).
pub const CONTACTS_PER_FOOT: usize = 3;

/// Constraint rows claimed per foot: three non-penetration rows plus two
/// structurally allocated tangential rows.
pub const ROWS_PER_FOOT: usize = CONTACTS_PER_FOOT + 2;

/// Constraint rows claimed per hinge: three anchor rows plus two axial
/// tangent rows.
pub const ROWS_PER_HINGE: usize = 5;

/// Finite stand-in for "unbounded" multiplier bounds (2^20).
pub const LAMBDA_LIMIT: Real = 1_048_576.0;

/// Default error reduction parameter for hinge position feedback.
pub const DEFAULT_ERP: Real = 0.8;

/// Model size, fixed for the lifetime of a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dims {
    pub bodies: usize,
    pub hinges: usize,
    pub motors: usize,
    pub feet: usize,
}

impl Dims {
    #[must_use]
    pub const fn new(bodies: usize, hinges: usize, motors: usize, feet: usize) -> Self {
        Self { bodies, hinges, motors, feet }
    }

    /// Rows `0..hinge_rows()` belong to hinges.
    #[must_use]
    pub const fn hinge_rows(self) -> usize {
        ROWS_PER_HINGE * self.hinges
    }

    /// Rows `hinge_rows()..hinge_motor_rows()` belong to motors.
    #[must_use]
    pub const fn hinge_motor_rows(self) -> usize {
        self.hinge_rows() + self.motors
    }

    /// Total number of constraint rows; rows `hinge_motor_rows()..rows()`
    /// are the per-foot contact blocks.
    #[must_use]
    pub const fn rows(self) -> usize {
        self.hinge_motor_rows() + ROWS_PER_FOOT * self.feet
    }
}

/// One rigid body: pose, velocities, mass properties and the external
/// wrench accumulated for the current step.
#[derive(Clone, Copy, Debug, Default)]
pub struct Body {
    /// Center-of-mass position, world frame.
    pub pos: Vec3,
    /// Orientation, body to world. Unit after every step.
    pub quat: Quat,
    /// Cached rotation matrix of `quat`; kept in sync at step boundaries
    /// and by [`World::refresh_rotation`].
    pub rot: Mtx3,
    pub vel: Vec3,
    pub omega: Vec3,
    pub inv_mass: Real,
    /// Inverse inertia tensor, body frame.
    pub inv_inertia: Mtx3,
    /// External force, accumulated by the caller, zeroed at end of step.
    pub force: Vec3,
    /// External torque, accumulated by the caller, zeroed at end of step.
    pub torque: Vec3,
}

impl Body {
    /// World-frame inverse inertia `R I_b^{-1} R^T`.
    #[must_use]
    pub fn inv_inertia_world(&self) -> Mtx3 {
        self.rot.mul(&self.inv_inertia.mul_transpose(&self.rot))
    }
}

/// One hinge joint between two bodies. Anchors and axes are stored in each
/// body's local frame; the tangent pair spans the plane perpendicular to
/// the body-0 axis and is stored in body-0 coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hinge {
    pub bodies: [usize; 2],
    pub anchors: [Vec3; 2],
    pub axes: [Vec3; 2],
    pub tangents: [Vec3; 2],
    /// Relative rotation `conj(q0) q1` captured when the hinge (or its
    /// motor) was created; defines the zero of [`World::hinge_angle`].
    pub ref_rot: Quat,
}

/// A torque-limited angular velocity controller attached to a hinge.
#[derive(Clone, Copy, Debug, Default)]
pub struct Motor {
    pub hinge: usize,
    /// Desired angular speed about the hinge axis, rad/s.
    pub desired_speed: Real,
}

/// Which bodies a constraint row acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowBodies {
    /// Both sides of the row are populated; side 0 and side 1 receive
    /// opposite reactions (hinge and motor rows).
    Pair(usize, usize),
    /// Only side 1 is populated (contact rows).
    Single(usize),
}

impl RowBodies {
    /// Iterates the populated `(side, body)` entries of this row.
    pub fn sides(self) -> impl Iterator<Item = (usize, usize)> {
        let sides = match self {
            RowBodies::Pair(b0, b1) => [Some((0, b0)), Some((1, b1))],
            RowBodies::Single(b) => [None, Some((1, b))],
        };
        sides.into_iter().flatten()
    }
}

/// One scalar constraint: a sparse Jacobian row over at most two bodies,
/// bounds on its Lagrange multiplier, and the solver workspace attached to
/// the row.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintRow {
    pub bodies: RowBodies,
    /// Translational Jacobian blocks, one per side.
    pub j_lin: [Vec3; 2],
    /// Angular Jacobian blocks, one per side.
    pub j_ang: [Vec3; 2],
    /// Translational blocks of `B = M^{-1} J^T`.
    pub b_lin: [Vec3; 2],
    /// Angular blocks of `B = M^{-1} J^T`.
    pub b_ang: [Vec3; 2],
    /// Current multiplier; persists across steps as the warm start.
    pub lambda: Real,
    pub lambda_min: Real,
    pub lambda_max: Real,
    /// Diagonal entry of `J B`.
    pub d: Real,
    pub rhs: Real,
}

impl ConstraintRow {
    fn cleared(bodies: RowBodies) -> Self {
        Self {
            bodies,
            j_lin: [Vec3::zero(); 2],
            j_ang: [Vec3::zero(); 2],
            b_lin: [Vec3::zero(); 2],
            b_ang: [Vec3::zero(); 2],
            lambda: 0.0,
            lambda_min: -LAMBDA_LIMIT,
            lambda_max: LAMBDA_LIMIT,
            d: 0.0,
            rhs: 0.0,
        }
    }
}

/// Per-body accumulator for `a = B lambda` (solver workspace).
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Accum {
    pub lin: Vec3,
    pub ang: Vec3,
}

/// The owning record for one simulation: every array lives here, sized by
/// [`Dims`] at construction.
#[derive(Clone, Debug)]
pub struct World {
    pub(crate) dims: Dims,
    /// Error reduction parameter scaling hinge position feedback into the
    /// solver right-hand side.
    pub erp: Real,
    pub(crate) bodies: Box<[Body]>,
    pub(crate) hinges: Box<[Hinge]>,
    pub(crate) motors: Box<[Motor]>,
    pub(crate) rows: Box<[ConstraintRow]>,
    pub(crate) acc: Box<[Accum]>,
    pub(crate) contacts: Box<[FootContact]>,
}

impl World {
    /// Allocates a zeroed world.
    ///
    /// # Panics
    ///
    /// Panics when the dimensions are inconsistent: a hinge needs two
    /// bodies, a motor needs a hinge, a foot needs a body.
    #[must_use]
    pub fn new(dims: Dims) -> Self {
        if dims.hinges > 0 {
            assert!(
                dims.hinges + 1 <= dims.bodies,
                "{} hinges need at least {} bodies",
                dims.hinges,
                dims.hinges + 1
            );
        }
        assert!(dims.motors <= dims.hinges, "more motors than hinges");
        assert!(dims.feet <= dims.bodies, "more feet than bodies");

        let mut world = Self {
            dims,
            erp: DEFAULT_ERP,
            bodies: vec![Body::default(); dims.bodies].into_boxed_slice(),
            hinges: vec![Hinge::default(); dims.hinges].into_boxed_slice(),
            motors: vec![Motor::default(); dims.motors].into_boxed_slice(),
            rows: vec![ConstraintRow::cleared(RowBodies::Single(0)); dims.rows()]
                .into_boxed_slice(),
            acc: vec![Accum::default(); dims.bodies].into_boxed_slice(),
            contacts: vec![FootContact::default(); dims.feet].into_boxed_slice(),
        };
        world.reset();
        world
    }

    /// Zeroes every array and restores the multiplier bounds to the
    /// `+-2^20` sentinel. Also discards the warm-start multipliers; during
    /// normal stepping they are deliberately kept.
    pub fn reset(&mut self) {
        let hmc = self.dims.hinge_motor_rows();
        for body in self.bodies.iter_mut() {
            *body = Body::default();
        }
        for hinge in self.hinges.iter_mut() {
            *hinge = Hinge::default();
        }
        for motor in self.motors.iter_mut() {
            *motor = Motor::default();
        }
        for (s, row) in self.rows.iter_mut().enumerate() {
            // Hinge and motor rows couple a pair of bodies, contact rows a
            // single one; with all-zero Jacobians either kind is a no-op
            // until claimed.
            let bodies = if s < hmc { RowBodies::Pair(0, 0) } else { RowBodies::Single(0) };
            *row = ConstraintRow::cleared(bodies);
        }
        for acc in self.acc.iter_mut() {
            *acc = Accum::default();
        }
        for contact in self.contacts.iter_mut() {
            *contact = FootContact::default();
        }
    }

    #[must_use]
    pub fn dims(&self) -> Dims {
        self.dims
    }

    #[must_use]
    pub fn body(&self, body: usize) -> &Body {
        &self.bodies[body]
    }

    pub fn body_mut(&mut self, body: usize) -> &mut Body {
        &mut self.bodies[body]
    }

    #[must_use]
    pub fn hinge(&self, hinge: usize) -> &Hinge {
        &self.hinges[hinge]
    }

    #[must_use]
    pub fn motor(&self, motor: usize) -> &Motor {
        &self.motors[motor]
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &ConstraintRow {
        &self.rows[row]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut ConstraintRow {
        &mut self.rows[row]
    }

    /// Diagnostic record of the last probe pass for one foot slot.
    #[must_use]
    pub fn foot_contact(&self, foot: usize) -> &FootContact {
        &self.contacts[foot]
    }

    /// Re-derives the cached rotation matrix from the quaternion. Call
    /// after writing [`Body::quat`] directly.
    pub fn refresh_rotation(&mut self, body: usize) {
        let b = &mut self.bodies[body];
        b.rot = b.quat.to_rotation();
    }

    /// Sets the desired angular speed of a motor, rad/s. Read by the solver
    /// when building the right-hand side.
    pub fn set_motor_speed(&mut self, motor: usize, speed: Real) {
        self.motors[motor].desired_speed = speed;
    }

    /// Validates the quaternion/rotation-matrix invariants; intended for
    /// tests and debug builds.
    ///
    /// # Panics
    ///
    /// Panics when a quaternion is not unit length or a cached rotation
    /// matrix has drifted from its quaternion.
    pub fn check_consistency(&self) {
        for (i, body) in self.bodies.iter().enumerate() {
            let q = body.quat;
            let mag = (q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
            assert!(
                (mag - 1.0).abs() < 1e-6,
                "body {i}: quaternion magnitude {mag} drifted from 1"
            );
            let rq = q.to_rotation();
            for r in 0..3 {
                for c in 0..3 {
                    assert!(
                        (body.rot.m[r][c] - rq.m[r][c]).abs() < 1e-7,
                        "body {i}: rotation matrix out of sync at ({r},{c})"
                    );
                }
            }
        }
    }
}
