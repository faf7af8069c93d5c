//! Hinge and motor construction, and the per-step refresh of the
//! orientation-dependent Jacobian entries.
//!
//! A hinge claims five rows: three anchor-coincidence rows whose
//! translational blocks are constant (`+I` / `-I`, written once at
//! creation) and two axial-tangent rows. A motor claims one row after all
//! hinge rows. Everything that depends on body orientation is rewritten by
//! [`World::update_jacobian`] at the top of each step.

use log::debug;
use stride_core::{Quat, Real, Vec3};

use crate::world::{RowBodies, World, ROWS_PER_HINGE};

/// Relative rotation `conj(q0) q1` between two orientations.
fn relative_rotation(q0: Quat, q1: Quat) -> Quat {
    q0.conj().mul(q1)
}

impl World {
    /// Creates hinge `hinge` between `b0` and `b1` through the world-space
    /// anchor point, rotating about the world-space axis.
    ///
    /// Anchors and axes are converted into each body's local frame, so the
    /// joint follows the bodies from then on. The current relative
    /// orientation of the pair becomes the zero reference for
    /// [`World::hinge_angle`].
    ///
    /// # Panics
    ///
    /// Panics on out-of-range indices, `b0 == b1`, or a near-zero axis.
    pub fn create_hinge(
        &mut self,
        hinge: usize,
        b0: usize,
        b1: usize,
        anchor_world: Vec3,
        axis_world: Vec3,
    ) {
        assert!(hinge < self.dims.hinges, "hinge index {hinge} out of range");
        assert!(b0 < self.dims.bodies, "body index {b0} out of range");
        assert!(b1 < self.dims.bodies, "body index {b1} out of range");
        assert!(b0 != b1, "hinge must connect two distinct bodies");

        let mut axis = axis_world;
        assert!(axis.normalize(), "hinge axis must have non-zero length");

        for s in ROWS_PER_HINGE * hinge..ROWS_PER_HINGE * (hinge + 1) {
            self.rows[s].bodies = RowBodies::Pair(b0, b1);
        }

        self.hinges[hinge].bodies = [b0, b1];
        for (side, body) in [b0, b1].into_iter().enumerate() {
            let b = &self.bodies[body];
            self.hinges[hinge].anchors[side] = b.rot.tr_mul_vec(anchor_world - b.pos);
            self.hinges[hinge].axes[side] = b.rot.tr_mul_vec(axis);
        }

        // Tangent base perpendicular to the body-0 axis: take a component
        // that is comfortably non-zero, swap it with a neighbour and flip
        // the sign, then complete with a cross product.
        let a = {
            let v = self.hinges[hinge].axes[0];
            [v.x, v.y, v.z]
        };
        let mut t0: [Real; 3] = [0.0; 3];
        for i in 0..3 {
            if a[i] * a[i] < 0.01 {
                continue;
            }
            let j = if i == 0 {
                1
            } else if i == 2 {
                0
            } else {
                2
            };
            t0 = [0.0; 3];
            t0[i] = a[j];
            t0[j] = -a[i];
        }
        let mut t0 = Vec3::new(t0[0], t0[1], t0[2]);
        assert!(t0.normalize(), "degenerate hinge tangent base");
        let t1 = t0.cross(self.hinges[hinge].axes[0]);
        self.hinges[hinge].tangents = [t0, t1];

        self.hinges[hinge].ref_rot =
            relative_rotation(self.bodies[b0].quat, self.bodies[b1].quat);

        // Constant translational parts of the three anchor rows.
        let base = ROWS_PER_HINGE * hinge;
        for k in 0..3 {
            let mut e = Vec3::zero();
            match k {
                0 => e.x = 1.0,
                1 => e.y = 1.0,
                _ => e.z = 1.0,
            }
            self.rows[base + k].j_lin[0] = e;
            self.rows[base + k].j_lin[1] = -e;
        }

        debug!("hinge {hinge}: bodies ({b0}, {b1}), axis {axis:?}");
    }

    /// Attaches motor `motor` to `hinge` with multiplier bounds
    /// `+-max_torque` on its constraint row, and re-captures the hinge's
    /// zero-angle reference orientation.
    ///
    /// # Panics
    ///
    /// Panics on out-of-range indices or a negative torque limit.
    pub fn add_motor(&mut self, motor: usize, hinge: usize, max_torque: Real) {
        assert!(motor < self.dims.motors, "motor index {motor} out of range");
        assert!(hinge < self.dims.hinges, "motor attached to missing hinge {hinge}");
        assert!(max_torque >= 0.0, "motor torque limit must be non-negative");

        let s = self.dims.hinge_rows() + motor;
        let [b0, b1] = self.hinges[hinge].bodies;

        self.motors[motor].hinge = hinge;
        self.rows[s].bodies = RowBodies::Pair(b0, b1);
        self.rows[s].lambda_min = -max_torque;
        self.rows[s].lambda_max = max_torque;

        self.hinges[hinge].ref_rot =
            relative_rotation(self.bodies[b0].quat, self.bodies[b1].quat);

        debug!("motor {motor}: hinge {hinge}, torque limit {max_torque}");
    }

    /// Rewrites the Jacobian entries that depend on current body
    /// orientation: the angular blocks of the hinge anchor rows, the hinge
    /// tangent rows and the motor rows. Translational hinge blocks are
    /// constant and contact rows belong to the collision probe; neither is
    /// touched here.
    pub fn update_jacobian(&mut self) {
        for h in 0..self.dims.hinges {
            let base = ROWS_PER_HINGE * h;
            let [b0, b1] = self.hinges[h].bodies;

            // World-frame anchor offsets (rotation only; the position drops
            // out of the velocity constraint).
            let a0 = self.bodies[b0].rot.mul_vec(self.hinges[h].anchors[0]);
            let a1 = self.bodies[b1].rot.mul_vec(self.hinges[h].anchors[1]);

            // Body 0 angular blocks are the rows of -[a0]_x:
            //          x     y     z
            //          0     a2   -a1
            //         -a2    0     a0
            //          a1   -a0    0
            self.rows[base].j_ang[0] = Vec3::new(0.0, a0.z, -a0.y);
            self.rows[base + 1].j_ang[0] = Vec3::new(-a0.z, 0.0, a0.x);
            self.rows[base + 2].j_ang[0] = Vec3::new(a0.y, -a0.x, 0.0);

            // Body 1 angular blocks are the rows of +[a1]_x.
            self.rows[base].j_ang[1] = Vec3::new(0.0, -a1.z, a1.y);
            self.rows[base + 1].j_ang[1] = Vec3::new(a1.z, 0.0, -a1.x);
            self.rows[base + 2].j_ang[1] = Vec3::new(-a1.y, a1.x, 0.0);

            // Axial tangent rows use the body-0 tangent base in world
            // coordinates, with opposite signs on the two sides.
            let r0 = self.bodies[b0].rot;
            for (i, tangent) in self.hinges[h].tangents.into_iter().enumerate() {
                let t = r0.mul_vec(tangent);
                self.rows[base + 3 + i].j_ang[0] = t;
                self.rows[base + 3 + i].j_ang[1] = -t;
            }
        }

        for m in 0..self.dims.motors {
            let s = self.dims.hinge_rows() + m;
            let hinge = self.motors[m].hinge;
            let RowBodies::Pair(b0, _) = self.rows[s].bodies else {
                continue;
            };

            let axis = self.bodies[b0].rot.mul_vec(self.hinges[hinge].axes[0]);
            self.rows[s].j_ang[0] = -axis;
            self.rows[s].j_ang[1] = axis;
        }
    }
}
