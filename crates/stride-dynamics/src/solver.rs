//! Projected Gauss-Seidel constraint solver.
//!
//! The implementation follows E. Catto, *Iterative dynamics with temporal
//! coherence*, Game Developer Conference, 2005. Each sweep updates the
//! `s`-th Lagrange multiplier by
//!
//! ```text
//! delta_lambda_s = (rhs_s - J_s . a) / d_s
//! ```
//!
//! where `a = B lambda`, `B = M^{-1} J^T`, `d = diag(J B)` and
//! `rhs = -(1/dt) J v - J M^{-1} F_e` plus first-order position feedback
//! and desired motor speeds. Updates are clamped to the per-row multiplier
//! bounds and the clamped delta is propagated back into `a`, so the bounds
//! hold after every sweep. Multipliers enter as last step's values (warm
//! start).
//!
//! Row order is fixed -- hinge rows, motor rows, contact rows by ascending
//! foot -- which makes the iteration result canonical.

use stride_core::{Real, Vec3};

use crate::world::{Accum, World, ROWS_PER_HINGE};

/// Diagonal entries at or below this magnitude defer their row's update to
/// a later sweep instead of dividing by a near-zero.
const DIAG_EPS: Real = 1e-7;

impl World {
    /// Computes `B = M^{-1} J^T`: per visited side, the translational block
    /// scaled by the inverse mass and the angular block mapped through the
    /// world-frame inverse inertia.
    pub fn compute_b(&mut self) {
        for s in 0..self.rows.len() {
            let row = self.rows[s];
            for (side, body) in row.bodies.sides() {
                let b = &self.bodies[body];
                let lin = row.j_lin[side].scale(b.inv_mass);
                let ang = b.inv_inertia_world().mul_vec(row.j_ang[side]);
                self.rows[s].b_lin[side] = lin;
                self.rows[s].b_ang[side] = ang;
            }
        }
    }

    /// Computes `a = B lambda`, accumulated per body.
    pub fn compute_acc(&mut self) {
        for acc in self.acc.iter_mut() {
            *acc = Accum::default();
        }
        for row in self.rows.iter() {
            for (side, body) in row.bodies.sides() {
                self.acc[body].lin += row.b_lin[side].scale(row.lambda);
                self.acc[body].ang += row.b_ang[side].scale(row.lambda);
            }
        }
    }

    /// Computes `d = diag(J B)`.
    pub fn compute_d(&mut self) {
        for s in 0..self.rows.len() {
            let row = self.rows[s];
            let mut dii = 0.0;
            for (side, _) in row.bodies.sides() {
                dii += row.j_lin[side].dot(row.b_lin[side]);
                dii += row.j_ang[side].dot(row.b_ang[side]);
            }
            self.rows[s].d = dii;
        }
    }

    /// Computes `rhs = -(1/dt) J v - J M^{-1} F_e`, then adds the hinge
    /// position feedback scaled by [`World::erp`] and the desired motor
    /// speeds.
    pub fn compute_rhs(&mut self, dt: Real) {
        for s in 0..self.rows.len() {
            let row = self.rows[s];
            let mut jv = 0.0;
            let mut jmife = 0.0;
            for (side, body) in row.bodies.sides() {
                let b = &self.bodies[body];
                jv += row.j_lin[side].dot(b.vel) + row.j_ang[side].dot(b.omega);
                jmife += row.j_lin[side].dot(b.force.scale(b.inv_mass));
                jmife += row.j_ang[side].dot(b.inv_inertia_world().mul_vec(b.torque));
            }
            self.rows[s].rhs = -(1.0 / dt) * jv - jmife;
        }

        let erp_dt = self.erp / dt;
        for h in 0..self.dims.hinges {
            let base = ROWS_PER_HINGE * h;
            let hinge = self.hinges[h];

            let mut anchors_world = [Vec3::zero(); 2];
            for side in 0..2 {
                let b = &self.bodies[hinge.bodies[side]];
                anchors_world[side] = b.pos + b.rot.mul_vec(hinge.anchors[side]);
            }
            let error = anchors_world[1] - anchors_world[0];
            self.rows[base].rhs += erp_dt * error.x;
            self.rows[base + 1].rhs += erp_dt * error.y;
            self.rows[base + 2].rhs += erp_dt * error.z;

            // Axis misalignment, first order: bring the body-1 axis into
            // body-0 coordinates and project the cross product on the
            // tangent base. Degrades near anti-parallel axes, which the
            // hinge never reaches in normal operation.
            let r0 = self.bodies[hinge.bodies[0]].rot;
            let r1 = self.bodies[hinge.bodies[1]].rot;
            let axis1_in_b0 = r0.tr_mul_vec(r1.mul_vec(hinge.axes[1]));
            let u = hinge.axes[0].cross(axis1_in_b0);
            self.rows[base + 3].rhs += erp_dt * hinge.tangents[0].dot(u);
            self.rows[base + 4].rhs += erp_dt * hinge.tangents[1].dot(u);
        }

        for m in 0..self.dims.motors {
            let s = self.dims.hinge_rows() + m;
            self.rows[s].rhs += self.motors[m].desired_speed / dt;
        }
    }

    /// Runs `iterations` projected Gauss-Seidel sweeps for the multipliers,
    /// starting from the warm-start values left by the previous step.
    ///
    /// # Panics
    ///
    /// Panics when `dt` is not positive or `iterations` is zero.
    pub fn solve_for_lambda(&mut self, dt: Real, iterations: usize) {
        assert!(dt > 0.0, "timestep must be positive, got {dt}");
        assert!(iterations >= 1, "solver needs at least one iteration");

        self.compute_b();
        self.compute_acc();
        self.compute_d();
        self.compute_rhs(dt);

        for _ in 0..iterations {
            for s in 0..self.rows.len() {
                let row = self.rows[s];

                let mut tmp = 0.0;
                for (side, body) in row.bodies.sides() {
                    tmp += row.j_lin[side].dot(self.acc[body].lin);
                    tmp += row.j_ang[side].dot(self.acc[body].ang);
                }

                let delta = if row.d.abs() > DIAG_EPS {
                    (row.rhs - tmp) / row.d
                } else {
                    0.0
                };

                let new_lambda = (row.lambda + delta).clamp(row.lambda_min, row.lambda_max);
                let delta = new_lambda - row.lambda;
                self.rows[s].lambda = new_lambda;

                for (side, body) in row.bodies.sides() {
                    self.acc[body].lin += row.b_lin[side].scale(delta);
                    self.acc[body].ang += row.b_ang[side].scale(delta);
                }
            }
        }
    }

    /// Folds the constraint forces `J^T lambda` into each body's external
    /// wrench, where the integrator picks them up.
    pub fn apply_constraint_forces(&mut self) {
        for row in self.rows.iter() {
            for (side, body) in row.bodies.sides() {
                self.bodies[body].force += row.j_lin[side].scale(row.lambda);
                self.bodies[body].torque += row.j_ang[side].scale(row.lambda);
            }
        }
    }

    /// Computes the constraint forces `J^T lambda` per body without
    /// touching the external wrench. Diagnostic counterpart of
    /// [`World::apply_constraint_forces`]; allocates and is not meant for
    /// the hot path.
    #[must_use]
    pub fn constraint_forces(&self) -> Vec<(Vec3, Vec3)> {
        let mut out = vec![(Vec3::zero(), Vec3::zero()); self.dims.bodies];
        for row in self.rows.iter() {
            for (side, body) in row.bodies.sides() {
                out[body].0 += row.j_lin[side].scale(row.lambda);
                out[body].1 += row.j_ang[side].scale(row.lambda);
            }
        }
        out
    }

    /// Read-only view of the solver accumulator `a = B lambda` for one
    /// body; exposed for diagnostics and tests.
    #[must_use]
    pub fn solver_accum(&self, body: usize) -> (Vec3, Vec3) {
        (self.acc[body].lin, self.acc[body].ang)
    }
}
