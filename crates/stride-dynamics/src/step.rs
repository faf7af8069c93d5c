//! Semi-implicit Euler integrator: the per-tick entry point.
//!
//! Velocities are updated first from the full wrench (external plus
//! constraint forces), then positions from the *new* velocities, then the
//! attitude quaternion from the new angular velocity followed by
//! renormalization and a rotation-matrix refresh. The gyroscopic
//! `omega x (I omega)` term is omitted.

use log::trace;
use stride_core::{Quat, Real, Vec3};

use crate::world::World;

impl World {
    /// Advances the world one tick of `dt` seconds.
    ///
    /// Refreshes the orientation-dependent Jacobian entries, solves for the
    /// Lagrange multipliers, folds the constraint forces into the external
    /// wrench, integrates every body, and clears the per-step state (wrench
    /// accumulators and contact-row Jacobians).
    ///
    /// # Panics
    ///
    /// Panics when `dt` is not positive or `iterations` is zero.
    pub fn step(&mut self, dt: Real, iterations: usize) {
        assert!(dt > 0.0, "timestep must be positive, got {dt}");
        assert!(iterations >= 1, "solver needs at least one iteration");
        trace!("step dt={dt} iterations={iterations}");

        self.update_jacobian();
        self.solve_for_lambda(dt, iterations);
        self.apply_constraint_forces();

        for body in self.bodies.iter_mut() {
            body.vel = body.vel.add_scaled(body.force, dt * body.inv_mass);
            body.omega = body.omega.add_scaled(body.inv_inertia_world().mul_vec(body.torque), dt);

            body.pos = body.pos.add_scaled(body.vel, dt);

            // dq/dt = 1/2 (0, omega) q; a resting body trivially
            // renormalizes, so the failure flag is ignored by contract.
            let dq = Quat::omega_mul(body.omega, body.quat);
            body.quat = body.quat + dq.scale(0.5 * dt);
            body.quat.normalize();
            body.rot = body.quat.to_rotation();

            body.force = Vec3::zero();
            body.torque = Vec3::zero();
        }

        // Contact rows are rewritten by the collision probe before the next
        // step; stale entries must not survive into it.
        for s in self.dims.hinge_motor_rows()..self.rows.len() {
            self.rows[s].j_lin[1] = Vec3::zero();
            self.rows[s].j_ang[1] = Vec3::zero();
        }
    }
}
