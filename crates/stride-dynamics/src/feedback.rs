//! Joint state queries: hinge angle, hinge angle rate, motor torque.

use stride_core::{Real, PI};

impl crate::world::World {
    /// Current hinge angle in radians, wrapped to `(-pi, pi]`.
    ///
    /// The angle measures how far the two connected bodies have rotated
    /// about the hinge axis away from the reference orientation captured at
    /// hinge (or motor) creation. Positive angles follow the axis by the
    /// right-hand rule.
    #[must_use]
    pub fn hinge_angle(&self, hinge: usize) -> Real {
        let h = &self.hinges[hinge];
        let [b0, b1] = h.bodies;

        // Relative rotation of the pair, with the reference taken out.
        let dq = self.bodies[b0].quat.conj().mul(self.bodies[b1].quat);
        let hdq = dq.mul(h.ref_rot.conj());

        // The stored axis lives in the body-0 frame.
        let axis = self.bodies[b0].rot.mul_vec(h.axes[0]);

        let cost2 = hdq.w;
        let sint2 = hdq.vec().norm();
        let mut theta = if hdq.vec().dot(axis) >= 0.0 {
            2.0 * sint2.atan2(cost2)
        } else {
            2.0 * sint2.atan2(-cost2)
        };
        if theta > PI {
            theta -= 2.0 * PI;
        }
        theta
    }

    /// Angular speed of the hinge in radians per second: the relative
    /// angular velocity of the pair projected on the hinge axis.
    #[must_use]
    pub fn hinge_angle_rate(&self, hinge: usize) -> Real {
        let h = &self.hinges[hinge];
        let [b0, b1] = h.bodies;
        let axis = self.bodies[b0].rot.mul_vec(h.axes[0]);
        axis.dot(self.bodies[b1].omega - self.bodies[b0].omega)
    }

    /// Torque the motor exerted in the last step: the multiplier of its
    /// constraint row.
    #[must_use]
    pub fn motor_torque(&self, motor: usize) -> Real {
        self.rows[self.dims.hinge_rows() + motor].lambda
    }
}
