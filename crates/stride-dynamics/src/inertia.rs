//! Mass property setters for the primitive shapes the engine knows about.
//!
//! Both write the *inverse* quantities straight into the body: the
//! reciprocal mass and the reciprocal principal inertias (the box formula
//! `m (y^2 + z^2) / 12` stores as `12 / (m (y^2 + z^2))`).

use stride_core::{Mtx3, Real, Vec3};

use crate::world::World;

impl World {
    /// Sets the inverse mass and inverse inertia of `body` to those of a
    /// uniform-density box with the given edge lengths.
    ///
    /// # Panics
    ///
    /// Panics when `mass` is not positive.
    pub fn set_box_inertia(&mut self, body: usize, mass: Real, xlen: Real, ylen: Real, zlen: Real) {
        assert!(mass > 0.0, "box mass must be positive, got {mass}");

        let b = self.body_mut(body);
        b.inv_mass = 1.0 / mass;
        b.inv_inertia = Mtx3::from_diagonal(Vec3::new(
            12.0 / (mass * (ylen * ylen + zlen * zlen)),
            12.0 / (mass * (xlen * xlen + zlen * zlen)),
            12.0 / (mass * (xlen * xlen + ylen * ylen)),
        ));
    }

    /// Sets the inverse mass and inverse inertia of `body` to those of a
    /// uniform-density cylinder whose symmetry axis is the local z axis.
    ///
    /// # Panics
    ///
    /// Panics when `mass` is not positive.
    pub fn set_cylinder_inertia(&mut self, body: usize, mass: Real, radius: Real, height: Real) {
        assert!(mass > 0.0, "cylinder mass must be positive, got {mass}");

        let transverse = 12.0 / (mass * (3.0 * radius * radius + height * height));
        let b = self.body_mut(body);
        b.inv_mass = 1.0 / mass;
        b.inv_inertia = Mtx3::from_diagonal(Vec3::new(
            transverse,
            transverse,
            2.0 / (mass * radius * radius),
        ));
    }
}
