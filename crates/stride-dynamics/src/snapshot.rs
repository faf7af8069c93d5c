//! Pose and velocity snapshots of a running world.
//!
//! This is the state-export seam for everything that watches a simulation
//! from outside (viewers, consoles, replay logs): a plain serde-friendly
//! capture of every body's pose and velocities. Mass properties, joints
//! and solver state are configuration, not state, and stay out of it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use stride_core::{Quat, Vec3};

use crate::world::World;

/// Pose and velocity of one body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub pos: Vec3,
    pub quat: Quat,
    pub vel: Vec3,
    pub omega: Vec3,
}

/// Snapshot of every body in a world, in body-index order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub bodies: Vec<BodyState>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot carries {got} bodies, world expects {expected}")]
    BodyCount { expected: usize, got: usize },
}

impl World {
    /// Captures the pose and velocities of every body.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            bodies: self
                .bodies
                .iter()
                .map(|b| BodyState { pos: b.pos, quat: b.quat, vel: b.vel, omega: b.omega })
                .collect(),
        }
    }

    /// Restores body poses and velocities from a snapshot taken on a world
    /// of the same dimensions, re-deriving the cached rotation matrices.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::BodyCount`] when the snapshot does not
    /// match the world's body count.
    pub fn restore(&mut self, snapshot: &WorldSnapshot) -> Result<(), SnapshotError> {
        if snapshot.bodies.len() != self.dims.bodies {
            return Err(SnapshotError::BodyCount {
                expected: self.dims.bodies,
                got: snapshot.bodies.len(),
            });
        }
        for (body, state) in self.bodies.iter_mut().zip(&snapshot.bodies) {
            body.pos = state.pos;
            body.quat = state.quat;
            body.vel = state.vel;
            body.omega = state.omega;
            body.rot = body.quat.to_rotation();
        }
        Ok(())
    }
}
