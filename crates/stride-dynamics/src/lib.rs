//! stride-dynamics
//!
//! Compact rigid-body dynamics for legged machines: bodies connected by
//! hinge joints, driven by torque-limited velocity motors, standing on a
//! height-field terrain through cylindrical feet.
//!
//! The whole simulation lives in one [`World`] record sized at construction
//! from [`Dims`]; every cross-reference is an integer index into the world's
//! arrays and nothing allocates after `World::new`. A tick is:
//!
//! 1. caller accumulates external forces/torques and desired motor speeds;
//! 2. caller runs [`World::collide_foot_cylinder_tri`] for each foot to seed
//!    the contact rows;
//! 3. [`World::step`] refreshes the orientation-dependent Jacobian entries,
//!    solves for the Lagrange multipliers with Projected Gauss-Seidel
//!    (Catto, *Iterative dynamics with temporal coherence*, GDC 2005), folds
//!    the constraint forces into the external wrench and integrates with
//!    semi-implicit Euler.
//!
//! Multipliers persist between steps as the warm start; position drift is
//! handled by first-order error feedback scaled by [`World::erp`].
//!
//! Conventions:
//! - world frame is z-up; terrain height is a function of (x, y);
//! - quaternions map body to world coordinates and stay in sync with the
//!   cached per-body rotation matrix at every step boundary;
//! - precondition violations (bad indices, `dt <= 0`, zero mass) panic --
//!   they are programmer errors, not runtime conditions.

pub mod collision;
pub mod snapshot;
pub mod world;

mod feedback;
mod inertia;
mod joints;
mod solver;
mod step;

pub use collision::{FlatTerrain, FootContact, Terrain};
pub use snapshot::{BodyState, SnapshotError, WorldSnapshot};
pub use world::{
    Body, ConstraintRow, Dims, Hinge, Motor, RowBodies, World, CONTACTS_PER_FOOT, DEFAULT_ERP,
    LAMBDA_LIMIT, ROWS_PER_FOOT, ROWS_PER_HINGE,
};

// Math types are part of the public surface; spare downstream users the
// extra dependency edge.
pub use stride_core::{Mtx3, Quat, Real, Vec3, NORM_EPS, PI};
