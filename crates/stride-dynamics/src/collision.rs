//! Cylindrical-foot vs height-field terrain probe.
//!
//! A foot is a body whose geometry is a cylinder standing on its flat end.
//! Each step, the probe samples the terrain under three points of the
//! bottom rim (one at 180 degrees, two at +-60 degrees from it),
//! approximates the ground by the triangle through the sampled heights and
//! seeds one non-penetration constraint row per point, all sharing the
//! triangle normal. Terrain comes from a caller-supplied [`Terrain`]
//! implementation and must be a pure function of position.

use log::debug;
use stride_core::{Real, Vec3};

use crate::world::{RowBodies, World, CONTACTS_PER_FOOT, ROWS_PER_FOOT};

/// Height-field terrain sampled by the collision probe.
///
/// Implementations must be side-effect-free; when worlds run on several
/// threads the same terrain value may be sampled concurrently.
pub trait Terrain {
    /// Terrain height (z) under the world-space point `(x, y)`.
    fn height(&self, x: Real, y: Real) -> Real;
}

/// Terrain of constant height zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatTerrain;

impl Terrain for FlatTerrain {
    fn height(&self, _x: Real, _y: Real) -> Real {
        0.0
    }
}

/// Diagnostic record of one foot's last probe pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct FootContact {
    /// Body probed as this foot.
    pub body: usize,
    /// World-space rim points the terrain was sampled under.
    pub points: [Vec3; CONTACTS_PER_FOOT],
    /// Shared ground-plane normal.
    pub normal: Vec3,
    /// Tangent pair in the foot plane. Recorded for inspection only: the
    /// two tangential constraint rows stay unenforced and contacts are
    /// frictionless.
    pub tangents: [Vec3; 2],
    /// Whether the last probe pass produced contact rows.
    pub active: bool,
}

impl World {
    /// Collides `foot_body` as a cylindrical foot against the terrain and
    /// writes this foot's contact rows at `contacts_offset` within the
    /// contact region of the Jacobian.
    ///
    /// Returns the number of rows claimed ([`ROWS_PER_FOOT`]), or 0 when
    /// the bottom of the cylinder is above the terrain under the body
    /// center. Note that only the three non-penetration rows receive
    /// non-trivial content; the two tangential rows are structurally
    /// claimed but left zero.
    ///
    /// # Panics
    ///
    /// Panics when `foot_body` is out of range or `contacts_offset` is not
    /// a multiple of [`ROWS_PER_FOOT`] inside the contact region.
    pub fn collide_foot_cylinder_tri<T: Terrain>(
        &mut self,
        terrain: &T,
        cyl_radius: Real,
        cyl_height: Real,
        contacts_offset: usize,
        foot_body: usize,
    ) -> usize {
        const SIN30: Real = 0.5;
        const COS30: Real = 0.866_025_403_7;
        const COS45: Real = 0.707_106_781_1;

        assert!(foot_body < self.dims.bodies, "foot body {foot_body} out of range");
        assert!(
            contacts_offset % ROWS_PER_FOOT == 0
                && contacts_offset + ROWS_PER_FOOT
                    <= self.dims.rows() - self.dims.hinge_motor_rows(),
            "contact offset {contacts_offset} does not address a foot slot"
        );
        let foot = contacts_offset / ROWS_PER_FOOT;

        let pos = self.bodies[foot_body].pos;
        let bottom = pos.z - 0.5 * cyl_height;
        if bottom > terrain.height(pos.x, pos.y) {
            self.contacts[foot].active = false;
            return 0;
        }

        // Bottom-rim candidates in foot coordinates: one point at 180
        // degrees, two at +-60 degrees from it.
        let local = [
            Vec3::new(-cyl_radius, 0.0, -0.5 * cyl_height),
            Vec3::new(SIN30 * cyl_radius, COS30 * cyl_radius, -0.5 * cyl_height),
            Vec3::new(SIN30 * cyl_radius, -COS30 * cyl_radius, -0.5 * cyl_height),
        ];

        let rot = self.bodies[foot_body].rot;
        let mut arm = [Vec3::zero(); CONTACTS_PER_FOOT];
        let mut point = [Vec3::zero(); CONTACTS_PER_FOOT];
        let mut height = [0.0; CONTACTS_PER_FOOT];
        for c in 0..CONTACTS_PER_FOOT {
            arm[c] = rot.mul_vec(local[c]);
            point[c] = arm[c] + pos;
            height[c] = terrain.height(point[c].x, point[c].y);
        }

        // Ground plane through the three sampled points.
        let e1 = Vec3::new(
            point[1].x - point[0].x,
            point[1].y - point[0].y,
            height[1] - height[0],
        );
        let e2 = Vec3::new(
            point[2].x - point[0].x,
            point[2].y - point[0].y,
            height[2] - height[0],
        );
        let mut normal = e2.cross(e1);
        normal.normalize();

        let base = self.dims.hinge_motor_rows() + contacts_offset;
        for c in 0..CONTACTS_PER_FOOT {
            let row = &mut self.rows[base + c];
            row.bodies = RowBodies::Single(foot_body);
            row.j_lin[1] = normal;
            row.j_ang[1] = arm[c].cross(normal);
            row.lambda_min = 0.0;
        }

        // Tangent pair pinned 45 degrees off the foot's local x axis,
        // rotated to world. Only recorded in the diagnostic slot; writing
        // them as constraint rows is what would make contact sticky.
        let tangents = [
            rot.mul_vec(Vec3::new(COS45, COS45, 0.0)),
            rot.mul_vec(Vec3::new(COS45, -COS45, 0.0)),
        ];

        self.contacts[foot] = FootContact {
            body: foot_body,
            points: point,
            normal,
            tangents,
            active: true,
        };
        debug!("foot {foot} (body {foot_body}): contact, normal ({}, {}, {})", normal.x, normal.y, normal.z);

        ROWS_PER_FOOT
    }
}
