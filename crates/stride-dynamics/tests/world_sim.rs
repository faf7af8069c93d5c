//! End-to-end simulation scenarios: a falling foot coming to rest on the
//! terrain, a hinge holding two bodies together, a motor spinning a hinge
//! up to speed, and contact staying strictly unilateral.

use approx::assert_relative_eq;
use stride_dynamics::{Dims, FlatTerrain, Quat, Real, Vec3, World, CONTACTS_PER_FOOT};

const DT: Real = 0.005;
const GRAVITY: Real = -9.81;

/// Zeroed world with every body staged at the identity orientation.
fn stage(dims: Dims) -> World {
    let mut world = World::new(dims);
    for b in 0..dims.bodies {
        world.body_mut(b).quat = Quat::identity();
        world.refresh_rotation(b);
    }
    world
}

/// Two hinged boxes: a heavy long box and a light cube, joined at
/// `(0.5, 0, 1)` about the x axis.
fn hinged_boxes(dims: Dims) -> World {
    let mut world = stage(dims);

    world.body_mut(0).pos = Vec3::new(0.0, -0.5, 1.0);
    world.set_box_inertia(0, 15.0, 0.5, 0.5, 1.5);

    world.body_mut(1).pos = Vec3::new(0.0, 0.5, 1.0);
    world.set_box_inertia(1, 1.0, 0.5, 0.5, 0.5);

    world.create_hinge(0, 0, 1, Vec3::new(0.5, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
    world
}

fn anchor_error(world: &World, hinge: usize) -> Real {
    let h = world.hinge(hinge);
    let mut anchors = [Vec3::zero(); 2];
    for side in 0..2 {
        let body = world.body(h.bodies[side]);
        anchors[side] = body.pos + body.rot.mul_vec(h.anchors[side]);
    }
    (anchors[1] - anchors[0]).norm()
}

#[test]
fn falling_box_comes_to_rest_on_flat_terrain() {
    let mut world = stage(Dims::new(1, 0, 0, 1));
    world.set_box_inertia(0, 1.0, 1.0, 1.0, 1.0);
    world.body_mut(0).pos = Vec3::new(0.0, 0.0, 2.0);

    // 1 s of simulated time: free fall, impact, rest.
    for _ in 0..200 {
        world.body_mut(0).force = Vec3::new(0.0, 0.0, GRAVITY);
        world.collide_foot_cylinder_tri(&FlatTerrain, 0.5, 0.3, 0, 0);
        world.step(DT, 100);
    }

    let body = world.body(0);
    assert!(body.vel.z.abs() < 1e-2, "still moving: vel.z = {}", body.vel.z);
    assert!(body.pos.z < 0.2, "hovering at z = {}", body.pos.z);

    // The three contact rows carry the weight between them, each pushing.
    let base = world.dims().hinge_motor_rows();
    let mut total = 0.0;
    for c in 0..CONTACTS_PER_FOOT {
        let lambda = world.row(base + c).lambda;
        assert!(lambda >= 0.0, "contact row {c} pulls: {lambda}");
        total += lambda;
    }
    assert_relative_eq!(total, -GRAVITY, epsilon = 0.1);

    // Contact Jacobians are consumed by the step; the probe rebuilds them.
    for s in base..world.dims().rows() {
        assert_eq!(world.row(s).j_lin[1], Vec3::zero());
        assert_eq!(world.row(s).j_ang[1], Vec3::zero());
    }

    world.check_consistency();
}

#[test]
fn hinge_keeps_anchors_coincident() {
    let mut world = hinged_boxes(Dims::new(2, 1, 0, 0));

    // Nothing moves, nothing drifts.
    world.step(DT, 100);
    assert!(anchor_error(&world, 0) <= 1e-9);

    // A velocity kick on the light cube has to drag the pair along without
    // tearing the joint open.
    world.body_mut(1).vel = Vec3::new(0.0, 0.0, 0.1);
    for _ in 0..100 {
        world.step(DT, 100);
    }
    assert!(
        anchor_error(&world, 0) < 1e-4,
        "anchor drifted to {}",
        anchor_error(&world, 0)
    );
    world.check_consistency();
}

#[test]
fn motor_spins_hinge_up_to_desired_rate() {
    let mut world = hinged_boxes(Dims::new(2, 1, 1, 0));
    world.add_motor(0, 0, 1.0);
    world.set_motor_speed(0, 1.0);

    for _ in 0..1000 {
        world.step(DT, 200);
    }

    let rate = world.hinge_angle_rate(0);
    assert!(
        (rate - 1.0).abs() < 0.01,
        "rate after 5 s: {rate} rad/s, wanted 1.0 within 1%"
    );

    // The motor never exceeds its torque limit, and the angle query stays
    // in its wrapped interval while the hinge keeps turning.
    assert!(world.motor_torque(0).abs() <= 1.0 + 1e-9);
    let angle = world.hinge_angle(0);
    assert!(angle > -stride_dynamics::PI && angle <= stride_dynamics::PI);

    world.check_consistency();
}

#[test]
fn contact_stays_unilateral_under_partial_and_full_pull() {
    let mut world = stage(Dims::new(1, 0, 0, 1));
    world.set_box_inertia(0, 1.0, 1.0, 1.0, 1.0);
    world.body_mut(0).pos = Vec3::new(0.0, 0.0, 0.14);

    // Settle under gravity first.
    for _ in 0..100 {
        world.body_mut(0).force = Vec3::new(0.0, 0.0, GRAVITY);
        world.collide_foot_cylinder_tri(&FlatTerrain, 0.5, 0.3, 0, 0);
        world.step(DT, 100);
    }
    assert!(world.body(0).vel.z.abs() < 1e-2);

    // A 5 N pull is less than the weight: the box keeps resting and every
    // contact keeps pushing.
    let base = world.dims().hinge_motor_rows();
    for _ in 0..100 {
        world.body_mut(0).force = Vec3::new(0.0, 0.0, GRAVITY + 5.0);
        world.collide_foot_cylinder_tri(&FlatTerrain, 0.5, 0.3, 0, 0);
        world.step(DT, 100);
        for c in 0..CONTACTS_PER_FOOT {
            assert!(world.row(base + c).lambda >= 0.0);
        }
    }
    assert!(world.body(0).vel.z.abs() < 1e-2);

    // A 15 N pull beats gravity: contacts cannot hold the box down, so the
    // multipliers clamp at zero and the box leaves at the unconstrained
    // acceleration.
    world.body_mut(0).force = Vec3::new(0.0, 0.0, GRAVITY + 15.0);
    world.collide_foot_cylinder_tri(&FlatTerrain, 0.5, 0.3, 0, 0);
    world.step(DT, 100);
    for c in 0..CONTACTS_PER_FOOT {
        let lambda = world.row(base + c).lambda;
        assert!(
            (0.0..1e-6).contains(&lambda),
            "contact row {c} resists the pull: {lambda}"
        );
    }
    assert_relative_eq!(world.body(0).vel.z, (15.0 + GRAVITY) * DT, epsilon = 1e-6);

    for _ in 0..50 {
        world.body_mut(0).force = Vec3::new(0.0, 0.0, GRAVITY + 15.0);
        world.collide_foot_cylinder_tri(&FlatTerrain, 0.5, 0.3, 0, 0);
        world.step(DT, 100);
    }
    assert!(world.body(0).vel.z > 0.0);
    assert!(world.body(0).pos.z > 0.15, "never lifted off: z = {}", world.body(0).pos.z);

    world.check_consistency();
}

#[test]
fn snapshot_survives_a_json_round_trip() {
    let mut world = hinged_boxes(Dims::new(2, 1, 0, 0));
    world.body_mut(1).vel = Vec3::new(0.0, 0.0, 0.05);
    for _ in 0..10 {
        world.step(DT, 50);
    }

    let snapshot = world.snapshot();
    let json = serde_json::to_string(&snapshot).expect("serialize");
    let decoded: stride_dynamics::WorldSnapshot = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, snapshot);

    let mut replica = hinged_boxes(Dims::new(2, 1, 0, 0));
    replica.restore(&decoded).expect("matching dimensions");
    assert_eq!(replica.body(1).pos, world.body(1).pos);
    replica.check_consistency();
}
