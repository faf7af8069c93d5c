//! Two hinged boxes driven by a weak motor.
//!
//! A heavy long box and a light cube share a hinge about the x axis; a
//! motor with a 0.2 Nm torque limit tries to spin the joint at 1 rad/s.
//! Run with `RUST_LOG=debug` to see the model construction.

use stride_dynamics::{Dims, Quat, Real, Vec3, World};

fn main() {
    env_logger::init();

    let mut world = World::new(Dims::new(2, 1, 1, 0));
    for b in 0..2 {
        world.body_mut(b).quat = Quat::identity();
        world.refresh_rotation(b);
    }

    world.body_mut(0).pos = Vec3::new(0.0, -0.5, 1.0);
    world.set_box_inertia(0, 15.0, 0.5, 0.5, 1.5);

    world.body_mut(1).pos = Vec3::new(0.0, 0.5, 1.0);
    world.set_box_inertia(1, 1.0, 0.5, 0.5, 0.5);

    world.create_hinge(0, 0, 1, Vec3::new(0.5, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
    world.add_motor(0, 0, 0.2);
    world.set_motor_speed(0, 1.0);

    let dt: Real = 0.005;
    for tick in 0..=600 {
        if tick % 50 == 0 {
            println!(
                "t = {:5.2} s  angle = {:7.3} rad  rate = {:6.3} rad/s  torque = {:6.3} Nm",
                tick as Real * dt,
                world.hinge_angle(0),
                world.hinge_angle_rate(0),
                world.motor_torque(0),
            );
        }
        world.step(dt, 150);
    }
}
