//! A cylindrical foot dropped onto flat terrain.
//!
//! The foot falls under gravity, the probe seeds contact rows once the
//! bottom rim reaches the ground, and the solver brings it to rest. The
//! final world state is dumped as a JSON snapshot.

use anyhow::Result;
use stride_dynamics::{Dims, FlatTerrain, Quat, Real, Vec3, World, CONTACTS_PER_FOOT};

fn main() -> Result<()> {
    env_logger::init();

    let (radius, height) = (0.5, 0.3);

    let mut world = World::new(Dims::new(1, 0, 0, 1));
    world.body_mut(0).quat = Quat::identity();
    world.refresh_rotation(0);
    world.set_cylinder_inertia(0, 1.0, radius, height);
    world.body_mut(0).pos = Vec3::new(-1.0, -1.0, 0.5);

    let dt: Real = 0.005;
    let contact_base = world.dims().hinge_motor_rows();
    for tick in 0..=300 {
        world.body_mut(0).force = Vec3::new(0.0, 0.0, -9.81);
        world.collide_foot_cylinder_tri(&FlatTerrain, radius, height, 0, 0);
        world.step(dt, 100);

        if tick % 25 == 0 {
            let normal_force: Real = (0..CONTACTS_PER_FOOT)
                .map(|c| world.row(contact_base + c).lambda)
                .sum();
            println!(
                "t = {:5.2} s  z = {:6.3} m  vel.z = {:7.3} m/s  contact force = {:6.2} N",
                tick as Real * dt,
                world.body(0).pos.z,
                world.body(0).vel.z,
                normal_force,
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&world.snapshot())?);
    Ok(())
}
