#![no_main]
use arbitrary::Arbitrary;
use fixbox::{
    Body, Boundary, FixFloat, FixVec, Material, Shape, SolverPrecision, Transform, Velocity, World,
    WorldSettings,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzBody {
    id: i16,
    x: i8,
    y: i8,
    vx: i8,
    vy: i8,
    spin: i8,
    size: u8,
    is_circle: bool,
    is_dynamic: bool,
    bounce: u8,
    friction: u8,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    bodies: Vec<FuzzBody>,
    precision: u8,
    /// Number of simulation steps (capped)
    step_count: u8,
}

// Fuzz the world: random bodies, random precision, step.
// Must never panic regardless of input.
fuzz_target!(|input: FuzzInput| {
    let precision = match input.precision % 5 {
        0 => SolverPrecision::Low,
        1 => SolverPrecision::Moderate,
        2 => SolverPrecision::Normal,
        3 => SolverPrecision::High,
        _ => SolverPrecision::Ultra,
    };
    let settings = WorldSettings::default().with_precision(precision);
    let boundary = Boundary::new(FixVec::from_int(-150, -150), FixVec::from_int(150, 150));
    let Ok(mut world) = World::new(boundary, settings, FixVec::from_int(0, -10)) else {
        return;
    };

    for b in input.bodies.iter().take(24) {
        let material = Material::new(
            FixFloat::from_ratio(i64::from(b.bounce), 255),
            FixFloat::from_ratio(i64::from(b.friction), 255),
            FixFloat::ONE,
        );
        let size = FixFloat::from_ratio(i64::from(b.size) + 1, 32);
        let shape = if b.is_circle {
            Shape::circle(size)
        } else {
            Shape::rect(FixVec::new(size, size.half() + FixFloat::HALF))
        };
        let mut body = Body::new(
            i64::from(b.id),
            Transform::from_position(FixVec::from_int(i64::from(b.x), i64::from(b.y))),
            b.is_dynamic,
            material,
        )
        .with_shape(shape);
        body.velocity = Velocity::new(
            FixVec::from_int(i64::from(b.vx), i64::from(b.vy)),
            FixFloat::from_int(i64::from(b.spin)),
        );
        // duplicate ids are rejected, never a panic
        let _ = world.add(body);
    }

    let steps = (input.step_count as usize).min(32);
    for _ in 0..steps {
        world.iterate();
    }
});
