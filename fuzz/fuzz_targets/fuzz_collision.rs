#![no_main]
use arbitrary::Arbitrary;
use fixbox::{
    Body, ColliderTable, CollisionSolver, ConvexCollider, FixFloat, FixVec, Material, Shape,
    Transform,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum FuzzShape {
    Circle { radius: u8 },
    Rect { w: u8, h: u8 },
    Polygon { points: Vec<(i8, i8)> },
}

#[derive(Debug, Arbitrary)]
struct FuzzBody {
    shape: FuzzShape,
    /// Position in 1/16 units
    x: i16,
    y: i16,
    /// Angle in 1/64 rad
    angle: i16,
}

#[derive(Debug, Arbitrary)]
struct CollisionInput {
    a: FuzzBody,
    b: FuzzBody,
}

fn build(input: &FuzzBody, id: i64, colliders: &mut ColliderTable) -> Option<Body> {
    let shape = match &input.shape {
        FuzzShape::Circle { radius } => Shape::circle(FixFloat::from_ratio(i64::from(*radius) + 1, 8)),
        FuzzShape::Rect { w, h } => Shape::rect(FixVec::new(
            FixFloat::from_ratio(i64::from(*w) + 1, 8),
            FixFloat::from_ratio(i64::from(*h) + 1, 8),
        )),
        FuzzShape::Polygon { points } => {
            let points = points
                .iter()
                .take(16)
                .map(|&(x, y)| FixVec::new(FixFloat::from_ratio(i64::from(x), 8), FixFloat::from_ratio(i64::from(y), 8)))
                .collect();
            // invalid polygons are rejected, never a panic
            let collider = ConvexCollider::new(points).ok()?;
            let index = colliders.add(collider.clone());
            Shape::polygon(index, &collider)
        }
    };
    let transform = Transform::new(
        FixVec::new(
            FixFloat::from_ratio(i64::from(input.x), 16),
            FixFloat::from_ratio(i64::from(input.y), 16),
        ),
        FixFloat::from_ratio(i64::from(input.angle), 64),
    );
    let mut body = Body::new(id, transform, true, Material::ORDINARY).with_shape(shape);
    body.refresh_boundary(colliders);
    Some(body)
}

// Narrow phase on arbitrary shape pairs, both argument orders.
// Must never panic; normals stay unit length.
fuzz_target!(|input: CollisionInput| {
    let mut colliders = ColliderTable::new();
    let (Some(a), Some(b)) = (build(&input.a, 1, &mut colliders), build(&input.b, 2, &mut colliders)) else {
        return;
    };

    let solver = CollisionSolver::default();
    for contact in [solver.collide(&a, &b, &colliders), solver.collide(&b, &a, &colliders)] {
        if !contact.is_outside() {
            assert!(contact.normal.length() <= FixFloat::from_ratio(9, 8));
        }
    }
});
