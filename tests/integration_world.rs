//! Integration tests for fixbox
//!
//! End-to-end scenarios through the public API only. Everything is integer
//! arithmetic, so repeated runs must agree bit for bit.

use fixbox::collision::collide_circles;
use fixbox::store::BodyStore;
use fixbox::{
    Body, Boundary, BodyHandler, CircleCollider, CollisionSolver, ColliderTable, ConvexCollider,
    FixFloat, FixVec, Material, PhysicsError, Shape, Transform, Velocity, World, WorldSettings,
};

// ============================================================================
// Helpers
// ============================================================================

fn arena(gravity: FixVec) -> World {
    let boundary = Boundary::new(FixVec::from_int(-100, -100), FixVec::from_int(100, 100));
    World::new(boundary, WorldSettings::default(), gravity).unwrap()
}

fn ground(id: i64, material: Material) -> Body {
    // 40 x 2 slab, top surface at y = 1
    Body::new(id, Transform::ZERO, false, material).with_shape(Shape::rect(FixVec::from_int(40, 2)))
}

fn circle(id: i64, position: FixVec, radius: FixFloat, material: Material) -> Body {
    Body::new(id, Transform::from_position(position), true, material).with_shape(Shape::circle(radius))
}

fn run(world: &mut World, steps: usize) {
    for _ in 0..steps {
        world.iterate();
    }
}

fn position(world: &World, handler: &BodyHandler) -> FixVec {
    world.actor(handler).unwrap().body.transform.position
}

fn sticky() -> Material {
    Material::new(FixFloat::ZERO, FixFloat::HALF, FixFloat::ONE)
}

// ============================================================================
// Free fall
// ============================================================================

#[test]
fn test_free_fall_determinism() {
    fn simulate() -> FixVec {
        let mut world = arena(FixVec::from_int(0, -10));
        let h = world
            .add(circle(1, FixVec::from_int(0, 50), FixFloat::ONE, Material::ORDINARY))
            .unwrap();
        run(&mut world, 60);
        position(&world, &h)
    }

    let p1 = simulate();
    let p2 = simulate();
    assert_eq!(p1.x.raw(), p2.x.raw());
    assert_eq!(p1.y.raw(), p2.y.raw());

    // about g t^2 / 2 = 5 after one second
    let fallen = FixFloat::from_int(50) - p1.y;
    assert!(fallen > FixFloat::from_ratio(9, 2), "fallen = {}", fallen);
    assert!(fallen < FixFloat::from_ratio(11, 2), "fallen = {}", fallen);
    assert!(p1.x.is_zero());
}

#[test]
fn test_gravity_opt_out() {
    let mut world = arena(FixVec::from_int(0, -10));
    let body = circle(1, FixVec::from_int(0, 10), FixFloat::ONE, Material::ORDINARY).with_gravity(false);
    let h = world.add(body).unwrap();
    run(&mut world, 30);
    assert_eq!(position(&world, &h), FixVec::from_int(0, 10));
}

// ============================================================================
// Resting contact
// ============================================================================

#[test]
fn test_resting_circle_is_stable() {
    let mut world = arena(FixVec::from_int(0, -10));
    world.add(ground(0, sticky())).unwrap();
    let h = world
        .add(circle(1, FixVec::from_int(0, 2), FixFloat::ONE, sticky()))
        .unwrap();

    run(&mut world, 120);
    let settled = position(&world, &h);
    run(&mut world, 120);
    let later = position(&world, &h);

    let eps = FixFloat::from_ratio(1, 20);
    assert!((later.y - FixFloat::from_int(2)).abs() < eps, "y = {}", later.y);
    assert!((later.y - settled.y).abs() < eps);
    assert!(later.x.abs() < eps);
}

#[test]
fn test_dropped_circle_rests_on_top() {
    let mut world = arena(FixVec::from_int(0, -10));
    world.add(ground(0, sticky())).unwrap();
    let radius = FixFloat::HALF;
    let h = world
        .add(circle(1, FixVec::from_int(3, 6), radius, sticky()))
        .unwrap();

    run(&mut world, 300);
    let rest = position(&world, &h);
    let expected = FixFloat::ONE + radius;
    assert!((rest.y - expected).abs() < FixFloat::from_ratio(1, 10), "y = {}", rest.y);

    let velocity = world.actor(&h).unwrap().body.velocity;
    assert!(velocity.linear.y.abs() < FixFloat::ONE);
}

// ============================================================================
// Impacts
// ============================================================================

#[test]
fn test_head_on_collision_momentum() {
    let mut world = arena(FixVec::ZERO);
    let mut a = circle(1, FixVec::from_int(-3, 0), FixFloat::ONE, sticky());
    a.velocity = Velocity::new(FixVec::from_int(4, 0), FixFloat::ZERO);
    let mut b = circle(2, FixVec::from_int(3, 0), FixFloat::ONE, sticky());
    b.velocity = Velocity::new(FixVec::from_int(-4, 0), FixFloat::ZERO);
    let ha = world.add(a).unwrap();
    let hb = world.add(b).unwrap();

    run(&mut world, 60);

    let va = world.actor(&ha).unwrap().body.velocity.linear;
    let vb = world.actor(&hb).unwrap().body.velocity.linear;
    let eps = FixFloat::from_ratio(1, 100);
    // no approaching relative velocity
    assert!(vb.x - va.x >= -eps, "va = {}, vb = {}", va.x, vb.x);
    // equal masses: total momentum stays zero
    assert!((va.x + vb.x).abs() <= eps);
    assert!((va.y + vb.y).abs() <= eps);
    // they met and did not pass through each other
    assert!(position(&world, &ha).x < position(&world, &hb).x);
}

#[test]
fn test_bounce_reverses_velocity() {
    let bouncy = Material::new(FixFloat::ONE, FixFloat::ZERO, FixFloat::ONE);
    let mut world = arena(FixVec::ZERO);
    world.add(ground(0, bouncy)).unwrap();
    let mut ball = circle(1, FixVec::from_int(0, 3), FixFloat::ONE, bouncy);
    ball.velocity = Velocity::new(FixVec::from_int(0, -6), FixFloat::ZERO);
    let h = world.add(ball).unwrap();

    run(&mut world, 30);
    let v = world.actor(&h).unwrap().body.velocity.linear;
    assert!(v.y.is_positive(), "vy = {}", v.y);
}

// ============================================================================
// Stacking
// ============================================================================

#[test]
fn test_box_stack_stays_up() {
    let mut world = arena(FixVec::from_int(0, -10));
    world.add(ground(0, sticky())).unwrap();
    let size = FixVec::from_int(2, 2);
    let mut handlers = Vec::new();
    for i in 0..3 {
        let body = Body::new(i + 1, Transform::from_position(FixVec::from_int(0, 2 + 2 * i)), true, sticky())
            .with_shape(Shape::rect(size));
        handlers.push(world.add(body).unwrap());
    }

    run(&mut world, 240);

    let mut last_y = FixFloat::ZERO;
    for h in &handlers {
        let body = world.actor(h).unwrap().body;
        let p = body.transform.position;
        assert!(body.is_alive);
        assert!(p.y > last_y, "stack order lost: {}", p.y);
        assert!(p.x.abs() < FixFloat::HALF, "box slid: {}", p.x);
        last_y = p.y;
    }
    // top box sits near 1 + 2 + 2 + 1
    assert!((last_y - FixFloat::from_int(6)).abs() < FixFloat::ONE, "top = {}", last_y);
}

// ============================================================================
// Store and handlers
// ============================================================================

#[test]
fn test_handle_invalidation() {
    let mut world = arena(FixVec::ZERO);
    let h10 = world
        .add(circle(10, FixVec::from_int(0, 0), FixFloat::ONE, Material::ORDINARY))
        .unwrap();
    let h20 = world
        .add(circle(20, FixVec::from_int(5, 0), FixFloat::ONE, Material::ORDINARY))
        .unwrap();

    // insertion in front moves both bodies
    world
        .add(circle(5, FixVec::from_int(-5, 0), FixFloat::ONE, Material::ORDINARY))
        .unwrap();
    assert_eq!(world.actor(&h10).unwrap().body.id, 10);
    assert_eq!(world.actor(&h20).unwrap().handler.index, 2);

    assert_eq!(world.remove(&h10).unwrap().id, 10);
    assert_eq!(world.actor(&h10), Err(PhysicsError::BodyNotFound { id: 10 }));
    assert_eq!(world.remove(&h10), Err(PhysicsError::BodyNotFound { id: 10 }));
    assert_eq!(world.actor(&h20).unwrap().handler.index, 1);

    assert!(matches!(
        world.add(circle(20, FixVec::ZERO, FixFloat::ONE, Material::ORDINARY)),
        Err(PhysicsError::DuplicateBody { id: 20 })
    ));
}

#[test]
fn test_store_add_remove_idempotent() {
    let mut store = BodyStore::new();
    let body = Body::new(1, Transform::ZERO, true, Material::ORDINARY);
    let h = store.add(body.clone()).unwrap();
    assert_eq!(store.remove(&h).unwrap(), body);
    let h = store.add(body.clone()).unwrap();
    assert_eq!(store.get(&h).unwrap(), &body);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_store_empties_in_any_order() {
    let mut store = BodyStore::new();
    let mut handlers = Vec::new();
    for i in 0..50 {
        let id = (i * 37) % 101;
        handlers.push(store.add(Body::new(id, Transform::ZERO, true, Material::ORDINARY)).unwrap());
    }
    assert_eq!(store.len(), 50);
    let ids: Vec<i64> = store.bodies().iter().map(|b| b.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    for i in 0..50 {
        let h = &handlers[(i * 13) % 50];
        assert_eq!(store.remove(h).unwrap().id, h.id);
    }
    assert!(store.is_empty());
    for h in &handlers {
        assert_eq!(store.get(h), Err(PhysicsError::BodyNotFound { id: h.id }));
    }
}

#[test]
fn test_set_moves_body() {
    let mut world = arena(FixVec::ZERO);
    let h = world
        .add(circle(1, FixVec::ZERO, FixFloat::ONE, Material::ORDINARY))
        .unwrap();
    let mut actor = world.actor_by_id(1).unwrap();
    actor.body.velocity = Velocity::new(FixVec::from_int(6, 0), FixFloat::ZERO);
    world.set(actor).unwrap();
    run(&mut world, 60);
    let p = position(&world, &h);
    assert!((p.x - FixFloat::from_int(6)).abs() < FixFloat::from_ratio(1, 100));
}

// ============================================================================
// Narrow phase through the public API
// ============================================================================

#[test]
fn test_normal_symmetry() {
    let mut colliders = ColliderTable::new();
    let hexagon = ConvexCollider::new(vec![
        FixVec::from_int(2, 0),
        FixVec::from_int(1, 2),
        FixVec::from_int(-1, 2),
        FixVec::from_int(-2, 0),
        FixVec::from_int(-1, -2),
        FixVec::from_int(1, -2),
    ])
    .unwrap();
    let index = colliders.add(hexagon.clone());

    let mut bodies = vec![
        circle(1, FixVec::from_int(0, 0), FixFloat::ONE, Material::ORDINARY),
        Body::new(2, Transform::new(FixVec::from_int(2, 1), FixFloat::from_ratio(1, 5)), true, Material::ORDINARY)
            .with_shape(Shape::polygon(index, &hexagon)),
        Body::new(3, Transform::from_position(FixVec::from_int(-1, 2)), true, Material::ORDINARY)
            .with_shape(Shape::rect(FixVec::from_int(2, 2))),
    ];
    for body in &mut bodies {
        body.refresh_boundary(&colliders);
    }

    let solver = CollisionSolver::default();
    for i in 0..bodies.len() {
        for j in 0..bodies.len() {
            if i == j {
                continue;
            }
            let ab = solver.collide(&bodies[i], &bodies[j], &colliders);
            let ba = solver.collide(&bodies[j], &bodies[i], &colliders);
            assert_eq!(ab.is_outside(), ba.is_outside());
            if ab.is_outside() {
                continue;
            }
            let sum = ab.normal + ba.normal;
            let eps = FixFloat::from_raw(8);
            assert!(sum.x.abs() <= eps && sum.y.abs() <= eps, "{} vs {}", i, j);
        }
    }
}

#[test]
fn test_box_normal_symmetry_sweep() {
    let colliders = ColliderTable::new();
    let solver = CollisionSolver::default();
    let eps = FixFloat::from_ratio(1, 32);
    let mut touching = 0;

    let mut slab = Body::new(2, Transform::ZERO, true, Material::ORDINARY).with_shape(Shape::rect(FixVec::from_int(3, 2)));
    slab.refresh_boundary(&colliders);

    for step in 0..7 {
        let angle = FixFloat::from_ratio(step, 4);
        for i in -4..=4 {
            for j in -4..=4 {
                if i == 0 && j == 0 {
                    continue;
                }
                let offset = FixVec::new(FixFloat::from_ratio(i, 2), FixFloat::from_ratio(j, 2));
                let mut tilted = Body::new(1, Transform::new(offset, angle), true, Material::ORDINARY)
                    .with_shape(Shape::rect(FixVec::from_int(2, 2)));
                tilted.refresh_boundary(&colliders);

                let ab = solver.collide(&tilted, &slab, &colliders);
                let ba = solver.collide(&slab, &tilted, &colliders);
                assert_eq!(ab.is_outside(), ba.is_outside(), "offset {:?} angle {}", offset, angle);
                if ab.is_outside() {
                    continue;
                }
                touching += 1;
                let sum = ab.normal + ba.normal;
                assert!(
                    sum.x.abs() <= eps && sum.y.abs() <= eps,
                    "offset {:?} angle {}: {:?} vs {:?}",
                    offset,
                    angle,
                    ab.normal,
                    ba.normal
                );
            }
        }
    }
    assert!(touching > 0);
}

#[test]
fn test_circles_outside_iff_beyond_radius_sum() {
    let radii = [
        (FixFloat::ONE, FixFloat::ONE),
        (FixFloat::HALF, FixFloat::from_ratio(3, 2)),
        (FixFloat::from_int(2), FixFloat::from_ratio(1, 3)),
    ];
    let directions = [FixVec::UNIT_X, -FixVec::UNIT_X, FixVec::UNIT_Y, -FixVec::UNIT_Y];
    let center = FixVec::from_int(7, -3);

    for &(ra, rb) in &radii {
        let sum = ra + rb;
        for &dir in &directions {
            for k in -4..=4 {
                let d = sum + FixFloat::from_raw(k);
                let a = CircleCollider::new(center, ra);
                let b = CircleCollider::new(center + dir * d, rb);
                let ab = collide_circles(&a, &b);
                let ba = collide_circles(&b, &a);
                assert_eq!(ab.is_outside(), k > 0, "ra {} rb {} k {}", ra, rb, k);
                assert_eq!(ba.is_outside(), k > 0);
                if k <= 0 {
                    let ulp = FixFloat::from_raw(8);
                    let (fwd, back) = (ab.normal - dir, ba.normal + dir);
                    assert!(fwd.x.abs() <= ulp && fwd.y.abs() <= ulp);
                    assert!(back.x.abs() <= ulp && back.y.abs() <= ulp);
                }
            }
        }
    }
}

#[test]
fn test_invalid_polygon_rejected() {
    let line = ConvexCollider::new(vec![
        FixVec::from_int(0, 0),
        FixVec::from_int(1, 1),
        FixVec::from_int(2, 2),
    ]);
    assert!(matches!(line, Err(PhysicsError::InvalidShape { .. })));
    let pair = ConvexCollider::new(vec![FixVec::ZERO, FixVec::UNIT_X]);
    assert!(pair.is_err());
}
