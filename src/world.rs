//! Physics World
//!
//! [`World`] owns the body store, the polygon collider table and the solver
//! scratch buffers, and advances the simulation one `time_step` per
//! [`World::iterate`] call.
//!
//! # Step
//!
//! Each call runs `position_iterations` substeps of
//! `sub_dt = time_step / position_iterations`:
//!
//! 1. broad phase over all pairs of alive bodies with at least one dynamic
//!    body, rejected by boundary overlap
//! 2. narrow phase (a static body is always the second body), manifolds
//! 3. slot allocation and the velocity loop
//! 4. integration: bodies with a slot move by their bias velocity and keep
//!    their true velocity, all others fly freely
//! 5. boundaries of moved bodies are refreshed
//!
//! After the last substep pending accelerations are cleared and dynamic
//! bodies outside the freeze boundary stop taking part.
//!
//! # Example
//!
//! ```rust
//! use fixbox::prelude::*;
//!
//! let boundary = Boundary::new(FixVec::from_int(-50, -50), FixVec::from_int(50, 50));
//! let mut world = World::new(boundary, WorldSettings::default(), FixVec::from_int(0, -10)).unwrap();
//!
//! let ground = Body::new(1, Transform::ZERO, false, Material::ORDINARY)
//!     .with_shape(Shape::rect(FixVec::from_int(20, 2)));
//! world.add(ground).unwrap();
//!
//! let ball = Body::new(2, Transform::from_position(FixVec::from_int(0, 5)), true, Material::ORDINARY)
//!     .with_shape(Shape::circle(FixFloat::ONE));
//! let handler = world.add(ball).unwrap();
//!
//! for _ in 0..60 {
//!     world.iterate();
//! }
//! let ball = world.actor(&handler).unwrap().body;
//! assert!(ball.transform.position.y < FixFloat::from_int(5));
//! ```

use crate::body::{Acceleration, Body, Velocity};
use crate::boundary::Boundary;
use crate::collider::{ColliderIndex, ColliderTable, ConvexCollider};
use crate::collision::CollisionSolver;
use crate::contact::Contact;
use crate::error::PhysicsError;
use crate::manifold::{DmManifold, StManifold};
use crate::math::{FixFloat, FixVec};
use crate::resolver::SolverScratch;
use crate::settings::WorldSettings;
use crate::shape::Form;
use crate::store::{Actor, BodyHandler, BodyStore};
use log::{debug, trace, warn};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Narrow-phase hit: global indices of A and B plus their contact.
type ContactPair = (usize, usize, Contact);

/// Simulation world
#[derive(Debug)]
pub struct World {
    settings: WorldSettings,
    gravity: FixVec,
    freeze_boundary: Boundary,
    collision_solver: CollisionSolver,
    store: BodyStore,
    colliders: ColliderTable,
    scratch: SolverScratch,
    pairs: Vec<ContactPair>,
    contacts: Vec<Contact>,
}

impl World {
    /// World covering `boundary` (grown by `freeze_margin` for freezing).
    pub fn new(
        boundary: Boundary,
        settings: WorldSettings,
        gravity: FixVec,
    ) -> Result<Self, PhysicsError> {
        settings.validate()?;
        Ok(Self {
            settings,
            gravity,
            freeze_boundary: boundary.expand(settings.freeze_margin),
            collision_solver: CollisionSolver::new(settings.circle_margin),
            store: BodyStore::with_capacity(settings.body_capacity),
            colliders: ColliderTable::new(),
            scratch: SolverScratch::with_capacity(settings.body_capacity),
            pairs: Vec::new(),
            contacts: Vec::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn gravity(&self) -> FixVec {
        self.gravity
    }

    #[inline]
    #[must_use]
    pub fn freeze_boundary(&self) -> &Boundary {
        &self.freeze_boundary
    }

    /// Bodies in id order.
    #[inline]
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        self.store.bodies()
    }

    /// Contacts of the last substep; empty unless `debug_contacts` is set.
    #[inline]
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    // ------------------------------------------------------------------
    // Colliders
    // ------------------------------------------------------------------

    /// Register a polygon for use by [`crate::shape::Shape::polygon`].
    pub fn add_collider(&mut self, collider: ConvexCollider) -> ColliderIndex {
        self.colliders.add(collider)
    }

    #[must_use]
    pub fn collider(&self, index: ColliderIndex) -> Option<&ConvexCollider> {
        self.colliders.get(index)
    }

    #[inline]
    #[must_use]
    pub fn colliders(&self) -> &ColliderTable {
        &self.colliders
    }

    fn check_shape(&self, body: &Body) -> Result<(), PhysicsError> {
        if let Form::Polygon { index } = body.shape().form {
            if self.colliders.get(index).is_none() {
                warn!("world: body {} references unknown collider {}", body.id, index.index());
                return Err(PhysicsError::InvalidShape {
                    reason: "unknown collider index",
                });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    pub fn add(&mut self, mut body: Body) -> Result<BodyHandler, PhysicsError> {
        self.check_shape(&body)?;
        body.refresh_boundary(&self.colliders);
        self.store.add(body)
    }

    pub fn actor(&self, handler: &BodyHandler) -> Result<Actor, PhysicsError> {
        self.store.actor(handler)
    }

    pub fn actor_by_id(&self, id: i64) -> Result<Actor, PhysicsError> {
        self.store.actor_by_id(id)
    }

    /// Write an edited actor back. Returns a handler valid for the current
    /// store state.
    pub fn set(&mut self, actor: Actor) -> Result<BodyHandler, PhysicsError> {
        let Actor { handler, mut body } = actor;
        if body.id != handler.id {
            warn!("world: actor body {} does not match handler {}", body.id, handler.id);
            return Err(PhysicsError::InvalidActor {
                reason: "body id differs from handler id",
            });
        }
        self.check_shape(&body)?;

        let index = self.store.index_of(&handler)?;
        body.refresh_boundary(&self.colliders);
        self.store.bodies_mut()[index] = body;

        self.store
            .handler_at(index)
            .ok_or(PhysicsError::BodyNotFound { id: handler.id })
    }

    pub fn remove(&mut self, handler: &BodyHandler) -> Result<Body, PhysicsError> {
        self.store.remove(handler)
    }

    /// Drop every body. Colliders stay registered.
    pub fn reset(&mut self) {
        self.store.remove_all();
        self.scratch.clear();
        self.contacts.clear();
    }

    // ------------------------------------------------------------------
    // Step
    // ------------------------------------------------------------------

    /// Advance the world by one `time_step`.
    pub fn iterate(&mut self) {
        let dt = self.settings.sub_time_step();
        let bias_scale = self.settings.baumgarte / dt;
        let substeps = self.settings.position_iterations;

        self.contacts.clear();
        for substep in 0..substeps {
            self.substep(dt, bias_scale, substep + 1 == substeps);
        }

        let freeze_boundary = self.freeze_boundary;
        for body in self.store.bodies_mut() {
            body.acceleration = Acceleration::ZERO;
            if body.is_alive && body.is_dynamic() && !freeze_boundary.is_collide(body.boundary()) {
                body.is_alive = false;
                debug!("world: body {} left the world and is frozen", body.id);
            }
        }
    }

    fn substep(&mut self, dt: FixFloat, bias_scale: FixFloat, is_last: bool) {
        self.scratch.clear();
        self.find_contacts();

        let bodies = self.store.bodies();
        for &(i_a, i_b, contact) in &self.pairs {
            let (a, b) = (&bodies[i_a], &bodies[i_b]);
            debug_assert!(a.is_dynamic());
            if b.is_dynamic() {
                self.scratch
                    .dm_manifolds
                    .push(DmManifold::new(a, b, i_a, i_b, &contact, bias_scale));
            } else {
                self.scratch
                    .st_manifolds
                    .push(StManifold::new(a, b, i_a, i_b, &contact, bias_scale));
            }
        }

        if is_last && self.settings.debug_contacts {
            self.contacts.extend(self.pairs.iter().map(|&(_, _, contact)| contact));
        }

        if self.scratch.has_manifolds() {
            self.scratch.allocate(bodies);
            self.scratch.iterate(
                self.settings.velocity_iterations,
                self.settings.impact_stabilization,
            );
        }

        self.integrate(dt);
    }

    /// Collect every non-outside contact in row order.
    fn find_contacts(&mut self) {
        self.pairs.clear();
        let bodies = self.store.bodies();
        let solver = &self.collision_solver;
        let colliders = &self.colliders;

        #[cfg(feature = "parallel")]
        {
            let rows: Vec<Vec<ContactPair>> = (0..bodies.len())
                .into_par_iter()
                .map(|i| {
                    let mut row = Vec::new();
                    collect_row(i, bodies, solver, colliders, &mut row);
                    row
                })
                .collect();
            for row in rows {
                self.pairs.extend(row);
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            for i in 0..bodies.len() {
                collect_row(i, bodies, solver, colliders, &mut self.pairs);
            }
        }

        trace!("world: {} contacts among {} bodies", self.pairs.len(), bodies.len());
    }

    fn integrate(&mut self, dt: FixFloat) {
        let gravity = self.gravity;
        let scratch = &self.scratch;
        let colliders = &self.colliders;

        for (index, body) in self.store.bodies_mut().iter_mut().enumerate() {
            if !body.is_alive || !body.is_dynamic() {
                continue;
            }

            let mut acceleration = body.acceleration;
            if body.apply_gravity() {
                acceleration.linear += gravity;
            }

            let (velocity, transform) = match scratch.slot_of(index) {
                Some(slot) => {
                    let var = &scratch.vars()[slot];
                    let transform = body.transform.apply(
                        var.bias_velocity.linear,
                        var.bias_velocity.angular,
                        dt,
                    );
                    (damp(body, var.velocity.apply(&acceleration, dt)), transform)
                }
                None => {
                    if body.velocity.is_zero() && acceleration.is_zero() {
                        continue;
                    }
                    let velocity = damp(body, body.velocity.apply(&acceleration, dt));
                    (velocity, body.transform.apply(velocity.linear, velocity.angular, dt))
                }
            };

            let boundary = body.shape().world_boundary(&transform, colliders);
            body.step_update(velocity, transform, boundary);
        }
    }
}

/// Air damping of the body's material.
#[inline]
fn damp(body: &Body, velocity: Velocity) -> Velocity {
    let material = body.material();
    if material.has_air_friction() {
        velocity.damped(material.air_linear_friction, material.air_angular_friction)
    } else {
        velocity
    }
}

/// Contacts of body `i` against every later body.
fn collect_row(
    i: usize,
    bodies: &[Body],
    solver: &CollisionSolver,
    colliders: &ColliderTable,
    out: &mut Vec<ContactPair>,
) {
    let a = &bodies[i];
    if !a.is_alive {
        return;
    }
    for (j, b) in bodies.iter().enumerate().skip(i + 1) {
        if !b.is_alive || (!a.is_dynamic() && !b.is_dynamic()) {
            continue;
        }
        if !a.boundary().is_collide(b.boundary()) {
            continue;
        }
        let (i_a, i_b) = if a.is_dynamic() { (i, j) } else { (j, i) };
        let contact = solver.collide(&bodies[i_a], &bodies[i_b], colliders);
        if !contact.is_outside() {
            out.push((i_a, i_b, contact));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::shape::Shape;
    use crate::transform::Transform;

    fn world(gravity: FixVec) -> World {
        let boundary = Boundary::new(FixVec::from_int(-100, -100), FixVec::from_int(100, 100));
        World::new(boundary, WorldSettings::default(), gravity).unwrap()
    }

    fn ball(id: i64, x: i64, y: i64) -> Body {
        Body::new(id, Transform::from_position(FixVec::from_int(x, y)), true, Material::ORDINARY)
            .with_shape(Shape::circle(FixFloat::ONE))
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = WorldSettings {
            position_iterations: 0,
            ..WorldSettings::default()
        };
        assert!(World::new(Boundary::ZERO, settings, FixVec::ZERO).is_err());
    }

    #[test]
    fn test_add_refreshes_boundary() {
        let mut w = world(FixVec::ZERO);
        let h = w.add(ball(1, 3, 4)).unwrap();
        let body = w.actor(&h).unwrap().body;
        assert_eq!(body.boundary().min, FixVec::from_int(2, 3));
        assert_eq!(body.boundary().max, FixVec::from_int(4, 5));
    }

    #[test]
    fn test_unknown_collider_rejected() {
        let mut w = world(FixVec::ZERO);
        let mut other = ColliderTable::new();
        let collider = ConvexCollider::from_size(FixVec::from_int(1, 1));
        let index = other.add(collider.clone());
        let body = Body::new(1, Transform::ZERO, true, Material::ORDINARY)
            .with_shape(Shape::polygon(index, &collider));
        assert!(matches!(w.add(body.clone()), Err(PhysicsError::InvalidShape { .. })));

        let index = w.add_collider(collider.clone());
        let body = Body::new(1, Transform::ZERO, true, Material::ORDINARY)
            .with_shape(Shape::polygon(index, &collider));
        assert!(w.add(body).is_ok());
    }

    #[test]
    fn test_free_fall() {
        let mut w = world(FixVec::from_int(0, -10));
        let h = w.add(ball(1, 0, 0)).unwrap();
        w.iterate();
        let body = w.actor(&h).unwrap().body;
        assert!(body.velocity.linear.y.is_negative());
        assert!(body.transform.position.y.is_negative());
        assert!(body.velocity.linear.x.is_zero());
        assert!(body.acceleration.is_zero());
    }

    #[test]
    fn test_static_never_moves() {
        let mut w = world(FixVec::from_int(0, -10));
        let mut wall = Body::new(1, Transform::ZERO, false, Material::ORDINARY)
            .with_shape(Shape::rect(FixVec::from_int(4, 4)));
        wall.velocity = Velocity::new(FixVec::from_int(5, 0), FixFloat::ZERO);
        let h = w.add(wall).unwrap();
        for _ in 0..10 {
            w.iterate();
        }
        assert_eq!(w.actor(&h).unwrap().body.transform.position, FixVec::ZERO);
    }

    #[test]
    fn test_set_round_trip() {
        let mut w = world(FixVec::ZERO);
        let h = w.add(ball(1, 0, 0)).unwrap();
        let mut actor = w.actor(&h).unwrap();
        actor.body.transform = Transform::from_position(FixVec::from_int(10, 0));
        let h = w.set(actor).unwrap();
        let body = w.actor(&h).unwrap().body;
        assert_eq!(body.transform.position, FixVec::from_int(10, 0));
        assert_eq!(body.boundary().min, FixVec::from_int(9, -1));
    }

    #[test]
    fn test_set_rejects_mismatched_actor() {
        let mut w = world(FixVec::ZERO);
        let h = w.add(ball(1, 0, 0)).unwrap();
        let mut actor = w.actor(&h).unwrap();
        actor.body.id = 2;
        assert!(matches!(w.set(actor), Err(PhysicsError::InvalidActor { .. })));
    }

    #[test]
    fn test_remove_and_reset() {
        let mut w = world(FixVec::ZERO);
        let h1 = w.add(ball(1, 0, 0)).unwrap();
        w.add(ball(2, 5, 0)).unwrap();
        assert_eq!(w.remove(&h1).unwrap().id, 1);
        assert!(w.actor(&h1).is_err());
        assert!(w.actor_by_id(2).is_ok());
        w.reset();
        assert!(w.bodies().is_empty());
    }

    #[test]
    fn test_freeze_outside_world() {
        let boundary = Boundary::new(FixVec::from_int(-5, -5), FixVec::from_int(5, 5));
        let mut w = World::new(boundary, WorldSettings::default(), FixVec::ZERO).unwrap();
        let mut body = ball(1, 0, 0);
        body.velocity = Velocity::new(FixVec::from_int(600, 0), FixFloat::ZERO);
        let h = w.add(body).unwrap();
        w.iterate();
        let frozen = w.actor(&h).unwrap().body;
        assert!(!frozen.is_alive);

        let x = frozen.transform.position.x;
        w.iterate();
        assert_eq!(w.actor(&h).unwrap().body.transform.position.x, x);
    }

    #[test]
    fn test_debug_contacts() {
        let boundary = Boundary::new(FixVec::from_int(-10, -10), FixVec::from_int(10, 10));
        let settings = WorldSettings {
            debug_contacts: true,
            ..WorldSettings::default()
        };
        let mut w = World::new(boundary, settings, FixVec::ZERO).unwrap();
        w.add(ball(1, 0, 0)).unwrap();
        w.add(ball(2, 1, 0)).unwrap();
        w.add(ball(3, 8, 8)).unwrap();
        w.iterate();
        assert_eq!(w.contacts().len(), 1);
        assert!(w.contacts()[0].penetration.is_negative());

        let mut quiet = world(FixVec::ZERO);
        quiet.add(ball(1, 0, 0)).unwrap();
        quiet.add(ball(2, 1, 0)).unwrap();
        quiet.iterate();
        assert!(quiet.contacts().is_empty());
    }

    #[test]
    fn test_overlap_separates() {
        let mut w = world(FixVec::ZERO);
        let h1 = w.add(ball(1, 0, 0)).unwrap();
        let h2 = w.add(ball(2, 1, 0)).unwrap();
        for _ in 0..60 {
            w.iterate();
        }
        let a = w.actor(&h1).unwrap().body.transform.position;
        let b = w.actor(&h2).unwrap().body.transform.position;
        assert!(a.x < FixFloat::ZERO);
        assert!(b.x > FixFloat::ONE);
        // symmetric push
        assert!((a.x + b.x - FixFloat::ONE).abs() <= FixFloat::from_raw(64));
    }
}
