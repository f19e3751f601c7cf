//! Contact Resolver
//!
//! Working-variable layer of one substep. Every body touched by a manifold
//! gets a [`VarBody`] slot holding its true and bias velocities; the velocity
//! loop then runs Jacobi passes over all manifolds:
//!
//! 1. every manifold resolves both channels from the start-of-pass slot values
//! 2. the velocity deltas are summed per slot in a [`VarVelocity`]
//! 3. each slot takes the average delta; slots hit by several impacts have
//!    their true velocity scaled down by `impact_stabilization` per extra hit
//!
//! A pass in which no manifold produced an impulse ends the loop.
//!
//! All buffers live in [`SolverScratch`], owned by the world and reused across
//! substeps.

use crate::body::{Body, Velocity};
use crate::manifold::{DmManifold, StManifold};
use crate::math::{FixFloat, FixVec};
use log::trace;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Marker for a body without a slot.
const NO_SLOT: usize = usize::MAX;

// ============================================================================
// VarBody / VarVelocity
// ============================================================================

/// Solver slot of one body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VarBody {
    /// Global body index
    pub index: usize,
    /// True velocity
    pub velocity: Velocity,
    /// Velocity used only for position correction
    pub bias_velocity: Velocity,
    /// Dynamic manifolds touching this body
    pub dyn_manifolds: Vec<usize>,
    /// Static manifolds touching this body
    pub st_manifolds: Vec<usize>,
}

impl VarBody {
    fn reset(&mut self, index: usize, velocity: Velocity) {
        self.index = index;
        self.velocity = velocity;
        self.bias_velocity = velocity;
        self.dyn_manifolds.clear();
        self.st_manifolds.clear();
    }
}

/// Per-slot sum of velocity deltas within one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VarVelocity {
    pub velocity: Velocity,
    pub bias_velocity: Velocity,
    pub count: i64,
    pub bias_count: i64,
}

impl VarVelocity {
    pub const ZERO: Self = Self {
        velocity: Velocity::ZERO,
        bias_velocity: Velocity::ZERO,
        count: 0,
        bias_count: 0,
    };

    #[inline]
    fn add_velocity(&mut self, delta: Velocity) {
        self.velocity = self.velocity + delta;
        self.count += 1;
    }

    #[inline]
    fn add_bias(&mut self, delta: Velocity) {
        self.bias_velocity = self.bias_velocity + delta;
        self.bias_count += 1;
    }
}

#[inline]
fn average(sum: Velocity, count: i64) -> Velocity {
    if count == 1 {
        sum
    } else {
        Velocity::new(
            FixVec::new(sum.linear.x.div_int(count), sum.linear.y.div_int(count)),
            sum.angular.div_int(count),
        )
    }
}

// ============================================================================
// SolverScratch
// ============================================================================

/// Reusable buffers of the contact solver.
#[derive(Debug, Default)]
pub struct SolverScratch {
    /// Dynamic/dynamic manifolds of the current substep
    pub dm_manifolds: Vec<DmManifold>,
    /// Dynamic/static manifolds of the current substep
    pub st_manifolds: Vec<StManifold>,
    vars: Vec<VarBody>,
    var_count: usize,
    slot_map: Vec<usize>,
    accumulators: Vec<VarVelocity>,
}

impl SolverScratch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scratch sized for `capacity` bodies.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dm_manifolds: Vec::with_capacity(capacity),
            st_manifolds: Vec::with_capacity(capacity),
            vars: Vec::with_capacity(capacity),
            var_count: 0,
            slot_map: Vec::with_capacity(capacity),
            accumulators: Vec::with_capacity(capacity),
        }
    }

    /// Forget the previous substep, keeping capacity.
    pub fn clear(&mut self) {
        for var in &self.vars[..self.var_count] {
            if let Some(entry) = self.slot_map.get_mut(var.index) {
                *entry = NO_SLOT;
            }
        }
        self.var_count = 0;
        self.dm_manifolds.clear();
        self.st_manifolds.clear();
    }

    #[inline]
    #[must_use]
    pub fn has_manifolds(&self) -> bool {
        !self.dm_manifolds.is_empty() || !self.st_manifolds.is_empty()
    }

    /// Slots allocated for the current substep.
    #[inline]
    #[must_use]
    pub fn vars(&self) -> &[VarBody] {
        &self.vars[..self.var_count]
    }

    /// Slot of the body at global `index`, if it has one.
    #[must_use]
    pub fn slot_of(&self, index: usize) -> Option<usize> {
        match self.slot_map.get(index) {
            Some(&slot) if slot != NO_SLOT => Some(slot),
            _ => None,
        }
    }

    fn slot(&mut self, index: usize, bodies: &[Body]) -> usize {
        if let Some(slot) = self.slot_of(index) {
            return slot;
        }
        let slot = self.var_count;
        let velocity = bodies[index].velocity;
        if slot < self.vars.len() {
            self.vars[slot].reset(index, velocity);
        } else {
            let mut var = VarBody::default();
            var.reset(index, velocity);
            self.vars.push(var);
        }
        self.var_count += 1;
        self.slot_map[index] = slot;
        slot
    }

    /// Give every body touched by a manifold a slot and record the manifold
    /// in it. Manifold slot indices are filled in.
    pub fn allocate(&mut self, bodies: &[Body]) {
        if self.slot_map.len() < bodies.len() {
            self.slot_map.resize(bodies.len(), NO_SLOT);
        }

        for m in 0..self.dm_manifolds.len() {
            let (i_a, i_b) = (self.dm_manifolds[m].i_a, self.dm_manifolds[m].i_b);
            let v_a = self.slot(i_a, bodies);
            let v_b = self.slot(i_b, bodies);
            self.vars[v_a].dyn_manifolds.push(m);
            self.vars[v_b].dyn_manifolds.push(m);
            let manifold = &mut self.dm_manifolds[m];
            manifold.v_a = v_a;
            manifold.v_b = v_b;
        }

        for m in 0..self.st_manifolds.len() {
            let i_a = self.st_manifolds[m].i_a;
            let v_a = self.slot(i_a, bodies);
            self.vars[v_a].st_manifolds.push(m);
            self.st_manifolds[m].v_a = v_a;
        }

        trace!(
            "resolver: {} dynamic, {} static manifolds over {} slots",
            self.dm_manifolds.len(),
            self.st_manifolds.len(),
            self.var_count
        );
    }

    /// Run up to `iterations` Jacobi passes. Returns the number of passes that
    /// produced at least one impulse.
    pub fn iterate(&mut self, iterations: usize, impact_stabilization: FixFloat) -> usize {
        let count = self.var_count;
        self.accumulators.clear();
        self.accumulators.resize(count, VarVelocity::ZERO);

        for pass in 0..iterations {
            let vars = &self.vars[..count];
            let acc = &mut self.accumulators[..count];
            acc.fill(VarVelocity::ZERO);

            for m in &self.dm_manifolds {
                let (a, b) = (&vars[m.v_a], &vars[m.v_b]);
                if let Some(s) = m.resolve(&a.velocity, &b.velocity) {
                    acc[m.v_a].add_velocity(s.vel_a - a.velocity);
                    acc[m.v_b].add_velocity(s.vel_b - b.velocity);
                }
                if let Some(s) = m.resolve_bias(&a.bias_velocity, &b.bias_velocity) {
                    acc[m.v_a].add_bias(s.vel_a - a.bias_velocity);
                    acc[m.v_b].add_bias(s.vel_b - b.bias_velocity);
                }
            }

            for m in &self.st_manifolds {
                let a = &vars[m.v_a];
                if let Some(s) = m.resolve(&a.velocity) {
                    acc[m.v_a].add_velocity(s.vel - a.velocity);
                }
                if let Some(s) = m.resolve_bias(&a.bias_velocity) {
                    acc[m.v_a].add_bias(s.vel - a.bias_velocity);
                }
            }

            let mut any_impact = false;
            for (var, sum) in self.vars[..count].iter_mut().zip(acc.iter()) {
                if sum.count > 0 {
                    any_impact = true;
                    let mut velocity = var.velocity + average(sum.velocity, sum.count);
                    if sum.count >= 2 {
                        let extra = impact_stabilization.mul_int(sum.count - 1);
                        let keep = (FixFloat::ONE - extra).max(FixFloat::ZERO);
                        velocity = velocity.damped(keep, keep);
                    }
                    var.velocity = velocity;
                }
                if sum.bias_count > 0 {
                    any_impact = true;
                    var.bias_velocity = var.bias_velocity + average(sum.bias_velocity, sum.bias_count);
                }
            }

            if !any_impact {
                trace!("resolver: settled after {pass} of {iterations} passes");
                return pass;
            }
        }

        iterations
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Contact, ContactStatus, ContactType};
    use crate::material::Material;
    use crate::math::FixVec;
    use crate::shape::Shape;
    use crate::transform::Transform;

    fn ball(id: i64, x: i64, y: i64, is_dynamic: bool) -> Body {
        let material = Material::new(FixFloat::ZERO, FixFloat::ZERO, FixFloat::ONE);
        Body::new(id, Transform::from_position(FixVec::from_int(x, y)), is_dynamic, material)
            .with_shape(Shape::circle(FixFloat::ONE))
    }

    fn touching(point: FixVec, normal: FixVec) -> Contact {
        Contact::new(point, normal, FixFloat::ZERO, ContactStatus::Collide, ContactType::Edge)
    }

    #[test]
    fn test_allocate_slots() {
        let bodies = [ball(1, 0, 0, true), ball(2, 2, 0, true), ball(3, 0, -2, false)];
        let mut scratch = SolverScratch::new();
        let c = touching(FixVec::from_int(1, 0), FixVec::UNIT_X);
        scratch
            .dm_manifolds
            .push(DmManifold::new(&bodies[0], &bodies[1], 0, 1, &c, FixFloat::ONE));
        let c = touching(FixVec::from_int(0, -1), -FixVec::UNIT_Y);
        scratch
            .st_manifolds
            .push(StManifold::new(&bodies[0], &bodies[2], 0, 2, &c, FixFloat::ONE));
        scratch.allocate(&bodies);

        assert_eq!(scratch.vars().len(), 2);
        assert_eq!(scratch.slot_of(0), Some(0));
        assert_eq!(scratch.slot_of(1), Some(1));
        assert_eq!(scratch.slot_of(2), None);
        assert_eq!(scratch.vars()[0].dyn_manifolds, [0]);
        assert_eq!(scratch.vars()[0].st_manifolds, [0]);
        assert_eq!(scratch.vars()[1].dyn_manifolds, [0]);
        assert_eq!(scratch.dm_manifolds[0].v_b, 1);

        scratch.clear();
        assert!(scratch.vars().is_empty());
        assert_eq!(scratch.slot_of(0), None);
        assert!(!scratch.has_manifolds());
    }

    #[test]
    fn test_no_impact_exits_early() {
        let bodies = [ball(1, 0, 0, true), ball(2, 2, 0, true)];
        let mut scratch = SolverScratch::new();
        let c = touching(FixVec::from_int(1, 0), FixVec::UNIT_X);
        scratch
            .dm_manifolds
            .push(DmManifold::new(&bodies[0], &bodies[1], 0, 1, &c, FixFloat::ONE));
        scratch.allocate(&bodies);
        assert_eq!(scratch.iterate(8, FixFloat::ZERO), 0);
    }

    #[test]
    fn test_head_on_settles() {
        let mut bodies = [ball(1, 0, 0, true), ball(2, 2, 0, true)];
        bodies[0].velocity = Velocity::new(FixVec::from_int(1, 0), FixFloat::ZERO);
        bodies[1].velocity = Velocity::new(FixVec::from_int(-1, 0), FixFloat::ZERO);
        let mut scratch = SolverScratch::new();
        let c = touching(FixVec::from_int(1, 0), FixVec::UNIT_X);
        scratch
            .dm_manifolds
            .push(DmManifold::new(&bodies[0], &bodies[1], 0, 1, &c, FixFloat::ONE));
        scratch.allocate(&bodies);

        let passes = scratch.iterate(8, FixFloat::ZERO);
        assert!(passes >= 1 && passes < 8);
        let (a, b) = (&scratch.vars()[0], &scratch.vars()[1]);
        let eps = FixFloat::from_raw(16);
        assert!(b.velocity.linear.x - a.velocity.linear.x >= -eps);
        assert!((a.velocity.linear.x + b.velocity.linear.x).abs() <= eps);
    }

    #[test]
    fn test_stabilization_scales_multi_hit() {
        let bouncy = Material::new(FixFloat::ONE, FixFloat::ZERO, FixFloat::ONE);
        let mut falling = Body::new(1, Transform::ZERO, true, bouncy).with_shape(Shape::circle(FixFloat::ONE));
        falling.velocity = Velocity::new(FixVec::from_int(0, -2), FixFloat::ZERO);
        let bodies = [falling, ball(2, 0, -2, false)];
        let c = touching(FixVec::from_int(0, -1), -FixVec::UNIT_Y);

        let run = |stabilization: FixFloat| {
            let mut scratch = SolverScratch::new();
            // the same support reported twice
            for _ in 0..2 {
                scratch
                    .st_manifolds
                    .push(StManifold::new(&bodies[0], &bodies[1], 0, 1, &c, FixFloat::ONE));
            }
            scratch.allocate(&bodies);
            scratch.iterate(4, stabilization);
            scratch.vars()[0].velocity.linear.y
        };

        let free = run(FixFloat::ZERO);
        let damped = run(FixFloat::HALF);
        let eps = FixFloat::from_raw(16);
        assert!((free - FixFloat::from_int(2)).abs() <= eps);
        assert!((damped - FixFloat::ONE).abs() <= eps);
    }

    #[test]
    fn test_scratch_reuse_keeps_capacity() {
        let bodies = [ball(1, 0, 0, true), ball(2, 2, 0, true)];
        let mut scratch = SolverScratch::with_capacity(4);
        for _ in 0..3 {
            scratch.clear();
            let c = touching(FixVec::from_int(1, 0), FixVec::UNIT_X);
            scratch
                .dm_manifolds
                .push(DmManifold::new(&bodies[0], &bodies[1], 0, 1, &c, FixFloat::ONE));
            scratch.allocate(&bodies);
            assert_eq!(scratch.vars().len(), 2);
            assert_eq!(scratch.vars()[1].dyn_manifolds.len(), 1);
        }
    }
}
