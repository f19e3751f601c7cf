//! Contact Manifolds
//!
//! A manifold is the per-substep snapshot of one contact: lever arms, normal
//! and tangent, combined material constants, Baumgarte bias and the inverted
//! effective masses along the normal and the tangent. It is rebuilt from
//! scratch every substep and never carries impulses across steps.
//!
//! # Variants
//!
//! - [`DmManifold`]: dynamic body against dynamic body, both receive impulses
//! - [`StManifold`]: dynamic body against static body; the static body's
//!   contact-point velocity is baked in at construction
//!
//! # Channels
//!
//! `resolve` works on true velocities: restitution `ke = 1 + bounce` and a
//! Coulomb friction clamp `|jt| <= q * j`. `resolve_bias` works on the bias
//! velocities that only drive position correction: normal impulse against the
//! target separation speed `bias`, scaled by the same `ke`, no friction.
//!
//! Relative velocity is `dv = (vB + wB x rB) - (vA + wA x rA)`; with the
//! normal pointing from A to B the bodies approach while `dv . n < 0`.

use crate::body::{Body, Velocity};
use crate::contact::Contact;
use crate::math::{FixFloat, FixVec};

/// New velocities of both bodies after an impact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmSolution {
    pub vel_a: Velocity,
    pub vel_b: Velocity,
}

/// New velocity of the dynamic body after an impact against a static one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StSolution {
    pub vel: Velocity,
}

/// Baumgarte target separation speed for a penetration.
#[inline]
fn bias_of(contact: &Contact, bias_scale: FixFloat) -> FixFloat {
    if contact.penetration.is_negative() {
        (-contact.penetration) * bias_scale
    } else {
        FixFloat::ZERO
    }
}

/// Inverse of an effective mass, zero when the denominator vanishes.
#[inline]
fn invert(k: FixFloat) -> FixFloat {
    if k.is_positive() {
        k.recip()
    } else {
        FixFloat::ZERO
    }
}

/// Velocity of the point `r` of a body.
#[inline]
fn point_velocity(vel: &Velocity, r: FixVec) -> FixVec {
    vel.linear + FixVec::scalar_cross(vel.angular, r)
}

// ============================================================================
// Dynamic / dynamic
// ============================================================================

/// Contact between two dynamic bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmManifold {
    /// Restitution factor `1 + max(bounce)`
    pub ke: FixFloat,
    /// Friction coefficient `avg(friction)`
    pub q: FixFloat,
    /// Target separation speed of the bias channel
    pub bias: FixFloat,
    /// Normal, A toward B
    pub n: FixVec,
    /// Tangent `(n.y, -n.x)`
    pub t: FixVec,
    /// Global body index of A
    pub i_a: usize,
    /// Global body index of B
    pub i_b: usize,
    /// Solver slot of A, valid after slot allocation
    pub v_a: usize,
    /// Solver slot of B, valid after slot allocation
    pub v_b: usize,
    /// Lever arm from A's center of mass to the contact point
    pub a_r: FixVec,
    /// Lever arm from B's center of mass to the contact point
    pub b_r: FixVec,
    inv_mass_a: FixFloat,
    inv_mass_b: FixFloat,
    inv_inertia_a: FixFloat,
    inv_inertia_b: FixFloat,
    normal_mass: FixFloat,
    tangent_mass: FixFloat,
}

impl DmManifold {
    #[must_use]
    pub fn new(
        a: &Body,
        b: &Body,
        i_a: usize,
        i_b: usize,
        contact: &Contact,
        bias_scale: FixFloat,
    ) -> Self {
        let n = contact.normal;
        let t = FixVec::new(n.y, -n.x);
        let a_r = contact.point - a.transform.position;
        let b_r = contact.point - b.transform.position;

        let inv_mass_a = a.inv_mass();
        let inv_mass_b = b.inv_mass();
        let inv_inertia_a = a.inv_inertia();
        let inv_inertia_b = b.inv_inertia();

        let k_n = inv_mass_a
            + inv_mass_b
            + a_r.cross(n).sqr() * inv_inertia_a
            + b_r.cross(n).sqr() * inv_inertia_b;
        let k_t = inv_mass_a
            + inv_mass_b
            + a_r.cross(t).sqr() * inv_inertia_a
            + b_r.cross(t).sqr() * inv_inertia_b;

        Self {
            ke: a.material().combined_bounce(b.material()) + FixFloat::ONE,
            q: a.material().combined_friction(b.material()),
            bias: bias_of(contact, bias_scale),
            n,
            t,
            i_a,
            i_b,
            v_a: 0,
            v_b: 0,
            a_r,
            b_r,
            inv_mass_a,
            inv_mass_b,
            inv_inertia_a,
            inv_inertia_b,
            normal_mass: invert(k_n),
            tangent_mass: invert(k_t),
        }
    }

    #[inline]
    fn relative_velocity(&self, vel_a: &Velocity, vel_b: &Velocity) -> FixVec {
        point_velocity(vel_b, self.b_r) - point_velocity(vel_a, self.a_r)
    }

    /// Apply impulse `p` (acting on B, reaction on A).
    #[inline]
    fn apply(&self, vel_a: &Velocity, vel_b: &Velocity, p: FixVec) -> DmSolution {
        DmSolution {
            vel_a: Velocity::new(
                vel_a.linear - p * self.inv_mass_a,
                vel_a.angular - self.a_r.cross(p) * self.inv_inertia_a,
            ),
            vel_b: Velocity::new(
                vel_b.linear + p * self.inv_mass_b,
                vel_b.angular + self.b_r.cross(p) * self.inv_inertia_b,
            ),
        }
    }

    /// True-velocity impulse with restitution and friction. `None` while the
    /// bodies are not approaching.
    #[must_use]
    pub fn resolve(&self, vel_a: &Velocity, vel_b: &Velocity) -> Option<DmSolution> {
        let dv = self.relative_velocity(vel_a, vel_b);
        let vn = dv.dot(self.n);
        if !vn.is_negative() || self.normal_mass.is_zero() {
            return None;
        }

        let j = -(self.ke * vn) * self.normal_mass;
        let max_friction = self.q * j;
        let jt = (-dv.dot(self.t) * self.tangent_mass).clamp(-max_friction, max_friction);

        Some(self.apply(vel_a, vel_b, self.n * j + self.t * jt))
    }

    /// Bias-velocity impulse along the normal only, with the same `ke` as
    /// [`Self::resolve`].
    #[must_use]
    pub fn resolve_bias(&self, bias_a: &Velocity, bias_b: &Velocity) -> Option<DmSolution> {
        let vn = self.relative_velocity(bias_a, bias_b).dot(self.n) - self.bias;
        if !vn.is_negative() || self.normal_mass.is_zero() {
            return None;
        }
        let j = -(self.ke * vn) * self.normal_mass;
        Some(self.apply(bias_a, bias_b, self.n * j))
    }
}

// ============================================================================
// Dynamic / static
// ============================================================================

/// Contact between a dynamic body A and a static body B.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StManifold {
    /// Restitution factor `1 + max(bounce)`
    pub ke: FixFloat,
    /// Friction coefficient `avg(friction)`
    pub q: FixFloat,
    /// Target separation speed of the bias channel
    pub bias: FixFloat,
    /// Normal, A toward B
    pub n: FixVec,
    /// Tangent `(n.y, -n.x)`
    pub t: FixVec,
    /// Global body index of A
    pub i_a: usize,
    /// Global body index of the static body
    pub i_b: usize,
    /// Solver slot of A, valid after slot allocation
    pub v_a: usize,
    /// Lever arm from A's center of mass to the contact point
    pub a_r: FixVec,
    /// Velocity of B's material at the contact point
    pub b_vel: FixVec,
    inv_mass_a: FixFloat,
    inv_inertia_a: FixFloat,
    normal_mass: FixFloat,
    tangent_mass: FixFloat,
}

impl StManifold {
    #[must_use]
    pub fn new(
        a: &Body,
        b: &Body,
        i_a: usize,
        i_b: usize,
        contact: &Contact,
        bias_scale: FixFloat,
    ) -> Self {
        let n = contact.normal;
        let t = FixVec::new(n.y, -n.x);
        let a_r = contact.point - a.transform.position;
        let b_r = contact.point - b.transform.position;

        let inv_mass_a = a.inv_mass();
        let inv_inertia_a = a.inv_inertia();

        let k_n = inv_mass_a + a_r.cross(n).sqr() * inv_inertia_a;
        let k_t = inv_mass_a + a_r.cross(t).sqr() * inv_inertia_a;

        Self {
            ke: a.material().combined_bounce(b.material()) + FixFloat::ONE,
            q: a.material().combined_friction(b.material()),
            bias: bias_of(contact, bias_scale),
            n,
            t,
            i_a,
            i_b,
            v_a: 0,
            a_r,
            b_vel: point_velocity(&b.velocity, b_r),
            inv_mass_a,
            inv_inertia_a,
            normal_mass: invert(k_n),
            tangent_mass: invert(k_t),
        }
    }

    #[inline]
    fn apply(&self, vel_a: &Velocity, p: FixVec) -> StSolution {
        StSolution {
            vel: Velocity::new(
                vel_a.linear - p * self.inv_mass_a,
                vel_a.angular - self.a_r.cross(p) * self.inv_inertia_a,
            ),
        }
    }

    /// True-velocity impulse against the static body's contact velocity.
    #[must_use]
    pub fn resolve(&self, vel_a: &Velocity) -> Option<StSolution> {
        let dv = self.b_vel - point_velocity(vel_a, self.a_r);
        let vn = dv.dot(self.n);
        if !vn.is_negative() || self.normal_mass.is_zero() {
            return None;
        }

        let j = -(self.ke * vn) * self.normal_mass;
        let max_friction = self.q * j;
        let jt = (-dv.dot(self.t) * self.tangent_mass).clamp(-max_friction, max_friction);

        Some(self.apply(vel_a, self.n * j + self.t * jt))
    }

    /// Bias-velocity impulse along the normal only. The static body has no
    /// bias motion.
    #[must_use]
    pub fn resolve_bias(&self, bias_a: &Velocity) -> Option<StSolution> {
        let vn = -point_velocity(bias_a, self.a_r).dot(self.n) - self.bias;
        if !vn.is_negative() || self.normal_mass.is_zero() {
            return None;
        }
        let j = -(self.ke * vn) * self.normal_mass;
        Some(self.apply(bias_a, self.n * j))
    }
}

// ============================================================================
// Tests
// ============================================================================
