//! Rigid Bodies
//!
//! [`Body`] holds the simulated state of one object: its transform, velocity,
//! pending acceleration and the mass properties derived from its shape and
//! material.
//!
//! Static bodies never move under the solver: their mass, inverse mass,
//! inertia and inverse inertia are zero, and force helpers ignore them.
//! Mass properties change only through [`Body::attach_shape`].

use crate::boundary::Boundary;
use crate::collider::ColliderTable;
use crate::material::Material;
use crate::math::{FixFloat, FixVec};
use crate::shape::Shape;
use crate::transform::Transform;
use core::ops::{Add, Sub};

// ============================================================================
// Velocity / Acceleration
// ============================================================================

/// Linear and angular velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Velocity {
    /// Units per second
    pub linear: FixVec,
    /// Radians per second, positive = CCW
    pub angular: FixFloat,
}

impl Velocity {
    pub const ZERO: Self = Self::new(FixVec::ZERO, FixFloat::ZERO);

    #[inline]
    #[must_use]
    pub const fn new(linear: FixVec, angular: FixFloat) -> Self {
        Self { linear, angular }
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.linear.is_zero() && self.angular.is_zero()
    }

    /// Velocity after accelerating for `dt`.
    #[inline]
    #[must_use]
    pub fn apply(&self, acceleration: &Acceleration, dt: FixFloat) -> Self {
        Self::new(
            self.linear + acceleration.linear * dt,
            self.angular + acceleration.angular * dt,
        )
    }

    /// Multiply each channel by a retention factor.
    #[inline]
    #[must_use]
    pub fn damped(&self, linear: FixFloat, angular: FixFloat) -> Self {
        Self::new(self.linear * linear, self.angular * angular)
    }
}

impl Add for Velocity {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.linear + rhs.linear, self.angular + rhs.angular)
    }
}

impl Sub for Velocity {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.linear - rhs.linear, self.angular - rhs.angular)
    }
}

/// Linear and angular acceleration, cleared after every step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Acceleration {
    pub linear: FixVec,
    pub angular: FixFloat,
}

impl Acceleration {
    pub const ZERO: Self = Self::new(FixVec::ZERO, FixFloat::ZERO);

    #[inline]
    #[must_use]
    pub const fn new(linear: FixVec, angular: FixFloat) -> Self {
        Self { linear, angular }
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.linear.is_zero() && self.angular.is_zero()
    }
}

// ============================================================================
// Body
// ============================================================================

/// Rigid body.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Body {
    /// Caller-assigned unique id
    pub id: i64,
    /// Position and angle of the body origin (center of mass)
    pub transform: Transform,
    pub velocity: Velocity,
    /// Pending acceleration for the next step
    pub acceleration: Acceleration,
    /// Alive bodies take part in simulation
    pub is_alive: bool,
    is_dynamic: bool,
    apply_gravity: bool,
    material: Material,
    shape: Shape,
    mass: FixFloat,
    inv_mass: FixFloat,
    unit_inertia: FixFloat,
    inertia: FixFloat,
    inv_inertia: FixFloat,
    boundary: Boundary,
}

impl Body {
    /// New body with an empty shape, zero velocity and gravity on for dynamic
    /// bodies.
    #[must_use]
    pub fn new(id: i64, transform: Transform, is_dynamic: bool, material: Material) -> Self {
        Self {
            id,
            transform,
            velocity: Velocity::ZERO,
            acceleration: Acceleration::ZERO,
            is_alive: true,
            is_dynamic,
            apply_gravity: is_dynamic,
            material,
            shape: Shape::empty(),
            mass: FixFloat::ZERO,
            inv_mass: FixFloat::ZERO,
            unit_inertia: FixFloat::ZERO,
            inertia: FixFloat::ZERO,
            inv_inertia: FixFloat::ZERO,
            boundary: Boundary::ZERO,
        }
    }

    /// Turn gravity on or off. Static bodies never receive gravity.
    #[must_use]
    pub fn with_gravity(mut self, apply_gravity: bool) -> Self {
        self.apply_gravity = apply_gravity && self.is_dynamic;
        self
    }

    /// Set the shape and derive mass properties from it.
    pub fn attach_shape(&mut self, shape: Shape) {
        self.shape = shape;
        if self.is_dynamic {
            self.mass = shape.area * self.material.density;
            self.inv_mass = safe_recip(self.mass);
            self.unit_inertia = shape.unit_inertia;
            self.inertia = self.unit_inertia * self.mass;
            self.inv_inertia = safe_recip(self.inertia);
        }
        self.boundary = Boundary::ZERO;
    }

    /// Builder form of [`Body::attach_shape`].
    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.attach_shape(shape);
        self
    }

    // ------------------------------------------------------------------
    // Force helpers
    // ------------------------------------------------------------------

    /// Apply a force at a world point for the next step.
    pub fn add_force(&mut self, force: FixVec, point: FixVec) {
        if !self.is_dynamic {
            return;
        }
        let r = point - self.transform.position;
        self.acceleration.linear += force * self.inv_mass;
        self.acceleration.angular += r.cross(force) * self.inv_inertia;
    }

    /// Apply an acceleration (force per unit mass) at a world point.
    pub fn add_acceleration(&mut self, acceleration: FixVec, point: FixVec) {
        if !self.is_dynamic {
            return;
        }
        let r = point - self.transform.position;
        self.acceleration.linear += acceleration;
        self.acceleration.angular += self.per_unit_inertia(r.cross(acceleration));
    }

    /// Change velocity as if by an impulse of `velocity × mass` at a world point.
    pub fn add_velocity(&mut self, velocity: FixVec, point: FixVec) {
        if !self.is_dynamic {
            return;
        }
        let r = point - self.transform.position;
        self.velocity.linear += velocity;
        self.velocity.angular += self.per_unit_inertia(r.cross(velocity));
    }

    pub fn add_velocity_to_center_of_mass(&mut self, velocity: FixVec) {
        if self.is_dynamic {
            self.velocity.linear += velocity;
        }
    }

    pub fn add_acceleration_to_center_of_mass(&mut self, acceleration: FixVec) {
        if self.is_dynamic {
            self.acceleration.linear += acceleration;
        }
    }

    pub fn add_angular_velocity(&mut self, angular: FixFloat) {
        if self.is_dynamic {
            self.velocity.angular += angular;
        }
    }

    #[inline]
    fn per_unit_inertia(&self, moment: FixFloat) -> FixFloat {
        if self.unit_inertia.is_zero() {
            FixFloat::ZERO
        } else {
            moment / self.unit_inertia
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    #[inline]
    #[must_use]
    pub fn apply_gravity(&self) -> bool {
        self.apply_gravity
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    #[must_use]
    pub fn mass(&self) -> FixFloat {
        self.mass
    }

    #[inline]
    #[must_use]
    pub fn inv_mass(&self) -> FixFloat {
        self.inv_mass
    }

    #[inline]
    #[must_use]
    pub fn unit_inertia(&self) -> FixFloat {
        self.unit_inertia
    }

    #[inline]
    #[must_use]
    pub fn inertia(&self) -> FixFloat {
        self.inertia
    }

    #[inline]
    #[must_use]
    pub fn inv_inertia(&self) -> FixFloat {
        self.inv_inertia
    }

    /// Cached world-space box, refreshed by the world after every move.
    #[inline]
    #[must_use]
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Recompute the cached box from the current shape and transform.
    pub fn refresh_boundary(&mut self, colliders: &ColliderTable) {
        self.boundary = self.shape.world_boundary(&self.transform, colliders);
    }

    /// Write the result of a substep.
    #[inline]
    pub(crate) fn step_update(&mut self, velocity: Velocity, transform: Transform, boundary: Boundary) {
        self.velocity = velocity;
        self.transform = transform;
        self.boundary = boundary;
    }
}

#[inline]
fn safe_recip(value: FixFloat) -> FixFloat {
    if value.is_zero() {
        FixFloat::ZERO
    } else {
        value.recip()
    }
}

// ============================================================================
// Tests
// ============================================================================
