//! Rigid Transforms
//!
//! A [`Transform`] is a position plus an angle, with the `(cos, sin)` pair
//! cached so hot paths never go back to the lookup table. Conversions between
//! two bodies' local frames keep polygon-vs-polygon tests in the frame of one
//! of the shapes.

use crate::boundary::Boundary;
use crate::contact::Contact;
use crate::math::{FixFloat, FixVec, Rotator};

/// Position, angle (radians) and cached rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub position: FixVec,
    pub angle: FixFloat,
    pub rotator: Rotator,
}

impl Transform {
    /// Identity transform.
    pub const ZERO: Self = Self {
        position: FixVec::ZERO,
        angle: FixFloat::ZERO,
        rotator: Rotator::IDENTITY,
    };

    #[must_use]
    pub fn new(position: FixVec, angle: FixFloat) -> Self {
        Self {
            position,
            angle,
            rotator: Rotator::from_angle(angle),
        }
    }

    /// Translation only.
    #[must_use]
    pub const fn from_position(position: FixVec) -> Self {
        Self {
            position,
            angle: FixFloat::ZERO,
            rotator: Rotator::IDENTITY,
        }
    }

    /// Local point to world.
    #[inline]
    #[must_use]
    pub fn convert_as_point(&self, point: FixVec) -> FixVec {
        self.rotator.rotate(point) + self.position
    }

    /// Local direction to world.
    #[inline]
    #[must_use]
    pub fn convert_as_vector(&self, vector: FixVec) -> FixVec {
        self.rotator.rotate(vector)
    }

    /// World point to local.
    #[inline]
    #[must_use]
    pub fn inverse_point(&self, point: FixVec) -> FixVec {
        self.rotator.inverse_rotate(point - self.position)
    }

    /// World direction to local.
    #[inline]
    #[must_use]
    pub fn inverse_vector(&self, vector: FixVec) -> FixVec {
        self.rotator.inverse_rotate(vector)
    }

    /// World box of a local box.
    #[must_use]
    pub fn convert_boundary(&self, local: &Boundary) -> Boundary {
        if self.angle.is_zero() {
            return local.translate(self.position);
        }
        Boundary::from_points(&[
            self.convert_as_point(local.min),
            self.convert_as_point(FixVec::new(local.min.x, local.max.y)),
            self.convert_as_point(local.max),
            self.convert_as_point(FixVec::new(local.max.x, local.min.y)),
        ])
    }

    /// Local-space contact to world space. Normal orientation is preserved.
    #[must_use]
    pub fn convert_contact(&self, contact: Contact) -> Contact {
        Contact {
            point: self.convert_as_point(contact.point),
            normal: self.convert_as_vector(contact.normal),
            ..contact
        }
    }

    /// Transform that maps points of `b`'s local frame into `a`'s local frame.
    #[must_use]
    pub fn convert_from_b_to_a(b: &Self, a: &Self) -> Self {
        let ra = FixVec::new(a.rotator.cos, a.rotator.sin);
        let rb = FixVec::new(b.rotator.cos, b.rotator.sin);
        // rotation by (b.angle - a.angle) composed from the cached pairs
        let rotator = Rotator {
            cos: ra.dot(rb),
            sin: ra.cross(rb),
        };
        Self {
            position: Self::convert_zero_point_b_to_a(b, a),
            angle: b.angle - a.angle,
            rotator,
        }
    }

    /// `b`'s origin expressed in `a`'s local frame.
    #[inline]
    #[must_use]
    pub fn convert_zero_point_b_to_a(b: &Self, a: &Self) -> FixVec {
        a.inverse_point(b.position)
    }

    /// Advance by a velocity over `dt`.
    #[must_use]
    pub fn apply(&self, linear: FixVec, angular: FixFloat, dt: FixFloat) -> Self {
        let position = self.position + linear * dt;
        if angular.is_zero() {
            Self { position, ..*self }
        } else {
            Self::new(position, self.angle + angular * dt)
        }
    }

    /// Move without rotating.
    #[inline]
    #[must_use]
    pub fn translate(&self, delta: FixVec) -> Self {
        Self {
            position: self.position + delta,
            ..*self
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::ZERO
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    fn near(a: FixVec, b: FixVec) -> bool {
        (a - b).length() < FixFloat::from_ratio(1, 500)
    }

    #[test]
    fn test_point_round_trip() {
        let t = Transform::new(FixVec::from_int(3, -1), FixFloat::from_ratio(3, 4));
        let p = FixVec::from_int(2, 5);
        assert!(near(t.inverse_point(t.convert_as_point(p)), p));
    }

    #[test]
    fn test_quarter_turn() {
        let t = Transform::new(FixVec::from_int(1, 1), FixFloat::HALF_PI);
        let p = t.convert_as_point(FixVec::from_int(1, 0));
        assert!(near(p, FixVec::from_int(1, 2)));
    }

    #[test]
    fn test_b_to_a_matches_world_round_trip() {
        let a = Transform::new(FixVec::from_int(2, 3), FixFloat::from_ratio(1, 3));
        let b = Transform::new(FixVec::from_int(-1, 4), FixFloat::from_ratio(-6, 5));
        let m = Transform::convert_from_b_to_a(&b, &a);
        let local_b = FixVec::from_int(1, -2);
        let via_world = a.inverse_point(b.convert_as_point(local_b));
        assert!(near(m.convert_as_point(local_b), via_world));
    }

    #[test]
    fn test_boundary_of_rotated_box() {
        let local = Boundary::from_size(FixVec::from_int(2, 2));
        let t = Transform::new(FixVec::ZERO, FixFloat::PI.half().half());
        let world = t.convert_boundary(&local);
        let r = FixFloat::from_int(2).sqrt();
        assert!((world.max.x - r).abs() < FixFloat::from_ratio(1, 500));
        assert!((world.min.y + r).abs() < FixFloat::from_ratio(1, 500));
    }

    #[test]
    fn test_apply_velocity() {
        let t = Transform::from_position(FixVec::ZERO);
        let moved = t.apply(FixVec::from_int(2, 0), FixFloat::ZERO, FixFloat::HALF);
        assert_eq!(moved.position, FixVec::from_int(1, 0));
        assert_eq!(moved.rotator, Rotator::IDENTITY);
    }
}
