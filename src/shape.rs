//! Body Shapes
//!
//! A [`Shape`] is the collision form a body carries, together with the mass
//! properties derived from it once at attach time.

use crate::boundary::Boundary;
use crate::collider::{ColliderIndex, ColliderTable, ConvexCollider};
use crate::math::{FixFloat, FixVec};
use crate::transform::Transform;

/// Collision form of a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Form {
    /// No collision (fresh body)
    Empty,
    /// Circle centered at the body origin
    Circle {
        /// Radius
        radius: FixFloat,
    },
    /// Axis-aligned (in body space) rectangle centered at the body origin
    Rect {
        /// Width and height
        size: FixVec,
    },
    /// Convex polygon stored in the world's collider table
    Polygon {
        /// Collider table entry
        index: ColliderIndex,
    },
}

/// Shape with its precomputed area and inertia per unit mass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    pub form: Form,
    pub area: FixFloat,
    /// Moment of inertia per unit mass about the body origin
    pub unit_inertia: FixFloat,
}

impl Shape {
    /// Shape of a freshly constructed body.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            form: Form::Empty,
            area: FixFloat::ZERO,
            unit_inertia: FixFloat::ZERO,
        }
    }

    /// Circle: area `πr²`, unit inertia `r²/2`.
    #[must_use]
    pub fn circle(radius: FixFloat) -> Self {
        let r2 = radius.sqr();
        Self {
            form: Form::Circle { radius },
            area: FixFloat::PI * r2,
            unit_inertia: r2.half(),
        }
    }

    /// Rectangle: area `w·h`, unit inertia `(w² + h²)/12`.
    #[must_use]
    pub fn rect(size: FixVec) -> Self {
        Self {
            form: Form::Rect { size },
            area: size.x * size.y,
            unit_inertia: (size.x.sqr() + size.y.sqr()).div_int(12),
        }
    }

    /// Polygon registered in a collider table under `index`.
    #[must_use]
    pub fn polygon(index: ColliderIndex, collider: &ConvexCollider) -> Self {
        Self {
            form: Form::Polygon { index },
            area: collider.area(),
            unit_inertia: collider.unit_inertia(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.form, Form::Empty)
    }

    /// Body-space box. `None` for an empty shape or an unknown polygon.
    #[must_use]
    pub fn local_boundary(&self, colliders: &ColliderTable) -> Option<Boundary> {
        match self.form {
            Form::Empty => None,
            Form::Circle { radius } => Some(Boundary::from_circle(FixVec::ZERO, radius)),
            Form::Rect { size } => Some(Boundary::from_size(size)),
            Form::Polygon { index } => colliders.get(index).map(|c| c.boundary),
        }
    }

    /// World-space box of the shape placed at `transform`.
    ///
    /// Circles give an exact box; rotated polygons are boxed vertex by vertex.
    /// An empty shape or an unknown polygon collapses to the body position.
    #[must_use]
    pub fn world_boundary(&self, transform: &Transform, colliders: &ColliderTable) -> Boundary {
        match self.form {
            Form::Circle { radius } => Boundary::from_circle(transform.position, radius),
            Form::Rect { size } => transform.convert_boundary(&Boundary::from_size(size)),
            Form::Polygon { index } => match colliders.get(index) {
                Some(c) if !transform.angle.is_zero() => {
                    let mut points = c.points.iter().map(|&p| transform.convert_as_point(p));
                    let first = points.next().unwrap_or(transform.position);
                    points.fold(Boundary::new(first, first), |b, p| {
                        b.union(&Boundary::new(p, p))
                    })
                }
                Some(c) => c.boundary.translate(transform.position),
                None => Boundary::new(transform.position, transform.position),
            },
            Form::Empty => Boundary::new(transform.position, transform.position),
        }
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
