//! Axis-Aligned Bounding Boxes
//!
//! [`Boundary`] is the cached world-space box every body carries. The broad
//! phase rejects pairs whose boundaries do not overlap, and the polygon
//! clipper uses them to skip edges that cannot cross the other shape.

use crate::math::{FixFloat, FixVec};

/// Axis-aligned bounding box (inclusive on all sides).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Boundary {
    /// Minimum corner
    pub min: FixVec,
    /// Maximum corner
    pub max: FixVec,
}

impl Boundary {
    /// Degenerate box at the origin.
    pub const ZERO: Self = Self {
        min: FixVec::ZERO,
        max: FixVec::ZERO,
    };

    #[inline]
    #[must_use]
    pub const fn new(min: FixVec, max: FixVec) -> Self {
        Self { min, max }
    }

    /// Box around a circle.
    #[must_use]
    pub fn from_circle(center: FixVec, radius: FixFloat) -> Self {
        let r = FixVec::new(radius, radius);
        Self::new(center - r, center + r)
    }

    /// Box of the given size centered at the origin.
    #[must_use]
    pub fn from_size(size: FixVec) -> Self {
        let half = FixVec::new(size.x.half(), size.y.half());
        Self::new(-half, half)
    }

    /// Tight box around a point set. `ZERO` for an empty set.
    #[must_use]
    pub fn from_points(points: &[FixVec]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::ZERO;
        };
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self::new(min, max)
    }

    #[inline]
    #[must_use]
    pub fn translate(&self, delta: FixVec) -> Self {
        Self::new(self.min + delta, self.max + delta)
    }

    /// Grow the box by `margin` on every side.
    #[inline]
    #[must_use]
    pub fn expand(&self, margin: FixFloat) -> Self {
        let m = FixVec::new(margin, margin);
        Self::new(self.min - m, self.max + m)
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            FixVec::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            FixVec::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Overlap test (touching boxes collide).
    #[inline]
    #[must_use]
    pub fn is_collide(&self, other: &Self) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    #[inline]
    #[must_use]
    pub fn is_contain(&self, p: FixVec) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }

    /// Whether a segment's own box overlaps this box.
    #[inline]
    #[must_use]
    pub fn is_intersection_possible(&self, a: FixVec, b: FixVec) -> bool {
        let seg = Self::new(
            FixVec::new(a.x.min(b.x), a.y.min(b.y)),
            FixVec::new(a.x.max(b.x), a.y.max(b.y)),
        );
        self.is_collide(&seg)
    }
}

// ============================================================================
// Tests
// ============================================================================
