//! Collision Geometry
//!
//! Narrow-phase geometry in body-local space.
//!
//! # Types
//!
//! - [`CircleCollider`]: center and radius
//! - [`ConvexCollider`]: counter-clockwise convex polygon with per-edge outward
//!   normals, centroid, inscribed radius and mass properties
//! - [`ColliderTable`]: owner of polygon colliders, addressed by [`ColliderIndex`]
//!
//! Edge `i` runs from `points[i]` to `points[i + 1]` (wrapping) and
//! `normals[i]` is its outward unit normal.

use crate::boundary::Boundary;
use crate::error::PhysicsError;
use crate::math::{div_round, saturate, FixFloat, FixVec, FRACTION_BITS};
use crate::transform::Transform;

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

// ============================================================================
// Circle
// ============================================================================

/// Circle in some frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircleCollider {
    pub center: FixVec,
    pub radius: FixFloat,
}

impl CircleCollider {
    #[inline]
    #[must_use]
    pub const fn new(center: FixVec, radius: FixFloat) -> Self {
        Self { center, radius }
    }
}

// ============================================================================
// Convex polygon
// ============================================================================

/// Convex polygon, counter-clockwise.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvexCollider {
    /// Area centroid
    pub center: FixVec,
    /// Vertices, counter-clockwise
    pub points: Vec<FixVec>,
    /// Outward unit normal of each edge
    pub normals: Vec<FixVec>,
    /// Box around `points`
    pub boundary: Boundary,
    /// Inscribed radius around `center`
    pub radius: FixFloat,
    area: FixFloat,
    unit_inertia: FixFloat,
}

impl ConvexCollider {
    /// Axis-aligned rectangle centered at the origin.
    #[must_use]
    pub fn from_size(size: FixVec) -> Self {
        let a = size.x.half();
        let b = size.y.half();
        let points = vec![
            FixVec::new(-a, -b),
            FixVec::new(a, -b),
            FixVec::new(a, b),
            FixVec::new(-a, b),
        ];
        let normals = vec![
            FixVec::new(FixFloat::ZERO, FixFloat::NEG_ONE),
            FixVec::UNIT_X,
            FixVec::UNIT_Y,
            FixVec::new(FixFloat::NEG_ONE, FixFloat::ZERO),
        ];
        let w = a + a;
        let h = b + b;
        Self {
            center: FixVec::ZERO,
            boundary: Boundary::new(points[0], points[2]),
            points,
            normals,
            radius: a.min(b),
            area: w * h,
            unit_inertia: (w.sqr() + h.sqr()).div_int(12),
        }
    }

    /// Polygon from its vertices. Clockwise input is reversed.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::InvalidShape`] for fewer than 3 vertices, zero area
    /// or a concave outline.
    pub fn new(mut points: Vec<FixVec>) -> Result<Self, PhysicsError> {
        if points.len() < 3 {
            return Err(PhysicsError::InvalidShape {
                reason: "polygon needs at least 3 vertices",
            });
        }
        let twice_area = twice_signed_area(&points);
        if twice_area == 0 {
            return Err(PhysicsError::InvalidShape {
                reason: "polygon has zero area",
            });
        }
        if twice_area < 0 {
            points.reverse();
        }
        let n = points.len();
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            let c = points[(i + 2) % n];
            if (b - a).cross_raw(c - b) < 0 {
                return Err(PhysicsError::InvalidShape {
                    reason: "polygon is not convex",
                });
            }
        }
        Ok(Self::build(points))
    }

    /// Precompute everything from counter-clockwise convex vertices.
    fn build(points: Vec<FixVec>) -> Self {
        let n = points.len();
        let mut normals = Vec::with_capacity(n);

        let mut sum_cross: i128 = 0;
        let mut cx: i128 = 0;
        let mut cy: i128 = 0;
        let mut inertia: i128 = 0;

        for i in 0..n {
            let p0 = points[i];
            let p1 = points[(i + 1) % n];
            let e = p1 - p0;
            normals.push(e.perpendicular_cw().normalize());

            let cross = p0.cross_raw(p1);
            sum_cross += cross;
            cx += (p0.x.raw() as i128 + p1.x.raw() as i128) * cross;
            cy += (p0.y.raw() as i128 + p1.y.raw() as i128) * cross;

            let dots = dot_raw(p0, p0) + dot_raw(p0, p1) + dot_raw(p1, p1);
            inertia += (dots >> FRACTION_BITS) * cross;
        }

        let center = FixVec::new(
            FixFloat::from_raw(saturate(div_round(cx, 3 * sum_cross))),
            FixFloat::from_raw(saturate(div_round(cy, 3 * sum_cross))),
        );
        let area = FixFloat::from_raw(saturate(div_round(sum_cross, 2 << FRACTION_BITS)));
        let unit_inertia = FixFloat::from_raw(saturate(div_round(inertia, 6 * sum_cross)));

        let radius = points
            .iter()
            .zip(normals.iter())
            .map(|(&p, &nm)| (p - center).dot(nm).abs())
            .min()
            .unwrap_or(FixFloat::ZERO);

        Self {
            center,
            boundary: Boundary::from_points(&points),
            points,
            normals,
            radius,
            area,
            unit_inertia,
        }
    }

    /// Copy moved by a transform. Mass properties are kept as is.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let points: Vec<FixVec> = self
            .points
            .iter()
            .map(|&p| transform.convert_as_point(p))
            .collect();
        let normals = self
            .normals
            .iter()
            .map(|&nm| transform.convert_as_vector(nm))
            .collect();
        Self {
            center: transform.convert_as_point(self.center),
            boundary: Boundary::from_points(&points),
            points,
            normals,
            radius: self.radius,
            area: self.area,
            unit_inertia: self.unit_inertia,
        }
    }

    /// Same outline shifted so that the centroid sits at the origin.
    #[must_use]
    pub fn centered(&self) -> Self {
        let shift = self.center;
        Self::build(self.points.iter().map(|&p| p - shift).collect())
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> FixFloat {
        self.area
    }

    /// Second moment of area per unit mass about the local origin.
    #[inline]
    #[must_use]
    pub fn unit_inertia(&self) -> FixFloat {
        self.unit_inertia
    }

    /// Whether a point lies inside or on the boundary.
    ///
    /// Binary search over the fan from `points[0]`, `O(log n)`.
    #[must_use]
    pub fn is_contain(&self, p: FixVec) -> bool {
        if !self.boundary.is_contain(p) {
            return false;
        }
        let pts = &self.points;
        let p0 = pts[0];
        let d = p - p0;
        if (pts[1] - p0).cross_raw(d) < 0 {
            return false;
        }
        let last = pts.len() - 1;
        if (pts[last] - p0).cross_raw(d) > 0 {
            return false;
        }

        let mut low = 1;
        let mut high = last;
        while high - low > 1 {
            let mid = (low + high) >> 1;
            if (pts[mid] - p0).cross_raw(d) >= 0 {
                low = mid;
            } else {
                high = mid;
            }
        }
        (pts[high] - pts[low]).cross_raw(p - pts[low]) >= 0
    }
}

#[inline]
fn dot_raw(a: FixVec, b: FixVec) -> i128 {
    a.x.raw() as i128 * b.x.raw() as i128 + a.y.raw() as i128 * b.y.raw() as i128
}

fn twice_signed_area(points: &[FixVec]) -> i128 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].cross_raw(points[(i + 1) % n]))
        .sum()
}

// ============================================================================
// Table
// ============================================================================

/// Handle of a polygon in a [`ColliderTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColliderIndex(usize);

impl ColliderIndex {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Append-only storage of polygon colliders shared by every body.
#[derive(Clone, Debug, Default)]
pub struct ColliderTable {
    colliders: Vec<ConvexCollider>,
}

impl ColliderTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, collider: ConvexCollider) -> ColliderIndex {
        self.colliders.push(collider);
        ColliderIndex(self.colliders.len() - 1)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: ColliderIndex) -> Option<&ConvexCollider> {
        self.colliders.get(index.0)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    fn v(x: i64, y: i64) -> FixVec {
        FixVec::from_int(x, y)
    }

    #[test]
    fn test_rect_matches_polygon() {
        let rect = ConvexCollider::from_size(v(4, 2));
        let poly = ConvexCollider::new(vec![v(-2, -1), v(2, -1), v(2, 1), v(-2, 1)]).unwrap();
        assert_eq!(rect.points, poly.points);
        assert_eq!(rect.normals, poly.normals);
        assert_eq!(rect.area(), poly.area());
        assert_eq!(rect.unit_inertia(), poly.unit_inertia());
        assert_eq!(poly.center, FixVec::ZERO);
        assert_eq!(poly.radius, FixFloat::ONE);
    }

    #[test]
    fn test_clockwise_is_reversed() {
        let poly = ConvexCollider::new(vec![v(0, 0), v(0, 2), v(2, 2), v(2, 0)]).unwrap();
        assert_eq!(poly.area(), FixFloat::from_int(4));
        assert_eq!(poly.center, v(1, 1));
        assert_eq!(poly.points[0], v(2, 0));
        assert_eq!(poly.normals[0], FixVec::UNIT_X);
    }

    #[test]
    fn test_triangle_centroid() {
        let poly = ConvexCollider::new(vec![v(0, 0), v(3, 0), v(0, 3)]).unwrap();
        assert_eq!(poly.center, v(1, 1));
        assert_eq!(poly.area(), FixFloat::from_ratio(9, 2));
    }

    #[test]
    fn test_invalid_polygons() {
        assert!(matches!(
            ConvexCollider::new(vec![v(0, 0), v(1, 0)]),
            Err(PhysicsError::InvalidShape { .. })
        ));
        assert!(matches!(
            ConvexCollider::new(vec![v(0, 0), v(1, 1), v(2, 2)]),
            Err(PhysicsError::InvalidShape { .. })
        ));
        let concave = vec![v(0, 0), v(4, 0), v(4, 4), v(2, 1), v(0, 4)];
        assert!(matches!(
            ConvexCollider::new(concave),
            Err(PhysicsError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_is_contain() {
        let hex = ConvexCollider::new(vec![
            v(2, 0),
            v(1, 2),
            v(-1, 2),
            v(-2, 0),
            v(-1, -2),
            v(1, -2),
        ])
        .unwrap();
        assert!(hex.is_contain(FixVec::ZERO));
        assert!(hex.is_contain(v(1, 1)));
        assert!(hex.is_contain(v(2, 0)));
        assert!(!hex.is_contain(v(2, 2)));
        assert!(!hex.is_contain(v(0, 3)));
        assert!(!hex.is_contain(FixVec::from_f64(1.9, 1.0)));
    }

    #[test]
    fn test_transformed_and_centered() {
        let rect = ConvexCollider::from_size(v(2, 2));
        let moved = rect.transformed(&Transform::from_position(v(5, 5)));
        assert_eq!(moved.center, v(5, 5));
        assert!(moved.is_contain(v(5, 5)));
        assert!(!moved.is_contain(FixVec::ZERO));

        let tri = ConvexCollider::new(vec![v(0, 0), v(3, 0), v(0, 3)]).unwrap();
        let c = tri.centered();
        assert_eq!(c.center, FixVec::ZERO);
        assert!(c.unit_inertia() < tri.unit_inertia());
    }

    #[test]
    fn test_table() {
        let mut table = ColliderTable::new();
        assert!(table.is_empty());
        let idx = table.add(ConvexCollider::from_size(v(1, 1)));
        assert_eq!(table.len(), 1);
        assert!(table.get(idx).is_some());
    }
}
