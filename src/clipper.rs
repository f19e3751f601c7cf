//! Convex Polygon Clipper
//!
//! Boundary intersections ("pins") of two counter-clockwise convex polygons and
//! the area and centroid of their overlap.
//!
//! Segment tests are exact: orientation and intersection parameters are
//! computed on `i128` cross products of the raw coordinates, so the site
//! provenance of a pin (edge interior or vertex) never depends on rounding.
//! The products stay exact while coordinates are below `2^45` units.

use crate::boundary::Boundary;
use crate::math::{div_round, saturate, FixFloat, FixVec, FRACTION_BITS};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Where a pin lies on one polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinSite {
    /// Interior of edge `i` (from vertex `i` to vertex `i + 1`)
    Edge(usize),
    /// Exactly on vertex `i`
    Vertex(usize),
}

impl PinSite {
    /// Whether the site lies on edge `edge` of a polygon with `count` vertices.
    #[inline]
    #[must_use]
    pub fn is_on_edge(self, edge: usize, count: usize) -> bool {
        match self {
            Self::Edge(i) => i == edge,
            Self::Vertex(v) => v == edge || v == (edge + 1) % count,
        }
    }

    /// The (up to two) edges the site belongs to.
    #[inline]
    #[must_use]
    pub fn edges(self, count: usize) -> [usize; 2] {
        match self {
            Self::Edge(i) => [i, i],
            Self::Vertex(v) => [v, (v + count - 1) % count],
        }
    }
}

/// Edge shared by two sites of the same polygon, if any.
#[must_use]
pub fn common_edge(s0: PinSite, s1: PinSite, count: usize) -> Option<usize> {
    s0.edges(count)
        .into_iter()
        .find(|&e| s1.is_on_edge(e, count))
}

/// Boundary intersection point of two polygons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pin {
    pub point: FixVec,
    /// Site on the first polygon
    pub a: PinSite,
    /// Site on the second polygon
    pub b: PinSite,
}

/// Overlap region summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub centroid: FixVec,
    /// Non-negative, zero when the polygons do not overlap
    pub area: FixFloat,
}

// ============================================================================
// Pins
// ============================================================================

/// All points where the outlines of `a` and `b` meet.
///
/// Pins are deduplicated by position and ordered along `a`'s outline (by edge
/// index, then by distance from the edge start).
#[must_use]
pub fn find_intersection_pins(
    a: &[FixVec],
    b: &[FixVec],
    bounds_a: &Boundary,
    bounds_b: &Boundary,
) -> Vec<Pin> {
    let mut pins: Vec<Pin> = Vec::new();
    if !bounds_a.is_collide(bounds_b) {
        return pins;
    }

    let na = a.len();
    let nb = b.len();

    // edges of b that can reach a at all
    let b_edges: Vec<usize> = (0..nb)
        .filter(|&j| bounds_a.is_intersection_possible(b[j], b[(j + 1) % nb]))
        .collect();

    let mut edge_pins: Vec<(i128, Pin)> = Vec::new();
    for i in 0..na {
        let a0 = a[i];
        let a1 = a[(i + 1) % na];
        if !bounds_b.is_intersection_possible(a0, a1) {
            continue;
        }
        edge_pins.clear();
        for &j in &b_edges {
            let b0 = b[j];
            let b1 = b[(j + 1) % nb];
            cross_segments([a0, a1], [b0, b1], i, j, na, nb, &mut edge_pins);
        }
        edge_pins.sort_by_key(|&(along, _)| along);
        for &(_, pin) in &edge_pins {
            if !pins.iter().any(|p| p.point == pin.point) {
                pins.push(pin);
            }
        }
    }
    pins
}

/// Intersections of segment `i` of `a` with segment `j` of `b`, tagged with
/// their distance key along the `a` segment.
fn cross_segments(
    [a0, a1]: [FixVec; 2],
    [b0, b1]: [FixVec; 2],
    i: usize,
    j: usize,
    na: usize,
    nb: usize,
    out: &mut Vec<(i128, Pin)>,
) {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let w = b0 - a0;
    let mut denom = d1.cross_raw(d2);

    if denom == 0 {
        if w.cross_raw(d1) != 0 {
            return;
        }
        collinear_overlap([a0, a1], [b0, b1], i, j, na, nb, out);
        return;
    }

    let mut t_num = w.cross_raw(d2);
    let mut u_num = w.cross_raw(d1);
    if denom < 0 {
        denom = -denom;
        t_num = -t_num;
        u_num = -u_num;
    }
    if t_num < 0 || t_num > denom || u_num < 0 || u_num > denom {
        return;
    }

    let site = |num: i128, index: usize, count: usize| {
        if num == 0 {
            PinSite::Vertex(index)
        } else if num == denom {
            PinSite::Vertex((index + 1) % count)
        } else {
            PinSite::Edge(index)
        }
    };
    let sa = site(t_num, i, na);
    let sb = site(u_num, j, nb);

    let point = match (sa, sb) {
        (PinSite::Vertex(v), _) => if v == i { a0 } else { a1 },
        (_, PinSite::Vertex(v)) => if v == j { b0 } else { b1 },
        _ => FixVec::new(
            a0.x + lerp_raw(d1.x, t_num, denom),
            a0.y + lerp_raw(d1.y, t_num, denom),
        ),
    };
    out.push((dot_raw(point - a0, d1), Pin { point, a: sa, b: sb }));
}

/// Shared stretch of two collinear segments: every endpoint of one lying on
/// the other is a pin.
fn collinear_overlap(
    [a0, a1]: [FixVec; 2],
    [b0, b1]: [FixVec; 2],
    i: usize,
    j: usize,
    na: usize,
    nb: usize,
    out: &mut Vec<(i128, Pin)>,
) {
    let d1 = a1 - a0;
    let len_a = dot_raw(d1, d1);
    let d2 = b1 - b0;
    let len_b = dot_raw(d2, d2);

    let site_on = |along: i128, len: i128, index: usize, count: usize| {
        if along == 0 {
            PinSite::Vertex(index)
        } else if along == len {
            PinSite::Vertex((index + 1) % count)
        } else {
            PinSite::Edge(index)
        }
    };

    for (p, vb) in [(b0, j), (b1, (j + 1) % nb)] {
        let along = dot_raw(p - a0, d1);
        if (0..=len_a).contains(&along) {
            let pin = Pin {
                point: p,
                a: site_on(along, len_a, i, na),
                b: PinSite::Vertex(vb),
            };
            out.push((along, pin));
        }
    }
    for (p, va) in [(a0, i), (a1, (i + 1) % na)] {
        let along = dot_raw(p - b0, d2);
        if (0..=len_b).contains(&along) {
            let pin = Pin {
                point: p,
                a: PinSite::Vertex(va),
                b: site_on(along, len_b, j, nb),
            };
            out.push((dot_raw(p - a0, d1), pin));
        }
    }
}

/// `d * num / denom` for `0 <= num <= denom`. A ratio too wide for an exact
/// product is cut to 62 bits first.
#[inline]
fn lerp_raw(d: FixFloat, num: i128, denom: i128) -> FixFloat {
    let d = d.raw() as i128;
    if let Some(product) = d.checked_mul(num) {
        return FixFloat::from_raw(saturate(div_round(product, denom)));
    }
    let shift = (128 - denom.leading_zeros()).saturating_sub(62);
    let (num, denom) = (num >> shift, (denom >> shift).max(1));
    FixFloat::from_raw(saturate(div_round(d * num, denom)))
}

#[inline]
fn dot_raw(a: FixVec, b: FixVec) -> i128 {
    a.x.raw() as i128 * b.x.raw() as i128 + a.y.raw() as i128 * b.y.raw() as i128
}

// ============================================================================
// Region
// ============================================================================

/// Overlap polygon of `a` and `b` reduced to its area and centroid.
///
/// The outline is the pins plus every vertex of one polygon inside the other,
/// sorted by angle around their mean.
#[must_use]
pub fn intersect_region(a: &[FixVec], b: &[FixVec], pins: &[Pin]) -> Region {
    let mut points: Vec<FixVec> = Vec::with_capacity(pins.len() + a.len() + b.len());
    let mut push = |p: FixVec| {
        if !points.contains(&p) {
            points.push(p);
        }
    };
    for pin in pins {
        push(pin.point);
    }
    for &p in a {
        if is_inside(b, p) {
            push(p);
        }
    }
    for &p in b {
        if is_inside(a, p) {
            push(p);
        }
    }

    let mean = mean_point(&points);
    if points.len() < 3 {
        return Region {
            centroid: mean,
            area: FixFloat::ZERO,
        };
    }

    let mut rel: Vec<FixVec> = points.iter().map(|&p| p - mean).collect();
    rel.sort_by(|&u, &v| {
        half_plane(u)
            .cmp(&half_plane(v))
            .then_with(|| 0.cmp(&u.cross_raw(v)))
    });

    let n = rel.len();
    let mut sum_cross: i128 = 0;
    let mut cx: i128 = 0;
    let mut cy: i128 = 0;
    for k in 0..n {
        let p0 = rel[k];
        let p1 = rel[(k + 1) % n];
        let cross = p0.cross_raw(p1);
        sum_cross += cross;
        cx += (p0.x.raw() as i128 + p1.x.raw() as i128) * cross;
        cy += (p0.y.raw() as i128 + p1.y.raw() as i128) * cross;
    }

    if sum_cross <= 0 {
        return Region {
            centroid: mean,
            area: FixFloat::ZERO,
        };
    }

    let offset = FixVec::new(
        FixFloat::from_raw(saturate(div_round(cx, 3 * sum_cross))),
        FixFloat::from_raw(saturate(div_round(cy, 3 * sum_cross))),
    );
    Region {
        centroid: mean + offset,
        area: FixFloat::from_raw(saturate(div_round(sum_cross, 2i128 << FRACTION_BITS))),
    }
}

/// Inside or on the outline of a counter-clockwise convex polygon.
fn is_inside(polygon: &[FixVec], p: FixVec) -> bool {
    let n = polygon.len();
    (0..n).all(|i| {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        (b - a).cross_raw(p - a) >= 0
    })
}

fn mean_point(points: &[FixVec]) -> FixVec {
    if points.is_empty() {
        return FixVec::ZERO;
    }
    let n = points.len() as i128;
    let sx: i128 = points.iter().map(|p| p.x.raw() as i128).sum();
    let sy: i128 = points.iter().map(|p| p.y.raw() as i128).sum();
    FixVec::new(
        FixFloat::from_raw(saturate(div_round(sx, n))),
        FixFloat::from_raw(saturate(div_round(sy, n))),
    )
}

/// 0 for angles in `[0, π)`, 1 for `[π, 2π)`.
#[inline]
fn half_plane(v: FixVec) -> u8 {
    if v.y.is_positive() || (v.y.is_zero() && !v.x.is_negative()) {
        0
    } else {
        1
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

    fn square(x: i64, y: i64, size: i64) -> Vec<FixVec> {
        vec![v(x, y), v(x + size, y), v(x + size, y + size), v(x, y + size)]
    }

    #[test]
    fn test_lerp_wide_ratio() {
        let d = FixFloat::from_raw(i64::MAX / 2);
        let half = lerp_raw(d, 1 << 120, 1 << 121);
        assert_eq!(half.raw(), 1 << 61);
        let third = lerp_raw(-d, 1 << 125, 3 << 125);
        assert!((third.raw() + (i64::MAX / 6)).abs() <= 1);
        assert_eq!(lerp_raw(FixFloat::from_int(6), 1, 3), FixFloat::from_int(2));
    }

    fn pins_of(a: &[FixVec], b: &[FixVec]) -> Vec<Pin> {
        find_intersection_pins(a, b, &Boundary::from_points(a), &Boundary::from_points(b))
    }

    #[test]
    fn test_overlapping_squares() {
        let a = square(0, 0, 2);
        let b = square(1, 1, 2);
        let pins = pins_of(&a, &b);
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[0].point, v(2, 1));
        assert_eq!(pins[0].a, PinSite::Edge(1));
        assert_eq!(pins[0].b, PinSite::Edge(0));
        assert_eq!(pins[1].point, v(1, 2));
        assert_eq!(pins[1].a, PinSite::Edge(2));
        assert_eq!(pins[1].b, PinSite::Edge(3));

        let region = intersect_region(&a, &b, &pins);
        assert_eq!(region.area, FixFloat::ONE);
        assert_eq!(region.centroid, FixVec::from_f64(1.5, 1.5));
    }

    #[test]
    fn test_disjoint() {
        let a = square(0, 0, 2);
        let b = square(5, 5, 2);
        let pins = pins_of(&a, &b);
        assert!(pins.is_empty());
        assert_eq!(intersect_region(&a, &b, &pins).area, FixFloat::ZERO);
    }

    #[test]
    fn test_corner_touch() {
        let a = square(0, 0, 2);
        let b = square(2, 2, 2);
        let pins = pins_of(&a, &b);
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].point, v(2, 2));
        assert_eq!(pins[0].a, PinSite::Vertex(2));
        assert_eq!(pins[0].b, PinSite::Vertex(0));
    }

    #[test]
    fn test_contained_has_region_but_no_pins() {
        let a = square(0, 0, 4);
        let b = square(1, 1, 2);
        let pins = pins_of(&a, &b);
        assert!(pins.is_empty());
        let region = intersect_region(&a, &b, &pins);
        assert_eq!(region.area, FixFloat::from_int(4));
        assert_eq!(region.centroid, v(2, 2));
    }

    #[test]
    fn test_diamond_over_square() {
        // diamond with vertices on the square's edge midpoints extended
        let a = square(-2, -2, 4);
        let b = vec![v(3, 0), v(0, 3), v(-3, 0), v(0, -3)];
        let pins = pins_of(&a, &b);
        assert_eq!(pins.len(), 8);
        let region = intersect_region(&a, &b, &pins);
        // 16 minus four corner triangles of area 1/2
        assert_eq!(region.area, FixFloat::from_int(14));
        assert_eq!(region.centroid, FixVec::ZERO);
    }

    #[test]
    fn test_common_edge() {
        assert_eq!(common_edge(PinSite::Vertex(1), PinSite::Vertex(2), 4), Some(1));
        assert_eq!(common_edge(PinSite::Vertex(0), PinSite::Edge(3), 4), Some(3));
        assert_eq!(common_edge(PinSite::Edge(0), PinSite::Edge(2), 4), None);
    }
}
