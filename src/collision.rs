//! Narrow-Phase Collision Detection
//!
//! [`CollisionSolver`] turns a pair of bodies (or raw colliders with their
//! transforms) into a [`Contact`] whose normal points from the first argument
//! toward the second.
//!
//! # Shape pairs
//!
//! - **Circle / circle**: analytic, contact on the radical line
//! - **Circle / convex**: maximum edge separation plus a Voronoi region test,
//!   solved in the polygon's local frame
//! - **Convex / convex**: boundary pins from the clipper, classified by count
//!
//! Degenerate directions fall back to `(0, 1)` instead of normalizing a zero
//! vector. Between bodies the fallback is oriented by id, so swapping the
//! pair always flips the normal.

use crate::body::Body;
use crate::clipper::{common_edge, find_intersection_pins, intersect_region, Pin, PinSite};
use crate::collider::{CircleCollider, ColliderTable, ConvexCollider};
use crate::contact::{Contact, ContactStatus, ContactType};
use crate::math::{FixFloat, FixVec};
use crate::shape::Form;
use crate::transform::Transform;

#[cfg(not(feature = "std"))]
use alloc::borrow::Cow;
#[cfg(feature = "std")]
use std::borrow::Cow;

/// Default slack (in raw units) within which a circle still reports a
/// speculative contact against a polygon face.
pub const DEFAULT_CIRCLE_MARGIN: FixFloat = FixFloat::from_raw(10);

/// Normal used when two centers coincide.
const FALLBACK_NORMAL: FixVec = FixVec::UNIT_Y;

/// Narrow-phase dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionSolver {
    /// Extra separation accepted by circle / polygon tests
    pub circle_margin: FixFloat,
}

impl Default for CollisionSolver {
    fn default() -> Self {
        Self::new(DEFAULT_CIRCLE_MARGIN)
    }
}

impl CollisionSolver {
    #[must_use]
    pub const fn new(circle_margin: FixFloat) -> Self {
        Self { circle_margin }
    }

    /// Contact between two bodies, normal from `a` toward `b`.
    ///
    /// Bodies without a shape, with disjoint boundaries or referencing an
    /// unknown polygon give [`Contact::OUTSIDE`].
    #[must_use]
    pub fn collide(&self, a: &Body, b: &Body, colliders: &ColliderTable) -> Contact {
        if a.shape().is_empty() || b.shape().is_empty() {
            return Contact::OUTSIDE;
        }
        if !a.boundary().is_collide(b.boundary()) {
            return Contact::OUTSIDE;
        }

        let ta = &a.transform;
        let tb = &b.transform;
        let fallback = if a.id <= b.id {
            FALLBACK_NORMAL
        } else {
            -FALLBACK_NORMAL
        };
        match (a.shape().form, b.shape().form) {
            (Form::Circle { radius: ra }, Form::Circle { radius: rb }) => collide_circles_toward(
                &CircleCollider::new(ta.position, ra),
                &CircleCollider::new(tb.position, rb),
                fallback,
            ),
            (Form::Circle { radius }, form_b) => match convex_of(form_b, colliders) {
                Some(convex) => self.collide_circle_and_convex(
                    &CircleCollider::new(ta.position, radius),
                    &convex,
                    tb,
                ),
                None => Contact::OUTSIDE,
            },
            (form_a, Form::Circle { radius }) => match convex_of(form_a, colliders) {
                Some(convex) => self
                    .collide_circle_and_convex(&CircleCollider::new(tb.position, radius), &convex, ta)
                    .negative_normal(),
                None => Contact::OUTSIDE,
            },
            (form_a, form_b) => match (convex_of(form_a, colliders), convex_of(form_b, colliders)) {
                (Some(ca), Some(cb)) => collide_convexes_toward(&ca, ta, &cb, tb, fallback),
                _ => Contact::OUTSIDE,
            },
        }
    }

    /// Circle (world space) against a polygon placed at `transform`.
    /// Normal points from the circle toward the polygon.
    #[must_use]
    pub fn collide_circle_and_convex(
        &self,
        circle: &CircleCollider,
        convex: &ConvexCollider,
        transform: &Transform,
    ) -> Contact {
        let local = CircleCollider::new(transform.inverse_point(circle.center), circle.radius);
        let contact = self.collide_local_circle(&local, convex);
        if contact.is_outside() {
            contact
        } else {
            transform.convert_contact(contact)
        }
    }

    fn collide_local_circle(&self, circle: &CircleCollider, convex: &ConvexCollider) -> Contact {
        let c = circle.center;
        let r = circle.radius;
        let n = convex.points.len();

        let mut max_sep = FixFloat::MIN;
        let mut edge = 0;
        for i in 0..n {
            let s = convex.normals[i].dot(c - convex.points[i]);
            if s > max_sep {
                max_sep = s;
                edge = i;
            }
        }

        if max_sep > r + self.circle_margin {
            return Contact::OUTSIDE;
        }

        let normal = convex.normals[edge];
        if max_sep.is_negative() {
            return Contact::new(
                c,
                -normal,
                max_sep - r,
                ContactStatus::Inside,
                ContactType::Edge,
            );
        }

        let v0 = convex.points[edge];
        let v1 = convex.points[(edge + 1) % n];

        if (c - v0).dot(v1 - v0) <= FixFloat::ZERO {
            return vertex_contact(c, r, v0, -normal);
        }
        if (c - v1).dot(v0 - v1) <= FixFloat::ZERO {
            return vertex_contact(c, r, v1, -normal);
        }

        Contact::new(
            c - normal * max_sep,
            -normal,
            max_sep - r,
            ContactStatus::Collide,
            ContactType::Edge,
        )
    }
}

/// Circle center `c` against polygon vertex `v`; normal from circle to vertex.
fn vertex_contact(c: FixVec, r: FixFloat, v: FixVec, fallback: FixVec) -> Contact {
    let delta = v - c;
    let sqr_dist = delta.length_squared();
    if sqr_dist > r.sqr() {
        return Contact::OUTSIDE;
    }
    let dist = sqr_dist.sqrt();
    Contact::new(
        v,
        delta.normalize_or(fallback),
        dist - r,
        ContactStatus::Collide,
        ContactType::Vertex,
    )
}

/// Body-space polygon of a rect or polygon form.
fn convex_of<'a>(form: Form, colliders: &'a ColliderTable) -> Option<Cow<'a, ConvexCollider>> {
    match form {
        Form::Rect { size } => Some(Cow::Owned(ConvexCollider::from_size(size))),
        Form::Polygon { index } => colliders.get(index).map(Cow::Borrowed),
        Form::Circle { .. } | Form::Empty => None,
    }
}

// ============================================================================
// Circle / circle
// ============================================================================

/// Two circles in the same frame, normal from `a` toward `b`.
#[must_use]
pub fn collide_circles(a: &CircleCollider, b: &CircleCollider) -> Contact {
    collide_circles_toward(a, b, FALLBACK_NORMAL)
}

/// [`collide_circles`] with the normal used for coincident centers.
#[must_use]
pub fn collide_circles_toward(a: &CircleCollider, b: &CircleCollider, fallback: FixVec) -> Contact {
    let ca = a.center;
    let cb = b.center;
    let ra = a.radius;
    let rb = b.radius;

    let sqr_dist = ca.sqr_distance(cb);
    let r_sum = ra + rb;
    if sqr_dist > r_sum.sqr() {
        return Contact::OUTSIDE;
    }

    let ra2 = ra.sqr();
    let rb2 = rb.sqr();
    let dist = sqr_dist.sqrt();

    if sqr_dist < ra2 || sqr_dist < rb2 {
        let point = if ra < rb { ca } else { cb };
        return Contact::new(
            point,
            (cb - ca).normalize_or(fallback),
            dist - r_sum,
            ContactStatus::Inside,
            ContactType::Edge,
        );
    }

    // distance from b's center to the radical line, as a share of the
    // center distance
    let k = (rb2 - ra2 + sqr_dist) / (sqr_dist + sqr_dist);
    let point = cb + (ca - cb) * k;

    Contact::new(
        point,
        (cb - ca).normalize_or(fallback),
        dist - r_sum,
        ContactStatus::Collide,
        ContactType::Edge,
    )
}

// ============================================================================
// Convex / convex
// ============================================================================

/// Two placed polygons, normal from `a` toward `b`.
///
/// The polygon with more vertices (ties: `b`) stays in its own frame and the
/// other one is moved into it, so only one side picks up rotation error.
#[must_use]
pub fn collide_convexes(
    a: &ConvexCollider,
    ta: &Transform,
    b: &ConvexCollider,
    tb: &Transform,
) -> Contact {
    collide_convexes_toward(a, ta, b, tb, FALLBACK_NORMAL)
}

/// [`collide_convexes`] with the world-space normal used for coincident
/// centers.
#[must_use]
pub fn collide_convexes_toward(
    a: &ConvexCollider,
    ta: &Transform,
    b: &ConvexCollider,
    tb: &Transform,
    fallback: FixVec,
) -> Contact {
    let (contact, frame) = if a.points.len() > b.points.len() {
        let b_in_a = b.transformed(&Transform::convert_from_b_to_a(tb, ta));
        (collide_local_convexes(a, &b_in_a, ta.inverse_vector(fallback)), ta)
    } else {
        let a_in_b = a.transformed(&Transform::convert_from_b_to_a(ta, tb));
        (collide_local_convexes(&a_in_b, b, tb.inverse_vector(fallback)), tb)
    };
    if contact.is_outside() {
        contact
    } else {
        frame.convert_contact(contact)
    }
}

/// Two polygons in the same frame.
fn collide_local_convexes(a: &ConvexCollider, b: &ConvexCollider, fallback: FixVec) -> Contact {
    if !a.boundary.is_collide(&b.boundary) {
        return Contact::OUTSIDE;
    }
    let pins = find_intersection_pins(&a.points, &b.points, &a.boundary, &b.boundary);
    match pins.as_slice() {
        [] => contained_contact(a, b, fallback),
        [pin] => touch_contact(a, b, pin, fallback),
        [p0, p1] => two_pin_contact(a, b, p0, p1, fallback),
        _ => overlap_contact(a, b, &pins, fallback),
    }
}

fn center_normal(a: &ConvexCollider, b: &ConvexCollider, fallback: FixVec) -> FixVec {
    (b.center - a.center).normalize_or(fallback)
}

/// No boundary crossing: either disjoint or one polygon holds the other.
fn contained_contact(a: &ConvexCollider, b: &ConvexCollider, fallback: FixVec) -> Contact {
    let point = if b.is_contain(a.points[0]) {
        a.center
    } else if a.is_contain(b.points[0]) {
        b.center
    } else {
        return Contact::OUTSIDE;
    };
    let dist = a.center.distance(b.center);
    Contact::new(
        point,
        center_normal(a, b, fallback),
        dist - (a.radius + b.radius),
        ContactStatus::Inside,
        ContactType::Average,
    )
}

/// Single touching point: the edge carrying the pin gives the normal.
fn touch_contact(a: &ConvexCollider, b: &ConvexCollider, pin: &Pin, fallback: FixVec) -> Contact {
    let (normal, kind) = match (pin.a, pin.b) {
        (PinSite::Edge(i), _) => (a.normals[i], ContactType::Edge),
        (PinSite::Vertex(_), PinSite::Edge(j)) => (-b.normals[j], ContactType::Edge),
        (PinSite::Vertex(_), PinSite::Vertex(_)) => (center_normal(a, b, fallback), ContactType::Vertex),
    };
    Contact::new(pin.point, normal, FixFloat::ZERO, ContactStatus::Collide, kind)
}

/// Two pins: edge normal when both lie on one edge, otherwise the pin chord
/// turned toward `b`. Depth is the deepest vertex of either polygon inside
/// the other, measured along the normal from the chord midpoint.
fn two_pin_contact(
    a: &ConvexCollider,
    b: &ConvexCollider,
    p0: &Pin,
    p1: &Pin,
    fallback: FixVec,
) -> Contact {
    let (normal, kind) = if let Some(e) = common_edge(p0.a, p1.a, a.points.len()) {
        (a.normals[e], ContactType::Edge)
    } else if let Some(e) = common_edge(p0.b, p1.b, b.points.len()) {
        (-b.normals[e], ContactType::Edge)
    } else {
        let chord = (p1.point - p0.point).perpendicular();
        let toward = center_normal(a, b, fallback);
        let n = chord.normalize_or(toward);
        let n = if n.dot(toward).is_negative() { -n } else { n };
        (n, ContactType::Average)
    };

    let mid = p0.point.middle(p1.point);
    let depth_a = a
        .points
        .iter()
        .filter(|&&v| b.is_contain(v))
        .map(|&v| normal.dot(v - mid))
        .max()
        .unwrap_or(FixFloat::ZERO);
    let depth_b = b
        .points
        .iter()
        .filter(|&&v| a.is_contain(v))
        .map(|&v| -normal.dot(v - mid))
        .max()
        .unwrap_or(FixFloat::ZERO);
    let depth = depth_a.max(depth_b).max(FixFloat::ZERO);

    Contact::new(mid, normal, -depth, ContactStatus::Collide, kind)
}

/// Three or more pins: overlap centroid, depth approximated by area / width.
fn overlap_contact(
    a: &ConvexCollider,
    b: &ConvexCollider,
    pins: &[Pin],
    fallback: FixVec,
) -> Contact {
    let region = intersect_region(&a.points, &b.points, pins);
    let mut width = FixFloat::ZERO;
    for (i, p) in pins.iter().enumerate() {
        for q in &pins[i + 1..] {
            width = width.max(p.point.sqr_distance(q.point));
        }
    }
    let width = width.sqrt();
    let depth = if width.is_zero() {
        FixFloat::ZERO
    } else {
        region.area / width
    };
    Contact::new(
        region.centroid,
        center_normal(a, b, fallback),
        -depth,
        ContactStatus::Collide,
        ContactType::Average,
    )
}

// ============================================================================
// Tests
// ============================================================================
