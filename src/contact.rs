//! Narrow-Phase Contact
//!
//! [`Contact`] is the single result type of every shape-pair test. The normal
//! always points from the first body toward the second; penetration is
//! negative while the shapes overlap.

use crate::math::{FixFloat, FixVec};

/// Relation of the two shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContactStatus {
    /// No interaction
    Outside,
    /// One shape's center lies inside the other
    Inside,
    /// Boundaries touch or overlap
    Collide,
}

/// Geometric feature the contact point comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContactType {
    /// A vertex of one shape
    Vertex,
    /// An edge (or circle surface)
    Edge,
    /// Average over an overlap region
    Average,
}

/// Contact between two bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contact {
    /// World-space point
    pub point: FixVec,
    /// Unit normal from body A toward body B
    pub normal: FixVec,
    /// Negative while overlapping, otherwise the separating distance
    pub penetration: FixFloat,
    pub status: ContactStatus,
    pub kind: ContactType,
}

impl Contact {
    /// No-interaction sentinel.
    pub const OUTSIDE: Self = Self {
        point: FixVec::ZERO,
        normal: FixVec::ZERO,
        penetration: FixFloat::ZERO,
        status: ContactStatus::Outside,
        kind: ContactType::Vertex,
    };

    #[inline]
    #[must_use]
    pub const fn new(
        point: FixVec,
        normal: FixVec,
        penetration: FixFloat,
        status: ContactStatus,
        kind: ContactType,
    ) -> Self {
        Self {
            point,
            normal,
            penetration,
            status,
            kind,
        }
    }

    /// Same contact seen from the other body.
    #[inline]
    #[must_use]
    pub fn negative_normal(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }

    #[inline]
    #[must_use]
    pub fn is_outside(&self) -> bool {
        self.status == ContactStatus::Outside
    }
}
