//! Body Materials with Pair-wise Combine Rules
//!
//! A [`Material`] carries the surface and bulk constants of a body. When two
//! bodies touch, their bounce and friction are merged with a [`CombineRule`]:
//! bounce takes the maximum, friction the average.

use crate::math::FixFloat;

/// Combine rule for friction/restitution when two materials interact
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CombineRule {
    /// Average of two values
    #[default]
    Average,
    /// Maximum of two values
    Max,
}

impl CombineRule {
    /// Apply the combine rule to two values
    #[inline]
    #[must_use]
    pub fn apply(self, a: FixFloat, b: FixFloat) -> FixFloat {
        match self {
            Self::Average => (a + b).half(),
            Self::Max => a.max(b),
        }
    }
}

/// Rule used to merge two bounces.
pub const BOUNCE_COMBINE: CombineRule = CombineRule::Max;

/// Rule used to merge two friction coefficients.
pub const FRICTION_COMBINE: CombineRule = CombineRule::Average;

/// Physics material definition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    /// Restitution (bounciness, 0..1)
    pub bounce: FixFloat,
    /// Coulomb friction coefficient
    pub friction: FixFloat,
    /// Mass per unit area
    pub density: FixFloat,
    /// Linear velocity kept per substep in free flight (1 = no drag)
    pub air_linear_friction: FixFloat,
    /// Angular velocity kept per substep in free flight (1 = no drag)
    pub air_angular_friction: FixFloat,
}

impl Material {
    /// Bounce 0.25, friction 0.5, density 1, no air drag.
    pub const ORDINARY: Self = Self {
        bounce: FixFloat::from_raw(1 << 14),
        friction: FixFloat::HALF,
        density: FixFloat::ONE,
        air_linear_friction: FixFloat::ONE,
        air_angular_friction: FixFloat::ONE,
    };

    /// Create a material without air drag.
    #[must_use]
    pub const fn new(bounce: FixFloat, friction: FixFloat, density: FixFloat) -> Self {
        Self {
            bounce,
            friction,
            density,
            air_linear_friction: FixFloat::ONE,
            air_angular_friction: FixFloat::ONE,
        }
    }

    /// Set per-substep air retention factors.
    #[must_use]
    pub const fn with_air_friction(mut self, linear: FixFloat, angular: FixFloat) -> Self {
        self.air_linear_friction = linear;
        self.air_angular_friction = angular;
        self
    }

    /// Combined bounce of a contact pair.
    #[inline]
    #[must_use]
    pub fn combined_bounce(&self, other: &Self) -> FixFloat {
        BOUNCE_COMBINE.apply(self.bounce, other.bounce)
    }

    /// Combined friction of a contact pair.
    #[inline]
    #[must_use]
    pub fn combined_friction(&self, other: &Self) -> FixFloat {
        FRICTION_COMBINE.apply(self.friction, other.friction)
    }

    /// Whether free flight is damped at all.
    #[inline]
    #[must_use]
    pub fn has_air_friction(&self) -> bool {
        self.air_linear_friction != FixFloat::ONE || self.air_angular_friction != FixFloat::ONE
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::ORDINARY
    }
}

// ============================================================================
// Tests
// ============================================================================
