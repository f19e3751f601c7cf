//! World Configuration
//!
//! [`WorldSettings`] carries every tunable of the step: time step, iteration
//! counts, stabilization constants and store capacity. Defaults correspond to
//! [`SolverPrecision::Normal`].

use crate::collision::DEFAULT_CIRCLE_MARGIN;
use crate::error::PhysicsError;
use crate::math::FixFloat;

/// Iteration presets (velocity × position iterations).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverPrecision {
    /// 8 × 2
    Low,
    /// 8 × 4
    Moderate,
    /// 16 × 4
    #[default]
    Normal,
    /// 16 × 8
    High,
    /// 32 × 8
    Ultra,
}

impl SolverPrecision {
    /// `(velocity_iterations, position_iterations)`
    #[must_use]
    pub const fn iterations(self) -> (usize, usize) {
        match self {
            Self::Low => (8, 2),
            Self::Moderate => (8, 4),
            Self::Normal => (16, 4),
            Self::High => (16, 8),
            Self::Ultra => (32, 8),
        }
    }
}

/// World step configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldSettings {
    /// Seconds per `iterate` call
    pub time_step: FixFloat,
    /// Jacobi passes per substep
    pub velocity_iterations: usize,
    /// Substeps per `iterate` call
    pub position_iterations: usize,
    /// Initial capacity of the body store and solver buffers
    pub body_capacity: usize,
    /// Distance bodies may leave the world boundary before they are frozen
    pub freeze_margin: FixFloat,
    /// Fraction of penetration corrected per substep
    pub baumgarte: FixFloat,
    /// Velocity reduction per extra simultaneous impact
    pub impact_stabilization: FixFloat,
    /// Speculative gap for circle-polygon contacts
    pub circle_margin: FixFloat,
    /// Keep the contacts of the last substep for inspection
    pub debug_contacts: bool,
}

impl Default for WorldSettings {
    fn default() -> Self {
        let (velocity_iterations, position_iterations) = SolverPrecision::Normal.iterations();
        Self {
            time_step: FixFloat::from_ratio(1, 60),
            velocity_iterations,
            position_iterations,
            body_capacity: 1024,
            freeze_margin: FixFloat::ONE,
            baumgarte: FixFloat::from_ratio(1, 4),
            impact_stabilization: FixFloat::from_ratio(1, 32),
            circle_margin: DEFAULT_CIRCLE_MARGIN,
            debug_contacts: false,
        }
    }
}

impl WorldSettings {
    /// Replace both iteration counts with a preset.
    #[must_use]
    pub fn with_precision(mut self, precision: SolverPrecision) -> Self {
        let (velocity, position) = precision.iterations();
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    /// Substep length `time_step / position_iterations`.
    #[must_use]
    pub fn sub_time_step(&self) -> FixFloat {
        self.time_step.div_int(self.position_iterations.max(1) as i64)
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.velocity_iterations == 0 {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "velocity_iterations must be positive",
            });
        }
        if self.position_iterations == 0 {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "position_iterations must be positive",
            });
        }
        if !self.time_step.is_positive() {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "time_step must be positive",
            });
        }
        if !self.sub_time_step().is_positive() {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "time_step too small for position_iterations",
            });
        }
        if self.freeze_margin.is_negative() || self.circle_margin.is_negative() {
            return Err(PhysicsError::InvalidConfiguration {
                reason: "margins must not be negative",
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
