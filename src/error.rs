//! Physics Error Types
//!
//! Unified error type for the engine. Operations that can be handed invalid
//! input at the API boundary (body lookup, store insertion, shape and
//! configuration validation) return `Result<T, PhysicsError>` instead of
//! producing wrong physics or corrupting the body/slot mapping.

use core::fmt;

/// Unified error type for physics operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhysicsError {
    /// No body with this id is present in the store.
    BodyNotFound {
        /// The id that was looked up
        id: i64,
    },
    /// A body with this id is already present in the store.
    DuplicateBody {
        /// The conflicting id
        id: i64,
    },
    /// A shape or collider cannot be built from the given geometry.
    InvalidShape {
        /// Human-readable description of the problem
        reason: &'static str,
    },
    /// An actor does not match the handler it carries.
    InvalidActor {
        /// Human-readable description of the problem
        reason: &'static str,
    },
    /// Invalid configuration parameter.
    InvalidConfiguration {
        /// Description of the invalid configuration
        reason: &'static str,
    },
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyNotFound { id } => write!(f, "body {id} not found"),
            Self::DuplicateBody { id } => write!(f, "body {id} already exists"),
            Self::InvalidShape { reason } => write!(f, "invalid shape: {reason}"),
            Self::InvalidActor { reason } => write!(f, "invalid actor: {reason}"),
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PhysicsError {}

// ============================================================================
// Tests
// ============================================================================
