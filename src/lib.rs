//! # fixbox
//!
//! **Deterministic Fixed-Point 2D Rigid-Body Physics**
//!
//! Every quantity in the engine is a Q47.16 fixed-point integer, so a
//! simulation fed the same inputs produces bit-identical states on every
//! platform. Suited to lockstep networking and replays.
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **Fixed-point math** | `FixFloat` scalar, `FixVec`, lookup-table trigonometry |
//! | **Shapes** | Circles, rectangles and convex polygons |
//! | **Narrow phase** | Circle/circle, circle/convex, convex/convex via polygon clipping |
//! | **Split impulse** | Restitution and friction on true velocity, Baumgarte on a separate bias channel |
//! | **Jacobi solver** | Per-body averaging of simultaneous impulses, order independent |
//! | **Body store** | Id-sorted arena with cached handlers |
//!
//! ## Cargo Features
//!
//! - `std` (default): standard library; without it the crate is `no_std` + `alloc`
//! - `parallel`: broad and narrow phase on rayon
//! - `serde`: serialization of value types and settings
//!
//! ## Quick Start
//!
//! ```rust
//! use fixbox::prelude::*;
//!
//! let boundary = Boundary::new(FixVec::from_int(-20, -20), FixVec::from_int(20, 20));
//! let mut world = World::new(boundary, WorldSettings::default(), FixVec::from_int(0, -10)).unwrap();
//!
//! let ground = Body::new(0, Transform::ZERO, false, Material::ORDINARY)
//!     .with_shape(Shape::rect(FixVec::from_int(30, 2)));
//! world.add(ground).unwrap();
//!
//! let triangle = ConvexCollider::new(vec![
//!     FixVec::from_int(-1, 0),
//!     FixVec::from_int(1, 0),
//!     FixVec::from_int(0, 2),
//! ])
//! .unwrap();
//! let index = world.add_collider(triangle.clone());
//! let body = Body::new(1, Transform::from_position(FixVec::from_int(0, 4)), true, Material::ORDINARY)
//!     .with_shape(Shape::polygon(index, &triangle));
//! let handler = world.add(body).unwrap();
//!
//! world.iterate();
//! let actor = world.actor(&handler).unwrap();
//! assert!(actor.body.velocity.linear.y.is_negative());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod body;
pub mod boundary;
pub mod clipper;
pub mod collider;
pub mod collision;
pub mod contact;
pub mod error;
pub mod manifold;
pub mod material;
pub mod math;
pub mod resolver;
pub mod settings;
pub mod shape;
pub mod store;
pub mod transform;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::body::{Acceleration, Body, Velocity};
    pub use crate::boundary::Boundary;
    pub use crate::collider::{CircleCollider, ColliderIndex, ColliderTable, ConvexCollider};
    pub use crate::collision::CollisionSolver;
    pub use crate::contact::{Contact, ContactStatus, ContactType};
    pub use crate::error::PhysicsError;
    pub use crate::material::{CombineRule, Material};
    pub use crate::math::{FixFloat, FixVec, Rotator};
    pub use crate::settings::{SolverPrecision, WorldSettings};
    pub use crate::shape::{Form, Shape};
    pub use crate::store::{Actor, BodyHandler};
    pub use crate::transform::Transform;
    pub use crate::world::World;
}

// Re-export main types at crate root
pub use prelude::*;

// ============================================================================
// Integration Tests
// ============================================================================
