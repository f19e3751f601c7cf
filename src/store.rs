//! Body Store
//!
//! Bodies live in a dense array kept sorted by id, next to a parallel array of
//! the ids themselves. A `timestamp` counts structural changes that may move
//! bodies to other indices; a [`BodyHandler`] caches the index together with
//! the timestamp it was taken at and re-resolves by binary search once the
//! store has changed.
//!
//! Appending a body with the largest id so far keeps every existing index and
//! therefore leaves the timestamp alone.

use crate::body::Body;
use crate::error::PhysicsError;
use log::{debug, warn};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Cached reference to a body in a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyHandler {
    pub id: i64,
    pub index: usize,
    pub timestamp: u64,
}

/// Handler plus a copy of the body it points to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub handler: BodyHandler,
    pub body: Body,
}

/// Id-sorted body arena.
#[derive(Clone, Debug, Default)]
pub struct BodyStore {
    ids: Vec<i64>,
    bodies: Vec<Body>,
    timestamp: u64,
}

impl BodyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            bodies: Vec::with_capacity(capacity),
            timestamp: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Structural change counter.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Bodies in id order.
    #[inline]
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    #[inline]
    pub(crate) fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// Insert a body at its sorted position.
    pub fn add(&mut self, body: Body) -> Result<BodyHandler, PhysicsError> {
        let id = body.id;
        let index = match self.ids.binary_search(&id) {
            Ok(_) => {
                warn!("store: rejected duplicate body {id}");
                return Err(PhysicsError::DuplicateBody { id });
            }
            Err(index) => index,
        };

        if index < self.ids.len() {
            self.timestamp += 1;
        }
        self.ids.insert(index, id);
        self.bodies.insert(index, body);

        debug!("store: added body {id} at {index} (timestamp {})", self.timestamp);
        Ok(BodyHandler {
            id,
            index,
            timestamp: self.timestamp,
        })
    }

    /// Remove a body and return it.
    pub fn remove(&mut self, handler: &BodyHandler) -> Result<Body, PhysicsError> {
        let index = self.index_of(handler)?;
        self.ids.remove(index);
        let body = self.bodies.remove(index);
        self.timestamp += 1;
        debug!("store: removed body {} (timestamp {})", handler.id, self.timestamp);
        Ok(body)
    }

    /// Drop every body.
    pub fn remove_all(&mut self) {
        self.ids.clear();
        self.bodies.clear();
        self.timestamp += 1;
        debug!("store: cleared (timestamp {})", self.timestamp);
    }

    /// Current index of the handler's body.
    pub fn index_of(&self, handler: &BodyHandler) -> Result<usize, PhysicsError> {
        if handler.timestamp == self.timestamp && self.ids.get(handler.index) == Some(&handler.id) {
            return Ok(handler.index);
        }
        self.index_of_id(handler.id)
    }

    /// Index of the body with `id`, by binary search.
    pub fn index_of_id(&self, id: i64) -> Result<usize, PhysicsError> {
        self.ids.binary_search(&id).map_err(|_| {
            warn!("store: body {id} not found");
            PhysicsError::BodyNotFound { id }
        })
    }

    /// Fresh handler for the body at `index`.
    #[must_use]
    pub fn handler_at(&self, index: usize) -> Option<BodyHandler> {
        self.ids.get(index).map(|&id| BodyHandler {
            id,
            index,
            timestamp: self.timestamp,
        })
    }

    pub fn get(&self, handler: &BodyHandler) -> Result<&Body, PhysicsError> {
        let index = self.index_of(handler)?;
        Ok(&self.bodies[index])
    }

    pub fn get_mut(&mut self, handler: &BodyHandler) -> Result<&mut Body, PhysicsError> {
        let index = self.index_of(handler)?;
        Ok(&mut self.bodies[index])
    }

    /// Handler and copy of the body with `id`.
    pub fn actor_by_id(&self, id: i64) -> Result<Actor, PhysicsError> {
        let index = self.index_of_id(id)?;
        Ok(Actor {
            handler: BodyHandler {
                id,
                index,
                timestamp: self.timestamp,
            },
            body: self.bodies[index].clone(),
        })
    }

    /// Handler refreshed to the current timestamp plus a copy of the body.
    pub fn actor(&self, handler: &BodyHandler) -> Result<Actor, PhysicsError> {
        let index = self.index_of(handler)?;
        Ok(Actor {
            handler: BodyHandler {
                id: handler.id,
                index,
                timestamp: self.timestamp,
            },
            body: self.bodies[index].clone(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
