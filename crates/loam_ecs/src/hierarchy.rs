//! Parent/child relation between entities
//!
//! [`Parent`] sits on the child, [`Children`] on the parent. Both are kept in
//! sync by [`HierarchyCommands`](crate::HierarchyCommands); editing them
//! directly will desync the two sides.
//!
//! Entity handles are world-local. Both components serialize as raw entity
//! bits, which is why scenes never store them and keep parent links as
//! guids instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;
use crate::world::World;

/// Upper bound on ancestor walks, guards against a corrupted chain
pub(crate) const MAX_DEPTH: usize = 1024;

/// Reference from a child to its parent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    pub entity: Entity,
}

impl Parent {
    pub fn new(entity: Entity) -> Self {
        Self { entity }
    }
}

/// Ordered list of an entity's children
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Children {
    entities: Vec<Entity>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub(crate) fn push(&mut self, entity: Entity) {
        if !self.entities.contains(&entity) {
            self.entities.push(entity);
        }
    }

    pub(crate) fn remove(&mut self, entity: Entity) {
        self.entities.retain(|&e| e != entity);
    }
}

/// Errors from hierarchy edits
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// Linking would make an entity its own ancestor
    #[error("Cycle detected in hierarchy: {entities:?}")]
    CycleDetected { entities: Vec<Entity> },

    /// Parent entity is dead
    #[error("Invalid parent {parent} for child {child}")]
    InvalidParent { child: Entity, parent: Entity },

    #[error("Entity {entity} not found")]
    EntityNotFound { entity: Entity },
}

// ============================================================================
// Read-only queries
// ============================================================================

/// Parent of an entity, if any
pub fn parent_of(world: &World, entity: Entity) -> Option<Entity> {
    world.get::<Parent>(entity).map(|p| p.entity)
}

/// Direct children of an entity, in link order
pub fn children_of(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<Children>(entity)
        .map(|c| c.as_slice().to_vec())
        .unwrap_or_default()
}

/// Whether `ancestor` appears anywhere in `entity`'s parent chain
pub fn is_ancestor(world: &World, entity: Entity, ancestor: Entity) -> bool {
    let mut current = entity;
    for _ in 0..MAX_DEPTH {
        match parent_of(world, current) {
            Some(parent) if parent == ancestor => return true,
            Some(parent) => current = parent,
            None => return false,
        }
    }
    false
}

/// All descendants, depth-first, parents before their children
pub fn descendants(world: &World, entity: Entity) -> Vec<Entity> {
    let mut out = Vec::new();
    let mut stack: Vec<Entity> = children_of(world, entity).into_iter().rev().collect();
    while let Some(next) = stack.pop() {
        if out.contains(&next) {
            continue;
        }
        out.push(next);
        stack.extend(children_of(world, next).into_iter().rev());
    }
    out
}

/// Live entities without a parent, in index order
pub fn roots(world: &World) -> Vec<Entity> {
    world
        .entities()
        .filter(|&e| !world.has::<Parent>(e))
        .collect()
}
