//! World - container for entities and their components
//!
//! Components live in one column per [`ComponentType`]. Statically typed
//! access (`insert`, `get`, ...) and keyed access (`insert_keyed`, ...) read
//! the same columns, so a value written through one path is visible through
//! the other.

use std::collections::{BTreeSet, HashMap};

use crate::component::{downcast_boxed, BoxedComponent, Component, ComponentType, ComponentValue};
use crate::entity::{Entity, EntityAllocator};
use crate::error::{Result, WorldError};

/// Storage for one component type
#[derive(Default)]
struct Column {
    values: HashMap<Entity, BoxedComponent>,
}

/// The ECS world
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    /// Live entities, ordered by index
    alive: BTreeSet<Entity>,
    columns: HashMap<ComponentType, Column>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    pub fn spawn(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.alive.insert(entity);
        log::trace!("spawned {}", entity);
        entity
    }

    /// Despawn an entity and drop all of its components.
    ///
    /// Hierarchy links pointing at the entity are left alone; use
    /// [`HierarchyCommands::despawn_recursive`](crate::HierarchyCommands::despawn_recursive)
    /// to keep the hierarchy consistent.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.allocator.deallocate(entity) {
            return false;
        }
        self.alive.remove(&entity);
        for column in self.columns.values_mut() {
            column.values.remove(&entity);
        }
        log::trace!("despawned {}", entity);
        true
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    #[inline]
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Live entities in index order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().copied()
    }

    /// Despawn everything
    pub fn clear(&mut self) {
        let all: Vec<Entity> = self.alive.iter().copied().collect();
        for entity in all {
            self.despawn(entity);
        }
        self.columns.clear();
    }

    // ------------------------------------------------------------------
    // Typed access
    // ------------------------------------------------------------------

    /// Insert or replace a component, returning the previous value
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>> {
        let previous = self.insert_keyed(entity, ComponentType::of::<T>(), Box::new(value))?;
        Ok(previous.and_then(|old| downcast_boxed::<T>(old).ok()))
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.get_keyed(entity, ComponentType::of::<T>())?
            .downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.get_keyed_mut(entity, ComponentType::of::<T>())?
            .downcast_mut::<T>()
    }

    #[inline]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_keyed(entity, ComponentType::of::<T>())
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.remove_keyed(entity, ComponentType::of::<T>())
            .and_then(|old| downcast_boxed::<T>(old).ok())
    }

    // ------------------------------------------------------------------
    // Keyed access
    // ------------------------------------------------------------------

    /// Insert or replace a type-erased component.
    ///
    /// For native keys the value must be of the keyed Rust type. Dynamic keys
    /// are not checked here; the descriptor that owns the key is responsible
    /// for handing in its own value type.
    pub fn insert_keyed(
        &mut self,
        entity: Entity,
        key: ComponentType,
        value: BoxedComponent,
    ) -> Result<Option<BoxedComponent>> {
        if !self.is_alive(entity) {
            return Err(WorldError::EntityNotFound(entity));
        }
        if let ComponentType::Native(type_id) = key {
            if value.as_any().type_id() != type_id {
                return Err(WorldError::TypeMismatch {
                    expected: key,
                    actual: value.value_type_name(),
                });
            }
        }
        Ok(self
            .columns
            .entry(key)
            .or_default()
            .values
            .insert(entity, value))
    }

    pub fn get_keyed(
        &self,
        entity: Entity,
        key: ComponentType,
    ) -> Option<&(dyn ComponentValue + 'static)> {
        self.columns
            .get(&key)?
            .values
            .get(&entity)
            .map(|value| &**value)
    }

    pub fn get_keyed_mut(
        &mut self,
        entity: Entity,
        key: ComponentType,
    ) -> Option<&mut (dyn ComponentValue + 'static)> {
        self.columns
            .get_mut(&key)?
            .values
            .get_mut(&entity)
            .map(|value| &mut **value)
    }

    pub fn has_keyed(&self, entity: Entity, key: ComponentType) -> bool {
        self.columns
            .get(&key)
            .is_some_and(|column| column.values.contains_key(&entity))
    }

    pub fn remove_keyed(&mut self, entity: Entity, key: ComponentType) -> Option<BoxedComponent> {
        self.columns.get_mut(&key)?.values.remove(&entity)
    }

    /// Number of entities carrying a component type
    pub fn component_count(&self, key: ComponentType) -> usize {
        self.columns.get(&key).map_or(0, |column| column.values.len())
    }

    /// Drop every value of a component type, e.g. after its plugin unloaded.
    /// Returns how many values were dropped.
    pub fn drop_component_type(&mut self, key: ComponentType) -> usize {
        let dropped = self
            .columns
            .remove(&key)
            .map_or(0, |column| column.values.len());
        if dropped > 0 {
            log::debug!("dropped {} values of {}", dropped, key);
        }
        dropped
    }
}
