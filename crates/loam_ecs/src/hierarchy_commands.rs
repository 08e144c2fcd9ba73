//! Hierarchy Commands API
//!
//! Validated edits to the parent/child relation. Every operation keeps
//! [`Parent`] and [`Children`] consistent and rejects cycles.
//!
//! ```ignore
//! let mut commands = HierarchyCommands::new(&mut world);
//! commands.set_parent(child, parent)?;
//! commands.remove_parent(child);
//! commands.despawn_recursive(root);
//! ```

use crate::entity::Entity;
use crate::hierarchy::{self, Children, HierarchyError, Parent};
use crate::world::World;

/// Commands for manipulating the entity hierarchy
pub struct HierarchyCommands<'w> {
    world: &'w mut World,
}

impl<'w> HierarchyCommands<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }

    /// Make `parent` the parent of `child`.
    ///
    /// Detaches `child` from any previous parent first.
    ///
    /// # Errors
    ///
    /// - either entity is dead
    /// - `child == parent`, or `child` is already an ancestor of `parent`
    pub fn set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), HierarchyError> {
        if !self.world.is_alive(child) {
            return Err(HierarchyError::EntityNotFound { entity: child });
        }
        if !self.world.is_alive(parent) {
            return Err(HierarchyError::InvalidParent { child, parent });
        }
        if child == parent || hierarchy::is_ancestor(self.world, parent, child) {
            return Err(HierarchyError::CycleDetected {
                entities: vec![child, parent],
            });
        }

        if let Some(old) = hierarchy::parent_of(self.world, child) {
            if old == parent {
                return Ok(());
            }
            if let Some(children) = self.world.get_mut::<Children>(old) {
                children.remove(child);
            }
        }

        // both entities were checked alive above
        let _ = self.world.insert(child, Parent::new(parent));
        match self.world.get_mut::<Children>(parent) {
            Some(children) => children.push(child),
            None => {
                let mut children = Children::new();
                children.push(child);
                let _ = self.world.insert(parent, children);
            }
        }
        Ok(())
    }

    /// Detach an entity from its parent, making it a root
    pub fn remove_parent(&mut self, entity: Entity) {
        if let Some(parent) = self.world.remove::<Parent>(entity) {
            if let Some(children) = self.world.get_mut::<Children>(parent.entity) {
                children.remove(entity);
            }
        }
    }

    /// Despawn an entity and all of its descendants.
    ///
    /// Returns the number of entities despawned.
    pub fn despawn_recursive(&mut self, entity: Entity) -> usize {
        if !self.world.is_alive(entity) {
            return 0;
        }

        self.remove_parent(entity);
        let mut doomed = hierarchy::descendants(self.world, entity);
        doomed.reverse();
        doomed.push(entity);

        doomed
            .into_iter()
            .filter(|&e| self.world.despawn(e))
            .count()
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        hierarchy::parent_of(self.world, entity)
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        hierarchy::children_of(self.world, entity)
    }

    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        hierarchy::descendants(self.world, entity)
    }

    pub fn roots(&self) -> Vec<Entity> {
        hierarchy::roots(self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(n: usize) -> (World, Vec<Entity>) {
        let mut world = World::new();
        let entities = (0..n).map(|_| world.spawn()).collect();
        (world, entities)
    }

    #[test]
    fn test_set_parent_links_both_sides() {
        let (mut world, e) = world_with(2);
        HierarchyCommands::new(&mut world).set_parent(e[1], e[0]).unwrap();

        assert_eq!(world.get::<Parent>(e[1]), Some(&Parent::new(e[0])));
        assert!(world.get::<Children>(e[0]).unwrap().contains(e[1]));
    }

    #[test]
    fn test_reparent_moves_child() {
        let (mut world, e) = world_with(3);
        let mut commands = HierarchyCommands::new(&mut world);
        commands.set_parent(e[2], e[0]).unwrap();
        commands.set_parent(e[2], e[1]).unwrap();

        assert!(commands.children(e[0]).is_empty());
        assert_eq!(commands.children(e[1]), vec![e[2]]);
        assert_eq!(commands.parent(e[2]), Some(e[1]));
    }

    #[test]
    fn test_cycles_rejected() {
        let (mut world, e) = world_with(3);
        let mut commands = HierarchyCommands::new(&mut world);
        commands.set_parent(e[1], e[0]).unwrap();
        commands.set_parent(e[2], e[1]).unwrap();

        assert!(matches!(
            commands.set_parent(e[0], e[2]),
            Err(HierarchyError::CycleDetected { .. })
        ));
        assert!(matches!(
            commands.set_parent(e[0], e[0]),
            Err(HierarchyError::CycleDetected { .. })
        ));
        assert_eq!(commands.parent(e[0]), None);
    }

    #[test]
    fn test_dead_parent_rejected() {
        let (mut world, e) = world_with(2);
        world.despawn(e[0]);
        let err = HierarchyCommands::new(&mut world)
            .set_parent(e[1], e[0])
            .unwrap_err();
        assert_eq!(err, HierarchyError::InvalidParent { child: e[1], parent: e[0] });
    }

    #[test]
    fn test_despawn_recursive() {
        let (mut world, e) = world_with(4);
        let mut commands = HierarchyCommands::new(&mut world);
        commands.set_parent(e[1], e[0]).unwrap();
        commands.set_parent(e[2], e[1]).unwrap();
        commands.set_parent(e[0], e[3]).unwrap();

        assert_eq!(commands.descendants(e[0]), vec![e[1], e[2]]);
        assert_eq!(commands.despawn_recursive(e[0]), 3);
        assert!(commands.children(e[3]).is_empty());
        assert_eq!(commands.roots(), vec![e[3]]);
        assert_eq!(world.entity_count(), 1);
    }
}
