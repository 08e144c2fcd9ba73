//! Prefab instantiation and clipboard copy/paste
//!
//! Both are documents loaded with [`IdentityMode::Regenerate`], so any number
//! of instances can live in one world without guid collisions.

use std::collections::HashSet;

use loam_core::{Guid, Vec2};
use loam_ecs::{hierarchy, Entity, Position, World};

use crate::codec::{EntityGraphCodec, IdentityMode, LoadedGraph};
use crate::document::SceneDocument;

/// Name given to documents produced by [`copy_entities`]
pub const CLIPBOARD_NAME: &str = "Clipboard";

/// Instantiate a prefab document.
///
/// Every root of the new instance is reset to default core transform values;
/// `position`, when given, then moves the roots. Rotation and scale written in
/// the document for a root are not applied. Children keep their document
/// values.
pub fn instantiate_prefab(
    codec: &EntityGraphCodec<'_>,
    world: &mut World,
    prefab: &SceneDocument,
    position: Option<Vec2>,
) -> LoadedGraph {
    let graph = codec.deserialize(world, prefab, IdentityMode::Regenerate);

    for root in graph.roots(world) {
        for descriptor in codec.registry().iter().filter(|d| d.is_core_transform()) {
            let reset = descriptor
                .create_default()
                .and_then(|value| descriptor.set(world, root, value));
            if let Err(e) = reset {
                log::warn!("Could not reset '{}' on prefab root {}: {}", descriptor.name(), root, e);
            }
        }
        if let Some(position) = position {
            if let Some(slot) = world.get_mut::<Position>(root) {
                *slot = Position::from(position);
            }
        }
    }

    log::debug!(
        "Instantiated prefab '{}' with {} entities",
        prefab.name,
        graph.entities.len()
    );
    graph
}

/// Copy the selection and all its descendants into a clipboard document.
///
/// Parents come before their children. Selected entities whose ancestor is
/// also selected are reached through that ancestor. Links to parents outside
/// the copy are dropped, so pasted roots stay roots.
pub fn copy_entities(codec: &EntityGraphCodec<'_>, world: &World, selection: &[Entity]) -> SceneDocument {
    let selected: HashSet<Entity> = selection.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for &entity in selection {
        if !world.is_alive(entity) || has_selected_ancestor(world, entity, &selected) {
            continue;
        }
        let subtree = std::iter::once(entity).chain(hierarchy::descendants(world, entity));
        for member in subtree {
            if seen.insert(member) {
                ordered.push(member);
            }
        }
    }

    let mut document = codec.serialize(world, &ordered, CLIPBOARD_NAME);
    let copied: HashSet<Guid> = document.entities.iter().map(|r| r.guid.clone()).collect();
    for record in &mut document.entities {
        if record.parent_guid.as_ref().is_some_and(|p| !copied.contains(p)) {
            record.parent_guid = None;
        }
    }
    document
}

/// Paste a clipboard document as new entities
pub fn paste_entities(codec: &EntityGraphCodec<'_>, world: &mut World, clipboard: &SceneDocument) -> LoadedGraph {
    codec.deserialize(world, clipboard, IdentityMode::Regenerate)
}

fn has_selected_ancestor(world: &World, entity: Entity, selected: &HashSet<Entity>) -> bool {
    selected
        .iter()
        .any(|&other| other != entity && hierarchy::is_ancestor(world, entity, other))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EntityRecord;
    use loam_ecs::{EntityGuid, HierarchyCommands, Rotation, Scale};
    use loam_reflect::{register_builtin_components, ComponentTypeRegistry};
    use serde_json::json;

    fn registry() -> ComponentTypeRegistry {
        let mut registry = ComponentTypeRegistry::new();
        register_builtin_components(&mut registry);
        registry
    }

    fn turret() -> SceneDocument {
        let mut doc = SceneDocument::new("Turret");
        doc.entities.push(
            EntityRecord::new(Guid::from("base"), "Base")
                .with_component("Position", json!({ "x": 50.0, "y": 50.0 }))
                .with_component("Scale", json!({ "x": 3.0, "y": 3.0 })),
        );
        doc.entities.push(
            EntityRecord::new(Guid::from("barrel"), "Barrel")
                .with_parent(Guid::from("base"))
                .with_component("Position", json!({ "x": 0.0, "y": 2.0 }))
                .with_component("Rotation", json!({ "radians": 0.5 })),
        );
        doc
    }

    #[test]
    fn test_roots_reset_and_moved() {
        let registry = registry();
        let codec = EntityGraphCodec::new(&registry);
        let mut world = World::new();

        let graph = instantiate_prefab(&codec, &mut world, &turret(), Some(Vec2::new(7.0, -1.0)));

        let base = graph.entity(&Guid::from("base")).unwrap();
        let barrel = graph.entity(&Guid::from("barrel")).unwrap();
        assert_eq!(world.get::<Position>(base), Some(&Position::new(7.0, -1.0)));
        assert_eq!(world.get::<Scale>(base), Some(&Scale::ONE));
        assert_eq!(world.get::<Position>(barrel), Some(&Position::new(0.0, 2.0)));
        assert_eq!(world.get::<Rotation>(barrel), Some(&Rotation::new(0.5)));
        assert_eq!(hierarchy::parent_of(&world, barrel), Some(base));
    }

    #[test]
    fn test_instances_get_distinct_guids() {
        let registry = registry();
        let codec = EntityGraphCodec::new(&registry);
        let mut world = World::new();

        let first = instantiate_prefab(&codec, &mut world, &turret(), None);
        let second = instantiate_prefab(&codec, &mut world, &turret(), None);

        let guids: HashSet<Guid> = first
            .entities
            .iter()
            .chain(&second.entities)
            .map(|&e| world.get::<EntityGuid>(e).unwrap().guid().clone())
            .collect();
        assert_eq!(guids.len(), 4);
        assert!(!guids.contains(&Guid::from("base")));
    }

    #[test]
    fn test_copy_paste_subtree() {
        let registry = registry();
        let codec = EntityGraphCodec::new(&registry);
        let mut world = World::new();
        let outside = world.spawn();
        let root = world.spawn();
        let child = world.spawn();
        {
            let mut commands = HierarchyCommands::new(&mut world);
            commands.set_parent(root, outside).unwrap();
            commands.set_parent(child, root).unwrap();
        }
        world.insert(child, Position::new(4.0, 4.0)).unwrap();

        let clipboard = copy_entities(&codec, &world, &[child, root]);
        assert_eq!(clipboard.name, CLIPBOARD_NAME);
        assert_eq!(clipboard.entities.len(), 2);
        assert_eq!(clipboard.entities[0].parent_guid, None);
        assert_eq!(
            clipboard.entities[1].parent_guid.as_ref(),
            Some(&clipboard.entities[0].guid)
        );

        let pasted = paste_entities(&codec, &mut world, &clipboard);
        let again = paste_entities(&codec, &mut world, &clipboard);
        assert!(pasted.issues.is_empty());
        assert_eq!(pasted.roots(&world).len(), 1);
        assert_eq!(world.entity_count(), 3 + 4);
        assert_ne!(
            world.get::<EntityGuid>(pasted.entities[0]),
            world.get::<EntityGuid>(again.entities[0])
        );
        assert_eq!(world.get::<Position>(pasted.entities[1]), Some(&Position::new(4.0, 4.0)));
    }
}
