//! Entity-graph codec
//!
//! Turns a set of entities into a [`SceneDocument`] and back, going through
//! the component-type registry for every component value. Loading never stops
//! at a bad component or record; what was skipped is reported as
//! [`LoadIssue`]s.
//!
//! Loading runs in two passes. The first creates every entity and its
//! components and maps document guids to entities; the second links parents.
//! Records may therefore appear in any order.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use loam_core::Guid;
use loam_ecs::hierarchy;
use loam_ecs::{Entity, EntityGuid, EntityName, HierarchyCommands, World};
use loam_reflect::ComponentTypeRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{EntityRecord, SceneDocument};
use crate::issue::LoadIssue;

/// Which guid a loaded entity carries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// The document's own guid (scene load)
    #[default]
    Preserve,
    /// A newly minted guid (prefab instantiation, paste)
    Regenerate,
}

impl fmt::Display for IdentityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityMode::Preserve => f.write_str("preserve"),
            IdentityMode::Regenerate => f.write_str("regenerate"),
        }
    }
}

impl FromStr for IdentityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" | "keep" => Ok(IdentityMode::Preserve),
            "regenerate" | "new" | "fresh" => Ok(IdentityMode::Regenerate),
            _ => Err(format!("Unknown identity mode: {}", s)),
        }
    }
}

/// Result of loading a document into a world
#[derive(Debug, Default)]
pub struct LoadedGraph {
    /// Created entities in document order
    pub entities: Vec<Entity>,
    /// Document guid to created entity
    pub by_guid: HashMap<Guid, Entity>,
    pub issues: Vec<LoadIssue>,
}

impl LoadedGraph {
    /// Created entities that ended up without a parent
    pub fn roots(&self, world: &World) -> Vec<Entity> {
        self.entities
            .iter()
            .copied()
            .filter(|&e| hierarchy::parent_of(world, e).is_none())
            .collect()
    }

    pub fn entity(&self, document_guid: &Guid) -> Option<Entity> {
        self.by_guid.get(document_guid).copied()
    }
}

/// Serializes and deserializes entities through a registry
pub struct EntityGraphCodec<'r> {
    registry: &'r ComponentTypeRegistry,
}

impl<'r> EntityGraphCodec<'r> {
    pub fn new(registry: &'r ComponentTypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r ComponentTypeRegistry {
        self.registry
    }

    /// Write `entities` into a new document named `scene_name`.
    ///
    /// Entities without a guid get a fresh one in the document, and parents
    /// inside the set are linked through it. A parent outside the set is only
    /// referenced if it carries a guid of its own.
    pub fn serialize(&self, world: &World, entities: &[Entity], scene_name: &str) -> SceneDocument {
        let mut document = SceneDocument::new(scene_name);
        let live: Vec<Entity> = entities
            .iter()
            .copied()
            .filter(|&e| {
                let alive = world.is_alive(e);
                if !alive {
                    log::debug!("not serializing dead entity {}", e);
                }
                alive
            })
            .collect();

        let guids: HashMap<Entity, Guid> = live
            .iter()
            .map(|&e| {
                let guid = world
                    .get::<EntityGuid>(e)
                    .map(|g| g.0.clone())
                    .filter(|g| !g.is_empty())
                    .unwrap_or_else(Guid::new);
                (e, guid)
            })
            .collect();

        for &entity in &live {
            let mut record = EntityRecord::new(
                guids[&entity].clone(),
                world
                    .get::<EntityName>(entity)
                    .map(|n| n.0.clone())
                    .unwrap_or_default(),
            );

            record.parent_guid = hierarchy::parent_of(world, entity).and_then(|parent| {
                guids.get(&parent).cloned().or_else(|| {
                    world
                        .get::<EntityGuid>(parent)
                        .map(|g| g.0.clone())
                        .filter(|g| !g.is_empty())
                })
            });

            for descriptor in self.registry.enumerate_serializable() {
                if !descriptor.has(world, entity) {
                    continue;
                }
                match descriptor.serialize_to_json(world, entity) {
                    Ok(value) => {
                        if has_null(&value) {
                            log::warn!(
                                "'{}' on {} holds a non-finite number, written as null; it will not load back",
                                descriptor.name(),
                                record.guid
                            );
                        }
                        record.components.insert(descriptor.name().to_string(), value);
                    }
                    Err(e) => log::warn!(
                        "Skipping component '{}' on {}: {}",
                        descriptor.name(),
                        record.guid,
                        e
                    ),
                }
            }

            document.entities.push(record);
        }

        log::debug!(
            "Serialized {} entities into '{}'",
            document.entities.len(),
            scene_name
        );
        document
    }

    /// Write every live entity of the world
    pub fn serialize_world(&self, world: &World, scene_name: &str) -> SceneDocument {
        let entities: Vec<Entity> = world.entities().collect();
        self.serialize(world, &entities, scene_name)
    }

    /// Create the document's entities in `world`
    pub fn deserialize(&self, world: &mut World, document: &SceneDocument, mode: IdentityMode) -> LoadedGraph {
        let mut graph = LoadedGraph::default();
        let mut created: Vec<(Entity, &EntityRecord)> = Vec::with_capacity(document.entities.len());
        let mut seen: HashSet<&Guid> = HashSet::new();

        // Pass 1: entities and components
        for (index, record) in document.entities.iter().enumerate() {
            let duplicate = !seen.insert(&record.guid);
            let refusal = if record.guid.is_empty() {
                Some("empty guid")
            } else if duplicate && mode == IdentityMode::Preserve {
                Some("guid already used in this document")
            } else {
                None
            };
            if let Some(reason) = refusal {
                log::warn!("Entity record #{} ({}) not created: {}", index, record.guid, reason);
                graph.issues.push(LoadIssue::CreationFailed {
                    index,
                    guid: record.guid.clone(),
                    reason: reason.to_string(),
                });
                continue;
            }

            let guid = match mode {
                IdentityMode::Preserve => record.guid.clone(),
                IdentityMode::Regenerate => Guid::new(),
            };
            let entity = match self.create_entity(world, record, guid) {
                Ok(entity) => entity,
                Err(reason) => {
                    log::warn!("Entity record #{} ({}) not created: {}", index, record.guid, reason);
                    graph.issues.push(LoadIssue::CreationFailed {
                        index,
                        guid: record.guid.clone(),
                        reason,
                    });
                    continue;
                }
            };

            self.apply_components(world, entity, record, &mut graph.issues);

            if duplicate {
                log::debug!("Duplicate guid {} in document, keeping first mapping", record.guid);
            } else {
                graph.by_guid.insert(record.guid.clone(), entity);
            }
            graph.entities.push(entity);
            created.push((entity, record));
        }

        // Pass 2: parent links
        for (entity, record) in created {
            let Some(parent_guid) = record.parent_guid.as_ref().filter(|g| !g.is_empty()) else {
                continue;
            };
            let Some(&parent) = graph.by_guid.get(parent_guid) else {
                log::warn!("Entity {} has unknown parent {}, leaving it at the root", record.guid, parent_guid);
                graph.issues.push(LoadIssue::DanglingParent {
                    entity: record.guid.clone(),
                    parent: parent_guid.clone(),
                });
                continue;
            };
            if let Err(e) = HierarchyCommands::new(world).set_parent(entity, parent) {
                log::warn!("Entity {} cannot be parented to {}: {}", record.guid, parent_guid, e);
                graph.issues.push(LoadIssue::RejectedParent {
                    entity: record.guid.clone(),
                    parent: parent_guid.clone(),
                    reason: e.to_string(),
                });
            }
        }

        log::debug!(
            "Loaded {} of {} entities from '{}' with {} issues",
            graph.entities.len(),
            document.entities.len(),
            document.name,
            graph.issues.len()
        );
        graph
    }

    /// Spawn an entity with default core transforms, its name and its guid
    fn create_entity(&self, world: &mut World, record: &EntityRecord, guid: Guid) -> Result<Entity, String> {
        let entity = world.spawn();
        if let Err(reason) = self.init_entity(world, entity, record, guid) {
            world.despawn(entity);
            return Err(reason);
        }
        Ok(entity)
    }

    fn init_entity(&self, world: &mut World, entity: Entity, record: &EntityRecord, guid: Guid) -> Result<(), String> {
        for descriptor in self.registry.iter().filter(|d| d.is_core_transform()) {
            descriptor
                .add(world, entity, None)
                .map_err(|e| e.to_string())?;
        }
        world
            .insert(entity, EntityName::new(record.name.clone()))
            .map_err(|e| e.to_string())?;
        world
            .insert(entity, EntityGuid::new(guid))
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn apply_components(
        &self,
        world: &mut World,
        entity: Entity,
        record: &EntityRecord,
        issues: &mut Vec<LoadIssue>,
    ) {
        for (name, raw) in &record.components {
            let Some(descriptor) = self.registry.get_by_name(name) else {
                log::warn!("Entity {}: unknown component '{}', skipping", record.guid, name);
                issues.push(LoadIssue::UnknownComponent {
                    entity: record.guid.clone(),
                    component: name.clone(),
                });
                continue;
            };
            if descriptor.is_internal() {
                log::debug!("Entity {}: ignoring internal component '{}'", record.guid, name);
                continue;
            }

            let applied = descriptor.deserialize_from_json(raw).and_then(|value| {
                if descriptor.is_core_transform() {
                    descriptor.set(world, entity, value)
                } else {
                    descriptor.add(world, entity, Some(value)).map(|_| ())
                }
            });
            if let Err(e) = applied {
                log::warn!("Entity {}: dropping component '{}': {}", record.guid, name, e);
                issues.push(LoadIssue::MalformedComponent {
                    entity: record.guid.clone(),
                    component: name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
}

/// JSON has no NaN or infinity; serde_json writes them as null
fn has_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(has_null),
        Value::Object(fields) => fields.values().any(has_null),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::Vec2;
    use loam_ecs::{Position, Rotation, Scale, Velocity};
    use loam_reflect::register_builtin_components;
    use serde_json::json;

    fn registry() -> ComponentTypeRegistry {
        let mut registry = ComponentTypeRegistry::new();
        register_builtin_components(&mut registry);
        registry
    }

    #[test]
    fn test_empty_document() {
        let registry = registry();
        let mut world = World::new();
        let graph = EntityGraphCodec::new(&registry).deserialize(
            &mut world,
            &SceneDocument::new("Empty"),
            IdentityMode::Preserve,
        );
        assert!(graph.entities.is_empty());
        assert!(graph.issues.is_empty());
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_core_transform_defaults() {
        let registry = registry();
        let mut world = World::new();
        let mut doc = SceneDocument::new("Bare");
        doc.entities.push(EntityRecord::new(Guid::from("bare"), "Bare"));

        let graph = EntityGraphCodec::new(&registry).deserialize(&mut world, &doc, IdentityMode::Preserve);
        let e = graph.entities[0];
        assert_eq!(world.get::<Position>(e), Some(&Position::default()));
        assert_eq!(world.get::<Rotation>(e), Some(&Rotation::default()));
        assert_eq!(world.get::<Scale>(e), Some(&Scale::ONE));
        assert_eq!(world.get::<EntityName>(e).unwrap().as_str(), "Bare");
    }

    #[test]
    fn test_creation_failures() {
        let registry = registry();
        let mut world = World::new();
        let mut doc = SceneDocument::new("Bad");
        doc.entities.push(EntityRecord::new(Guid::empty(), "NoGuid"));
        doc.entities.push(EntityRecord::new(Guid::from("dup"), "First"));
        doc.entities.push(EntityRecord::new(Guid::from("dup"), "Second"));

        let graph = EntityGraphCodec::new(&registry).deserialize(&mut world, &doc, IdentityMode::Preserve);
        assert_eq!(graph.entities.len(), 1);
        assert_eq!(graph.issues.len(), 2);
        assert!(graph
            .issues
            .iter()
            .all(|i| matches!(i, LoadIssue::CreationFailed { .. })));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_internal_entries_ignored() {
        let registry = registry();
        let mut world = World::new();
        let mut doc = SceneDocument::new("Sneaky");
        doc.entities.push(
            EntityRecord::new(Guid::from("real"), "E")
                .with_component("Guid", json!("forged"))
                .with_component("Velocity", json!({ "linear": [1.0, 2.0] })),
        );

        let graph = EntityGraphCodec::new(&registry).deserialize(&mut world, &doc, IdentityMode::Preserve);
        let e = graph.entities[0];
        assert_eq!(world.get::<EntityGuid>(e).unwrap().guid(), &Guid::from("real"));
        assert_eq!(world.get::<Velocity>(e).unwrap().linear.x, 1.0);
        assert!(graph.issues.is_empty());
    }

    #[test]
    fn test_serialize_skips_internal_and_links_parents() {
        let registry = registry();
        let mut world = World::new();
        let parent = world.spawn();
        let child = world.spawn();
        world.insert(parent, Position::new(1.0, 1.0)).unwrap();
        world.insert(child, EntityGuid::new(Guid::from("kid"))).unwrap();
        HierarchyCommands::new(&mut world).set_parent(child, parent).unwrap();

        let doc = EntityGraphCodec::new(&registry).serialize(&world, &[parent, child], "S");
        assert_eq!(doc.entities.len(), 2);
        let parent_guid = doc.entities[0].guid.clone();
        assert!(!parent_guid.is_empty());
        assert_eq!(doc.entities[1].guid, Guid::from("kid"));
        assert_eq!(doc.entities[1].parent_guid, Some(parent_guid));
        assert!(doc.entities[0].components.contains_key("Position"));
        assert!(!doc.entities[1].components.contains_key("Parent"));
        assert!(!doc.entities[1].components.contains_key("Guid"));
    }

    #[test]
    fn test_parent_outside_the_set() {
        let registry = registry();
        let codec = EntityGraphCodec::new(&registry);
        let mut world = World::new();
        let named = world.spawn();
        let anonymous = world.spawn();
        let first = world.spawn();
        let second = world.spawn();
        world.insert(named, EntityGuid::new(Guid::from("mom"))).unwrap();
        world.insert(anonymous, EntityGuid::new(Guid::empty())).unwrap();
        let mut commands = HierarchyCommands::new(&mut world);
        commands.set_parent(first, named).unwrap();
        commands.set_parent(second, anonymous).unwrap();

        let doc = codec.serialize(&world, &[first], "Part");
        assert_eq!(doc.entities.len(), 1);
        assert_eq!(doc.entities[0].parent_guid, Some(Guid::from("mom")));

        let doc = codec.serialize(&world, &[second], "Part");
        assert_eq!(doc.entities.len(), 1);
        assert_eq!(doc.entities[0].parent_guid, None);
        assert!(!doc.to_json_string().unwrap().contains("parentGuid"));

        // A parent with no guid component at all is not referenced either
        let bare = world.spawn();
        HierarchyCommands::new(&mut world).set_parent(second, bare).unwrap();
        let doc = codec.serialize(&world, &[second], "Part");
        assert_eq!(doc.entities[0].parent_guid, None);
    }

    #[test]
    fn test_non_finite_position_reloads_as_default() {
        let registry = registry();
        let codec = EntityGraphCodec::new(&registry);
        let mut world = World::new();
        let e = world.spawn();
        world.insert(e, EntityGuid::new(Guid::from("lost"))).unwrap();
        world.insert(e, Position::new(f32::NAN, 3.0)).unwrap();
        world.insert(e, Velocity { linear: Vec2::new(1.0, 0.0) }).unwrap();

        let doc = codec.serialize(&world, &[e], "Nan");
        assert_eq!(doc.entities[0].components["Position"], json!({ "x": null, "y": 3.0 }));

        let text = doc.to_json_string().unwrap();
        let parsed = SceneDocument::parse(&text).unwrap().document;
        let mut loaded = World::new();
        let graph = codec.deserialize(&mut loaded, &parsed, IdentityMode::Preserve);

        let copy = graph.entity(&Guid::from("lost")).unwrap();
        assert_eq!(loaded.get::<Position>(copy), Some(&Position::default()));
        assert_eq!(loaded.get::<Velocity>(copy).unwrap().linear.x, 1.0);
        assert!(matches!(
            graph.issues.as_slice(),
            [LoadIssue::MalformedComponent { component, .. }] if component == "Position"
        ));
    }

    #[test]
    fn test_cycle_in_document_rejected() {
        let registry = registry();
        let mut world = World::new();
        let mut doc = SceneDocument::new("Loop");
        doc.entities.push(EntityRecord::new(Guid::from("a"), "A").with_parent(Guid::from("b")));
        doc.entities.push(EntityRecord::new(Guid::from("b"), "B").with_parent(Guid::from("a")));

        let graph = EntityGraphCodec::new(&registry).deserialize(&mut world, &doc, IdentityMode::Preserve);
        assert_eq!(graph.entities.len(), 2);
        assert_eq!(
            graph
                .issues
                .iter()
                .filter(|i| matches!(i, LoadIssue::RejectedParent { .. }))
                .count(),
            1
        );
        let a = graph.entity(&Guid::from("a")).unwrap();
        assert_eq!(hierarchy::parent_of(&world, a), graph.entity(&Guid::from("b")));
    }
}
