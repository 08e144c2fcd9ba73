//! End-to-end scene tests: text in, world, text out

use loam_core::{Color, Guid};
use loam_ecs::hierarchy;
use loam_ecs::{BlendMode, EntityGuid, EntityName, Position, Rotation, Scale, SpriteRenderer, World};
use loam_plugin::{AssemblyHost, StaticModule};
use loam_reflect::{register_builtin_components, ComponentTypeRegistry, FieldValue};
use loam_scene::{
    load_scene, save_scene, EntityGraphCodec, IdentityMode, LoadIssue, SceneDocument,
};

fn registry() -> ComponentTypeRegistry {
    let mut registry = ComponentTypeRegistry::new();
    register_builtin_components(&mut registry);
    registry
}

fn load(registry: &ComponentTypeRegistry, world: &mut World, text: &str) -> loam_scene::LoadedGraph {
    let parsed = SceneDocument::parse(text).unwrap();
    let mut graph = EntityGraphCodec::new(registry).deserialize(world, &parsed.document, IdentityMode::Preserve);
    graph.issues.extend(parsed.issues);
    graph
}

#[test]
fn test_child_listed_before_parent() {
    let text = r#"{
        "version": 1,
        "name": "Order",
        "entities": [
            { "guid": "22", "name": "Child", "parentGuid": "11",
              "components": { "Position": { "x": 10.0, "y": 5.0 } } },
            { "guid": "11", "name": "Root",
              "components": { "Position": { "x": 0.0, "y": 0.0 } } }
        ]
    }"#;
    let registry = registry();
    let mut world = World::new();

    let graph = load(&registry, &mut world, text);

    assert!(graph.issues.is_empty(), "{:?}", graph.issues);
    let a = graph.entity(&Guid::from("11")).unwrap();
    let b = graph.entity(&Guid::from("22")).unwrap();
    assert_eq!(hierarchy::parent_of(&world, b), Some(a));
    assert_eq!(world.get::<Position>(b).unwrap().x, 10.0);
    assert_eq!(world.get::<EntityName>(a).unwrap().as_str(), "Root");
}

#[test]
fn test_scene_roundtrip_preserves_identity_and_values() {
    let registry = registry();
    let codec = EntityGraphCodec::new(&registry);
    let mut world = World::new();

    let player = world.spawn();
    world.insert(player, EntityGuid::new(Guid::from("player"))).unwrap();
    world.insert(player, EntityName::new("Player")).unwrap();
    world.insert(player, Position::new(3.0, -2.0)).unwrap();
    world.insert(player, Rotation::new(0.25)).unwrap();
    world.insert(player, Scale::new(2.0, 2.0)).unwrap();
    world
        .insert(
            player,
            SpriteRenderer {
                texture: "hero.png".into(),
                tint: Color::rgb(1.0, 0.5, 0.0),
                layer: 2,
                blend: BlendMode::Multiply,
                ..Default::default()
            },
        )
        .unwrap();

    let text = codec.serialize_world(&world, "Level").to_json_pretty().unwrap();

    let mut loaded = World::new();
    let graph = load(&registry, &mut loaded, &text);
    assert!(graph.issues.is_empty());

    let copy = graph.entity(&Guid::from("player")).unwrap();
    assert_eq!(loaded.get::<EntityGuid>(copy), world.get::<EntityGuid>(player));
    assert_eq!(loaded.get::<Position>(copy), world.get::<Position>(player));
    assert_eq!(loaded.get::<SpriteRenderer>(copy), world.get::<SpriteRenderer>(player));

    // Writing the loaded world again gives the same document
    let again = codec.serialize_world(&loaded, "Level").to_json_pretty().unwrap();
    assert_eq!(again, text);
}

#[test]
fn test_unknown_and_malformed_components_are_skipped() {
    let text = r#"{
        "version": 1,
        "name": "Messy",
        "entities": [
            { "guid": "e1", "name": "One", "components": {
                "Hovercraft": { "lift": 3 },
                "Velocity": { "linear": "fast" },
                "Position": { "x": 1.0, "y": 1.0 }
            } },
            { "guid": "e2", "name": "Two", "parentGuid": "ghost" }
        ]
    }"#;
    let registry = registry();
    let mut world = World::new();

    let graph = load(&registry, &mut world, text);

    assert_eq!(graph.entities.len(), 2);
    assert!(graph.issues.contains(&LoadIssue::UnknownComponent {
        entity: Guid::from("e1"),
        component: "Hovercraft".into(),
    }));
    assert!(graph.issues.iter().any(|i| matches!(
        i,
        LoadIssue::MalformedComponent { component, .. } if component == "Velocity"
    )));
    assert!(graph.issues.contains(&LoadIssue::DanglingParent {
        entity: Guid::from("e2"),
        parent: Guid::from("ghost"),
    }));

    let one = graph.entity(&Guid::from("e1")).unwrap();
    assert_eq!(world.get::<Position>(one), Some(&Position::new(1.0, 1.0)));
    assert!(!world.has::<loam_ecs::Velocity>(one));
    let two = graph.entity(&Guid::from("e2")).unwrap();
    assert_eq!(hierarchy::parent_of(&world, two), None);
}

#[test]
fn test_plugin_components_roundtrip() {
    let mut registry = registry();
    let mut host = AssemblyHost::new();
    host.load_boundary(
        Box::new(StaticModule::new("demo", demo_plugin::loam_plugin_manifest)),
        &mut registry,
    )
    .unwrap();

    let mut world = World::new();
    let e = world.spawn();
    world.insert(e, EntityGuid::new(Guid::from("spinning"))).unwrap();
    let spinner = registry.get_by_name("Spinner").unwrap().clone();
    spinner.add(&mut world, e, None).unwrap();
    spinner
        .set_field(&mut world, e, "Speed", FieldValue::Float(12.5))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spin.json");
    let document = EntityGraphCodec::new(&registry).serialize_world(&world, "Spin");
    assert!(document.entities[0].components.contains_key("Spinner"));
    save_scene(&path, &document, false).unwrap();

    let parsed = load_scene(&path).unwrap();
    let mut loaded = World::new();
    let graph = EntityGraphCodec::new(&registry).deserialize(&mut loaded, &parsed.document, IdentityMode::Preserve);
    assert!(graph.issues.is_empty());
    let copy = graph.entity(&Guid::from("spinning")).unwrap();
    assert_eq!(
        spinner.get_field(&loaded, copy, "Speed").unwrap(),
        FieldValue::Float(12.5)
    );

    // Without the plugin the same file still loads, minus its components
    host.unload(&mut registry);
    let mut bare = World::new();
    let graph = EntityGraphCodec::new(&registry).deserialize(&mut bare, &parsed.document, IdentityMode::Preserve);
    assert_eq!(graph.entities.len(), 1);
    assert!(graph.issues.contains(&LoadIssue::UnknownComponent {
        entity: Guid::from("spinning"),
        component: "Spinner".into(),
    }));
}

#[test]
fn test_plugin_guid_field_references_scene_entity() {
    let text = r#"{
        "version": 1,
        "name": "Anchored",
        "entities": [
            { "guid": "11", "name": "Pivot" },
            { "guid": "22", "name": "Blade",
              "components": { "Spinner": { "Speed": 5.0, "Anchor": "11" } } }
        ]
    }"#;
    let mut registry = registry();
    let mut host = AssemblyHost::new();
    host.load_boundary(
        Box::new(StaticModule::new("demo", demo_plugin::loam_plugin_manifest)),
        &mut registry,
    )
    .unwrap();
    let spinner = registry.get_by_name("Spinner").unwrap().clone();
    let mut world = World::new();

    let graph = load(&registry, &mut world, text);

    assert!(graph.issues.is_empty(), "{:?}", graph.issues);
    let blade = graph.entity(&Guid::from("22")).unwrap();
    assert!(spinner.has(&world, blade));
    assert_eq!(
        spinner.get_field(&world, blade, "Anchor").unwrap(),
        FieldValue::Guid(Guid::from("11"))
    );
    assert_eq!(
        spinner.get_field(&world, blade, "Speed").unwrap(),
        FieldValue::Float(5.0)
    );

    spinner
        .set_field(&mut world, blade, "Anchor", FieldValue::Guid(Guid::from("33")))
        .unwrap();
    let document = EntityGraphCodec::new(&registry).serialize_world(&world, "Anchored");
    let record = document.entities.iter().find(|r| r.guid.as_str() == "22").unwrap();
    assert_eq!(record.components["Spinner"]["Anchor"], "33");

    host.unload(&mut registry);
}
