//! Assembly host tests against the demo plugin, linked statically

use loam_ecs::World;
use loam_plugin::{AssemblyHost, HostState, PluginError, StaticModule};
use loam_plugin_api::PluginManifest;
use loam_reflect::{register_builtin_components, ComponentTypeRegistry, FieldValue, ReflectError};
use serde_json::json;

fn demo() -> Box<StaticModule> {
    Box::new(StaticModule::new("demo", demo_plugin::loam_plugin_manifest))
}

fn setup() -> (AssemblyHost, ComponentTypeRegistry, usize) {
    let mut registry = ComponentTypeRegistry::new();
    let builtin = register_builtin_components(&mut registry);
    (AssemblyHost::new(), registry, builtin)
}

#[test]
fn test_load_registers_marked_types_only() {
    let (mut host, mut registry, builtin) = setup();

    let count = host.load_boundary(demo(), &mut registry).unwrap();

    assert_eq!(count, 2);
    assert_eq!(host.state(), HostState::Loaded);
    assert_eq!(host.module_name(), Some("demo"));
    assert_eq!(registry.len(), builtin + 2);
    assert!(registry.contains("Spinner"));
    assert!(registry.contains("Wander"));
    assert!(!registry.contains("SpinnerSettings"));

    let spinner = registry.get_by_name("Spinner").unwrap();
    assert_eq!(spinner.category(), "Motion");
    assert!(spinner.component_type().is_dynamic());
    let fields: Vec<_> = spinner.fields().iter().map(|f| f.name()).collect();
    assert_eq!(
        fields,
        vec!["Speed", "Turns", "Enabled", "Axis", "Glow", "Easing", "Anchor"]
    );

    host.unload(&mut registry);
}

#[test]
fn test_plugin_component_behaves_like_builtin() {
    let (mut host, mut registry, _) = setup();
    host.load_boundary(demo(), &mut registry).unwrap();
    let spinner = registry.get_by_name("Spinner").unwrap().clone();

    let mut world = World::new();
    let e = world.spawn();
    assert!(spinner.add(&mut world, e, None).unwrap());
    assert_eq!(
        spinner.get_field(&world, e, "Speed").unwrap(),
        FieldValue::Float(90.0)
    );

    spinner
        .set_field(&mut world, e, "Easing", FieldValue::Enum(2))
        .unwrap();
    spinner
        .set_field(&mut world, e, "Enabled", FieldValue::Bool(false))
        .unwrap();

    let json = spinner.serialize_to_json(&world, e).unwrap();
    assert_eq!(json["Easing"], json!("EaseOut"));
    assert_eq!(json["Enabled"], json!(false));
    assert_eq!(json["Axis"], json!({ "x": 0.0, "y": 1.0 }));
    assert!(json.get("Scratch").is_none());

    let copy = spinner.deserialize_from_json(&json).unwrap();
    let other = world.spawn();
    spinner.add(&mut world, other, Some(copy)).unwrap();
    assert_eq!(spinner.serialize_to_json(&world, other).unwrap(), json);

    host.unload(&mut registry);
}

#[test]
fn test_unload_restores_registry_and_revokes() {
    let (mut host, mut registry, builtin) = setup();
    host.load_boundary(demo(), &mut registry).unwrap();
    let spinner = registry.get_by_name("Spinner").unwrap().clone();

    let report = host.unload(&mut registry);

    assert_eq!(report.module.as_deref(), Some("demo"));
    assert_eq!(report.unregistered.len(), 2);
    assert_eq!(host.state(), HostState::Unloaded);
    assert_eq!(registry.len(), builtin);
    assert!(registry.get_by_type(spinner.component_type()).is_none());
    assert!(matches!(
        spinner.create_default(),
        Err(ReflectError::ModuleUnloaded(_))
    ));

    // Second unload is a no-op
    assert!(host.unload(&mut registry).module.is_none());
}

#[test]
fn test_reload_allocates_fresh_types() {
    let (mut host, mut registry, builtin) = setup();
    host.load_boundary(demo(), &mut registry).unwrap();
    let first = registry.get_by_name("Wander").unwrap().component_type();

    host.load_boundary(demo(), &mut registry).unwrap();
    let second = registry.get_by_name("Wander").unwrap().component_type();

    assert_ne!(first, second);
    assert!(registry.get_by_type(first).is_none());
    assert_eq!(registry.len(), builtin + 2);

    host.unload(&mut registry);
}

#[test]
fn test_replaced_registration_survives_unload() {
    let (mut host, mut registry, _) = setup();
    host.load_boundary(demo(), &mut registry).unwrap();

    // A later registration under the same name takes over
    registry.register_descriptor(
        loam_reflect::NativeDescriptor::<loam_ecs::Velocity>::new("Wander"),
    );
    let report = host.unload(&mut registry);

    assert_eq!(report.unregistered.len(), 1);
    assert!(registry.contains("Wander"));
    assert!(!registry.contains("Spinner"));
}

unsafe extern "C" fn future_abi() -> *const PluginManifest {
    static TYPES: [loam_plugin_api::TypeExport; 0] = [];
    static MANIFEST: PluginManifest = PluginManifest {
        abi_version: (loam_plugin_api::ABI_VERSION_MAJOR as u32 + 1) << 16,
        ..PluginManifest::new(loam_plugin_api::cstr!("future"), &TYPES)
    };
    &MANIFEST
}

unsafe extern "C" fn no_manifest() -> *const PluginManifest {
    std::ptr::null()
}

#[test]
fn test_failed_load_leaves_host_unloaded() {
    let (mut host, mut registry, builtin) = setup();
    host.load_boundary(demo(), &mut registry).unwrap();

    let err = host
        .load_boundary(Box::new(StaticModule::new("future", future_abi)), &mut registry)
        .unwrap_err();
    assert!(matches!(err, PluginError::AbiMismatch { .. }));
    assert_eq!(host.state(), HostState::Unloaded);
    assert_eq!(registry.len(), builtin);

    let err = host
        .load_boundary(Box::new(StaticModule::new("null", no_manifest)), &mut registry)
        .unwrap_err();
    assert!(matches!(err, PluginError::InvalidManifest { .. }));
}

#[test]
fn test_load_missing_library() {
    let (mut host, mut registry, builtin) = setup();
    let dir = tempfile::tempdir().unwrap();

    let err = host
        .load_module(dir.path().join("nothing_here.so"), &mut registry)
        .unwrap_err();

    assert!(matches!(err, PluginError::LoadFailure { .. }));
    assert_eq!(host.state(), HostState::Unloaded);
    assert_eq!(registry.len(), builtin);
}
