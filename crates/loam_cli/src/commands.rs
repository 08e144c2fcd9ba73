//! Subcommand implementations
//!
//! Each command writes its report to `out` so it can be captured in tests.

use std::error::Error;
use std::io::Write;
use std::path::Path;

use loam_core::Vec2;
use loam_ecs::{hierarchy, Entity, EntityGuid, EntityName, World};
use loam_reflect::ComponentTypeRegistry;
use loam_scene::{
    instantiate_prefab, load_scene, save_scene, EntityGraphCodec, IdentityMode, LoadIssue,
};

pub type CommandResult = Result<(), Box<dyn Error>>;

/// Parse `X,Y` into a point
pub fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x: f32 = x.trim().parse().map_err(|_| format!("bad x in '{}'", s))?;
    let y: f32 = y.trim().parse().map_err(|_| format!("bad y in '{}'", s))?;
    Ok(Vec2::new(x, y))
}

/// List every registered component type, grouped by category
pub fn components(registry: &ComponentTypeRegistry, out: &mut dyn Write) -> CommandResult {
    let mut current = None;
    let mut descriptors: Vec<_> = registry.iter().collect();
    descriptors.sort_by(|a, b| (a.category(), a.name()).cmp(&(b.category(), b.name())));

    for descriptor in descriptors {
        if current != Some(descriptor.category()) {
            current = Some(descriptor.category());
            writeln!(out, "[{}]", descriptor.category())?;
        }
        let mut flags = Vec::new();
        if descriptor.is_core_transform() {
            flags.push("core");
        }
        if descriptor.is_internal() {
            flags.push("internal");
        }
        if descriptor.component_type().is_dynamic() {
            flags.push("plugin");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        writeln!(out, "  {}{}", descriptor.name(), flags)?;
        for field in descriptor.fields() {
            match field.enum_variants() {
                Some(variants) => writeln!(out, "    {}: enum {}", field.name(), variants.join("|"))?,
                None => writeln!(out, "    {}: {}", field.name(), field.kind())?,
            }
        }
    }
    writeln!(out, "{} component types", registry.len())?;
    Ok(())
}

/// Load a scene and print its entity tree
pub fn inspect(registry: &ComponentTypeRegistry, scene: &Path, out: &mut dyn Write) -> CommandResult {
    let parsed = load_scene(scene)?;
    let mut world = World::new();
    let codec = EntityGraphCodec::new(registry);
    let graph = codec.deserialize(&mut world, &parsed.document, IdentityMode::Preserve);

    writeln!(
        out,
        "{} (format {}), {} entities",
        if parsed.document.name.is_empty() {
            "<unnamed>"
        } else {
            parsed.document.name.as_str()
        },
        parsed.document.version,
        graph.entities.len()
    )?;
    for root in graph.roots(&world) {
        print_entity(registry, &world, root, 1, out)?;
    }
    print_issues(parsed.issues.iter().chain(&graph.issues), out)
}

fn print_entity(
    registry: &ComponentTypeRegistry,
    world: &World,
    entity: Entity,
    depth: usize,
    out: &mut dyn Write,
) -> CommandResult {
    let name = world.get::<EntityName>(entity).map_or("", |n| n.as_str());
    let guid = world
        .get::<EntityGuid>(entity)
        .map_or_else(String::new, |g| g.guid().to_string());
    let components: Vec<&str> = registry
        .enumerate_serializable()
        .filter(|d| d.has(world, entity))
        .map(|d| d.name())
        .collect();
    writeln!(
        out,
        "{}{} [{}] {}",
        "  ".repeat(depth),
        name,
        guid,
        components.join(", ")
    )?;
    for child in hierarchy::children_of(world, entity) {
        print_entity(registry, world, child, depth + 1, out)?;
    }
    Ok(())
}

fn print_issues<'a>(issues: impl Iterator<Item = &'a LoadIssue>, out: &mut dyn Write) -> CommandResult {
    let mut count = 0;
    for issue in issues {
        if count == 0 {
            writeln!(out, "issues:")?;
        }
        writeln!(out, "  {}", issue)?;
        count += 1;
    }
    if count > 0 {
        log::warn!("{} load issues", count);
    }
    Ok(())
}

/// Load a scene and write it back, to `target` or over the original
pub fn resave(
    registry: &ComponentTypeRegistry,
    scene: &Path,
    target: Option<&Path>,
    mode: IdentityMode,
    pretty: bool,
    out: &mut dyn Write,
) -> CommandResult {
    let parsed = load_scene(scene)?;
    let mut world = World::new();
    let codec = EntityGraphCodec::new(registry);
    let graph = codec.deserialize(&mut world, &parsed.document, mode);

    let document = codec.serialize(&world, &graph.entities, &parsed.document.name);
    let target = target.unwrap_or(scene);
    save_scene(target, &document, pretty)?;

    writeln!(
        out,
        "wrote {} entities to {}",
        document.len(),
        target.display()
    )?;
    print_issues(parsed.issues.iter().chain(&graph.issues), out)
}

/// Instantiate a prefab `count` times into an empty world and print the
/// resulting scene document
pub fn instantiate(
    registry: &ComponentTypeRegistry,
    prefab: &Path,
    count: usize,
    at: Option<Vec2>,
    pretty: bool,
    out: &mut dyn Write,
) -> CommandResult {
    let parsed = load_scene(prefab)?;
    let mut world = World::new();
    let codec = EntityGraphCodec::new(registry);

    let mut issues = parsed.issues;
    let mut entities = Vec::new();
    for _ in 0..count {
        let graph = instantiate_prefab(&codec, &mut world, &parsed.document, at);
        entities.extend(graph.entities);
        issues.extend(graph.issues);
    }
    log::info!(
        "Instantiated '{}' {} times, {} entities",
        parsed.document.name,
        count,
        entities.len()
    );

    let document = codec.serialize(&world, &entities, &parsed.document.name);
    let text = if pretty {
        document.to_json_pretty()?
    } else {
        document.to_json_string()?
    };
    writeln!(out, "{}", text)?;
    if !issues.is_empty() {
        log::warn!("{} load issues while instantiating", issues.len());
    }
    Ok(())
}
