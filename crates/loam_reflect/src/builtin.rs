//! Descriptors for the components compiled into loam

use loam_core::{Color, Guid, Rect, Vec2};
use loam_ecs::{
    BlendMode, BoxCollider, CameraFollow, Children, EntityGuid, EntityName, Parent, Position,
    Rotation, Scale, SpriteRenderer, Velocity,
};

use crate::descriptor::{DescriptorRef, NativeDescriptor};
use crate::field::FieldDescriptor;
use crate::registry::ComponentTypeRegistry;

pub const CATEGORY_TRANSFORM: &str = "Transform";
pub const CATEGORY_INTERNAL: &str = "Internal";

/// Register every built-in component.
///
/// Safe to call more than once: a descriptor is skipped when its name or its
/// type is already registered, so a plugin that took over a name keeps it.
/// Returns how many descriptors were added.
pub fn register_builtin_components(registry: &mut ComponentTypeRegistry) -> usize {
    let mut added = 0;
    for descriptor in builtin_descriptors() {
        if registry.contains(descriptor.name())
            || registry.get_by_type(descriptor.component_type()).is_some()
        {
            continue;
        }
        registry.register(descriptor);
        added += 1;
    }
    if added > 0 {
        log::info!("Registered {} built-in components", added);
    }
    added
}

fn builtin_descriptors() -> Vec<DescriptorRef> {
    vec![
        // Core transform
        NativeDescriptor::<Position>::new("Position")
            .with_category(CATEGORY_TRANSFORM)
            .core_transform()
            .with_field(FieldDescriptor::of::<Position, f32>("X", |p| p.x, |p, v| p.x = v))
            .with_field(FieldDescriptor::of::<Position, f32>("Y", |p| p.y, |p, v| p.y = v))
            .into_ref(),
        NativeDescriptor::<Rotation>::new("Rotation")
            .with_category(CATEGORY_TRANSFORM)
            .core_transform()
            .with_field(
                FieldDescriptor::of::<Rotation, f32>(
                    "Radians",
                    |r| r.radians,
                    |r, v| r.radians = v,
                )
                .with_range(-std::f32::consts::PI, std::f32::consts::PI),
            )
            .into_ref(),
        NativeDescriptor::<Scale>::new("Scale")
            .with_category(CATEGORY_TRANSFORM)
            .core_transform()
            .with_field(FieldDescriptor::of::<Scale, f32>("X", |s| s.x, |s, v| s.x = v))
            .with_field(FieldDescriptor::of::<Scale, f32>("Y", |s| s.y, |s, v| s.y = v))
            .into_ref(),
        // Bookkeeping
        NativeDescriptor::<EntityName>::new("Name")
            .with_category(CATEGORY_INTERNAL)
            .internal()
            .with_field(FieldDescriptor::of::<EntityName, String>(
                "Value",
                |n| n.0.clone(),
                |n, v| n.0 = v,
            ))
            .into_ref(),
        NativeDescriptor::<EntityGuid>::new("Guid")
            .with_category(CATEGORY_INTERNAL)
            .internal()
            .with_field(FieldDescriptor::of::<EntityGuid, Guid>(
                "Value",
                |g| g.0.clone(),
                |g, v| g.0 = v,
            ))
            .into_ref(),
        NativeDescriptor::<Parent>::new("Parent")
            .with_category(CATEGORY_INTERNAL)
            .internal()
            .into_ref(),
        NativeDescriptor::<Children>::new("Children")
            .with_category(CATEGORY_INTERNAL)
            .internal()
            .into_ref(),
        // Rendering
        NativeDescriptor::<SpriteRenderer>::new("SpriteRenderer")
            .with_category("Rendering")
            .with_field(
                FieldDescriptor::of::<SpriteRenderer, String>(
                    "Texture",
                    |s| s.texture.clone(),
                    |s, v| s.texture = v,
                )
                .with_tooltip("Texture asset path"),
            )
            .with_field(FieldDescriptor::of::<SpriteRenderer, Color>(
                "Tint",
                |s| s.tint,
                |s, v| s.tint = v,
            ))
            .with_field(
                FieldDescriptor::of::<SpriteRenderer, i32>("Layer", |s| s.layer, |s, v| s.layer = v)
                    .with_tooltip("Higher layers draw on top"),
            )
            .with_field(FieldDescriptor::of::<SpriteRenderer, bool>(
                "FlipX",
                |s| s.flip_x,
                |s, v| s.flip_x = v,
            ))
            .with_field(FieldDescriptor::enumeration::<SpriteRenderer>(
                "Blend",
                BlendMode::NAMES,
                |s| s.blend.index(),
                |s, i| match BlendMode::from_index(i) {
                    Some(mode) => {
                        s.blend = mode;
                        true
                    }
                    None => false,
                },
            ))
            .with_field(FieldDescriptor::of::<SpriteRenderer, Rect>(
                "SourceRect",
                |s| s.source_rect,
                |s, v| s.source_rect = v,
            ))
            .into_ref(),
        // Camera
        NativeDescriptor::<CameraFollow>::new("CameraFollow")
            .with_category("Camera")
            .with_field(
                FieldDescriptor::of::<CameraFollow, Guid>(
                    "Target",
                    |c| c.target.clone(),
                    |c, v| c.target = v,
                )
                .with_tooltip("Guid of the entity to follow"),
            )
            .with_field(
                FieldDescriptor::of::<CameraFollow, f32>(
                    "Smoothing",
                    |c| c.smoothing,
                    |c, v| c.smoothing = v,
                )
                .with_range(0.0, 1.0),
            )
            .with_field(FieldDescriptor::of::<CameraFollow, Vec2>(
                "Offset",
                |c| c.offset,
                |c, v| c.offset = v,
            ))
            .into_ref(),
        // Physics
        NativeDescriptor::<BoxCollider>::new("BoxCollider")
            .with_category("Physics")
            .with_field(FieldDescriptor::of::<BoxCollider, Rect>(
                "Bounds",
                |b| b.bounds,
                |b, v| b.bounds = v,
            ))
            .with_field(FieldDescriptor::of::<BoxCollider, bool>(
                "IsTrigger",
                |b| b.is_trigger,
                |b, v| b.is_trigger = v,
            ))
            .into_ref(),
        NativeDescriptor::<Velocity>::new("Velocity")
            .with_category("Physics")
            .with_field(FieldDescriptor::of::<Velocity, Vec2>(
                "Linear",
                |v| v.linear,
                |v, x| v.linear = x,
            ))
            .into_ref(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReflectError;
    use crate::field::FieldValue;
    use loam_ecs::World;

    #[test]
    fn test_registration_is_idempotent() {
        let mut registry = ComponentTypeRegistry::new();
        let first = register_builtin_components(&mut registry);
        assert!(first > 0);
        assert_eq!(register_builtin_components(&mut registry), 0);
        assert_eq!(registry.len(), first);
    }

    #[test]
    fn test_flags() {
        let mut registry = ComponentTypeRegistry::new();
        register_builtin_components(&mut registry);

        let position = registry.get_by_name("Position").unwrap();
        assert!(position.is_core_transform());
        assert!(!position.is_internal());
        assert!(registry.get_by_name("Guid").unwrap().is_internal());

        let addable: Vec<&str> = registry.enumerate_addable().map(|d| d.name()).collect();
        assert!(addable.contains(&"SpriteRenderer"));
        assert!(!addable.contains(&"Position"));
        assert!(!addable.contains(&"Parent"));
    }

    #[test]
    fn test_sprite_fields_cover_kinds() {
        let mut registry = ComponentTypeRegistry::new();
        register_builtin_components(&mut registry);
        let sprite = registry.get_by_name("SpriteRenderer").unwrap();

        let mut world = World::new();
        let e = world.spawn();
        sprite.add(&mut world, e, None).unwrap();
        sprite
            .set_field(&mut world, e, "Blend", FieldValue::Enum(1))
            .unwrap();
        sprite
            .set_field(&mut world, e, "Layer", FieldValue::Int(4))
            .unwrap();

        let value = world.get::<SpriteRenderer>(e).unwrap();
        assert_eq!(value.blend, BlendMode::Additive);
        assert_eq!(value.layer, 4);
        let err = sprite
            .set_field(&mut world, e, "Blend", FieldValue::Enum(7))
            .unwrap_err();
        assert!(matches!(err, ReflectError::FieldRejected { ref field, .. } if field == "Blend"));
        assert_eq!(err.to_string(), "'SpriteRenderer.Blend' rejected value Enum(7)");
    }
}
