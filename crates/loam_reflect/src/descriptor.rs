//! Component descriptors
//!
//! [`ComponentDescriptor`] is the one contract every component type is used
//! through, whether it was compiled in or came from a plugin. Values cross it
//! as [`BoxedComponent`]s.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use loam_ecs::{BoxedComponent, Component, ComponentType, ComponentValue, Entity, World};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ReflectError, Result};
use crate::field::{FieldDescriptor, FieldValue};

/// Shared handle to a registered descriptor
pub type DescriptorRef = Arc<dyn ComponentDescriptor>;

/// Type-erased operations over one component type
pub trait ComponentDescriptor: Send + Sync {
    /// Registry key
    fn name(&self) -> &str;

    fn component_type(&self) -> ComponentType;

    /// Grouping label for tooling
    fn category(&self) -> &str;

    /// Never serialized, never offered for adding
    fn is_internal(&self) -> bool;

    /// Present on every entity, never added or removed on its own
    fn is_core_transform(&self) -> bool;

    /// Editable fields, in declaration order
    fn fields(&self) -> &[FieldDescriptor];

    fn has(&self, world: &World, entity: Entity) -> bool;

    /// Copy of the entity's current value
    fn get(&self, world: &World, entity: Entity) -> Result<BoxedComponent>;

    /// Replace an existing value. Fails with `ComponentMissing` if absent.
    fn set(&self, world: &mut World, entity: Entity, value: BoxedComponent) -> Result<()>;

    /// Attach the component with `value`, or the default when `None`.
    ///
    /// Returns `false` and leaves the current value alone if the entity
    /// already has the component.
    fn add(&self, world: &mut World, entity: Entity, value: Option<BoxedComponent>) -> Result<bool>;

    /// Detach the component. Returns `false` if it was absent.
    fn remove(&self, world: &mut World, entity: Entity) -> Result<bool>;

    /// Encode a value of this component type
    fn encode_value(&self, value: &dyn ComponentValue) -> Result<Value>;

    fn deserialize_from_json(&self, json: &Value) -> Result<BoxedComponent>;

    fn create_default(&self) -> Result<BoxedComponent>;

    /// Encode the entity's current value
    fn serialize_to_json(&self, world: &World, entity: Entity) -> Result<Value> {
        let value = world
            .get_keyed(entity, self.component_type())
            .ok_or_else(|| ReflectError::component_missing(self.name(), entity))?;
        self.encode_value(value)
    }

    fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().iter().find(|f| f.name() == name)
    }

    /// Read one field of the entity's current value
    fn get_field(&self, world: &World, entity: Entity, field: &str) -> Result<FieldValue> {
        let descriptor = self.field(field).ok_or_else(|| ReflectError::FieldNotFound {
            component: self.name().to_string(),
            field: field.to_string(),
        })?;
        let value = self.get(world, entity)?;
        descriptor.get(&*value).ok_or_else(|| {
            ReflectError::type_mismatch(self.name(), descriptor.kind().to_string(), "unreadable")
        })
    }

    /// Replace one field by computing a new whole value and storing it
    fn set_field(
        &self,
        world: &mut World,
        entity: Entity,
        field: &str,
        new_value: FieldValue,
    ) -> Result<()> {
        let descriptor = self.field(field).ok_or_else(|| ReflectError::FieldNotFound {
            component: self.name().to_string(),
            field: field.to_string(),
        })?;
        let actual = new_value.kind();
        let convertible = new_value.clone().coerce(descriptor.kind()).is_some();
        let shown = format!("{:?}", new_value);
        let current = self.get(world, entity)?;
        let next = descriptor.set(&*current, new_value).ok_or_else(|| {
            if convertible {
                ReflectError::FieldRejected {
                    component: self.name().to_string(),
                    field: field.to_string(),
                    value: shown,
                }
            } else {
                ReflectError::type_mismatch(
                    format!("{}.{}", self.name(), field),
                    descriptor.kind().to_string(),
                    actual.to_string(),
                )
            }
        })?;
        self.set(world, entity, next)
    }
}

impl fmt::Debug for dyn ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name())
            .field("type", &self.component_type())
            .field("category", &self.category())
            .finish()
    }
}

// ============================================================================
// Compile-time descriptors
// ============================================================================

/// Descriptor for a Rust component type.
///
/// All operations are monomorphized over `T`; the JSON form is `T`'s serde
/// encoding.
pub struct NativeDescriptor<T> {
    name: String,
    category: String,
    internal: bool,
    core_transform: bool,
    fields: Vec<FieldDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> NativeDescriptor<T>
where
    T: Component + Default + Serialize + DeserializeOwned,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: String::from("General"),
            internal: false,
            core_transform: false,
            fields: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn core_transform(mut self) -> Self {
        self.core_transform = true;
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn into_ref(self) -> DescriptorRef {
        Arc::new(self)
    }

    fn unbox(&self, value: BoxedComponent) -> Result<T> {
        let actual = value.value_type_name();
        loam_ecs::component::downcast_boxed::<T>(value)
            .map_err(|_| ReflectError::type_mismatch(&self.name, std::any::type_name::<T>(), actual))
    }
}

impl<T> ComponentDescriptor for NativeDescriptor<T>
where
    T: Component + Default + Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::of::<T>()
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn is_internal(&self) -> bool {
        self.internal
    }

    fn is_core_transform(&self) -> bool {
        self.core_transform
    }

    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn has(&self, world: &World, entity: Entity) -> bool {
        world.has::<T>(entity)
    }

    fn get(&self, world: &World, entity: Entity) -> Result<BoxedComponent> {
        world
            .get::<T>(entity)
            .map(|v| Box::new(v.clone()) as BoxedComponent)
            .ok_or_else(|| ReflectError::component_missing(&self.name, entity))
    }

    fn set(&self, world: &mut World, entity: Entity, value: BoxedComponent) -> Result<()> {
        let value = self.unbox(value)?;
        match world.get_mut::<T>(entity) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ReflectError::component_missing(&self.name, entity)),
        }
    }

    fn add(&self, world: &mut World, entity: Entity, value: Option<BoxedComponent>) -> Result<bool> {
        if world.has::<T>(entity) {
            return Ok(false);
        }
        let value = match value {
            Some(v) => self.unbox(v)?,
            None => T::default(),
        };
        world.insert(entity, value)?;
        Ok(true)
    }

    fn remove(&self, world: &mut World, entity: Entity) -> Result<bool> {
        Ok(world.remove::<T>(entity).is_some())
    }

    fn encode_value(&self, value: &dyn ComponentValue) -> Result<Value> {
        let typed = value.downcast_ref::<T>().ok_or_else(|| {
            ReflectError::type_mismatch(
                &self.name,
                std::any::type_name::<T>(),
                value.value_type_name(),
            )
        })?;
        serde_json::to_value(typed).map_err(|e| ReflectError::malformed(&self.name, e))
    }

    fn serialize_to_json(&self, world: &World, entity: Entity) -> Result<Value> {
        let value = world
            .get::<T>(entity)
            .ok_or_else(|| ReflectError::component_missing(&self.name, entity))?;
        serde_json::to_value(value).map_err(|e| ReflectError::malformed(&self.name, e))
    }

    fn deserialize_from_json(&self, json: &Value) -> Result<BoxedComponent> {
        T::deserialize(json)
            .map(|v| Box::new(v) as BoxedComponent)
            .map_err(|e| ReflectError::malformed(&self.name, e))
    }

    fn create_default(&self) -> Result<BoxedComponent> {
        Ok(Box::new(T::default()))
    }
}
