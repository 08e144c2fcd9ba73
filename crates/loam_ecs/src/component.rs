//! Component - value data attached to entities
//!
//! Components are plain values. A compile-time type is keyed by its
//! [`TypeId`]; a type defined by a loaded plugin gets a [`DynamicTypeId`]
//! when its descriptor is built. Both travel through the world as
//! [`BoxedComponent`] once their static type is erased.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier for a component type that only exists at runtime
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DynamicTypeId(u64);

static NEXT_DYNAMIC_ID: AtomicU64 = AtomicU64::new(1);

impl DynamicTypeId {
    /// Allocate a process-unique id. Ids are never reused, so a type from a
    /// reloaded plugin never aliases the type it replaced.
    pub fn allocate() -> Self {
        Self(NEXT_DYNAMIC_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Key a component column is stored under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Rust type known at compile time
    Native(TypeId),
    /// Plugin-defined type
    Dynamic(DynamicTypeId),
}

impl ComponentType {
    #[inline]
    pub fn of<T: Component>() -> Self {
        ComponentType::Native(TypeId::of::<T>())
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ComponentType::Dynamic(_))
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Native(id) => write!(f, "native:{:?}", id),
            ComponentType::Dynamic(id) => write!(f, "dynamic:{}", id.0),
        }
    }
}

/// Marker for types usable as statically typed components
pub trait Component: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> Component for T {}

/// Object-safe view of a component value
pub trait ComponentValue: Any + Send + Sync + fmt::Debug {
    fn clone_value(&self) -> BoxedComponent;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn value_type_name(&self) -> &'static str;
}

/// A component value with its static type erased
pub type BoxedComponent = Box<dyn ComponentValue>;

impl<T: Component> ComponentValue for T {
    fn clone_value(&self) -> BoxedComponent {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<'a> dyn ComponentValue + 'a {
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Unbox a component value as `T`, handing the box back on mismatch
pub fn downcast_boxed<T: Any>(value: BoxedComponent) -> Result<T, BoxedComponent> {
    if !value.is::<T>() {
        return Err(value);
    }
    match value.into_any().downcast::<T>() {
        Ok(typed) => Ok(*typed),
        // checked by `is` above
        Err(_) => unreachable!("component type changed during downcast"),
    }
}
