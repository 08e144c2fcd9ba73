//! # loam_reflect - component descriptors and registry
//!
//! A [`ComponentDescriptor`] is a type-erased handle over one component type:
//! it can test for, read, replace, add and remove that component on an entity,
//! and encode/decode its value as JSON. The [`ComponentTypeRegistry`] maps
//! descriptor names and [`ComponentType`](loam_ecs::ComponentType)s to
//! descriptors and is what the scene codec and tooling consult.
//!
//! ```text
//!   NativeDescriptor<T> ─┐
//!                        ├─► Arc<dyn ComponentDescriptor> ─► ComponentTypeRegistry
//!   plugin descriptors ──┘          │                          by_name / by_type
//!                                   └─► [FieldDescriptor] (get/set one field)
//! ```
//!
//! Compile-time types go through [`NativeDescriptor`], which is generic over
//! the component and never resolves types at runtime. Plugin types implement
//! the same trait elsewhere.

pub mod builtin;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod registry;

pub use builtin::register_builtin_components;
pub use descriptor::{ComponentDescriptor, DescriptorRef, NativeDescriptor};
pub use error::{ReflectError, Result};
pub use field::{FieldDescriptor, FieldKind, FieldType, FieldValue};
pub use registry::ComponentTypeRegistry;

/// Prelude for common imports
pub mod prelude {
    pub use crate::builtin::register_builtin_components;
    pub use crate::descriptor::{ComponentDescriptor, DescriptorRef, NativeDescriptor};
    pub use crate::field::{FieldDescriptor, FieldKind, FieldValue};
    pub use crate::registry::ComponentTypeRegistry;
}
