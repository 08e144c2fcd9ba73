//! # loam_plugin - runtime component types from plugin modules
//!
//! The [`AssemblyHost`] opens a plugin module, reads its export tables and
//! registers a [`DynamicComponentDescriptor`] for every exported type carrying
//! the component marker. Those descriptors behave like compiled-in ones until
//! the module is unloaded, after which they refuse every operation.
//!
//! ```ignore
//! let mut registry = ComponentTypeRegistry::new();
//! register_builtin_components(&mut registry);
//!
//! let mut host = AssemblyHost::new();
//! host.load_module("plugins/libgame.so", &mut registry)?;
//! // ... scenes may now use the plugin's components ...
//! host.unload(&mut registry);
//! ```

pub mod dynamic;
pub mod error;
pub mod host;
pub mod manifest;
pub mod module;

pub use dynamic::{DynamicComponentDescriptor, DynamicValue, GuidTable, ModuleToken};
pub use error::{PluginError, Result};
pub use host::{AssemblyHost, HostState, UnloadReport};
pub use manifest::{read_manifest, ExportedField, ExportedType, ModuleManifest, HOST_ABI};
pub use module::{ModuleBoundary, NativeModule, StaticModule};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dynamic::DynamicValue;
    pub use crate::host::{AssemblyHost, HostState};
    pub use crate::module::{ModuleBoundary, NativeModule, StaticModule};
}
