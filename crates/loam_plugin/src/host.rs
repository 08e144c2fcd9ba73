//! Assembly host
//!
//! Owns at most one plugin module at a time and keeps the registry in step
//! with it: loading registers one descriptor per exported component type,
//! unloading removes them again and revokes their lease on the module.
//!
//! ```text
//! Unloaded ──load_module──► Loaded ──unload──► Unloaded
//!    ▲                        │
//!    └──── failed load ◄──────┘ (load_module unloads first)
//! ```

use std::path::Path;
use std::sync::Arc;

use loam_ecs::ComponentType;
use loam_reflect::{ComponentTypeRegistry, DescriptorRef};

use crate::dynamic::{DynamicComponentDescriptor, ModuleToken};
use crate::error::Result;
use crate::manifest::read_manifest;
use crate::module::{ModuleBoundary, NativeModule};

/// Whether a module is currently held
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostState {
    Unloaded,
    Loaded,
}

struct LoadedModule {
    name: String,
    registered: Vec<(String, ComponentType)>,
    token: Arc<ModuleToken>,
    boundary: Box<dyn ModuleBoundary>,
}

/// What an unload removed
#[derive(Debug, Default)]
pub struct UnloadReport {
    pub module: Option<String>,
    /// Component names and types taken out of the registry
    pub unregistered: Vec<(String, ComponentType)>,
}

/// Loads plugin modules and registers their component types
#[derive(Default)]
pub struct AssemblyHost {
    loaded: Option<LoadedModule>,
}

impl AssemblyHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HostState {
        if self.loaded.is_some() {
            HostState::Loaded
        } else {
            HostState::Unloaded
        }
    }

    /// Name the loaded module gave itself
    pub fn module_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|m| m.name.as_str())
    }

    /// Component names registered by the loaded module
    pub fn registered_names(&self) -> impl Iterator<Item = &str> {
        self.loaded
            .iter()
            .flat_map(|m| m.registered.iter().map(|(name, _)| name.as_str()))
    }

    /// Load a shared library and register its component types.
    ///
    /// Any module already loaded is unloaded first, whether or not the new one
    /// loads. Returns the number of component types registered.
    pub fn load_module(
        &mut self,
        path: impl AsRef<Path>,
        registry: &mut ComponentTypeRegistry,
    ) -> Result<usize> {
        self.unload(registry);
        let module = NativeModule::open(path.as_ref()).map_err(|e| {
            log::error!("{}", e);
            e
        })?;
        self.load_boundary(Box::new(module), registry)
    }

    /// Register the component types of an already opened module.
    ///
    /// On failure the module is released and nothing is registered.
    pub fn load_boundary(
        &mut self,
        boundary: Box<dyn ModuleBoundary>,
        registry: &mut ComponentTypeRegistry,
    ) -> Result<usize> {
        self.unload(registry);

        let manifest = unsafe {
            let manifest_fn = boundary.manifest_fn();
            read_manifest(manifest_fn(), boundary.label())
        }
        .map_err(|e| {
            log::error!("{}", e);
            e
        })?;

        let token = ModuleToken::new(manifest.name.clone());
        let mut descriptors: Vec<DescriptorRef> = Vec::new();
        for export in &manifest.types {
            if !export.is_component() {
                log::debug!(
                    "'{}' in '{}' is not marked as a component, skipping",
                    export.name,
                    manifest.name
                );
                continue;
            }
            descriptors.push(Arc::new(DynamicComponentDescriptor::new(export, &token)));
        }

        let mut registered = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let entry = (descriptor.name().to_string(), descriptor.component_type());
            registry.register(descriptor);
            registered.push(entry);
        }

        log::info!(
            "Loaded plugin '{}' ({}) with {} component types",
            manifest.name,
            boundary.label(),
            registered.len()
        );

        let count = registered.len();
        self.loaded = Some(LoadedModule {
            name: manifest.name,
            registered,
            token,
            boundary,
        });
        Ok(count)
    }

    /// Remove the loaded module's component types and release the module.
    ///
    /// A registration that has since been replaced by another descriptor is
    /// left alone. Does nothing when no module is loaded.
    pub fn unload(&mut self, registry: &mut ComponentTypeRegistry) -> UnloadReport {
        let Some(loaded) = self.loaded.take() else {
            return UnloadReport::default();
        };
        let LoadedModule {
            name,
            registered,
            token,
            boundary,
        } = loaded;

        let mut unregistered = Vec::new();
        for (component, component_type) in registered {
            let still_ours = registry
                .get_by_type(component_type)
                .is_some_and(|d| d.name() == component);
            if still_ours {
                registry.unregister_type(component_type);
                unregistered.push((component, component_type));
            } else {
                log::debug!("'{}' was replaced after loading, leaving it registered", component);
            }
        }

        // Descriptors must be revoked before the code they describe goes away.
        drop(token);
        drop(boundary);

        log::info!(
            "Unloaded plugin '{}', removed {} component types",
            name,
            unregistered.len()
        );

        UnloadReport {
            module: Some(name),
            unregistered,
        }
    }
}

impl Drop for AssemblyHost {
    fn drop(&mut self) {
        if let Some(loaded) = &self.loaded {
            log::warn!(
                "AssemblyHost dropped with plugin '{}' still loaded; its components stay registered but unusable",
                loaded.name
            );
        }
    }
}
