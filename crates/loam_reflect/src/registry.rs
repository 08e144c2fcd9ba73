//! Component-type registry
//!
//! Maps descriptor names and component types to descriptors. Both maps always
//! describe the same set of descriptors: every registered descriptor is
//! reachable by its name and by its type, and by nothing else.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use loam_ecs::ComponentType;

use crate::descriptor::{ComponentDescriptor, DescriptorRef};

/// Directory of component descriptors
#[derive(Default)]
pub struct ComponentTypeRegistry {
    /// Name to descriptor, ordered so enumeration is stable
    by_name: BTreeMap<String, DescriptorRef>,
    by_type: HashMap<ComponentType, DescriptorRef>,
}

impl ComponentTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any descriptor with the same name or
    /// the same component type. The last registration wins.
    ///
    /// Returns the descriptors that were displaced.
    pub fn register(&mut self, descriptor: DescriptorRef) -> Vec<DescriptorRef> {
        let name = descriptor.name().to_string();
        let component_type = descriptor.component_type();
        let mut displaced = Vec::new();

        if let Some(old) = self.by_name.remove(&name) {
            self.by_type.remove(&old.component_type());
            displaced.push(old);
        }
        if let Some(old) = self.by_type.remove(&component_type) {
            self.by_name.remove(old.name());
            displaced.push(old);
        }

        for old in &displaced {
            log::debug!(
                "component '{}' ({}) replaced by '{}' ({})",
                old.name(),
                old.component_type(),
                name,
                component_type
            );
        }

        self.by_type.insert(component_type, Arc::clone(&descriptor));
        self.by_name.insert(name, descriptor);
        displaced
    }

    /// Convenience for registering a concrete descriptor
    pub fn register_descriptor<D>(&mut self, descriptor: D) -> Vec<DescriptorRef>
    where
        D: ComponentDescriptor + 'static,
    {
        self.register(Arc::new(descriptor))
    }

    /// Remove the descriptor registered under `name`
    pub fn unregister(&mut self, name: &str) -> Option<DescriptorRef> {
        let descriptor = self.by_name.remove(name)?;
        self.by_type.remove(&descriptor.component_type());
        Some(descriptor)
    }

    /// Remove the descriptor registered for `component_type`
    pub fn unregister_type(&mut self, component_type: ComponentType) -> Option<DescriptorRef> {
        let descriptor = self.by_type.remove(&component_type)?;
        self.by_name.remove(descriptor.name());
        Some(descriptor)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&DescriptorRef> {
        self.by_name.get(name)
    }

    pub fn get_by_type(&self, component_type: ComponentType) -> Option<&DescriptorRef> {
        self.by_type.get(&component_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Registered names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Every descriptor, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &DescriptorRef> {
        self.by_name.values()
    }

    /// Descriptors whose values are written to documents
    pub fn enumerate_serializable(&self) -> impl Iterator<Item = &DescriptorRef> {
        self.iter().filter(|d| !d.is_internal())
    }

    /// Descriptors a user may add to or remove from an entity
    pub fn enumerate_addable(&self) -> impl Iterator<Item = &DescriptorRef> {
        self.iter()
            .filter(|d| !d.is_internal() && !d.is_core_transform())
    }

    /// Addable descriptors grouped by category, both levels ordered by name
    pub fn addable_by_category(&self) -> BTreeMap<String, Vec<DescriptorRef>> {
        let mut groups: BTreeMap<String, Vec<DescriptorRef>> = BTreeMap::new();
        for descriptor in self.enumerate_addable() {
            groups
                .entry(descriptor.category().to_string())
                .or_default()
                .push(Arc::clone(descriptor));
        }
        groups
    }
}
