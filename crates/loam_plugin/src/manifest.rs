//! Reading a module's export tables into owned data
//!
//! Everything the host needs from a module is copied out here, once, while the
//! module is known to be loaded. Default values are captured by running each
//! component type's default constructor a single time.

use std::alloc::{self, Layout};
use std::collections::HashSet;
use std::ffi::CStr;
use std::os::raw::c_char;

use loam_core::Version;
use loam_plugin_api::{
    FieldExport, PluginManifest, TypeExport, ABI_VERSION_MAJOR, ABI_VERSION_MINOR,
};

use crate::error::{PluginError, Result};

/// Largest value size a module may export
pub const MAX_VALUE_SIZE: usize = 64 * 1024;

/// ABI version this host implements
pub const HOST_ABI: Version = Version::new(ABI_VERSION_MAJOR, ABI_VERSION_MINOR, 0);

/// Owned copy of a module manifest
#[derive(Debug, Clone)]
pub struct ModuleManifest {
    pub name: String,
    pub abi: Version,
    pub types: Vec<ExportedType>,
}

/// Owned copy of one exported type
#[derive(Debug, Clone)]
pub struct ExportedType {
    pub name: String,
    pub category: Option<String>,
    pub flags: u32,
    pub size: usize,
    pub align: usize,
    /// Default value image; empty for types that are not components
    pub default_bytes: Vec<u8>,
    pub fields: Vec<ExportedField>,
}

impl ExportedType {
    pub fn is_component(&self) -> bool {
        self.flags & loam_plugin_api::COMPONENT_MARKER != 0
    }
}

/// Owned copy of one exported field
#[derive(Debug, Clone)]
pub struct ExportedField {
    pub name: String,
    pub type_code: u32,
    pub offset: usize,
    pub enum_variants: Vec<String>,
}

/// Copy and validate a manifest.
///
/// # Safety
///
/// `manifest` must be null or point to a manifest whose tables stay valid for
/// the duration of the call.
pub unsafe fn read_manifest(manifest: *const PluginManifest, origin: &str) -> Result<ModuleManifest> {
    let raw = manifest
        .as_ref()
        .ok_or_else(|| PluginError::invalid_manifest(origin, "manifest pointer is null"))?;

    let abi = Version::from_abi_word(raw.abi_version);
    if !HOST_ABI.can_host(&abi) {
        return Err(PluginError::AbiMismatch {
            module: origin.to_string(),
            found: abi,
            expected: HOST_ABI,
        });
    }

    let name = match read_str(raw.name) {
        Some(Ok(name)) if !name.is_empty() => name,
        _ => return Err(PluginError::invalid_manifest(origin, "module name missing or not UTF-8")),
    };

    let exports = table(raw.types, raw.type_count)
        .ok_or_else(|| PluginError::invalid_manifest(&name, "type table is null"))?;

    let mut seen = HashSet::new();
    let mut types = Vec::with_capacity(exports.len());
    for (index, export) in exports.iter().enumerate() {
        let ty = read_type(export, &name, index)?;
        if !seen.insert(ty.name.clone()) {
            return Err(PluginError::invalid_manifest(
                &name,
                format!("type '{}' exported twice", ty.name),
            ));
        }
        types.push(ty);
    }

    Ok(ModuleManifest { name, abi, types })
}

unsafe fn read_type(export: &TypeExport, module: &str, index: usize) -> Result<ExportedType> {
    let name = match read_str(export.name) {
        Some(Ok(name)) if !name.is_empty() => name,
        _ => {
            return Err(PluginError::invalid_manifest(
                module,
                format!("type #{} has no valid name", index),
            ))
        }
    };
    let category = match read_str(export.category) {
        None => None,
        Some(Ok(category)) => Some(category),
        Some(Err(())) => {
            return Err(PluginError::invalid_manifest(
                module,
                format!("type '{}' has a non UTF-8 category", name),
            ))
        }
    };

    if export.size == 0 || export.size > MAX_VALUE_SIZE {
        return Err(PluginError::invalid_manifest(
            module,
            format!("type '{}' has unsupported size {}", name, export.size),
        ));
    }
    let layout = Layout::from_size_align(export.size, export.align).map_err(|_| {
        PluginError::invalid_manifest(
            module,
            format!("type '{}' has invalid alignment {}", name, export.align),
        )
    })?;

    let fields = table(export.fields, export.field_count)
        .ok_or_else(|| {
            PluginError::invalid_manifest(module, format!("type '{}' has a null field table", name))
        })?
        .iter()
        .filter_map(|field| read_field(field, &name))
        .collect();

    let default_bytes = if export.flags & loam_plugin_api::COMPONENT_MARKER != 0 {
        capture_default(export, layout)
    } else {
        Vec::new()
    };

    Ok(ExportedType {
        name,
        category,
        flags: export.flags,
        size: export.size,
        align: export.align,
        default_bytes,
        fields,
    })
}

unsafe fn read_field(field: &FieldExport, type_name: &str) -> Option<ExportedField> {
    let name = match read_str(field.name) {
        Some(Ok(name)) if !name.is_empty() => name,
        _ => {
            log::debug!("skipping unnamed field on '{}'", type_name);
            return None;
        }
    };
    let enum_variants = match read_str(field.enum_variants) {
        Some(Ok(list)) => list
            .split('|')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };
    Some(ExportedField {
        name,
        type_code: field.type_code,
        offset: field.offset,
        enum_variants,
    })
}

/// Run the type's default constructor into scratch memory and copy the bytes.
/// Types without a constructor default to all zeroes. Exported types carry no
/// implicit padding, so every copied byte was written by the constructor.
unsafe fn capture_default(export: &TypeExport, layout: Layout) -> Vec<u8> {
    let Some(write_default) = export.write_default else {
        return vec![0; layout.size()];
    };
    let scratch = alloc::alloc_zeroed(layout);
    if scratch.is_null() {
        alloc::handle_alloc_error(layout);
    }
    write_default(scratch);
    let bytes = std::slice::from_raw_parts(scratch, layout.size()).to_vec();
    alloc::dealloc(scratch, layout);
    bytes
}

/// `None` for a null pointer, `Some(Err)` for invalid UTF-8
unsafe fn read_str(ptr: *const c_char) -> Option<std::result::Result<String, ()>> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_str().map(String::from).map_err(|_| ()))
}

/// View a (pointer, count) table. A null pointer is only valid for count 0.
unsafe fn table<'a, T>(ptr: *const T, count: usize) -> Option<&'a [T]> {
    if count == 0 {
        Some(&[])
    } else if ptr.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(ptr, count))
    }
}
