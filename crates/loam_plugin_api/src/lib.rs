//! # loam_plugin_api - plugin export tables
//!
//! A plugin module is a shared library exporting one symbol,
//! `loam_plugin_manifest`, that returns a pointer to a static
//! [`PluginManifest`]. The manifest lists the plain-data value types the module
//! defines. Types flagged with [`COMPONENT_MARKER`] become components on load.
//!
//! ```text
//! PluginManifest ──► [TypeExport] ──► [FieldExport]
//!   abi_version        name             name
//!   name               category         type_code
//!                      flags            offset
//!                      size / align     enum_variants ("A|B|C")
//!                      write_default
//! ```
//!
//! All tables must be `'static` and immutable. Component values are moved
//! around by byte copy, so exported types must be plain data with no drop
//! glue, no pointers and no implicit padding: fill alignment gaps with
//! explicit `_pad` fields so every byte of a value is initialized.
//!
//! ```ignore
//! #[repr(C)]
//! #[derive(Default)]
//! pub struct Spin { pub speed: f32 }
//!
//! static SPIN_FIELDS: [FieldExport; 1] =
//!     [FieldExport::new(cstr!("Speed"), type_code::F32, offset_of!(Spin, speed))];
//! static TYPES: [TypeExport; 1] =
//!     [TypeExport::component::<Spin>(cstr!("Spin"), cstr!("Motion"), &SPIN_FIELDS)];
//! static MANIFEST: PluginManifest = PluginManifest::new(cstr!("spin"), &TYPES);
//!
//! declare_plugin!(MANIFEST);
//! ```

#![allow(clippy::missing_safety_doc)]

use std::os::raw::c_char;

/// ABI major version, bumped on incompatible table changes
pub const ABI_VERSION_MAJOR: u16 = 1;
/// ABI minor version, bumped on additive changes
pub const ABI_VERSION_MINOR: u16 = 0;
/// `major << 16 | minor`
pub const ABI_VERSION: u32 = (ABI_VERSION_MAJOR as u32) << 16 | ABI_VERSION_MINOR as u32;

/// Name of the exported manifest function
pub const MANIFEST_SYMBOL: &str = "loam_plugin_manifest";

/// Type flag: this type is a component
pub const COMPONENT_MARKER: u32 = 1 << 0;

/// Field type codes
pub mod type_code {
    /// `f32`
    pub const F32: u32 = 1;
    /// `i32`
    pub const I32: u32 = 2;
    /// `u8`, zero is false
    pub const BOOL: u32 = 3;
    /// `[f32; 2]`
    pub const VEC2: u32 = 4;
    /// `[f32; 4]` rgba
    pub const COLOR: u32 = 5;
    /// `[f32; 4]` x, y, width, height
    pub const RECT: u32 = 6;
    /// `i32` variant index, names in `enum_variants`
    pub const ENUM_I32: u32 = 7;
    /// `[u8; 16]` entity reference, all zero for none. Canonical UUID text
    /// is stored as its uuid bytes; any other identifier as a host reference
    /// starting with [`GUID_REF_TAG`](super::GUID_REF_TAG). Equal identifiers
    /// always have equal bytes within one load of a module.
    pub const GUID: u32 = 8;
    /// Host must not interpret the bytes
    pub const OPAQUE: u32 = 0xFFFF;
}

/// First 8 bytes of a `GUID` field that holds a host reference instead of
/// uuid bytes. The remaining 8 bytes are a host-assigned index.
pub const GUID_REF_TAG: [u8; 8] = *b"loamref\0";

/// Signature of the exported manifest function
pub type ManifestFn = unsafe extern "C" fn() -> *const PluginManifest;

/// Writes a default value of a type into uninitialized, suitably sized memory
pub type WriteDefaultFn = unsafe extern "C" fn(dst: *mut u8);

/// Root table exported by a plugin module
#[repr(C)]
pub struct PluginManifest {
    pub abi_version: u32,
    /// Module display name, nul-terminated
    pub name: *const c_char,
    pub types: *const TypeExport,
    pub type_count: usize,
}

/// One exported value type
#[repr(C)]
pub struct TypeExport {
    /// Nul-terminated type name, becomes the component name
    pub name: *const c_char,
    /// Optional nul-terminated grouping label
    pub category: *const c_char,
    pub flags: u32,
    pub size: usize,
    pub align: usize,
    pub write_default: Option<WriteDefaultFn>,
    pub fields: *const FieldExport,
    pub field_count: usize,
}

/// One field of an exported type
#[repr(C)]
pub struct FieldExport {
    pub name: *const c_char,
    pub type_code: u32,
    /// Byte offset within the value
    pub offset: usize,
    /// For `ENUM_I32`: nul-terminated `'|'`-separated variant names
    pub enum_variants: *const c_char,
}

// Tables are immutable statics.
unsafe impl Sync for PluginManifest {}
unsafe impl Sync for TypeExport {}
unsafe impl Sync for FieldExport {}

impl PluginManifest {
    pub const fn new(name: *const c_char, types: &'static [TypeExport]) -> Self {
        Self {
            abi_version: ABI_VERSION,
            name,
            types: types.as_ptr(),
            type_count: types.len(),
        }
    }
}

impl TypeExport {
    /// Export `T` as a component
    pub const fn component<T: Default>(
        name: *const c_char,
        category: *const c_char,
        fields: &'static [FieldExport],
    ) -> Self {
        Self::value::<T>(name, category, COMPONENT_MARKER, fields)
    }

    /// Export `T` with explicit flags
    pub const fn value<T: Default>(
        name: *const c_char,
        category: *const c_char,
        flags: u32,
        fields: &'static [FieldExport],
    ) -> Self {
        Self {
            name,
            category,
            flags,
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            write_default: Some(write_default::<T>),
            fields: fields.as_ptr(),
            field_count: fields.len(),
        }
    }

    #[inline]
    pub const fn is_component(&self) -> bool {
        self.flags & COMPONENT_MARKER != 0
    }
}

impl FieldExport {
    pub const fn new(name: *const c_char, type_code: u32, offset: usize) -> Self {
        Self {
            name,
            type_code,
            offset,
            enum_variants: std::ptr::null(),
        }
    }

    pub const fn enumeration(name: *const c_char, offset: usize, variants: *const c_char) -> Self {
        Self {
            name,
            type_code: type_code::ENUM_I32,
            offset,
            enum_variants: variants,
        }
    }
}

/// Default constructor usable as [`TypeExport::write_default`].
///
/// `T` must have no implicit padding; the host copies every byte written.
pub unsafe extern "C" fn write_default<T: Default>(dst: *mut u8) {
    dst.cast::<T>().write_unaligned(T::default());
}

/// Nul-terminated C string pointer from a literal
#[macro_export]
macro_rules! cstr {
    ($s:expr) => {
        concat!($s, "\0").as_ptr() as *const ::std::os::raw::c_char
    };
}

/// Export `loam_plugin_manifest` returning the given static manifest
#[macro_export]
macro_rules! declare_plugin {
    ($manifest:path) => {
        #[no_mangle]
        pub unsafe extern "C" fn loam_plugin_manifest() -> *const $crate::PluginManifest {
            &$manifest
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Default)]
    struct Pair {
        a: f32,
        b: i32,
    }

    static FIELDS: [FieldExport; 2] = [
        FieldExport::new(cstr!("A"), type_code::F32, std::mem::offset_of!(Pair, a)),
        FieldExport::new(cstr!("B"), type_code::I32, std::mem::offset_of!(Pair, b)),
    ];
    static TYPES: [TypeExport; 1] = [TypeExport::component::<Pair>(cstr!("Pair"), std::ptr::null(), &FIELDS)];
    static MANIFEST: PluginManifest = PluginManifest::new(cstr!("test"), &TYPES);

    #[test]
    fn test_tables() {
        assert_eq!(MANIFEST.abi_version, ABI_VERSION);
        assert_eq!(MANIFEST.type_count, 1);
        let ty = &TYPES[0];
        assert!(ty.is_component());
        assert_eq!(ty.size, 8);
        assert_eq!(ty.field_count, 2);
        assert_eq!(FIELDS[1].offset, 4);
    }

    #[test]
    fn test_write_default() {
        let mut bytes = [0xAAu8; 8];
        unsafe { write_default::<Pair>(bytes.as_mut_ptr()) };
        assert_eq!(bytes, [0u8; 8]);
    }
}
