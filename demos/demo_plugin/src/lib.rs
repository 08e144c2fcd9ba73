//! Example plugin module
//!
//! Build with `cargo build -p demo_plugin` and point `loam --plugin` at the
//! resulting shared library. Exports two components, `Spinner` and `Wander`,
//! and one plain settings type that the host ignores.

use std::mem::offset_of;

use loam_plugin_api::{
    cstr, declare_plugin, type_code, FieldExport, PluginManifest, TypeExport,
};

/// Rotates its entity at a fixed rate
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spinner {
    pub speed: f32,
    pub turns: i32,
    pub enabled: u8,
    _pad: [u8; 3],
    pub axis: [f32; 2],
    pub glow: [f32; 4],
    pub easing: i32,
    pub anchor: [u8; 16],
    /// Runtime state, never shown to tooling
    pub scratch: u64,
}

impl Default for Spinner {
    fn default() -> Self {
        Self {
            speed: 90.0,
            turns: 0,
            enabled: 1,
            _pad: [0; 3],
            axis: [0.0, 1.0],
            glow: [1.0, 1.0, 1.0, 1.0],
            easing: 0,
            anchor: [0; 16],
            scratch: 0,
        }
    }
}

/// Drifts its entity around inside a rectangle
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wander {
    pub radius: f32,
    pub bounds: [f32; 4],
    pub target_layer: i32,
}

impl Default for Wander {
    fn default() -> Self {
        Self {
            radius: 2.0,
            bounds: [-8.0, -8.0, 16.0, 16.0],
            target_layer: 0,
        }
    }
}

/// Module-wide tuning, not a component
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SpinnerSettings {
    pub max_speed: f32,
}

static SPINNER_FIELDS: [FieldExport; 8] = [
    FieldExport::new(cstr!("Speed"), type_code::F32, offset_of!(Spinner, speed)),
    FieldExport::new(cstr!("Turns"), type_code::I32, offset_of!(Spinner, turns)),
    FieldExport::new(cstr!("Enabled"), type_code::BOOL, offset_of!(Spinner, enabled)),
    FieldExport::new(cstr!("Axis"), type_code::VEC2, offset_of!(Spinner, axis)),
    FieldExport::new(cstr!("Glow"), type_code::COLOR, offset_of!(Spinner, glow)),
    FieldExport::enumeration(
        cstr!("Easing"),
        offset_of!(Spinner, easing),
        cstr!("Constant|EaseIn|EaseOut"),
    ),
    FieldExport::new(cstr!("Anchor"), type_code::GUID, offset_of!(Spinner, anchor)),
    FieldExport::new(cstr!("Scratch"), type_code::OPAQUE, offset_of!(Spinner, scratch)),
];

static WANDER_FIELDS: [FieldExport; 3] = [
    FieldExport::new(cstr!("Radius"), type_code::F32, offset_of!(Wander, radius)),
    FieldExport::new(cstr!("Bounds"), type_code::RECT, offset_of!(Wander, bounds)),
    FieldExport::new(cstr!("TargetLayer"), type_code::I32, offset_of!(Wander, target_layer)),
];

static SETTINGS_FIELDS: [FieldExport; 1] = [FieldExport::new(
    cstr!("MaxSpeed"),
    type_code::F32,
    offset_of!(SpinnerSettings, max_speed),
)];

static TYPES: [TypeExport; 3] = [
    TypeExport::component::<Spinner>(cstr!("Spinner"), cstr!("Motion"), &SPINNER_FIELDS),
    TypeExport::component::<Wander>(cstr!("Wander"), cstr!("AI"), &WANDER_FIELDS),
    TypeExport::value::<SpinnerSettings>(cstr!("SpinnerSettings"), std::ptr::null(), 0, &SETTINGS_FIELDS),
];

static MANIFEST: PluginManifest = PluginManifest::new(cstr!("demo"), &TYPES);

declare_plugin!(MANIFEST);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_has_no_padding() {
        use std::mem::size_of;

        // Every byte belongs to a member, so default values are fully written
        let spinner_members = 4 + 4 + 1 + 3 + 8 + 16 + 4 + 16 + 8;
        assert_eq!(size_of::<Spinner>(), spinner_members);
        assert_eq!(offset_of!(Spinner, axis), 12);
        assert_eq!(size_of::<Wander>(), 4 + 16 + 4);
        assert_eq!(size_of::<SpinnerSettings>(), 4);
    }

    #[test]
    fn test_manifest_symbol() {
        let manifest = unsafe { &*loam_plugin_manifest() };
        assert_eq!(manifest.type_count, 3);
        assert!(TYPES[0].is_component());
        assert!(!TYPES[2].is_component());
    }
}
