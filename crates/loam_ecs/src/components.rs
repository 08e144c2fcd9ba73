//! Built-in component data
//!
//! Every entity carries [`Position`], [`Rotation`] and [`Scale`]. [`EntityName`]
//! and [`EntityGuid`] are bookkeeping written by the scene layer. The rest are
//! ordinary gameplay components that scenes may or may not use.

use loam_core::{Color, Guid, Rect, Vec2};
use serde::{Deserialize, Serialize};

// ============================================================================
// Core transform
// ============================================================================

/// World position
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for Position {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Rotation in radians, counter-clockwise
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub radians: f32,
}

impl Rotation {
    pub const fn new(radians: f32) -> Self {
        Self { radians }
    }

    pub fn from_degrees(degrees: f32) -> Self {
        Self::new(degrees.to_radians())
    }
}

/// Non-uniform scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    pub const ONE: Scale = Scale::new(1.0, 1.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<Vec2> for Scale {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

// ============================================================================
// Bookkeeping
// ============================================================================

/// Display name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityName(pub String);

impl EntityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity that survives save/load
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityGuid(pub Guid);

impl EntityGuid {
    pub fn new(guid: Guid) -> Self {
        Self(guid)
    }

    pub fn guid(&self) -> &Guid {
        &self.0
    }
}

// ============================================================================
// Rendering / camera / physics
// ============================================================================

/// How a sprite is composited
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
    Multiply,
}

impl BlendMode {
    pub const NAMES: &'static [&'static str] = &["Alpha", "Additive", "Multiply"];

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Alpha),
            1 => Some(Self::Additive),
            2 => Some(Self::Multiply),
            _ => None,
        }
    }
}

/// Textured quad
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteRenderer {
    /// Texture asset path
    pub texture: String,
    pub tint: Color,
    /// Draw order, higher draws later
    pub layer: i32,
    pub flip_x: bool,
    pub blend: BlendMode,
    /// Region of the texture in pixels; zero size means the whole texture
    pub source_rect: Rect,
}

impl Default for SpriteRenderer {
    fn default() -> Self {
        Self {
            texture: String::new(),
            tint: Color::WHITE,
            layer: 0,
            flip_x: false,
            blend: BlendMode::Alpha,
            source_rect: Rect::default(),
        }
    }
}

/// Camera that tracks another entity by guid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraFollow {
    /// Entity to follow; empty for none
    pub target: Guid,
    /// 0 snaps, values toward 1 lag behind
    pub smoothing: f32,
    pub offset: Vec2,
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self {
            target: Guid::empty(),
            smoothing: 0.1,
            offset: Vec2::ZERO,
        }
    }
}

/// Axis-aligned collision box, relative to the entity position
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxCollider {
    pub bounds: Rect,
    pub is_trigger: bool,
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            bounds: Rect::centered(1.0, 1.0),
            is_trigger: false,
        }
    }
}

/// Linear velocity in units per second
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Velocity {
    pub linear: Vec2,
}

impl Velocity {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            linear: Vec2::new(x, y),
        }
    }
}
