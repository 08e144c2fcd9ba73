//! # loam_core - shared primitives
//!
//! Small value types every other loam crate builds on:
//!
//! - [`Guid`] - stable string identity for entities across save/load
//! - [`Vec2`], [`Color`], [`Rect`] - the math values component fields are made of
//! - [`Version`] - compatibility checks for scene formats and plugin ABIs

pub mod guid;
pub mod math;
pub mod version;

pub use guid::Guid;
pub use math::{Color, Rect, Vec2};
pub use version::Version;

/// Prelude for common imports
pub mod prelude {
    pub use crate::guid::Guid;
    pub use crate::math::{Color, Rect, Vec2};
    pub use crate::version::Version;
}
