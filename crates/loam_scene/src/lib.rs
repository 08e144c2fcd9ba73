//! # loam_scene - entity graphs as JSON documents
//!
//! ```text
//! World ──EntityGraphCodec::serialize──► SceneDocument ──to_json──► text
//!   ▲                                                                 │
//!   └──────deserialize (two passes)◄── SceneDocument ◄──parse─────────┘
//! ```
//!
//! Every component value goes through its descriptor in the
//! [`ComponentTypeRegistry`](loam_reflect::ComponentTypeRegistry), so plugin
//! components round-trip exactly like compiled-in ones.

pub mod codec;
pub mod document;
pub mod error;
pub mod issue;
pub mod prefab;

pub use codec::{EntityGraphCodec, IdentityMode, LoadedGraph};
pub use document::{
    load_scene, save_scene, EntityRecord, ParsedScene, SceneDocument, SCENE_FORMAT_VERSION,
};
pub use error::{Result, SceneError};
pub use issue::LoadIssue;
pub use prefab::{copy_entities, instantiate_prefab, paste_entities, CLIPBOARD_NAME};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::codec::{EntityGraphCodec, IdentityMode, LoadedGraph};
    pub use crate::document::{EntityRecord, SceneDocument};
    pub use crate::issue::LoadIssue;
    pub use crate::prefab::{copy_entities, instantiate_prefab, paste_entities};
}
