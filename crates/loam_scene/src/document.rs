//! Scene documents on the wire
//!
//! ```json
//! { "version": 1, "name": "Level 1", "entities": [
//!     { "guid": "…", "name": "Player", "parentGuid": "…",
//!       "components": { "Position": { "x": 0.0, "y": 0.0 } } } ] }
//! ```
//!
//! Component values are opaque here; only their descriptors know the shape.

use std::collections::BTreeMap;
use std::path::Path;

use loam_core::Guid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SceneError};
use crate::issue::LoadIssue;

/// Format version written by this build
pub const SCENE_FORMAT_VERSION: u32 = 1;

/// One serialized entity
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub guid: Guid,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_guid: Option<Guid>,
    /// Descriptor name to encoded value
    #[serde(default)]
    pub components: BTreeMap<String, Value>,
}

impl EntityRecord {
    pub fn new(guid: Guid, name: impl Into<String>) -> Self {
        Self {
            guid,
            name: name.into(),
            parent_guid: None,
            components: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: Guid) -> Self {
        self.parent_guid = Some(parent);
        self
    }

    pub fn with_component(mut self, name: impl Into<String>, value: Value) -> Self {
        self.components.insert(name.into(), value);
        self
    }
}

/// A named, ordered list of entity records
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneDocument {
    pub version: u32,
    pub name: String,
    pub entities: Vec<EntityRecord>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new("")
    }
}

/// A parsed document plus the records that had to be dropped
#[derive(Debug)]
pub struct ParsedScene {
    pub document: SceneDocument,
    pub issues: Vec<LoadIssue>,
}

impl SceneDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SCENE_FORMAT_VERSION,
            name: name.into(),
            entities: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Parse a document, skipping malformed entity records.
    ///
    /// Only a top level that is not a JSON object, or a structurally wrong
    /// `version` or `entities` entry, fails the whole parse.
    pub fn parse(text: &str) -> Result<ParsedScene> {
        let root: Value = serde_json::from_str(text).map_err(|e| SceneError::Parse(e.to_string()))?;
        let Value::Object(mut root) = root else {
            return Err(SceneError::Parse("top level must be an object".into()));
        };

        let version = match root.get("version") {
            None => SCENE_FORMAT_VERSION,
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| SceneError::Parse(format!("invalid version {}", v)))?,
        };
        let name = root
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if version > SCENE_FORMAT_VERSION {
            log::warn!(
                "Scene '{}' has format version {}, newer than {}; loading what can be read",
                name,
                version,
                SCENE_FORMAT_VERSION
            );
        }

        let records = match root.remove("entities") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(SceneError::Parse("'entities' must be an array".into())),
        };

        let mut entities = Vec::with_capacity(records.len());
        let mut issues = Vec::new();
        for (index, raw) in records.into_iter().enumerate() {
            match serde_json::from_value::<EntityRecord>(raw) {
                Ok(record) => entities.push(record),
                Err(e) => {
                    log::warn!("Skipping entity record #{}: {}", index, e);
                    issues.push(LoadIssue::MalformedRecord {
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(ParsedScene {
            document: SceneDocument {
                version,
                name,
                entities,
            },
            issues,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SceneError::Serialize(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SceneError::Serialize(e.to_string()))
    }
}

/// Write a document to disk
pub fn save_scene(path: impl AsRef<Path>, document: &SceneDocument, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let text = if pretty {
        document.to_json_pretty()?
    } else {
        document.to_json_string()?
    };
    std::fs::write(path, text).map_err(|e| SceneError::io(path, e))?;
    log::debug!("Saved scene '{}' to {}", document.name, path.display());
    Ok(())
}

/// Read and parse a document from disk
pub fn load_scene(path: impl AsRef<Path>) -> Result<ParsedScene> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
    SceneDocument::parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let mut doc = SceneDocument::new("Level");
        doc.entities.push(
            EntityRecord::new(Guid::from("b"), "Child")
                .with_parent(Guid::from("a"))
                .with_component("Position", json!({ "x": 1.0, "y": 2.0 })),
        );
        doc.entities.push(EntityRecord::new(Guid::from("a"), "Root"));

        let value: Value = serde_json::from_str(&doc.to_json_string().unwrap()).unwrap();
        assert_eq!(value["version"], json!(1));
        assert_eq!(value["entities"][0]["parentGuid"], json!("a"));
        assert!(value["entities"][1].get("parentGuid").is_none());
        assert_eq!(value["entities"][0]["components"]["Position"]["x"], json!(1.0));
    }

    #[test]
    fn test_parse_skips_bad_records() {
        let text = r#"{
            "version": 1,
            "name": "Mixed",
            "entities": [
                { "guid": "1", "name": "Good" },
                { "guid": 42 },
                "not a record",
                { "guid": "2", "components": { "Velocity": {} } }
            ]
        }"#;
        let parsed = SceneDocument::parse(text).unwrap();
        assert_eq!(parsed.document.name, "Mixed");
        assert_eq!(parsed.document.len(), 2);
        assert_eq!(parsed.issues.len(), 2);
        assert!(matches!(parsed.issues[0], LoadIssue::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(SceneDocument::parse("[1, 2]"), Err(SceneError::Parse(_))));
        assert!(matches!(SceneDocument::parse("{ nope"), Err(SceneError::Parse(_))));
        assert!(matches!(
            SceneDocument::parse(r#"{ "entities": {} }"#),
            Err(SceneError::Parse(_))
        ));
    }

    #[test]
    fn test_newer_version_still_loads() {
        let parsed = SceneDocument::parse(r#"{ "version": 9, "entities": [{ "guid": "x" }] }"#).unwrap();
        assert_eq!(parsed.document.version, 9);
        assert_eq!(parsed.document.len(), 1);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let mut doc = SceneDocument::new("Saved");
        doc.entities.push(EntityRecord::new(Guid::from("g"), "One"));

        save_scene(&path, &doc, true).unwrap();
        let parsed = load_scene(&path).unwrap();
        assert_eq!(parsed.document, doc);
        assert!(parsed.issues.is_empty());

        let missing = load_scene(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, SceneError::Io { .. }));
    }
}
