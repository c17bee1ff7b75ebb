//! JSON scene documents.
//!
//! A scene document is a list of entities plus an optional playback clock.
//! Loading one and feeding it to [`crate::EntityCollection::replace_all`] is
//! how hosts populate and refresh a collection.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::entity::Entity;
use crate::time::SceneTime;

/// Errors that can occur while loading a scene document.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scene: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Suggested playback settings for a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneClock {
    /// Time at which playback starts
    pub start: SceneTime,
    /// Time at which playback stops, if bounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<SceneTime>,
    /// Scene seconds per wall-clock second
    pub multiplier: f64,
    /// Whether playback wraps from stop back to start
    pub looping: bool,
}

impl Default for SceneClock {
    fn default() -> Self {
        Self {
            start: SceneTime::EPOCH,
            stop: None,
            multiplier: 1.0,
            looping: false,
        }
    }
}

/// A scene loaded from JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub clock: SceneClock,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Entities that had no `id` in the source and were given a random one.
    ///
    /// Those ids change on every parse, so reloading the same file replaces
    /// these entities instead of updating them.
    #[serde(skip)]
    pub generated_ids: usize,
}

impl SceneDocument {
    /// Loads a scene from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a scene from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, SceneError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let generated_ids = value
            .get("entities")
            .and_then(serde_json::Value::as_array)
            .map_or(0, |entities| {
                entities.iter().filter(|e| e.get("id").is_none()).count()
            });

        let mut document: SceneDocument = serde_json::from_value(value)?;
        document.generated_ids = generated_ids;
        tracing::debug!(
            "Parsed scene {:?} with {} entities ({} without id)",
            document.name,
            document.entities.len(),
            generated_ids
        );
        Ok(document)
    }

    /// Serializes the scene as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::BillboardGraphics;
    use crate::math::Cartesian3;
    use crate::property::Property;
    use std::io::Write;

    #[test]
    fn test_empty_scene() {
        let scene = SceneDocument::from_json("{}").unwrap();
        assert!(scene.entities.is_empty());
        assert_eq!(scene.clock, SceneClock::default());
    }

    #[test]
    fn test_scene_json_roundtrip() {
        let scene = SceneDocument {
            name: Some("harbor".into()),
            clock: SceneClock {
                stop: Some(SceneTime::from_seconds(60.0)),
                looping: true,
                ..SceneClock::default()
            },
            entities: vec![Entity::new("buoy")
                .with_position(Property::constant(Cartesian3::new(1.0, 2.0, 0.0)))
                .with_billboard(BillboardGraphics::with_image("buoy.png"))],
            generated_ids: 0,
        };

        let json = scene.to_json().unwrap();
        assert_eq!(SceneDocument::from_json(&json).unwrap(), scene);
    }

    #[test]
    fn test_scene_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"entities":[{{"id":"a"}},{{"id":"b"}}]}}"#).unwrap();

        let scene = SceneDocument::from_file(file.path()).unwrap();
        assert_eq!(scene.entities.len(), 2);
    }

    #[test]
    fn test_scene_counts_generated_ids() {
        let json = r#"{"entities":[{"id":"a"},{},{"name":"anonymous"}]}"#;
        let first = SceneDocument::from_json(json).unwrap();
        let second = SceneDocument::from_json(json).unwrap();

        assert_eq!(first.generated_ids, 2);
        assert_eq!(first.entities[0].id.as_str(), "a");
        // Missing ids differ between parses of the same text
        assert_ne!(first.entities[1].id, second.entities[1].id);

        let explicit = SceneDocument::from_json(r#"{"entities":[{"id":"a"}]}"#).unwrap();
        assert_eq!(explicit.generated_ids, 0);
    }

    #[test]
    fn test_scene_errors() {
        assert!(matches!(
            SceneDocument::from_json("{ not json"),
            Err(SceneError::Parse(_))
        ));
        assert!(matches!(
            SceneDocument::from_file(Path::new("/definitely/not/here.json")),
            Err(SceneError::Io(_))
        ));
    }
}
