//! Scene entities.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graphics::BillboardGraphics;
use crate::math::Cartesian3;
use crate::property::Property;
use crate::time::{SceneTime, TimeInterval};

/// Unique key of an entity within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique key
    #[serde(default = "EntityId::generate")]
    pub id: EntityId,
    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Entity-level visibility, independent of any graphics bundle
    #[serde(default = "default_show")]
    pub show: bool,
    /// Times at which the entity exists; absent means always
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability: Vec<TimeInterval>,
    /// Time-varying position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Property<Cartesian3>>,
    /// Billboard attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billboard: Option<BillboardGraphics>,
}

fn default_show() -> bool {
    true
}

impl Entity {
    /// Creates a visible entity with no attributes.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            show: true,
            availability: Vec::new(),
            position: None,
            billboard: None,
        }
    }

    /// Sets the position property.
    pub fn with_position(mut self, position: Property<Cartesian3>) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the billboard bundle.
    pub fn with_billboard(mut self, billboard: BillboardGraphics) -> Self {
        self.billboard = Some(billboard);
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts the entity to the given availability interval.
    pub fn with_availability(mut self, interval: TimeInterval) -> Self {
        self.availability.push(interval);
        self
    }

    pub fn is_showing(&self) -> bool {
        self.show
    }

    /// Checks whether the entity exists at `time`.
    pub fn is_available(&self, time: SceneTime) -> bool {
        self.availability.is_empty() || self.availability.iter().any(|iv| iv.contains(time))
    }

    /// An entity can be drawn as a billboard only with both a bundle and a position.
    pub fn is_billboard_eligible(&self) -> bool {
        self.billboard.is_some() && self.position.is_some()
    }
}
