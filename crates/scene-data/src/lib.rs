//! Scene data for billboard visualization.
//!
//! This crate contains the data side of the pipeline: scene time, value
//! types, time-varying properties, entities and the observable collection
//! that holds them. It has no rendering logic and is a dependency for the
//! other crates in the workspace.

pub mod collection;
pub mod entity;
pub mod graphics;
pub mod math;
pub mod property;
pub mod scene;
pub mod time;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export time types
pub use time::{ParseTimeError, SceneTime, TimeInterval};

// Re-export value types
pub use math::{
    BoundingRectangle, BoundingSphere, Cartesian2, Cartesian3, Color, DistanceDisplayCondition,
    NearFarScalar,
};

// Re-export property types
pub use property::{is_constant, value_or_default, value_or_none, Property, PropertyValue};

// Re-export entity types
pub use entity::{Entity, EntityId};
pub use graphics::{BillboardGraphics, HeightReference, HorizontalOrigin, VerticalOrigin};

// Re-export collection types
pub use collection::{
    ChangeListener, CollectionChanged, CollectionError, EntityCollection, ListenerId,
};

// Re-export scene types
pub use scene::{SceneClock, SceneDocument, SceneError};
