//! Billboard attribute bundle carried by entities.

use serde::{Deserialize, Serialize};

use crate::math::{
    BoundingRectangle, Cartesian2, Cartesian3, Color, DistanceDisplayCondition, NearFarScalar,
};
use crate::property::Property;

/// How a primitive's position relates to the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeightReference {
    /// Position is used as given.
    #[default]
    None,
    /// Position is clamped to the ground surface.
    ClampToGround,
    /// Height is measured from the ground surface.
    RelativeToGround,
}

/// Horizontal anchor of a billboard relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalOrigin {
    #[default]
    Center,
    Left,
    Right,
}

/// Vertical anchor of a billboard relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerticalOrigin {
    #[default]
    Center,
    Bottom,
    Baseline,
    Top,
}

/// Time-varying billboard attributes of an entity.
///
/// Every field is optional; visualizers substitute their own defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillboardGraphics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<Property<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Property<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Property<Color>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_offset: Option<Property<Cartesian3>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_reference: Option<Property<HeightReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_offset: Option<Property<Cartesian2>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Property<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Property<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aligned_axis: Option<Property<Cartesian3>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_origin: Option<Property<HorizontalOrigin>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_origin: Option<Property<VerticalOrigin>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Property<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Property<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_by_distance: Option<Property<NearFarScalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translucency_by_distance: Option<Property<NearFarScalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_offset_scale_by_distance: Option<Property<NearFarScalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_in_meters: Option<Property<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_display_condition: Option<Property<DistanceDisplayCondition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_sub_region: Option<Property<BoundingRectangle>>,
}

impl BillboardGraphics {
    /// Creates a bundle with a constant image and nothing else set.
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            image: Some(Property::constant(image.into())),
            ..Default::default()
        }
    }

    /// Sets the show property.
    pub fn show(mut self, show: Property<bool>) -> Self {
        self.show = Some(show);
        self
    }

    /// Sets the color property.
    pub fn color(mut self, color: Property<Color>) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the scale property.
    pub fn scale(mut self, scale: Property<f64>) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Sets the height reference property.
    pub fn height_reference(mut self, height_reference: Property<HeightReference>) -> Self {
        self.height_reference = Some(height_reference);
        self
    }

    /// Sets the image sub-region property.
    pub fn image_sub_region(mut self, region: Property<BoundingRectangle>) -> Self {
        self.image_sub_region = Some(region);
        self
    }
}
