//! Renderable billboard primitive.
//!
//! A [`Billboard`] is what a host renderer draws: fully resolved values, no
//! time dependence. Visualizers write into it every frame; the host reads it.

use scene_data::{
    BoundingRectangle, Cartesian2, Cartesian3, Color, DistanceDisplayCondition, EntityId,
    HeightReference, HorizontalOrigin, NearFarScalar, VerticalOrigin,
};
use serde::Serialize;

/// Index of a billboard inside its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BillboardId(pub usize);

/// A screen-aligned image anchored at a 3D position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Billboard {
    /// Entity this billboard currently represents
    pub id: Option<EntityId>,
    pub show: bool,
    pub position: Cartesian3,
    pub color: Color,
    pub eye_offset: Cartesian3,
    pub height_reference: HeightReference,
    pub pixel_offset: Cartesian2,
    pub scale: f64,
    pub rotation: f64,
    pub aligned_axis: Cartesian3,
    pub horizontal_origin: HorizontalOrigin,
    pub vertical_origin: VerticalOrigin,
    /// Width in pixels; `None` uses the image width
    pub width: Option<f64>,
    /// Height in pixels; `None` uses the image height
    pub height: Option<f64>,
    pub scale_by_distance: Option<NearFarScalar>,
    pub translucency_by_distance: Option<NearFarScalar>,
    pub pixel_offset_scale_by_distance: Option<NearFarScalar>,
    pub size_in_meters: bool,
    pub distance_display_condition: Option<DistanceDisplayCondition>,
    image: Option<String>,
    image_id: Option<String>,
    image_loads: u64,
    image_sub_region: Option<BoundingRectangle>,
    clamped_position: Option<Cartesian3>,
}

impl Default for Billboard {
    fn default() -> Self {
        Self {
            id: None,
            show: true,
            position: Cartesian3::ZERO,
            color: Color::WHITE,
            eye_offset: Cartesian3::ZERO,
            height_reference: HeightReference::None,
            pixel_offset: Cartesian2::ZERO,
            scale: 1.0,
            rotation: 0.0,
            aligned_axis: Cartesian3::ZERO,
            horizontal_origin: HorizontalOrigin::Center,
            vertical_origin: VerticalOrigin::Center,
            width: None,
            height: None,
            scale_by_distance: None,
            translucency_by_distance: None,
            pixel_offset_scale_by_distance: None,
            size_in_meters: false,
            distance_display_condition: None,
            image: None,
            image_id: None,
            image_loads: 0,
            image_sub_region: None,
            clamped_position: None,
        }
    }
}

impl Billboard {
    /// The image reference currently bound, if any.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Identifier of the bound image in the texture atlas.
    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    /// Binds a new image, or unbinds with `None`.
    ///
    /// Binding counts as a texture upload. Any sub-region of the previous
    /// image is dropped.
    pub fn set_image(&mut self, image: Option<String>) {
        self.image_sub_region = None;
        self.image_id = image.clone();
        if image.is_some() {
            self.image_loads += 1;
        }
        self.image = image;
    }

    /// Number of texture uploads this billboard has performed.
    pub fn image_loads(&self) -> u64 {
        self.image_loads
    }

    /// Restricts drawing to a region of the image `image_id`.
    ///
    /// Ignored unless `image_id` is the bound image. Returns whether it applied.
    pub fn set_image_sub_region(&mut self, image_id: &str, region: BoundingRectangle) -> bool {
        if self.image_id.as_deref() != Some(image_id) {
            return false;
        }
        self.image_sub_region = Some(region);
        true
    }

    pub fn image_sub_region(&self) -> Option<BoundingRectangle> {
        self.image_sub_region
    }

    /// Ground-clamped position, once the host has computed it.
    pub fn clamped_position(&self) -> Option<Cartesian3> {
        self.clamped_position
    }

    pub fn set_clamped_position(&mut self, position: Option<Cartesian3>) {
        self.clamped_position = position;
    }
}
