//! Billboard rendering: mirrors pool billboards into Bevy sprites.
//!
//! Each pool slot gets one sprite entity. Released slots keep their sprite
//! but hide it, so recycled billboards reuse the same Bevy entity.

use bevy::prelude::*;
use bevy::sprite::Anchor;
use billboard_visualizer::{Billboard, BillboardId};
use scene_data::{Cartesian3, HeightReference, HorizontalOrigin, VerticalOrigin};
use std::collections::HashMap;

use crate::plugin::VizSet;
use crate::runtime::SceneRuntime;

/// Image references with this prefix are drawn as plain tinted quads.
pub const BUILTIN_IMAGE_PREFIX: &str = "builtin:";

/// Sprite size when a billboard has no width or height.
const DEFAULT_SPRITE_SIZE: f32 = 16.0;

/// Plugin for billboard sprite rendering.
pub struct SpritePlugin;

impl Plugin for SpritePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpriteSettings>()
            .init_resource::<SpriteIndex>()
            .add_systems(Update, sync_sprites.in_set(VizSet::Render));
    }
}

/// Mapping from scene units to screen pixels.
#[derive(Resource, Debug, Clone)]
pub struct SpriteSettings {
    /// Screen pixels per scene meter at zoom 1.0.
    pub pixels_per_meter: f32,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        Self {
            pixels_per_meter: 4.0,
        }
    }
}

impl SpriteSettings {
    /// Projects a scene position onto the 2D world plane.
    pub fn to_world(&self, position: Cartesian3) -> Vec2 {
        Vec2::new(position.x as f32, position.y as f32) * self.pixels_per_meter
    }
}

/// Component linking a sprite to its pool slot.
#[derive(Component)]
pub struct BillboardSprite {
    /// Pool slot this sprite mirrors.
    pub slot: BillboardId,
    /// Upload counter of the billboard when the texture was last set.
    pub image_loads: u64,
}

/// Resource mapping pool slots to sprite entities.
#[derive(Resource, Default)]
pub struct SpriteIndex {
    pub map: HashMap<BillboardId, Entity>,
}

/// Everything a sprite needs from a billboard, except its texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteState {
    pub visible: bool,
    pub translation: Vec3,
    pub rotation: f32,
    pub scale: f32,
    pub color: Color,
    pub anchor: Anchor,
    pub custom_size: Option<Vec2>,
    pub rect: Option<Rect>,
}

impl SpriteState {
    /// Derives the sprite state from a billboard.
    pub fn from_billboard(billboard: &Billboard, settings: &SpriteSettings) -> Self {
        // Ground-referenced billboards are drawn where the ground put them.
        let position = match billboard.height_reference {
            HeightReference::None => billboard.position,
            _ => billboard.clamped_position().unwrap_or(billboard.position),
        };
        let world = settings.to_world(position);
        // Screen-space offset: +y is down
        let offset = Vec2::new(
            billboard.pixel_offset.x as f32,
            -(billboard.pixel_offset.y as f32),
        );

        let width = billboard.width.map_or(DEFAULT_SPRITE_SIZE, |w| w as f32);
        let height = billboard.height.map_or(DEFAULT_SPRITE_SIZE, |h| h as f32);
        let size = if billboard.size_in_meters {
            Vec2::new(width, height) * settings.pixels_per_meter
        } else {
            Vec2::new(width, height)
        };

        let color = billboard.color;
        Self {
            visible: billboard.show && billboard.id.is_some(),
            // Higher billboards are drawn on top
            translation: (world + offset).extend(1.0 + position.z as f32 * 1e-4),
            rotation: billboard.rotation as f32,
            scale: billboard.scale as f32,
            color: Color::srgba(
                color.red as f32,
                color.green as f32,
                color.blue as f32,
                color.alpha as f32,
            ),
            anchor: anchor_for(billboard.horizontal_origin, billboard.vertical_origin),
            custom_size: Some(size),
            rect: billboard.image_sub_region().map(|r| {
                Rect::new(
                    r.x as f32,
                    r.y as f32,
                    (r.x + r.width) as f32,
                    (r.y + r.height) as f32,
                )
            }),
        }
    }

    fn apply(&self, sprite: &mut Sprite, transform: &mut Transform, visibility: &mut Visibility) {
        sprite.color = self.color;
        sprite.anchor = self.anchor.clone();
        sprite.custom_size = self.custom_size;
        sprite.rect = self.rect;
        transform.translation = self.translation;
        transform.rotation = Quat::from_rotation_z(self.rotation);
        transform.scale = Vec3::splat(self.scale);
        *visibility = if self.visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }
}

/// Maps billboard origins to a sprite anchor.
///
/// The origin names the side of the image that sits on the position, so a
/// left origin puts the image to the right of its anchor point.
pub fn anchor_for(horizontal: HorizontalOrigin, vertical: VerticalOrigin) -> Anchor {
    use HorizontalOrigin as H;
    use VerticalOrigin as V;
    match (horizontal, vertical) {
        (H::Center, V::Center) => Anchor::Center,
        (H::Left, V::Center) => Anchor::CenterLeft,
        (H::Right, V::Center) => Anchor::CenterRight,
        (H::Center, V::Bottom | V::Baseline) => Anchor::BottomCenter,
        (H::Left, V::Bottom | V::Baseline) => Anchor::BottomLeft,
        (H::Right, V::Bottom | V::Baseline) => Anchor::BottomRight,
        (H::Center, V::Top) => Anchor::TopCenter,
        (H::Left, V::Top) => Anchor::TopLeft,
        (H::Right, V::Top) => Anchor::TopRight,
    }
}

fn load_texture(asset_server: &AssetServer, image: Option<&str>) -> Handle<Image> {
    match image {
        Some(path) if !path.starts_with(BUILTIN_IMAGE_PREFIX) => asset_server.load(path.to_string()),
        _ => Handle::default(),
    }
}

/// System to mirror every pool slot into a sprite.
fn sync_sprites(
    mut commands: Commands,
    runtime: NonSend<SceneRuntime>,
    settings: Res<SpriteSettings>,
    asset_server: Res<AssetServer>,
    mut index: ResMut<SpriteIndex>,
    mut sprites: Query<(
        &mut BillboardSprite,
        &mut Sprite,
        &mut Transform,
        &mut Visibility,
        &mut Handle<Image>,
    )>,
) {
    let cluster = runtime.cluster.borrow();

    for (slot, billboard) in cluster.slots() {
        let state = SpriteState::from_billboard(billboard, &settings);

        let Some(&entity) = index.map.get(&slot) else {
            let mut sprite = Sprite::default();
            let mut transform = Transform::default();
            let mut visibility = Visibility::Hidden;
            state.apply(&mut sprite, &mut transform, &mut visibility);

            let entity = commands
                .spawn((
                    SpriteBundle {
                        sprite,
                        transform,
                        visibility,
                        texture: load_texture(&asset_server, billboard.image()),
                        ..default()
                    },
                    BillboardSprite {
                        slot,
                        image_loads: billboard.image_loads(),
                    },
                ))
                .id();
            index.map.insert(slot, entity);
            tracing::debug!("Spawned sprite for billboard {:?}", slot);
            continue;
        };

        let Ok((mut link, mut sprite, mut transform, mut visibility, mut texture)) =
            sprites.get_mut(entity)
        else {
            continue;
        };

        state.apply(&mut sprite, &mut transform, &mut visibility);

        // Only touch the texture when the billboard bound a new image.
        if link.image_loads != billboard.image_loads() {
            *texture = load_texture(&asset_server, billboard.image());
            link.image_loads = billboard.image_loads();
        }
    }
}
