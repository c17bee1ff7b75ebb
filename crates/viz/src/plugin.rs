//! Main visualization plugin that ties all systems together.

use bevy::prelude::*;

use crate::camera::CameraPlugin;
use crate::playback::PlaybackPlugin;
use crate::scene_watch::SceneWatchPlugin;
use crate::sprites::SpritePlugin;

/// Frame stages, run in this order every update.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum VizSet {
    /// Keyboard and mouse handling
    Input,
    /// Scene reloads from disk
    Reload,
    /// Clock advance and billboard update
    Playback,
    /// Mirroring billboards into sprites
    Render,
}

/// Main plugin for the billboard visualization.
///
/// This plugin sets up the window, adds all sub-plugins, and orders their
/// systems. The [`crate::SceneRuntime`] must be inserted as a non-send
/// resource before the app runs.
pub struct BillboardVizPlugin;

impl Plugin for BillboardVizPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Billboard Visualizer".into(),
                        resolution: (1280., 720.).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        .configure_sets(
            Update,
            (VizSet::Input, VizSet::Reload, VizSet::Playback, VizSet::Render).chain(),
        )
        .add_plugins((CameraPlugin, SceneWatchPlugin, PlaybackPlugin, SpritePlugin));
    }
}
