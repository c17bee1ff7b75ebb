//! Visualization host: draws billboard scenes with Bevy.
//!
//! The app owns a [`SceneRuntime`] (collection, billboard pool and
//! visualizer), advances a playback clock every frame, and mirrors the pool's
//! billboards into sprites. The same runtime drives the windowless
//! [`headless`] runner.

pub mod camera;
pub mod demo;
pub mod headless;
pub mod playback;
pub mod plugin;
pub mod runtime;
pub mod scene_watch;
pub mod sprites;

pub use plugin::BillboardVizPlugin;
pub use runtime::{RuntimeError, SceneRuntime};
