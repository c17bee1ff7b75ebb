//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // scene-data = { path = "../scene-data", features = ["test-fixtures"] }
//!
//! use scene_data::fixtures;
//!
//! let scene = fixtures::sample_scene();
//! ```

use crate::SceneDocument;

/// Returns the sample harbor scene from the fixtures file.
///
/// Contains 7 entities over a 60 second looping clock:
/// - `harbor-beacon`: constant position, tinted color
/// - `patrol-boat`: sampled (moving) position and rotation, scale 1.5
/// - `weather-station`: clamped to ground, explicit width/height
/// - `night-light`: shown for the first 30 seconds, uses an image sub-region
/// - `ghost-ship`: only available between 10 and 20 seconds
/// - `radio-mast`: position but no billboard
/// - `floating-label`: billboard but no position
pub fn sample_scene() -> SceneDocument {
    let json = include_str!("../tests/fixtures/sample_scene.json");
    SceneDocument::from_json(json).expect("Failed to parse sample_scene.json")
}

/// Returns the raw JSON of the sample scene.
pub fn sample_scene_json() -> &'static str {
    include_str!("../tests/fixtures/sample_scene.json")
}
