//! Integration tests for the visualization host.

use std::io::Write;

use billboard_visualizer::{default_config_toml, VisualizerConfig};
use scene_data::fixtures::{sample_scene, sample_scene_json};
use scene_data::{Cartesian3, EntityId, SceneTime};
use viz::demo::demo_scene;
use viz::headless::{run, write_reports, HeadlessOptions};
use viz::scene_watch::reload_scene;
use viz::SceneRuntime;

/// Test running the sample scene headless over its whole clock.
#[test]
fn test_headless_sample_scene() {
    let runtime = SceneRuntime::new(sample_scene(), VisualizerConfig::default()).unwrap();
    let reports = run(
        &runtime,
        HeadlessOptions {
            frames: 61,
            step: 1.0,
            start: SceneTime::EPOCH,
        },
    );

    assert_eq!(reports.len(), 61);
    assert!(reports.iter().all(|r| r.tracked == 5));

    // Ghost ship only between 10 and 20 seconds
    let has_ghost = |frame: usize| {
        reports[frame]
            .billboards
            .iter()
            .any(|b| b.entity.as_str() == "ghost-ship")
    };
    assert!(!has_ghost(5));
    assert!(has_ghost(15));
    assert!(!has_ghost(25));

    assert_eq!(reports[5].shown, 4);
    assert_eq!(reports[45].shown, 3);
}

/// Test that the weather station is clamped to the flat ground.
#[test]
fn test_headless_clamps_to_ground() {
    let runtime = SceneRuntime::new(sample_scene(), VisualizerConfig::default()).unwrap();
    let reports = run(&runtime, HeadlessOptions::default());

    let station = reports[0]
        .billboards
        .iter()
        .find(|b| b.entity.as_str() == "weather-station")
        .unwrap();
    assert_eq!(station.position, Cartesian3::new(50.0, -20.0, 120.0));
    assert_eq!(
        station.clamped_position,
        Some(Cartesian3::new(50.0, -20.0, 0.0))
    );
}

/// Test reloading an edited scene file into a running scene.
#[test]
fn test_reload_from_file() {
    let runtime = SceneRuntime::new(sample_scene(), VisualizerConfig::default()).unwrap();
    runtime.step(SceneTime::from_seconds(15.0));
    assert!(runtime.visualizer.is_tracking(&EntityId::new("ghost-ship")));

    let mut edited = sample_scene();
    edited
        .entities
        .retain(|e| e.id.as_str() != "ghost-ship");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", edited.to_json().unwrap()).unwrap();

    let count = reload_scene(file.path(), &runtime).unwrap();
    assert_eq!(count, 6);
    assert!(!runtime.visualizer.is_tracking(&EntityId::new("ghost-ship")));
    assert_eq!(runtime.visualizer.len(), 4);
}

/// Test that a broken scene file leaves the running scene alone.
#[test]
fn test_reload_invalid_file_keeps_scene() {
    let runtime = SceneRuntime::new(sample_scene(), VisualizerConfig::default()).unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", &sample_scene_json()[..40]).unwrap();

    assert!(reload_scene(file.path(), &runtime).is_err());
    assert_eq!(runtime.visualizer.len(), 5);
}

/// Test that a config file changes the written defaults.
#[test]
fn test_config_file_defaults() {
    let toml = default_config_toml().replace("scale = 1.0", "scale = 2.0");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", toml).unwrap();
    let config = VisualizerConfig::from_file(file.path()).unwrap();

    let runtime = SceneRuntime::new(sample_scene(), config).unwrap();
    let reports = run(&runtime, HeadlessOptions::default());
    let beacon = reports[0]
        .billboards
        .iter()
        .find(|b| b.entity.as_str() == "harbor-beacon")
        .unwrap();
    let boat = reports[0]
        .billboards
        .iter()
        .find(|b| b.entity.as_str() == "patrol-boat")
        .unwrap();

    assert_eq!(beacon.scale, 2.0);
    // Explicit scale wins over the default
    assert_eq!(boat.scale, 1.5);
}

/// Test the demo scene end to end through JSON-lines output.
#[test]
fn test_demo_headless_output() {
    let runtime = SceneRuntime::new(demo_scene(42, 25), VisualizerConfig::default()).unwrap();
    let reports = run(
        &runtime,
        HeadlessOptions {
            frames: 10,
            step: 0.5,
            start: SceneTime::EPOCH,
        },
    );

    assert!(reports.iter().all(|r| r.tracked == 25));
    assert!(reports.iter().all(|r| r.dirty));

    let mut out = Vec::new();
    write_reports(&reports, &mut out).unwrap();
    for line in String::from_utf8(out).unwrap().lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value["billboards"].is_array());
    }
}
