//! Playback clock and per-frame billboard update.

use bevy::prelude::*;
use scene_data::{SceneClock, SceneTime};

use crate::camera::PlayPauseEvent;
use crate::plugin::VizSet;
use crate::runtime::SceneRuntime;

/// Plugin that advances scene time and updates billboards.
pub struct PlaybackPlugin;

impl Plugin for PlaybackPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlaybackClock>()
            .add_systems(Update, handle_playback_input.in_set(VizSet::Input))
            .add_systems(
                Update,
                (advance_clock, update_billboards)
                    .chain()
                    .in_set(VizSet::Playback),
            );
    }
}

/// Speed multipliers reachable with `[` and `]`.
const SPEED_STEPS: [f64; 9] = [0.125, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 60.0];

/// Scene playback state.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    /// Current scene time.
    pub current: SceneTime,
    /// Time playback starts from and loops back to.
    pub start: SceneTime,
    /// Time playback stops at, if bounded.
    pub stop: Option<SceneTime>,
    /// Scene seconds per real second.
    pub speed: f64,
    /// Whether the clock is advancing.
    pub playing: bool,
    /// Whether to wrap from stop back to start.
    pub looping: bool,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::from_scene_clock(&SceneClock::default())
    }
}

impl PlaybackClock {
    /// Creates a playing clock from a scene's suggested settings.
    pub fn from_scene_clock(clock: &SceneClock) -> Self {
        Self {
            current: clock.start,
            start: clock.start,
            stop: clock.stop,
            speed: clock.multiplier,
            playing: true,
            looping: clock.looping,
        }
    }

    /// Advances by `delta` real seconds.
    pub fn advance(&mut self, delta: f64) {
        if !self.playing {
            return;
        }

        self.current = self.current.add_seconds(delta * self.speed);

        let Some(stop) = self.stop else {
            return;
        };
        if self.current > stop {
            if self.looping {
                let span = stop.seconds_since(self.start);
                let overshoot = self.current.seconds_since(stop);
                let wrapped = if span > 0.0 { overshoot % span } else { 0.0 };
                self.current = self.start.add_seconds(wrapped);
            } else {
                self.current = stop;
                // Auto-pause at end
                self.playing = false;
            }
        }
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    /// Moves to the next faster speed step.
    pub fn faster(&mut self) {
        if let Some(&next) = SPEED_STEPS.iter().find(|&&s| s > self.speed) {
            self.speed = next;
        }
    }

    /// Moves to the next slower speed step.
    pub fn slower(&mut self) {
        if let Some(&next) = SPEED_STEPS.iter().rev().find(|&&s| s < self.speed) {
            self.speed = next;
        }
    }
}

/// System to handle play/pause and speed keys.
fn handle_playback_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut play_pause_events: EventReader<PlayPauseEvent>,
    mut clock: ResMut<PlaybackClock>,
) {
    for _ in play_pause_events.read() {
        clock.toggle();
        tracing::info!("Playback {}", if clock.playing { "resumed" } else { "paused" });
    }

    if keyboard.just_pressed(KeyCode::BracketRight) {
        clock.faster();
        tracing::info!("Playback speed {}x", clock.speed);
    }
    if keyboard.just_pressed(KeyCode::BracketLeft) {
        clock.slower();
        tracing::info!("Playback speed {}x", clock.speed);
    }
}

/// System to advance the scene clock by real time.
fn advance_clock(time: Res<Time>, mut clock: ResMut<PlaybackClock>) {
    clock.advance(time.delta_seconds_f64());
}

/// System to push the current scene time into the billboards.
fn update_billboards(runtime: NonSend<SceneRuntime>, clock: Res<PlaybackClock>) {
    runtime.step(clock.current);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(looping: bool) -> PlaybackClock {
        PlaybackClock::from_scene_clock(&SceneClock {
            start: SceneTime::from_seconds(10.0),
            stop: Some(SceneTime::from_seconds(20.0)),
            multiplier: 2.0,
            looping,
        })
    }

    #[test]
    fn test_clock_starts_at_scene_start() {
        let clock = bounded(false);
        assert_eq!(clock.current, SceneTime::from_seconds(10.0));
        assert_eq!(clock.speed, 2.0);
        assert!(clock.playing);
    }

    #[test]
    fn test_advance_uses_speed() {
        let mut clock = bounded(false);
        clock.advance(1.5);
        assert_eq!(clock.current, SceneTime::from_seconds(13.0));
    }

    #[test]
    fn test_paused_clock_does_not_advance() {
        let mut clock = bounded(false);
        clock.toggle();
        clock.advance(1.0);
        assert_eq!(clock.current, SceneTime::from_seconds(10.0));
    }

    #[test]
    fn test_clock_stops_at_end() {
        let mut clock = bounded(false);
        clock.advance(100.0);
        assert_eq!(clock.current, SceneTime::from_seconds(20.0));
        assert!(!clock.playing);
    }

    #[test]
    fn test_clock_loops() {
        let mut clock = bounded(true);
        // 10 + 2 * 6 = 22, two seconds past the stop
        clock.advance(6.0);
        assert_eq!(clock.current, SceneTime::from_seconds(12.0));
        assert!(clock.playing);
    }

    #[test]
    fn test_unbounded_clock_keeps_running() {
        let mut clock = PlaybackClock::default();
        clock.advance(1000.0);
        assert_eq!(clock.current, SceneTime::from_seconds(1000.0));
    }

    #[test]
    fn test_speed_steps() {
        let mut clock = PlaybackClock::default();
        clock.faster();
        assert_eq!(clock.speed, 2.0);
        clock.slower();
        clock.slower();
        assert_eq!(clock.speed, 0.5);

        clock.speed = 60.0;
        clock.faster();
        assert_eq!(clock.speed, 60.0);
    }
}
