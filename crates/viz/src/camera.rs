//! Camera system: pan/zoom controller, entity focus, and user input handling.

use bevy::prelude::*;
use billboard_visualizer::BoundingSphereState;
use scene_data::EntityId;

use crate::plugin::VizSet;
use crate::runtime::SceneRuntime;
use crate::sprites::SpriteSettings;

/// Plugin for camera control and movement.
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraController>()
            .init_resource::<CameraConstraints>()
            .init_resource::<CameraFocus>()
            .add_event::<PlayPauseEvent>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (handle_camera_input, handle_keyboard_input, cycle_focus)
                    .chain()
                    .in_set(VizSet::Input),
            )
            .add_systems(
                Update,
                (follow_focus, update_camera_transition, apply_camera_to_transform)
                    .chain()
                    .in_set(VizSet::Render),
            );
    }
}

/// Event emitted when play/pause is toggled.
#[derive(Event)]
pub struct PlayPauseEvent;

/// Main camera controller resource.
#[derive(Resource)]
pub struct CameraController {
    /// Current camera position in world coordinates.
    pub position: Vec2,
    /// Current zoom level (1.0 = normal, higher = zoomed in).
    pub zoom: f32,
    /// Target position for smooth movement.
    pub target_position: Vec2,
    /// Target zoom for smooth zooming.
    pub target_zoom: f32,
    /// Active camera transition, if any.
    pub transition: Option<CameraTransition>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            target_position: Vec2::ZERO,
            target_zoom: 1.0,
            transition: None,
        }
    }
}

impl CameraController {
    /// Begin a smooth transition to a new position and zoom.
    pub fn begin_transition(&mut self, to_pos: Vec2, to_zoom: f32, duration: f32) {
        self.transition = Some(CameraTransition {
            from_pos: self.position,
            to_pos,
            from_zoom: self.zoom,
            to_zoom,
            duration,
            elapsed: 0.0,
        });
    }
}

/// Entity the camera is following, if any.
#[derive(Resource, Default, Debug)]
pub struct CameraFocus {
    /// Followed entity.
    pub target: Option<EntityId>,
    /// Frames spent waiting for the target's position to become known.
    pub pending_frames: u32,
}

impl CameraFocus {
    /// Picks the entity after the current target in `ids`, wrapping around.
    ///
    /// Returns to free camera after the last one.
    pub fn cycle(&mut self, ids: &[EntityId]) {
        let next = match &self.target {
            None => ids.first(),
            Some(current) => ids
                .iter()
                .position(|id| id == current)
                .and_then(|index| ids.get(index + 1)),
        };
        self.target = next.cloned();
        self.pending_frames = 0;
    }
}

/// Active camera transition state.
#[derive(Clone, Debug)]
pub struct CameraTransition {
    /// Starting position.
    pub from_pos: Vec2,
    /// Target position.
    pub to_pos: Vec2,
    /// Starting zoom.
    pub from_zoom: f32,
    /// Target zoom.
    pub to_zoom: f32,
    /// Total duration in seconds.
    pub duration: f32,
    /// Time elapsed so far.
    pub elapsed: f32,
}

impl CameraTransition {
    /// Get the progress of this transition (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn current_position(&self) -> Vec2 {
        let t = ease_in_out(self.progress());
        self.from_pos.lerp(self.to_pos, t)
    }

    pub fn current_zoom(&self) -> f32 {
        let t = ease_in_out(self.progress());
        self.from_zoom + (self.to_zoom - self.from_zoom) * t
    }
}

/// Smooth ease-in-out function for transitions.
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Zoom toward a specific world point.
///
/// The point under the cursor stays at the same screen position.
pub fn zoom_toward_point(
    controller: &mut CameraController,
    cursor_world_pos: Vec2,
    zoom_delta: f32,
    constraints: &CameraConstraints,
) {
    let old_zoom = controller.zoom;
    let new_zoom = constraints.clamp_zoom(old_zoom * (1.0 + zoom_delta));

    // (cursor - old_pos) * old_zoom = (cursor - new_pos) * new_zoom
    let zoom_ratio = new_zoom / old_zoom;
    let offset = cursor_world_pos - controller.position;
    controller.position = cursor_world_pos - offset / zoom_ratio;
    controller.zoom = new_zoom;
    controller.target_zoom = new_zoom;
    controller.position = constraints.clamp_position(controller.position);
    controller.target_position = controller.position;
}

/// Camera constraints for zooming and panning.
#[derive(Resource)]
pub struct CameraConstraints {
    /// Minimum zoom level (zoomed out).
    pub min_zoom: f32,
    /// Maximum zoom level (zoomed in).
    pub max_zoom: f32,
    /// Optional bounds to constrain camera position.
    pub bounds: Option<Rect>,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            min_zoom: 0.05,
            max_zoom: 8.0,
            bounds: None,
        }
    }
}

impl CameraConstraints {
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    pub fn clamp_position(&self, pos: Vec2) -> Vec2 {
        match &self.bounds {
            Some(bounds) => Vec2::new(
                pos.x.clamp(bounds.min.x, bounds.max.x),
                pos.y.clamp(bounds.min.y, bounds.max.y),
            ),
            None => pos,
        }
    }
}

/// Marker component for the main camera.
#[derive(Component)]
pub struct MainCamera;

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2dBundle::default(), MainCamera));
}

/// System to handle mouse pan and zoom.
fn handle_camera_input(
    mut controller: ResMut<CameraController>,
    mut focus: ResMut<CameraFocus>,
    constraints: Res<CameraConstraints>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<bevy::input::mouse::MouseMotion>,
    mut scroll: EventReader<bevy::input::mouse::MouseWheel>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };

    let is_panning = mouse_button.pressed(MouseButton::Left)
        || mouse_button.pressed(MouseButton::Right)
        || mouse_button.pressed(MouseButton::Middle);

    if is_panning {
        let mut delta = Vec2::ZERO;
        for motion in mouse_motion.read() {
            delta += motion.delta;
        }

        if delta != Vec2::ZERO {
            // Dragging drops any followed entity
            focus.target = None;
            let pan_speed = 1.0 / controller.zoom;
            controller.position -= Vec2::new(delta.x, -delta.y) * pan_speed;
            controller.position = constraints.clamp_position(controller.position);
            controller.target_position = controller.position;
        }
    } else {
        mouse_motion.clear();
    }

    for ev in scroll.read() {
        let zoom_delta = ev.y * 0.1;
        let cursor_world = window.cursor_position().and_then(|cursor| {
            let (camera, camera_transform) = camera_query.get_single().ok()?;
            camera.viewport_to_world_2d(camera_transform, cursor)
        });

        match cursor_world {
            Some(world_pos) if focus.target.is_none() => {
                zoom_toward_point(&mut controller, world_pos, zoom_delta, &constraints);
            }
            _ => {
                let new_zoom = constraints.clamp_zoom(controller.zoom * (1.0 + zoom_delta));
                controller.zoom = new_zoom;
                controller.target_zoom = new_zoom;
            }
        }
    }
}

/// System to handle keyboard input for camera controls.
fn handle_keyboard_input(
    mut controller: ResMut<CameraController>,
    mut focus: ResMut<CameraFocus>,
    constraints: Res<CameraConstraints>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut play_pause_events: EventWriter<PlayPauseEvent>,
) {
    let delta = time.delta_seconds();

    let shift_held = keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);
    let base_pan_speed = if shift_held { 800.0 } else { 400.0 };
    let pan_speed = base_pan_speed / controller.zoom * delta;

    let mut pan_delta = Vec2::ZERO;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        pan_delta.x -= pan_speed;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        pan_delta.x += pan_speed;
    }
    if keyboard.pressed(KeyCode::ArrowUp) {
        pan_delta.y += pan_speed;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        pan_delta.y -= pan_speed;
    }

    if pan_delta != Vec2::ZERO {
        focus.target = None;
        controller.position += pan_delta;
        controller.position = constraints.clamp_position(controller.position);
        controller.target_position = controller.position;
    }

    // Home key - return to scene origin
    if keyboard.just_pressed(KeyCode::Home) {
        focus.target = None;
        controller.begin_transition(Vec2::ZERO, 1.0, 0.5);
    }

    if keyboard.just_pressed(KeyCode::Equal) {
        let new_zoom = constraints.clamp_zoom(controller.zoom * 1.25);
        controller.zoom = new_zoom;
        controller.target_zoom = new_zoom;
    }
    if keyboard.just_pressed(KeyCode::Minus) {
        let new_zoom = constraints.clamp_zoom(controller.zoom / 1.25);
        controller.zoom = new_zoom;
        controller.target_zoom = new_zoom;
    }

    if keyboard.just_pressed(KeyCode::Space) {
        play_pause_events.send(PlayPauseEvent);
    }
}

/// System to cycle the followed entity with Tab.
fn cycle_focus(
    keyboard: Res<ButtonInput<KeyCode>>,
    runtime: NonSend<SceneRuntime>,
    mut focus: ResMut<CameraFocus>,
) {
    if !keyboard.just_pressed(KeyCode::Tab) {
        return;
    }

    let ids: Vec<EntityId> = runtime
        .collection
        .values()
        .iter()
        .filter(|e| runtime.visualizer.is_tracking(&e.id))
        .map(|e| e.id.clone())
        .collect();
    focus.cycle(&ids);

    match &focus.target {
        Some(id) => tracing::info!("Following {}", id),
        None => tracing::info!("Free camera"),
    }
}

/// System to keep the followed entity centered.
///
/// Polls the visualizer's bounding sphere each frame. Clamped billboards
/// report pending until the ground position is known; the camera just waits.
fn follow_focus(
    runtime: NonSend<SceneRuntime>,
    settings: Res<SpriteSettings>,
    mut focus: ResMut<CameraFocus>,
    mut controller: ResMut<CameraController>,
) {
    let Some(id) = focus.target.clone() else {
        return;
    };
    let Some(entity) = runtime.collection.get(&id) else {
        focus.target = None;
        return;
    };

    match runtime.visualizer.bounding_sphere(&entity) {
        BoundingSphereState::Ready(sphere) => {
            focus.pending_frames = 0;
            controller.target_position = settings.to_world(sphere.center);
        }
        BoundingSphereState::Pending => {
            focus.pending_frames += 1;
            if focus.pending_frames == 60 {
                tracing::debug!("Still waiting for the ground position of {}", id);
            }
        }
        // Hidden right now; keep the last target
        BoundingSphereState::NotFound => {}
    }
}

/// System to update camera transitions.
fn update_camera_transition(mut controller: ResMut<CameraController>, time: Res<Time>) {
    let delta = time.delta_seconds();

    let transition_result = if let Some(ref mut transition) = controller.transition {
        transition.elapsed += delta;
        Some((
            transition.current_position(),
            transition.current_zoom(),
            transition.is_complete(),
            transition.to_pos,
            transition.to_zoom,
        ))
    } else {
        None
    };

    if let Some((position, zoom, is_complete, final_pos, final_zoom)) = transition_result {
        if is_complete {
            controller.position = final_pos;
            controller.zoom = final_zoom;
            controller.target_position = final_pos;
            controller.target_zoom = final_zoom;
            controller.transition = None;
        } else {
            controller.position = position;
            controller.zoom = zoom;
        }
    } else {
        let lerp_speed = (5.0 * delta).min(1.0);
        let target_pos = controller.target_position;
        let target_zoom = controller.target_zoom;
        controller.position = controller.position.lerp(target_pos, lerp_speed);
        controller.zoom = controller.zoom + (target_zoom - controller.zoom) * lerp_speed;
    }
}

/// System to apply camera controller state to the actual camera transform.
fn apply_camera_to_transform(
    controller: Res<CameraController>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    for mut transform in camera_query.iter_mut() {
        transform.translation.x = controller.position.x;
        transform.translation.y = controller.position.y;
        // Zoom is applied via projection scale (inverse relationship)
        let scale = 1.0 / controller.zoom;
        transform.scale = Vec3::new(scale, scale, 1.0);
    }
}
