//! Scene file watching.
//!
//! Watches the scene file and re-applies it to the collection when it
//! changes on disk. The visualizer sees the difference as ordinary
//! collection changes.

use bevy::prelude::*;
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use scene_data::{SceneDocument, SceneError};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;

use crate::plugin::VizSet;
use crate::runtime::SceneRuntime;

/// Plugin for reloading the scene from disk.
pub struct SceneWatchPlugin;

impl Plugin for SceneWatchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneWatchSettings>()
            .init_resource::<SceneStatus>()
            .add_event::<SceneReloadedEvent>()
            .add_systems(
                Update,
                (check_file_updates, handle_reload_key)
                    .chain()
                    .in_set(VizSet::Reload),
            );
    }
}

/// Where the scene came from and whether to watch it.
#[derive(Resource, Default, Debug, Clone)]
pub struct SceneWatchSettings {
    /// Scene file, if the scene was loaded from one.
    pub path: Option<PathBuf>,
    /// Whether to reload automatically on change.
    pub watch: bool,
}

/// Outcome of the most recent reload.
#[derive(Resource, Default, Debug)]
pub struct SceneStatus {
    /// Number of successful reloads.
    pub reloads: u64,
    /// When the scene was last reloaded.
    pub last_reload: Option<Instant>,
    /// Any error from the last reload attempt.
    pub last_error: Option<String>,
}

/// Event emitted after the scene was re-applied.
#[derive(Event)]
pub struct SceneReloadedEvent {
    /// Number of entities in the new scene.
    pub entities: usize,
}

/// File watching state stored in Local (doesn't need Send+Sync).
#[derive(Default)]
struct FileWatcherState {
    watcher: Option<RecommendedWatcher>,
    rx: Option<Receiver<Result<NotifyEvent, notify::Error>>>,
    initialized: bool,
}

impl FileWatcherState {
    fn ensure_initialized(&mut self, settings: &SceneWatchSettings) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let Some(path) = settings.path.as_ref().filter(|_| settings.watch) else {
            return;
        };

        // Editors often replace the file, so watch the directory.
        let watch_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let (tx, rx) = channel();
        match RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        ) {
            Ok(mut watcher) => {
                if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
                    tracing::warn!("Failed to watch directory {:?}: {}", watch_dir, e);
                } else {
                    tracing::info!("Watching {:?} for scene changes", path);
                }
                self.watcher = Some(watcher);
                self.rx = Some(rx);
            }
            Err(e) => {
                tracing::error!("Failed to create file watcher: {}", e);
            }
        }
    }
}

/// Whether a file event should trigger a reload of `scene_path`.
pub fn is_relevant(event: &NotifyEvent, scene_path: &Path) -> bool {
    let scene_name = scene_path.file_name();
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == scene_name)
}

/// Loads the scene file and applies it to the runtime.
///
/// Returns the number of entities in the new scene.
pub fn reload_scene(path: &Path, runtime: &SceneRuntime) -> Result<usize, SceneError> {
    let document = SceneDocument::from_file(path)?;
    let count = document.entities.len();
    runtime.reload(document);
    Ok(count)
}

fn apply_reload(
    path: &Path,
    runtime: &SceneRuntime,
    status: &mut SceneStatus,
    events: &mut EventWriter<SceneReloadedEvent>,
) {
    match reload_scene(path, runtime) {
        Ok(entities) => {
            status.reloads += 1;
            status.last_reload = Some(Instant::now());
            status.last_error = None;
            events.send(SceneReloadedEvent { entities });
        }
        Err(e) => {
            // Keep showing the previous scene
            let error_msg = format!("Failed to reload {:?}: {}", path, e);
            tracing::error!("{}", error_msg);
            status.last_error = Some(error_msg);
        }
    }
}

/// Check for file updates and reload the scene if necessary.
fn check_file_updates(
    mut watcher_state: Local<FileWatcherState>,
    settings: Res<SceneWatchSettings>,
    runtime: NonSend<SceneRuntime>,
    mut status: ResMut<SceneStatus>,
    mut events: EventWriter<SceneReloadedEvent>,
) {
    watcher_state.ensure_initialized(&settings);

    let (Some(rx), Some(path)) = (watcher_state.rx.as_ref(), settings.path.as_ref()) else {
        return;
    };

    // A save usually produces several events; reload once per frame.
    let mut changed = false;
    while let Ok(result) = rx.try_recv() {
        match result {
            Ok(event) => {
                if is_relevant(&event, path) {
                    tracing::debug!("Detected scene change: {:?}", event.paths);
                    changed = true;
                }
            }
            Err(e) => {
                tracing::warn!("File watcher error: {}", e);
            }
        }
    }

    if changed {
        apply_reload(path, &runtime, &mut status, &mut events);
    }
}

/// Handle R key to force reload.
fn handle_reload_key(
    keyboard: Res<ButtonInput<KeyCode>>,
    settings: Res<SceneWatchSettings>,
    runtime: NonSend<SceneRuntime>,
    mut status: ResMut<SceneStatus>,
    mut events: EventWriter<SceneReloadedEvent>,
) {
    if !keyboard.just_pressed(KeyCode::KeyR) {
        return;
    }
    if let Some(path) = settings.path.as_ref() {
        tracing::info!("Manual reload triggered");
        apply_reload(path, &runtime, &mut status, &mut events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> NotifyEvent {
        NotifyEvent::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_modify_of_scene_is_relevant() {
        let scene = Path::new("scenes/harbor.json");
        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/abs/scenes/harbor.json"),
            scene
        ));
        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), "scenes/harbor.json"),
            scene
        ));
    }

    #[test]
    fn test_other_files_and_kinds_are_ignored() {
        let scene = Path::new("scenes/harbor.json");
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "scenes/other.json"),
            scene
        ));
        assert!(!is_relevant(
            &event(EventKind::Access(AccessKind::Any), "scenes/harbor.json"),
            scene
        ));
    }

    #[test]
    fn test_scene_watch_settings_default() {
        let settings = SceneWatchSettings::default();
        assert!(settings.path.is_none());
        assert!(!settings.watch);
    }
}
