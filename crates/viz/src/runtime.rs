//! The scene pipeline shared by the windowed app and the headless runner.
//!
//! Entities, pool and visualizer live behind `Rc`, so the runtime is stored
//! in Bevy as a non-send resource and only touched from the main thread.

use std::cell::RefCell;
use std::rc::Rc;

use billboard_visualizer::{
    BillboardVisualizer, ConfigError, EntityCluster, VisualizerConfig, VisualizerError,
};
use scene_data::{CollectionError, EntityCollection, SceneDocument, SceneError, SceneTime};

/// Height of the flat ground used for clamping.
pub const GROUND_HEIGHT: f64 = 0.0;

/// Errors that can occur while setting up the scene pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("collection error: {0}")]
    Collection(#[from] CollectionError),
    #[error("visualizer error: {0}")]
    Visualizer(#[from] VisualizerError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Collection, billboard pool and visualizer for one scene.
pub struct SceneRuntime {
    pub collection: EntityCollection,
    pub cluster: Rc<RefCell<EntityCluster>>,
    pub visualizer: BillboardVisualizer,
}

impl SceneRuntime {
    /// Builds the pipeline for a scene document.
    pub fn new(document: SceneDocument, config: VisualizerConfig) -> Result<Self, RuntimeError> {
        let collection = EntityCollection::from_entities(document.entities)?;
        let cluster = Rc::new(RefCell::new(EntityCluster::new()));
        let visualizer = BillboardVisualizer::builder()
            .cluster(cluster.clone())
            .collection(collection.clone())
            .config(config)
            .build()?;

        tracing::info!(
            "Loaded scene {:?}: {} entities, {} with billboards",
            document.name,
            collection.len(),
            visualizer.len()
        );

        Ok(Self {
            collection,
            cluster,
            visualizer,
        })
    }

    /// Advances billboards to `time` and clamps them to the ground.
    pub fn step(&self, time: SceneTime) {
        self.visualizer.update(time);
        self.cluster
            .borrow_mut()
            .update_height_clamping(|_| Some(GROUND_HEIGHT));
    }

    /// Replaces the collection's entities with those of `document`.
    ///
    /// The visualizer picks up the difference through its change listener.
    /// Entities the file leaves without an id get a new one on every parse,
    /// so they are removed and re-added rather than updated.
    pub fn reload(&self, document: SceneDocument) {
        if document.generated_ids > 0 {
            tracing::warn!(
                "{} reloaded entities have no id and will be replaced, not updated",
                document.generated_ids
            );
        }
        let count = document.entities.len();
        self.collection.replace_all(document.entities);
        tracing::info!(
            "Reloaded scene {:?}: {} entities, {} with billboards",
            document.name,
            count,
            self.visualizer.len()
        );
    }

    /// Number of billboards currently shown.
    pub fn shown(&self) -> usize {
        self.cluster
            .borrow()
            .active()
            .filter(|(_, b)| b.show)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_data::{BillboardGraphics, Cartesian3, Entity, EntityId, HeightReference, Property};

    fn scene(entities: Vec<Entity>) -> SceneDocument {
        SceneDocument {
            entities,
            ..SceneDocument::default()
        }
    }

    fn marker(id: &str) -> Entity {
        Entity::new(id)
            .with_position(Property::constant(Cartesian3::new(1.0, 2.0, 30.0)))
            .with_billboard(BillboardGraphics::with_image("builtin:square"))
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let result = SceneRuntime::new(
            scene(vec![marker("a"), marker("a")]),
            VisualizerConfig::default(),
        );
        assert!(matches!(result, Err(RuntimeError::Collection(_))));
    }

    #[test]
    fn test_step_clamps_to_ground() {
        let clamped = Entity::new("clamped")
            .with_position(Property::constant(Cartesian3::new(1.0, 2.0, 30.0)))
            .with_billboard(
                BillboardGraphics::with_image("builtin:square")
                    .height_reference(Property::constant(HeightReference::ClampToGround)),
            );
        let runtime = SceneRuntime::new(scene(vec![clamped]), VisualizerConfig::default()).unwrap();

        runtime.step(SceneTime::EPOCH);

        let cluster = runtime.cluster.borrow();
        let billboard = cluster.billboard_for(&EntityId::new("clamped")).unwrap();
        assert_eq!(
            billboard.clamped_position(),
            Some(Cartesian3::new(1.0, 2.0, GROUND_HEIGHT))
        );
    }

    #[test]
    fn test_reload_reconciles() {
        let runtime = SceneRuntime::new(
            scene(vec![marker("a"), marker("b")]),
            VisualizerConfig::default(),
        )
        .unwrap();
        runtime.step(SceneTime::EPOCH);
        assert_eq!(runtime.shown(), 2);

        runtime.reload(scene(vec![marker("b"), marker("c")]));
        runtime.step(SceneTime::EPOCH);

        assert_eq!(runtime.shown(), 2);
        assert!(!runtime.visualizer.is_tracking(&EntityId::new("a")));
        assert!(runtime.visualizer.is_tracking(&EntityId::new("c")));
    }

    #[test]
    fn test_reload_replaces_entities_without_id() {
        let json = r#"{"entities":[
            {"id": "named",
             "position": {"type": "constant", "value": {"x": 0.0, "y": 0.0, "z": 0.0}},
             "billboard": {"image": {"type": "constant", "value": "builtin:square"}}},
            {"position": {"type": "constant", "value": {"x": 5.0, "y": 0.0, "z": 0.0}},
             "billboard": {"image": {"type": "constant", "value": "builtin:square"}}}
        ]}"#;
        let document = SceneDocument::from_json(json).unwrap();
        assert_eq!(document.generated_ids, 1);
        let anonymous = document.entities[1].id.clone();

        let runtime = SceneRuntime::new(document, VisualizerConfig::default()).unwrap();
        runtime.step(SceneTime::EPOCH);
        let named = runtime.visualizer.primitive_for(&EntityId::new("named"));
        assert!(named.is_some());

        runtime.reload(SceneDocument::from_json(json).unwrap());
        runtime.step(SceneTime::EPOCH);

        assert_eq!(runtime.visualizer.len(), 2);
        assert_eq!(runtime.shown(), 2);
        assert_eq!(runtime.visualizer.primitive_for(&EntityId::new("named")), named);
        assert!(!runtime.visualizer.is_tracking(&anonymous));
    }
}
