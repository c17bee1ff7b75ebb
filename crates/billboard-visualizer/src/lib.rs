//! Billboard visualization for scene entities.
//!
//! The visualizer keeps a pool of [`Billboard`] primitives in step with an
//! [`EntityCollection`]. It listens for collection changes to decide which
//! entities need a billboard, and on every [`BillboardVisualizer::update`]
//! resolves each entity's time-varying attributes and writes them into its
//! primitive.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  CollectionChanged  ┌────────────────────┐  acquire/release  ┌───────────────┐
//! │ EntityCollection │ ──────────────────▶ │ BillboardVisualizer│ ────────────────▶ │ BillboardPool │
//! └──────────────────┘                     └────────────────────┘   update(time)    └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`billboard`]: The renderable primitive
//! - [`cluster`]: Pool trait and the reference [`EntityCluster`]
//! - [`registry`]: Per-entity tracking records
//! - [`config`]: TOML configuration with attribute fallbacks

pub mod billboard;
pub mod cluster;
pub mod config;
pub mod registry;

// Re-export primitive types
pub use billboard::{Billboard, BillboardId};

// Re-export pool types
pub use cluster::{BillboardPool, EntityCluster, PoolOwner};

// Re-export registry types
pub use registry::{Registry, TrackingRecord};

// Re-export config types
pub use config::{default_config_toml, BillboardDefaults, ConfigError, VisualizerConfig};

use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

use scene_data::{
    is_constant, value_or_default, value_or_none, BoundingSphere, CollectionChanged, Entity,
    EntityCollection, EntityId, HeightReference, ListenerId, SceneTime,
};

/// A billboard pool shared between visualizers and the host renderer.
pub type SharedPool = Rc<RefCell<dyn BillboardPool>>;

/// Errors that can occur while setting up a visualizer.
#[derive(Debug, thiserror::Error)]
pub enum VisualizerError {
    /// A required collaborator was not supplied
    #[error("invalid argument: {0} is required")]
    InvalidArgument(&'static str),
    /// Error loading configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result of a bounding sphere query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingSphereState {
    /// The sphere is known.
    Ready(BoundingSphere),
    /// The entity is drawn but its ground-clamped position has not been
    /// computed yet. Ask again later.
    Pending,
    /// The entity has no billboard.
    NotFound,
}

/// Builder for [`BillboardVisualizer`].
#[derive(Default)]
pub struct VisualizerBuilder {
    cluster: Option<SharedPool>,
    collection: Option<EntityCollection>,
    config: VisualizerConfig,
}

impl VisualizerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pool billboards are drawn from.
    pub fn cluster<P: BillboardPool + 'static>(mut self, cluster: Rc<RefCell<P>>) -> Self {
        let cluster: SharedPool = cluster;
        self.cluster = Some(cluster);
        self
    }

    /// Sets an already type-erased pool.
    pub fn shared_cluster(mut self, cluster: SharedPool) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Sets the collection to visualize.
    pub fn collection(mut self, collection: EntityCollection) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn config(mut self, config: VisualizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads configuration from a TOML file.
    pub fn config_file(self, path: &Path) -> Result<Self, VisualizerError> {
        let config = VisualizerConfig::from_file(path)?;
        Ok(self.config(config))
    }

    /// Creates the visualizer, subscribes it to the collection and tracks
    /// every entity already present.
    pub fn build(self) -> Result<BillboardVisualizer, VisualizerError> {
        let cluster = self
            .cluster
            .ok_or(VisualizerError::InvalidArgument("cluster"))?;
        let collection = self
            .collection
            .ok_or(VisualizerError::InvalidArgument("collection"))?;
        Ok(BillboardVisualizer::with_config(
            cluster,
            collection,
            self.config,
        ))
    }
}

/// State shared between the visualizer handle and its collection listener.
struct VisualizerState {
    cluster: SharedPool,
    owner: PoolOwner,
    items: Registry,
    defaults: BillboardDefaults,
}

impl VisualizerState {
    fn on_collection_changed(&mut self, event: &CollectionChanged) {
        for entity in event.added.iter().rev() {
            if entity.is_billboard_eligible() {
                self.track(entity);
            }
        }

        for entity in event.changed.iter().rev() {
            if entity.is_billboard_eligible() {
                self.track(entity);
            } else {
                self.untrack(&entity.id);
            }
        }

        for entity in event.removed.iter().rev() {
            self.untrack(&entity.id);
        }
    }

    fn track(&mut self, entity: &Rc<Entity>) {
        if self.items.insert_if_absent(entity) {
            tracing::debug!("Tracking entity {}", entity.id);
        } else {
            self.items.refresh_entity(entity);
        }
    }

    fn untrack(&mut self, id: &EntityId) {
        let Some(record) = self.items.remove(id) else {
            return;
        };
        if record.billboard.is_some() {
            self.cluster.borrow_mut().release(self.owner, id);
        }
        tracing::debug!("Stopped tracking entity {}", id);
    }

    fn update(&mut self, time: SceneTime) {
        let VisualizerState {
            cluster,
            owner,
            items,
            defaults,
        } = self;
        let owner = *owner;
        let mut pool = cluster.borrow_mut();
        let mut shown = 0usize;

        for record in items.values_mut() {
            let entity = record.entity.clone();
            let graphics = entity.billboard.as_ref();

            let show = graphics.is_some()
                && entity.is_showing()
                && entity.is_available(time)
                && value_or_default(graphics.and_then(|g| g.show.as_ref()), time, true);

            let resolved = if show {
                let position = value_or_none(entity.position.as_ref(), time);
                let image = value_or_none(graphics.and_then(|g| g.image.as_ref()), time);
                position.zip(image)
            } else {
                None
            };

            let (Some(graphics), Some((position, image))) = (graphics, resolved) else {
                if record.billboard.take().is_some() {
                    pool.release(owner, &entity.id);
                }
                continue;
            };

            if !is_constant(entity.position.as_ref()) {
                pool.mark_dirty();
            }

            // A slot rebound to another entity behind our back is not ours
            let bound = record
                .billboard
                .filter(|&id| pool.get(id).is_some_and(|b| b.id.as_ref() == Some(&entity.id)));
            if let (Some(stale), None) = (record.billboard, bound) {
                tracing::warn!(
                    "Billboard {:?} no longer bound to entity {}, acquiring a new one",
                    stale,
                    entity.id
                );
            }

            let id = match bound {
                Some(id) => id,
                None => {
                    let id = pool.acquire(owner, &entity.id);
                    if let Some(billboard) = pool.get_mut(id) {
                        billboard.id = Some(entity.id.clone());
                        billboard.set_image(None);
                    }
                    record.billboard = Some(id);
                    record.texture_value = None;
                    id
                }
            };

            let Some(billboard) = pool.get_mut(id) else {
                tracing::warn!("Pool lost billboard {:?} for entity {}", id, entity.id);
                record.billboard = None;
                continue;
            };

            billboard.show = true;
            if billboard.image().is_none() || record.texture_value.as_deref() != Some(image.as_str()) {
                billboard.set_image(Some(image.clone()));
                record.texture_value = Some(image);
            }

            billboard.position = position;
            billboard.color = value_or_default(graphics.color.as_ref(), time, defaults.color);
            billboard.eye_offset =
                value_or_default(graphics.eye_offset.as_ref(), time, defaults.eye_offset);
            billboard.height_reference = value_or_default(
                graphics.height_reference.as_ref(),
                time,
                defaults.height_reference,
            );
            billboard.pixel_offset =
                value_or_default(graphics.pixel_offset.as_ref(), time, defaults.pixel_offset);
            billboard.scale = value_or_default(graphics.scale.as_ref(), time, defaults.scale);
            billboard.rotation = value_or_default(graphics.rotation.as_ref(), time, defaults.rotation);
            billboard.aligned_axis =
                value_or_default(graphics.aligned_axis.as_ref(), time, defaults.aligned_axis);
            billboard.horizontal_origin = value_or_default(
                graphics.horizontal_origin.as_ref(),
                time,
                defaults.horizontal_origin,
            );
            billboard.vertical_origin = value_or_default(
                graphics.vertical_origin.as_ref(),
                time,
                defaults.vertical_origin,
            );
            billboard.width = value_or_none(graphics.width.as_ref(), time);
            billboard.height = value_or_none(graphics.height.as_ref(), time);
            billboard.scale_by_distance = value_or_none(graphics.scale_by_distance.as_ref(), time);
            billboard.translucency_by_distance =
                value_or_none(graphics.translucency_by_distance.as_ref(), time);
            billboard.pixel_offset_scale_by_distance =
                value_or_none(graphics.pixel_offset_scale_by_distance.as_ref(), time);
            billboard.size_in_meters = value_or_default(
                graphics.size_in_meters.as_ref(),
                time,
                defaults.size_in_meters,
            );
            billboard.distance_display_condition =
                value_or_none(graphics.distance_display_condition.as_ref(), time);

            if let Some(region) = value_or_none(graphics.image_sub_region.as_ref(), time) {
                if let Some(image_id) = billboard.image_id().map(str::to_owned) {
                    billboard.set_image_sub_region(&image_id, region);
                }
            }

            shown += 1;
        }

        tracing::trace!("Updated billboards at {}: {} shown of {}", time, shown, items.len());
    }
}

/// Keeps billboards in a pool in sync with the entities of a collection.
///
/// Dropping the visualizer, or calling [`BillboardVisualizer::destroy`],
/// unsubscribes from the collection and releases every billboard it holds.
pub struct BillboardVisualizer {
    state: Rc<RefCell<VisualizerState>>,
    collection: EntityCollection,
    listener: Option<ListenerId>,
}

impl std::fmt::Debug for BillboardVisualizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillboardVisualizer")
            .field("tracked", &self.len())
            .field("listener", &self.listener)
            .finish()
    }
}

impl BillboardVisualizer {
    /// Creates a visualizer with default configuration.
    pub fn new<P: BillboardPool + 'static>(
        cluster: Rc<RefCell<P>>,
        collection: EntityCollection,
    ) -> Self {
        Self::with_config(cluster, collection, VisualizerConfig::default())
    }

    pub fn builder() -> VisualizerBuilder {
        VisualizerBuilder::new()
    }

    fn with_config(
        cluster: SharedPool,
        collection: EntityCollection,
        config: VisualizerConfig,
    ) -> Self {
        let state = Rc::new(RefCell::new(VisualizerState {
            cluster,
            owner: PoolOwner::next(),
            items: Registry::new(),
            defaults: config.defaults,
        }));

        let weak: Weak<RefCell<VisualizerState>> = Rc::downgrade(&state);
        let listener = collection.subscribe(move |event| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().on_collection_changed(event);
            }
        });

        state
            .borrow_mut()
            .on_collection_changed(&CollectionChanged::initial(collection.values()));

        tracing::info!(
            "Billboard visualizer tracking {} of {} entities",
            state.borrow().items.len(),
            collection.len()
        );

        Self {
            state,
            collection,
            listener: Some(listener),
        }
    }

    /// Writes every tracked entity's attributes at `time` into its billboard.
    ///
    /// Entities that are hidden, unavailable, or whose position or image
    /// cannot be resolved give their billboard back to the pool. Always
    /// returns true.
    pub fn update(&self, time: SceneTime) -> bool {
        self.state.borrow_mut().update(time);
        true
    }

    /// Computes the bounding sphere of an entity's billboard.
    pub fn bounding_sphere(&self, entity: &Entity) -> BoundingSphereState {
        let state = self.state.borrow();
        let Some(id) = state.items.get(&entity.id).and_then(|r| r.billboard) else {
            return BoundingSphereState::NotFound;
        };

        let pool = state.cluster.borrow();
        let Some(billboard) = pool.get(id) else {
            return BoundingSphereState::NotFound;
        };

        if billboard.height_reference == HeightReference::None {
            return BoundingSphereState::Ready(BoundingSphere::new(billboard.position, 0.0));
        }

        match billboard.clamped_position() {
            Some(center) => BoundingSphereState::Ready(BoundingSphere::new(center, 0.0)),
            None => BoundingSphereState::Pending,
        }
    }

    /// Unsubscribes from the collection and releases every billboard held
    /// for entities still in it.
    pub fn destroy(mut self) {
        self.teardown();
    }

    /// Always false. A destroyed visualizer has been consumed and cannot be
    /// asked.
    pub fn is_destroyed(&self) -> bool {
        false
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().items.is_empty()
    }

    /// Whether the entity has a tracking record.
    pub fn is_tracking(&self, id: &EntityId) -> bool {
        self.state.borrow().items.contains(id)
    }

    /// The billboard currently bound to the entity.
    pub fn primitive_for(&self, id: &EntityId) -> Option<BillboardId> {
        self.state.borrow().items.get(id).and_then(|r| r.billboard)
    }

    /// The pool this visualizer draws from.
    pub fn cluster(&self) -> SharedPool {
        self.state.borrow().cluster.clone()
    }

    pub fn collection(&self) -> &EntityCollection {
        &self.collection
    }

    fn teardown(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        self.collection.unsubscribe(listener);

        let mut state = self.state.borrow_mut();
        let mut released = 0usize;
        {
            let VisualizerState {
                cluster,
                owner,
                items,
                ..
            } = &mut *state;
            let mut pool = cluster.borrow_mut();
            for entity in self.collection.values() {
                let owned = items.get(&entity.id).is_some_and(|r| r.billboard.is_some());
                if owned && pool.release(*owner, &entity.id) {
                    released += 1;
                }
            }
        }
        state.items.clear();
        tracing::info!("Billboard visualizer destroyed, released {} billboards", released);
    }
}

impl Drop for BillboardVisualizer {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_data::{BillboardGraphics, Cartesian3, Color, Property};

    fn beacon(id: &str) -> Entity {
        Entity::new(id)
            .with_position(Property::constant(Cartesian3::ZERO))
            .with_billboard(BillboardGraphics::with_image("a.png"))
    }

    fn setup(
        entities: Vec<Entity>,
    ) -> (Rc<RefCell<EntityCluster>>, EntityCollection, BillboardVisualizer) {
        let cluster = Rc::new(RefCell::new(EntityCluster::new()));
        let collection = EntityCollection::from_entities(entities).unwrap();
        let visualizer = BillboardVisualizer::new(cluster.clone(), collection.clone());
        (cluster, collection, visualizer)
    }

    #[test]
    fn test_builder_requires_cluster() {
        let collection = EntityCollection::from_entities(vec![beacon("a")]).unwrap();
        let result = BillboardVisualizer::builder()
            .collection(collection.clone())
            .build();
        assert!(matches!(result, Err(VisualizerError::InvalidArgument("cluster"))));
        assert_eq!(collection.listener_count(), 0);
    }

    #[test]
    fn test_builder_requires_collection() {
        let result = BillboardVisualizer::builder()
            .cluster(Rc::new(RefCell::new(EntityCluster::new())))
            .build();
        assert!(matches!(
            result,
            Err(VisualizerError::InvalidArgument("collection"))
        ));
    }

    #[test]
    fn test_construction_tracks_existing_entities() {
        let (_, collection, visualizer) = setup(vec![beacon("a"), Entity::new("bare")]);
        assert_eq!(visualizer.len(), 1);
        assert!(visualizer.is_tracking(&EntityId::new("a")));
        assert!(!visualizer.is_tracking(&EntityId::new("bare")));
        assert_eq!(collection.listener_count(), 1);
    }

    #[test]
    fn test_update_writes_defaults() {
        let (cluster, _, visualizer) = setup(vec![beacon("a")]);
        assert!(visualizer.update(SceneTime::EPOCH));

        let cluster = cluster.borrow();
        let billboard = cluster.billboard_for(&EntityId::new("a")).unwrap();
        assert!(billboard.show);
        assert_eq!(billboard.image(), Some("a.png"));
        assert_eq!(billboard.position, Cartesian3::ZERO);
        assert_eq!(billboard.color, Color::WHITE);
        assert_eq!(billboard.scale, 1.0);
        assert_eq!(billboard.width, None);
        assert_eq!(billboard.distance_display_condition, None);
    }

    #[test]
    fn test_config_defaults_are_used() {
        let mut config = VisualizerConfig::default();
        config.defaults.scale = 3.0;
        let cluster = Rc::new(RefCell::new(EntityCluster::new()));
        let visualizer = BillboardVisualizer::builder()
            .cluster(cluster.clone())
            .collection(EntityCollection::from_entities(vec![beacon("a")]).unwrap())
            .config(config)
            .build()
            .unwrap();

        visualizer.update(SceneTime::EPOCH);
        assert_eq!(
            cluster.borrow().billboard_for(&EntityId::new("a")).unwrap().scale,
            3.0
        );
    }

    #[test]
    fn test_entity_show_hides_billboard() {
        let (cluster, collection, visualizer) = setup(vec![beacon("a")]);
        visualizer.update(SceneTime::EPOCH);
        assert_eq!(cluster.borrow().in_use(), 1);

        collection.update(&EntityId::new("a"), |e| e.show = false);
        visualizer.update(SceneTime::EPOCH);

        assert_eq!(cluster.borrow().in_use(), 0);
        assert!(visualizer.is_tracking(&EntityId::new("a")));
        assert!(visualizer.primitive_for(&EntityId::new("a")).is_none());
    }

    #[test]
    fn test_missing_image_hides_billboard() {
        let entity = Entity::new("a")
            .with_position(Property::constant(Cartesian3::ZERO))
            .with_billboard(BillboardGraphics::default());
        let (cluster, _, visualizer) = setup(vec![entity]);

        visualizer.update(SceneTime::EPOCH);
        assert!(visualizer.is_tracking(&EntityId::new("a")));
        assert_eq!(cluster.borrow().in_use(), 0);
    }

    #[test]
    fn test_changed_to_ineligible_releases() {
        let (cluster, collection, visualizer) = setup(vec![beacon("a")]);
        visualizer.update(SceneTime::EPOCH);

        collection.update(&EntityId::new("a"), |e| e.billboard = None);
        assert!(!visualizer.is_tracking(&EntityId::new("a")));
        assert_eq!(cluster.borrow().in_use(), 0);
    }

    #[test]
    fn test_changed_entity_keeps_binding() {
        let (_, collection, visualizer) = setup(vec![beacon("a")]);
        visualizer.update(SceneTime::EPOCH);
        let before = visualizer.primitive_for(&EntityId::new("a"));

        collection.update(&EntityId::new("a"), |e| {
            e.position = Some(Property::constant(Cartesian3::new(5.0, 0.0, 0.0)))
        });
        assert_eq!(visualizer.primitive_for(&EntityId::new("a")), before);
    }

    #[test]
    fn test_bounding_sphere_not_found() {
        let (_, _, visualizer) = setup(vec![beacon("a")]);
        // Tracked but not yet drawn.
        assert_eq!(
            visualizer.bounding_sphere(&beacon("a")),
            BoundingSphereState::NotFound
        );
        assert_eq!(
            visualizer.bounding_sphere(&Entity::new("unknown")),
            BoundingSphereState::NotFound
        );
    }

    #[test]
    fn test_destroy_unsubscribes_and_releases() {
        let (cluster, collection, visualizer) = setup(vec![beacon("a"), beacon("b")]);
        visualizer.update(SceneTime::EPOCH);
        assert_eq!(cluster.borrow().in_use(), 2);
        assert!(!visualizer.is_destroyed());

        visualizer.destroy();
        assert_eq!(cluster.borrow().in_use(), 0);
        assert_eq!(collection.listener_count(), 0);

        // Later mutations reach nobody.
        collection.add(beacon("c")).unwrap();
        assert_eq!(cluster.borrow().in_use(), 0);
    }

    #[test]
    fn test_drop_tears_down() {
        let (cluster, collection, visualizer) = setup(vec![beacon("a")]);
        visualizer.update(SceneTime::EPOCH);
        drop(visualizer);

        assert_eq!(cluster.borrow().in_use(), 0);
        assert_eq!(collection.listener_count(), 0);
    }

    #[test]
    fn test_two_visualizers_share_pool() {
        let cluster = Rc::new(RefCell::new(EntityCluster::new()));
        let first = EntityCollection::from_entities(vec![beacon("a")]).unwrap();
        let second = EntityCollection::from_entities(vec![beacon("b")]).unwrap();
        let one = BillboardVisualizer::new(cluster.clone(), first);
        let two = BillboardVisualizer::new(cluster.clone(), second);

        one.update(SceneTime::EPOCH);
        two.update(SceneTime::EPOCH);
        assert_eq!(cluster.borrow().in_use(), 2);

        drop(one);
        assert_eq!(cluster.borrow().in_use(), 1);
        assert!(cluster.borrow().billboard_for(&EntityId::new("b")).is_some());
    }

    #[test]
    fn test_shared_pool_same_entity_id() {
        let cluster = Rc::new(RefCell::new(EntityCluster::new()));
        let first = EntityCollection::from_entities(vec![beacon("a")]).unwrap();
        let second = EntityCollection::from_entities(vec![beacon("a")]).unwrap();
        let one = BillboardVisualizer::new(cluster.clone(), first);
        let two = BillboardVisualizer::new(cluster.clone(), second.clone());

        one.update(SceneTime::EPOCH);
        two.update(SceneTime::EPOCH);
        let a = EntityId::new("a");
        let kept = two.primitive_for(&a).unwrap();
        assert_ne!(one.primitive_for(&a), Some(kept));
        assert_eq!(cluster.borrow().in_use(), 2);

        // Tearing down one visualizer must not free the other's billboard
        drop(one);
        second
            .add(
                Entity::new("b")
                    .with_position(Property::constant(Cartesian3::new(9.0, 0.0, 0.0)))
                    .with_billboard(BillboardGraphics::with_image("b.png")),
            )
            .unwrap();
        two.update(SceneTime::EPOCH);

        let b = two.primitive_for(&EntityId::new("b")).unwrap();
        assert_ne!(b, kept);
        assert_eq!(two.primitive_for(&a), Some(kept));

        let cluster = cluster.borrow();
        assert_eq!(cluster.in_use(), 2);
        assert_eq!(cluster.get(kept).unwrap().id.as_ref(), Some(&a));
        assert_eq!(cluster.get(kept).unwrap().position, Cartesian3::ZERO);
        assert_eq!(cluster.get(b).unwrap().position, Cartesian3::new(9.0, 0.0, 0.0));
    }

    /// Pool that ignores owners and hands slots out by entity id only.
    #[derive(Default)]
    struct EntityKeyedPool {
        slots: Vec<Billboard>,
    }

    impl BillboardPool for EntityKeyedPool {
        fn acquire(&mut self, _owner: PoolOwner, entity: &EntityId) -> BillboardId {
            if let Some(index) = self.slots.iter().position(|b| b.id.as_ref() == Some(entity)) {
                return BillboardId(index);
            }
            let index = match self.slots.iter().position(|b| b.id.is_none()) {
                Some(index) => index,
                None => {
                    self.slots.push(Billboard::default());
                    self.slots.len() - 1
                }
            };
            self.slots[index].id = Some(entity.clone());
            BillboardId(index)
        }

        fn release(&mut self, _owner: PoolOwner, entity: &EntityId) -> bool {
            match self.slots.iter_mut().find(|b| b.id.as_ref() == Some(entity)) {
                Some(billboard) => {
                    billboard.id = None;
                    true
                }
                None => false,
            }
        }

        fn get(&self, id: BillboardId) -> Option<&Billboard> {
            self.slots.get(id.0)
        }

        fn get_mut(&mut self, id: BillboardId) -> Option<&mut Billboard> {
            self.slots.get_mut(id.0)
        }

        fn mark_dirty(&mut self) {}
    }

    #[test]
    fn test_rebound_slot_is_reacquired() {
        let pool = Rc::new(RefCell::new(EntityKeyedPool::default()));
        let a = EntityId::new("a");
        let one = BillboardVisualizer::new(
            pool.clone(),
            EntityCollection::from_entities(vec![beacon("a")]).unwrap(),
        );
        let second = EntityCollection::from_entities(vec![beacon("a")]).unwrap();
        let two = BillboardVisualizer::new(pool.clone(), second.clone());

        one.update(SceneTime::EPOCH);
        two.update(SceneTime::EPOCH);
        assert_eq!(one.primitive_for(&a), two.primitive_for(&a));

        // This pool frees the slot both records point at and hands it to "b"
        drop(one);
        second
            .add(
                Entity::new("b")
                    .with_position(Property::constant(Cartesian3::new(9.0, 0.0, 0.0)))
                    .with_billboard(BillboardGraphics::with_image("b.png")),
            )
            .unwrap();
        two.update(SceneTime::EPOCH);

        let fresh = two.primitive_for(&a).unwrap();
        let b = two.primitive_for(&EntityId::new("b")).unwrap();
        assert_ne!(fresh, b);

        let pool = pool.borrow();
        assert_eq!(pool.get(fresh).unwrap().id.as_ref(), Some(&a));
        assert_eq!(pool.get(fresh).unwrap().position, Cartesian3::ZERO);
        assert_eq!(pool.get(b).unwrap().id.as_ref(), Some(&EntityId::new("b")));
    }
}
