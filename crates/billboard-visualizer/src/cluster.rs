//! Billboard pools.
//!
//! Visualizers never create billboards directly. They ask a [`BillboardPool`]
//! for one per entity and hand it back when the entity stops being drawn.
//! A pool can be shared by several visualizers. Bindings are scoped by
//! [`PoolOwner`], so two visualizers drawing the same entity id get separate
//! billboards and one releasing its binding never frees the other's.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use scene_data::{Cartesian3, EntityId, HeightReference};

use crate::billboard::{Billboard, BillboardId};

/// Identifies the visualizer a pool binding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolOwner(pub u64);

impl PoolOwner {
    /// Returns an owner id not handed out before in this process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Allocates and recycles billboards on behalf of visualizers.
pub trait BillboardPool {
    /// Returns the billboard `owner` has bound to `entity`, allocating one
    /// if needed.
    fn acquire(&mut self, owner: PoolOwner, entity: &EntityId) -> BillboardId;

    /// Returns the billboard `owner` has bound to `entity` to the pool.
    ///
    /// Returns false if there was none. Never fails.
    fn release(&mut self, owner: PoolOwner, entity: &EntityId) -> bool;

    fn get(&self, id: BillboardId) -> Option<&Billboard>;

    fn get_mut(&mut self, id: BillboardId) -> Option<&mut Billboard>;

    /// Flags that billboard positions changed and grouping must be redone.
    fn mark_dirty(&mut self);
}

/// Reference pool that keeps billboards in a slot list and reuses released
/// slots before growing.
#[derive(Debug, Default)]
pub struct EntityCluster {
    billboards: Vec<Billboard>,
    unused: Vec<usize>,
    bindings: HashMap<(PoolOwner, EntityId), BillboardId>,
    dirty: bool,
}

impl EntityCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether re-clustering has been requested since the last [`Self::take_dirty`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Total slots allocated, in use or not.
    pub fn len(&self) -> usize {
        self.billboards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.billboards.is_empty()
    }

    /// Number of billboards bound to an entity.
    pub fn in_use(&self) -> usize {
        self.bindings.len()
    }

    /// A billboard bound to `entity` by any owner, if any.
    pub fn billboard_for(&self, entity: &EntityId) -> Option<&Billboard> {
        self.bindings
            .iter()
            .find(|((_, bound), _)| bound == entity)
            .and_then(|(_, id)| self.billboards.get(id.0))
    }

    /// The billboard `owner` has bound to `entity`, if any.
    pub fn binding(&self, owner: PoolOwner, entity: &EntityId) -> Option<BillboardId> {
        self.bindings.get(&(owner, entity.clone())).copied()
    }

    /// Iterates over bound billboards.
    pub fn active(&self) -> impl Iterator<Item = (BillboardId, &Billboard)> + '_ {
        self.billboards
            .iter()
            .enumerate()
            .filter(|(_, b)| b.id.is_some())
            .map(|(index, b)| (BillboardId(index), b))
    }

    /// Iterates over every slot, including released ones.
    pub fn slots(&self) -> impl Iterator<Item = (BillboardId, &Billboard)> + '_ {
        self.billboards
            .iter()
            .enumerate()
            .map(|(index, b)| (BillboardId(index), b))
    }

    /// Computes clamped positions for billboards that reference the ground.
    ///
    /// `ground_height` returns the terrain height under a position, or
    /// `None` while terrain for that spot is not loaded yet. Billboards with
    /// [`HeightReference::None`] have their clamped position cleared.
    pub fn update_height_clamping(&mut self, ground_height: impl Fn(&Cartesian3) -> Option<f64>) {
        for billboard in self.billboards.iter_mut().filter(|b| b.id.is_some()) {
            let position = billboard.position;
            let clamped = match billboard.height_reference {
                HeightReference::None => None,
                HeightReference::ClampToGround => {
                    ground_height(&position).map(|h| Cartesian3::new(position.x, position.y, h))
                }
                HeightReference::RelativeToGround => ground_height(&position)
                    .map(|h| Cartesian3::new(position.x, position.y, h + position.z)),
            };
            // Keep the last known value while terrain is still loading.
            if clamped.is_some() || billboard.height_reference == HeightReference::None {
                billboard.set_clamped_position(clamped);
            }
        }
    }
}

impl BillboardPool for EntityCluster {
    fn acquire(&mut self, owner: PoolOwner, entity: &EntityId) -> BillboardId {
        let key = (owner, entity.clone());
        if let Some(&id) = self.bindings.get(&key) {
            return id;
        }

        let id = match self.unused.pop() {
            Some(index) => BillboardId(index),
            None => {
                self.billboards.push(Billboard::default());
                BillboardId(self.billboards.len() - 1)
            }
        };

        let billboard = &mut self.billboards[id.0];
        billboard.id = Some(entity.clone());
        billboard.show = true;
        self.bindings.insert(key, id);
        self.dirty = true;
        tracing::trace!("Bound billboard {:?} to entity {} for {:?}", id, entity, owner);
        id
    }

    fn release(&mut self, owner: PoolOwner, entity: &EntityId) -> bool {
        let Some(id) = self.bindings.remove(&(owner, entity.clone())) else {
            return false;
        };

        if let Some(billboard) = self.billboards.get_mut(id.0) {
            billboard.id = None;
            billboard.show = false;
            billboard.set_clamped_position(None);
        }
        self.unused.push(id.0);
        self.dirty = true;
        tracing::trace!("Released billboard {:?} from entity {} for {:?}", id, entity, owner);
        true
    }

    fn get(&self, id: BillboardId) -> Option<&Billboard> {
        self.billboards.get(id.0)
    }

    fn get_mut(&mut self, id: BillboardId) -> Option<&mut Billboard> {
        self.billboards.get_mut(id.0)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: PoolOwner = PoolOwner(0);

    #[test]
    fn test_acquire_is_idempotent_per_entity() {
        let mut cluster = EntityCluster::new();
        let a = EntityId::new("a");

        let first = cluster.acquire(OWNER, &a);
        let second = cluster.acquire(OWNER, &a);

        assert_eq!(first, second);
        assert_eq!(cluster.len(), 1);
        assert_eq!(cluster.in_use(), 1);
        assert_eq!(cluster.get(first).unwrap().id.as_ref(), Some(&a));
    }

    #[test]
    fn test_release_recycles_slot() {
        let mut cluster = EntityCluster::new();
        let a = EntityId::new("a");
        let b = EntityId::new("b");

        let slot = cluster.acquire(OWNER, &a);
        assert!(cluster.release(OWNER, &a));
        assert!(!cluster.get(slot).unwrap().show);
        assert!(cluster.get(slot).unwrap().id.is_none());

        let reused = cluster.acquire(OWNER, &b);
        assert_eq!(reused, slot);
        assert_eq!(cluster.len(), 1);
        assert!(cluster.get(reused).unwrap().show);
    }

    #[test]
    fn test_release_unknown_entity() {
        let mut cluster = EntityCluster::new();
        assert!(!cluster.release(OWNER, &EntityId::new("nobody")));
        assert!(!cluster.is_dirty());
    }

    #[test]
    fn test_owners_bind_same_entity_separately() {
        let mut cluster = EntityCluster::new();
        let a = EntityId::new("a");
        let (one, two) = (PoolOwner(1), PoolOwner(2));

        let first = cluster.acquire(one, &a);
        let second = cluster.acquire(two, &a);
        assert_ne!(first, second);
        assert_eq!(cluster.in_use(), 2);

        // Releasing one owner's binding leaves the other's slot alone
        assert!(cluster.release(one, &a));
        assert!(!cluster.release(one, &a));
        assert_eq!(cluster.binding(two, &a), Some(second));
        assert!(cluster.get(second).unwrap().show);

        let recycled = cluster.acquire(two, &EntityId::new("b"));
        assert_eq!(recycled, first);
        assert_eq!(cluster.get(second).unwrap().id.as_ref(), Some(&a));
    }

    #[test]
    fn test_owner_ids_are_unique() {
        assert_ne!(PoolOwner::next(), PoolOwner::next());
    }

    #[test]
    fn test_dirty_flag() {
        let mut cluster = EntityCluster::new();
        assert!(!cluster.take_dirty());
        cluster.mark_dirty();
        assert!(cluster.is_dirty());
        assert!(cluster.take_dirty());
        assert!(!cluster.is_dirty());
    }

    #[test]
    fn test_active_skips_released() {
        let mut cluster = EntityCluster::new();
        cluster.acquire(OWNER, &EntityId::new("a"));
        cluster.acquire(OWNER, &EntityId::new("b"));
        cluster.release(OWNER, &EntityId::new("a"));

        let active: Vec<_> = cluster
            .active()
            .map(|(_, b)| b.id.clone().unwrap().to_string())
            .collect();
        assert_eq!(active, vec!["b"]);
        assert_eq!(cluster.slots().count(), 2);
    }

    #[test]
    fn test_height_clamping() {
        let mut cluster = EntityCluster::new();
        let clamped = cluster.acquire(OWNER, &EntityId::new("clamped"));
        let relative = cluster.acquire(OWNER, &EntityId::new("relative"));
        let free = cluster.acquire(OWNER, &EntityId::new("free"));

        for (id, reference) in [
            (clamped, HeightReference::ClampToGround),
            (relative, HeightReference::RelativeToGround),
            (free, HeightReference::None),
        ] {
            let billboard = cluster.get_mut(id).unwrap();
            billboard.position = Cartesian3::new(1.0, 2.0, 10.0);
            billboard.height_reference = reference;
        }

        // Terrain not loaded yet.
        cluster.update_height_clamping(|_| None);
        assert!(cluster.get(clamped).unwrap().clamped_position().is_none());

        cluster.update_height_clamping(|_| Some(5.0));
        assert_eq!(
            cluster.get(clamped).unwrap().clamped_position(),
            Some(Cartesian3::new(1.0, 2.0, 5.0))
        );
        assert_eq!(
            cluster.get(relative).unwrap().clamped_position(),
            Some(Cartesian3::new(1.0, 2.0, 15.0))
        );
        assert!(cluster.get(free).unwrap().clamped_position().is_none());
    }
}
