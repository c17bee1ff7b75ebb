//! Per-entity tracking records.

use std::collections::HashMap;
use std::rc::Rc;

use scene_data::{Entity, EntityId};

use crate::billboard::BillboardId;

/// What a visualizer remembers about one entity.
#[derive(Debug, Clone)]
pub struct TrackingRecord {
    /// Latest definition of the entity; used for identity and attribute lookup
    pub entity: Rc<Entity>,
    /// Billboard currently bound to the entity, if shown
    pub billboard: Option<BillboardId>,
    /// Image last written to the billboard
    pub texture_value: Option<String>,
}

impl TrackingRecord {
    pub fn new(entity: Rc<Entity>) -> Self {
        Self {
            entity,
            billboard: None,
            texture_value: None,
        }
    }
}

/// Tracking records keyed by entity id.
#[derive(Debug, Default)]
pub struct Registry {
    records: HashMap<EntityId, TrackingRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `entity` unless it is already tracked.
    ///
    /// Returns true if a record was created.
    pub fn insert_if_absent(&mut self, entity: &Rc<Entity>) -> bool {
        if self.records.contains_key(&entity.id) {
            return false;
        }
        self.records
            .insert(entity.id.clone(), TrackingRecord::new(entity.clone()));
        true
    }

    /// Points an existing record at a newer definition of its entity.
    ///
    /// The billboard binding and cached image are kept.
    pub fn refresh_entity(&mut self, entity: &Rc<Entity>) -> bool {
        match self.records.get_mut(&entity.id) {
            Some(record) => {
                record.entity = entity.clone();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<TrackingRecord> {
        self.records.remove(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&TrackingRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.records.contains_key(id)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut TrackingRecord> {
        self.records.values_mut()
    }

    pub fn values(&self) -> impl Iterator<Item = &TrackingRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
