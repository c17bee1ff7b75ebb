//! Observable entity collection.
//!
//! The collection owns its entities behind `Rc` and hands out shared
//! references. Entities are copy-on-write: [`EntityCollection::update`]
//! replaces the stored `Rc` and reports the entity as changed.
//!
//! Every mutation is reported synchronously to subscribers as a
//! [`CollectionChanged`] event once the mutation has completed. Between
//! [`EntityCollection::suspend_events`] and the matching
//! [`EntityCollection::resume_events`] changes are merged into a single event.
//!
//! The collection is single-threaded; handles are cheap to clone and all
//! clones observe the same entities.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::entity::{Entity, EntityId};

/// Callback invoked for every collection change.
pub type ChangeListener = Box<dyn FnMut(&CollectionChanged)>;

/// Handle returned by [`EntityCollection::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A batch of changes to a collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionChanged {
    /// Every entity in the collection after the change
    pub values: Vec<Rc<Entity>>,
    /// Entities that joined the collection
    pub added: Vec<Rc<Entity>>,
    /// Entities that left the collection
    pub removed: Vec<Rc<Entity>>,
    /// Entities whose definition changed
    pub changed: Vec<Rc<Entity>>,
}

impl CollectionChanged {
    /// An event that reports every entity in `values` as added.
    pub fn initial(values: Vec<Rc<Entity>>) -> Self {
        Self {
            added: values.clone(),
            values,
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Errors from collection mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollectionError {
    #[error("an entity with id '{0}' already exists in the collection")]
    DuplicateId(EntityId),
}

#[derive(Default)]
struct PendingChanges {
    added: Vec<Rc<Entity>>,
    removed: Vec<Rc<Entity>>,
    changed: Vec<Rc<Entity>>,
}

fn position_of(list: &[Rc<Entity>], id: &EntityId) -> Option<usize> {
    list.iter().position(|e| &e.id == id)
}

fn upsert(list: &mut Vec<Rc<Entity>>, entity: Rc<Entity>) {
    match position_of(list, &entity.id) {
        Some(index) => list[index] = entity,
        None => list.push(entity),
    }
}

impl PendingChanges {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    fn record_added(&mut self, entity: Rc<Entity>) {
        if let Some(index) = position_of(&self.removed, &entity.id) {
            // Removed and re-added within one batch.
            self.removed.remove(index);
            upsert(&mut self.changed, entity);
        } else {
            upsert(&mut self.added, entity);
        }
    }

    fn record_removed(&mut self, entity: Rc<Entity>) {
        if let Some(index) = position_of(&self.added, &entity.id) {
            self.added.remove(index);
            return;
        }
        if let Some(index) = position_of(&self.changed, &entity.id) {
            self.changed.remove(index);
        }
        upsert(&mut self.removed, entity);
    }

    fn record_changed(&mut self, entity: Rc<Entity>) {
        if let Some(index) = position_of(&self.added, &entity.id) {
            self.added[index] = entity;
            return;
        }
        upsert(&mut self.changed, entity);
    }
}

#[derive(Default)]
struct CollectionState {
    entities: Vec<Rc<Entity>>,
    suspend_count: u32,
    pending: PendingChanges,
}

impl CollectionState {
    fn index_of(&self, id: &EntityId) -> Option<usize> {
        position_of(&self.entities, id)
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, ChangeListener)>,
    registered: HashSet<ListenerId>,
    dispatching: bool,
}

/// An ordered, observable set of entities keyed by [`EntityId`].
#[derive(Clone, Default)]
pub struct EntityCollection {
    state: Rc<RefCell<CollectionState>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl fmt::Debug for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EntityCollection")
            .field("len", &state.entities.len())
            .field("suspend_count", &state.suspend_count)
            .field("listeners", &self.listeners.borrow().registered.len())
            .finish()
    }
}

impl EntityCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection holding `entities`, without notifying anyone.
    pub fn from_entities(
        entities: impl IntoIterator<Item = Entity>,
    ) -> Result<Self, CollectionError> {
        let collection = Self::new();
        for entity in entities {
            collection.add(entity)?;
        }
        Ok(collection)
    }

    /// Adds an entity. Fails if the id is already present.
    pub fn add(&self, entity: Entity) -> Result<Rc<Entity>, CollectionError> {
        let entity = Rc::new(entity);
        {
            let mut state = self.state.borrow_mut();
            if state.index_of(&entity.id).is_some() {
                return Err(CollectionError::DuplicateId(entity.id.clone()));
            }
            state.entities.push(entity.clone());
            state.pending.record_added(entity.clone());
        }
        self.flush();
        Ok(entity)
    }

    /// Removes the entity with `id`. Returns false if it was not present.
    pub fn remove(&self, id: &EntityId) -> bool {
        {
            let mut state = self.state.borrow_mut();
            let Some(index) = state.index_of(id) else {
                return false;
            };
            let entity = state.entities.remove(index);
            state.pending.record_removed(entity);
        }
        self.flush();
        true
    }

    /// Removes every entity, reported as one event.
    pub fn remove_all(&self) {
        {
            let mut state = self.state.borrow_mut();
            let entities = std::mem::take(&mut state.entities);
            for entity in entities {
                state.pending.record_removed(entity);
            }
        }
        self.flush();
    }

    /// Modifies the entity with `id` in place and reports it as changed.
    ///
    /// The entity's id cannot be changed this way. Returns false if no such
    /// entity exists. Edits that leave the entity equal are not reported.
    pub fn update(&self, id: &EntityId, edit: impl FnOnce(&mut Entity)) -> bool {
        let Some(current) = self.get(id) else {
            return false;
        };
        let mut entity = (*current).clone();
        edit(&mut entity);
        entity.id = id.clone();
        if entity == *current {
            return true;
        }

        {
            let mut state = self.state.borrow_mut();
            let Some(index) = state.index_of(id) else {
                return false;
            };
            let entity = Rc::new(entity);
            state.entities[index] = entity.clone();
            state.pending.record_changed(entity);
        }
        self.flush();
        true
    }

    /// Makes the collection hold exactly `entities`.
    ///
    /// Entities missing from `entities` are removed, new ids are added and
    /// existing ids whose definition differs are changed. The whole diff is
    /// reported as a single event. Later duplicates of an id win.
    pub fn replace_all(&self, entities: impl IntoIterator<Item = Entity>) {
        let entities: Vec<Entity> = entities.into_iter().collect();
        let keep: HashSet<&EntityId> = entities.iter().map(|e| &e.id).collect();

        self.suspend_events();

        let stale: Vec<EntityId> = self
            .values()
            .iter()
            .filter(|e| !keep.contains(&e.id))
            .map(|e| e.id.clone())
            .collect();
        for id in &stale {
            self.remove(id);
        }

        for entity in entities.iter().cloned() {
            let id = entity.id.clone();
            if self.contains(&id) {
                self.update(&id, |current| *current = entity);
            } else if let Err(e) = self.add(entity) {
                tracing::warn!("Skipping entity during replace: {}", e);
            }
        }

        self.resume_events();
    }

    /// Looks up an entity by id.
    pub fn get(&self, id: &EntityId) -> Option<Rc<Entity>> {
        let state = self.state.borrow();
        state.index_of(id).map(|index| state.entities[index].clone())
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.state.borrow().index_of(id).is_some()
    }

    /// Snapshot of all entities in insertion order.
    pub fn values(&self) -> Vec<Rc<Entity>> {
        self.state.borrow().entities.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().entities.is_empty()
    }

    /// Holds back change events until the matching [`Self::resume_events`].
    pub fn suspend_events(&self) {
        self.state.borrow_mut().suspend_count += 1;
    }

    /// Releases one level of suspension and fires the merged event once the
    /// outermost level is released.
    pub fn resume_events(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.suspend_count == 0 {
                tracing::warn!("resume_events called without matching suspend_events");
                return;
            }
            state.suspend_count -= 1;
        }
        self.flush();
    }

    /// Registers a change listener.
    pub fn subscribe(&self, listener: impl FnMut(&CollectionChanged) + 'static) -> ListenerId {
        let mut listeners = self.listeners.borrow_mut();
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Box::new(listener)));
        listeners.registered.insert(id);
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.registered.remove(&id) {
            return false;
        }
        // During dispatch the entries are checked out; they are pruned afterwards.
        if !listeners.dispatching {
            listeners.entries.retain(|(entry_id, _)| *entry_id != id);
        }
        true
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().registered.len()
    }

    fn take_event(&self) -> Option<CollectionChanged> {
        let mut state = self.state.borrow_mut();
        if state.suspend_count > 0 || state.pending.is_empty() {
            return None;
        }
        let pending = std::mem::take(&mut state.pending);
        Some(CollectionChanged {
            values: state.entities.clone(),
            added: pending.added,
            removed: pending.removed,
            changed: pending.changed,
        })
    }

    fn flush(&self) {
        // Mutations made by a listener are delivered after the current dispatch.
        if self.listeners.borrow().dispatching {
            return;
        }
        while let Some(event) = self.take_event() {
            self.dispatch(&event);
        }
    }

    fn dispatch(&self, event: &CollectionChanged) {
        let mut entries = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.dispatching = true;
            std::mem::take(&mut listeners.entries)
        };

        for (id, listener) in entries.iter_mut() {
            if self.listeners.borrow().registered.contains(id) {
                listener(event);
            }
        }

        let mut listeners = self.listeners.borrow_mut();
        listeners.dispatching = false;
        let subscribed_during_dispatch = std::mem::take(&mut listeners.entries);
        entries.extend(subscribed_during_dispatch);
        let registered = &listeners.registered;
        entries.retain(|(id, _)| registered.contains(id));
        listeners.entries = entries;
    }
}
