//! # Component-to-Owner Index
//!
//! Maps pool-resident components back to the entity that owns them, so a
//! component holding only its own handle can find its transform.
//!
//! Entries are keyed by identity token, which is unique across every
//! registry in the process. Each entry also shares the component's slot
//! header, so a component destroyed through the factory drops out of every
//! query without being unregistered first.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{trace, warn};

use super::entity::EntityId;
use crate::handle::{Handle, Resource, SlotHeader};
use crate::identity::ResourceId;

/// Stable identity of one component instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    type_id: TypeId,
    index: usize,
    id: ResourceId,
}

impl ComponentKey {
    /// Key for the component behind `handle`.
    #[must_use]
    pub fn of<C: Resource>(handle: &Handle<C>) -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            index: handle.index(),
            id: handle.id(),
        }
    }

    /// Identity token of the keyed component.
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// Pool index of the keyed component.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Checks if the keyed component is a `C`.
    #[must_use]
    pub fn is<C: Resource>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }

    pub(crate) const fn type_id(&self) -> TypeId {
        self.type_id
    }
}

#[derive(Debug)]
struct OwnerEntry {
    key: ComponentKey,
    owner: EntityId,
    header: Arc<SlotHeader>,
}

impl OwnerEntry {
    fn is_live(&self) -> bool {
        self.header.id() == self.key.id
    }
}

/// Component → owning entity, with a reverse map for entity teardown.
#[derive(Debug, Default)]
pub struct OwnerIndex {
    owners: HashMap<ResourceId, OwnerEntry>,
    by_entity: HashMap<EntityId, Vec<ResourceId>>,
}

impl OwnerIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `owner` as the owner of the component behind `component`.
    ///
    /// Returns the previous owner, if any. Null and stale handles are not
    /// recorded.
    pub fn register<C: Resource>(
        &mut self,
        component: &Handle<C>,
        owner: EntityId,
    ) -> Option<EntityId> {
        let Some(header) = component.header() else {
            trace!(?component, "stale component not registered");
            return None;
        };
        let key = ComponentKey::of(component);
        let entry = OwnerEntry {
            key,
            owner,
            header: Arc::clone(header),
        };

        let previous = self.owners.insert(key.id, entry).map(|old| old.owner);
        if let Some(old) = previous {
            self.forget(old, key.id);
            if old != owner {
                warn!(%old, new = %owner, id = %key.id, "component re-registered to a new owner");
            }
        }
        self.by_entity.entry(owner).or_default().push(key.id);
        previous
    }

    /// Removes `component`, returning its owner.
    ///
    /// `None` if the key is not registered or its component was destroyed;
    /// the entry is dropped either way.
    pub fn unregister(&mut self, component: ComponentKey) -> Option<EntityId> {
        let entry = self.owners.remove(&component.id)?;
        self.forget(entry.owner, component.id);
        entry.is_live().then_some(entry.owner)
    }

    /// Owner of `component`.
    ///
    /// `None` if the key is not registered or its component was destroyed.
    #[must_use]
    pub fn owner_of(&self, component: ComponentKey) -> Option<EntityId> {
        self.owners
            .get(&component.id)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.owner)
    }

    /// Removes every component owned by `owner`, returning the keys of the
    /// ones still alive.
    pub fn unregister_entity(&mut self, owner: EntityId) -> Vec<ComponentKey> {
        let ids = self.by_entity.remove(&owner).unwrap_or_default();
        ids.into_iter()
            .filter_map(|id| self.owners.remove(&id))
            .filter(OwnerEntry::is_live)
            .map(|entry| entry.key)
            .collect()
    }

    /// Live components owned by `owner`, in registration order.
    #[must_use]
    pub fn components_of(&self, owner: EntityId) -> Vec<ComponentKey> {
        self.by_entity
            .get(&owner)
            .into_iter()
            .flatten()
            .filter_map(|id| self.owners.get(id))
            .filter(|entry| entry.is_live())
            .map(|entry| entry.key)
            .collect()
    }

    /// Drops entries whose components were destroyed. Returns how many.
    pub fn prune(&mut self) -> usize {
        let dead: Vec<(ResourceId, EntityId)> = self
            .owners
            .iter()
            .filter(|(_, entry)| !entry.is_live())
            .map(|(id, entry)| (*id, entry.owner))
            .collect();
        for (id, owner) in &dead {
            self.owners.remove(id);
            self.forget(*owner, *id);
        }
        dead.len()
    }

    /// Number of registered components that are still alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.values().filter(|entry| entry.is_live()).count()
    }

    /// Checks if no live component is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.owners.values().any(OwnerEntry::is_live)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.owners.clear();
        self.by_entity.clear();
    }

    fn forget(&mut self, owner: EntityId, id: ResourceId) {
        if let Some(ids) = self.by_entity.get_mut(&owner) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_entity.remove(&owner);
            }
        }
    }
}
