//! # ECS World
//!
//! Entities, their dense components, and the index tying pool-resident
//! components back to their owners. Entity slots and dense storage are
//! pre-allocated at creation.

use tracing::debug;

use super::component::{Component, MeshBounds, Transform};
use super::entity::{Entity, EntityId};
use super::owner::{ComponentKey, OwnerIndex};
use super::storage::ComponentStorage;
use crate::handle::{Handle, Resource};

/// Container for a scene's entities.
///
/// # Example
///
/// ```rust
/// use kiln_core::ecs::{Transform, World};
///
/// let mut world = World::new(16);
/// let entity = world.spawn();
/// world.set_transform(entity, Transform::from_translation(1.0, 2.0, 3.0));
/// assert_eq!(world.transform(entity).map(|t| t.translation), Some([1.0, 2.0, 3.0]));
/// ```
pub struct World {
    entities: Box<[Entity]>,
    /// Free entity indices, popped from the back.
    free_indices: Vec<u32>,
    alive_count: usize,

    transforms: ComponentStorage<Transform>,
    mesh_bounds: ComponentStorage<MeshBounds>,
    owners: OwnerIndex,
}

impl World {
    /// Creates a world with room for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        let Ok(last) = u32::try_from(capacity) else {
            panic!("Capacity cannot exceed u32::MAX");
        };

        let entities = (0..last)
            .map(|index| Entity::vacant(EntityId::new(index, 0)))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            entities,
            free_indices: (0..last).rev().collect(),
            alive_count: 0,
            transforms: ComponentStorage::new(capacity),
            mesh_bounds: ComponentStorage::new(capacity),
            owners: OwnerIndex::new(),
        }
    }

    /// Maximum number of live entities.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.len()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Spawns an entity at the identity transform.
    ///
    /// Returns `EntityId::NULL` if the world is full.
    pub fn spawn(&mut self) -> EntityId {
        let Some(index) = self.free_indices.pop() else {
            return EntityId::NULL;
        };

        let entity = &mut self.entities[index as usize];
        // Bump the generation so ids of the previous occupant go stale
        let id = entity.id().next_generation();
        *entity = Entity::spawned(id);
        entity.insert::<Transform>();
        self.alive_count += 1;
        id
    }

    /// Despawns an entity and unregisters every component it owned.
    ///
    /// The components themselves stay in their pools; use
    /// [`despawn_with_components`](Self::despawn_with_components) to get
    /// their keys for destruction. Returns `false` if the id was null, dead
    /// or stale.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.despawn_with_components(id).is_some()
    }

    /// Despawns an entity, returning the keys of the live components it
    /// owned so the caller can destroy them through the factory.
    ///
    /// `None` if the id was null, dead or stale.
    pub fn despawn_with_components(&mut self, id: EntityId) -> Option<Vec<ComponentKey>> {
        if !self.is_alive(id) {
            return None;
        }

        let index = id.index() as usize;
        self.entities[index] = Entity::vacant(id);
        self.alive_count -= 1;
        self.free_indices.push(id.index());

        self.transforms.reset(index);
        self.mesh_bounds.reset(index);
        let owned = self.owners.unregister_entity(id);
        if !owned.is_empty() {
            debug!(entity = %id, components = owned.len(), "despawned entity with components");
        }
        Some(owned)
    }

    /// Checks if `id` refers to a live entity.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        if id.is_null() {
            return false;
        }
        self.entities
            .get(id.index() as usize)
            .is_some_and(|entity| entity.is_alive() && entity.id() == id)
    }

    /// Entity slot for a live id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .get(id.index() as usize)
            .filter(|_| self.is_alive(id))
    }

    /// Iterates over all live entities.
    pub fn iter_alive(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_alive())
    }

    /// Transform of a live entity.
    #[must_use]
    pub fn transform(&self, id: EntityId) -> Option<Transform> {
        self.dense::<Transform>(id)
            .and_then(|index| self.transforms.get(index).copied())
    }

    /// Sets the transform of a live entity. Returns `false` if it is not alive.
    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> bool {
        self.set_dense::<Transform>(id, |world, index| {
            world.transforms.replace(index, transform);
        })
    }

    /// Mesh bounds of a live entity, if it has any.
    #[must_use]
    pub fn mesh_bounds(&self, id: EntityId) -> Option<MeshBounds> {
        self.dense::<MeshBounds>(id)
            .and_then(|index| self.mesh_bounds.get(index).copied())
    }

    /// Sets the mesh bounds of a live entity. Returns `false` if it is not alive.
    pub fn set_mesh_bounds(&mut self, id: EntityId, bounds: MeshBounds) -> bool {
        self.set_dense::<MeshBounds>(id, |world, index| {
            world.mesh_bounds.replace(index, bounds);
        })
    }

    /// Makes `owner` the owner of the component behind `component`.
    ///
    /// Returns `false` if the entity is not alive or the handle is invalid.
    pub fn attach<C: Resource>(&mut self, owner: EntityId, component: &Handle<C>) -> bool {
        if !self.is_alive(owner) || !component.is_valid() {
            return false;
        }
        self.owners.register(component, owner);
        true
    }

    /// Detaches a component from its owner, returning the owner.
    pub fn detach<C: Resource>(&mut self, component: &Handle<C>) -> Option<EntityId> {
        self.owners.unregister(ComponentKey::of(component))
    }

    /// Owner of the component behind `component`.
    ///
    /// `None` for unattached components and for stale handles.
    #[must_use]
    pub fn owner_of<C: Resource>(&self, component: &Handle<C>) -> Option<EntityId> {
        if !component.is_valid() {
            return None;
        }
        self.owners.owner_of(ComponentKey::of(component))
    }

    /// The component-to-owner index.
    #[must_use]
    pub fn owners(&self) -> &OwnerIndex {
        &self.owners
    }

    /// Despawns every entity, returning the keys of the live components
    /// they owned.
    pub fn clear(&mut self) -> Vec<ComponentKey> {
        let live: Vec<EntityId> = self.iter_alive().map(Entity::id).collect();
        let owned = live
            .into_iter()
            .filter_map(|id| self.despawn_with_components(id))
            .flatten()
            .collect();
        self.transforms.clear();
        self.mesh_bounds.clear();
        self.owners.clear();
        owned
    }

    /// Drops owner entries of components destroyed through the factory.
    pub fn prune_owners(&mut self) -> usize {
        self.owners.prune()
    }

    fn dense<C: Component>(&self, id: EntityId) -> Option<usize> {
        self.get(id)
            .filter(|entity| entity.has::<C>())
            .map(|entity| entity.id().index() as usize)
    }

    fn set_dense<C: Component>(
        &mut self,
        id: EntityId,
        write: impl FnOnce(&mut Self, usize),
    ) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let index = id.index() as usize;
        self.entities[index].insert::<C>();
        write(self, index);
        true
    }
}
