//! # Resource Factory
//!
//! One typed pool per registered resource type, looked up by [`TypeId`].
//!
//! ## Architecture
//!
//! ```text
//! FactoryRegistry ──► Arc<RegistryInner> ──► TypeId ─► PoolEntry
//!        │ (clone / rebind share the same inner)         ├─ Arc<dyn ErasedPool>   (stats, sweeps, shutdown)
//!        │                                               └─ Arc<dyn Any>          (downcast to TypedPool<T>)
//!        ▼
//!   create::<T>(value) ──► TypedPool<T>.slots.allocate ──► Handle<T>(token, index)
//! ```
//!
//! The registered type set is fixed at [`FactoryBuilder::build`]. Pools are
//! locked per type, so work on textures never contends with work on meshes.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::config::{short_type_name, FactoryConfig, ReleasePolicy};
use crate::ecs::ComponentKey;
use crate::error::{FactoryError, FactoryResult};
use crate::handle::{Handle, ManagedSlot, Resource, SlotHeader};
use crate::identity::ResourceId;
use crate::memory::PoolAllocator;

/// Storage for one resource type.
pub(crate) struct TypedPool<T> {
    pub(crate) type_name: &'static str,
    pub(crate) slots: RwLock<PoolAllocator<ManagedSlot<T>>>,
}

impl<T: Resource> TypedPool<T> {
    fn new(chunk_size: usize) -> Self {
        Self {
            type_name: short_type_name(std::any::type_name::<T>()),
            slots: RwLock::new(PoolAllocator::new(chunk_size)),
        }
    }

    fn busy(&self) -> FactoryError {
        FactoryError::PoolBusy {
            type_name: self.type_name,
        }
    }
}

/// Type-erased view of a pool, for whole-registry operations.
trait ErasedPool: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// `None` if the pool is held by an exclusive guard.
    fn stats(&self) -> Option<PoolStats>;

    /// Frees the slot at `index` if it still holds `id`.
    ///
    /// `None` if the pool is locked, otherwise whether a slot was freed.
    fn destroy_slot(&self, index: usize, id: ResourceId) -> Option<bool>;

    /// Frees live slots with no handles. Returns the number freed.
    fn collect_unreferenced(&self) -> usize;

    /// Frees every slot. `None` if the pool is locked.
    fn release_all(&self) -> Option<PoolRelease>;
}

/// Outcome of tearing down one pool.
#[derive(Clone, Copy, Debug, Default)]
struct PoolRelease {
    released: usize,
    outstanding: usize,
}

impl<T: Resource> ErasedPool for TypedPool<T> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn stats(&self) -> Option<PoolStats> {
        let slots = self.slots.try_read()?;
        Some(PoolStats {
            type_name: self.type_name,
            live: slots.allocated_count(),
            capacity: slots.capacity(),
            chunks: slots.chunk_count(),
            referenced: slots.iter().map(|(_, slot)| slot.header.ref_count()).sum(),
        })
    }

    fn destroy_slot(&self, index: usize, id: ResourceId) -> Option<bool> {
        let mut slots = self.slots.try_write()?;
        if !slots.get(index).is_some_and(|slot| slot.id() == id) {
            return Some(false);
        }

        let slot = slots.deallocate(index);
        if let Some(slot) = &slot {
            slot.header.retire();
        }
        drop(slots);
        // Values drop outside the lock so their own handles can be released freely
        drop(slot);

        debug!(pool = self.type_name, %id, index, "resource destroyed");
        Some(true)
    }

    fn collect_unreferenced(&self) -> usize {
        let Some(mut slots) = self.slots.try_write() else {
            debug!(pool = self.type_name, "pool busy, sweep skipped");
            return 0;
        };

        let doomed: Vec<usize> = slots
            .iter()
            .filter(|(_, slot)| slot.header.ref_count() == 0)
            .map(|(index, _)| index)
            .collect();

        let mut released = Vec::with_capacity(doomed.len());
        for index in doomed {
            if let Some(slot) = slots.deallocate(index) {
                slot.header.retire();
                released.push(slot);
            }
        }
        drop(slots);

        let count = released.len();
        drop(released);
        count
    }

    fn release_all(&self) -> Option<PoolRelease> {
        let mut slots = self.slots.try_write()?;
        let outstanding = slots
            .iter()
            .filter(|(_, slot)| slot.header.ref_count() > 0)
            .count();
        let released = slots.allocated_count();

        let mut drained = Vec::with_capacity(released);
        let indices: Vec<usize> = slots.iter().map(|(index, _)| index).collect();
        for index in indices {
            if let Some(slot) = slots.deallocate(index) {
                slot.header.retire();
                drained.push(slot);
            }
        }
        slots.clear();
        drop(slots);
        drop(drained);

        Some(PoolRelease {
            released,
            outstanding,
        })
    }
}

struct PoolEntry {
    erased: Arc<dyn ErasedPool>,
    typed: Arc<dyn Any + Send + Sync>,
}

struct RegistryInner {
    config: FactoryConfig,
    pools: HashMap<TypeId, PoolEntry>,
}

/// Occupancy of one pool, for inspectors and logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Short name of the resource type.
    pub type_name: &'static str,
    /// Live slots.
    pub live: usize,
    /// Total cells, live or free.
    pub capacity: usize,
    /// Chunks appended so far.
    pub chunks: usize,
    /// Sum of reference counts over live slots.
    pub referenced: usize,
}

/// Summary returned by [`FactoryRegistry::shutdown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Slots freed.
    pub released: usize,
    /// Slots that still had handles when freed.
    pub outstanding: usize,
    /// Pools left alone because an access guard was still alive.
    pub skipped_pools: usize,
}

/// Collects resource types, then builds a [`FactoryRegistry`].
///
/// ```rust
/// use kiln_core::{FactoryBuilder, FactoryConfig};
///
/// struct Texture;
/// struct Shader;
///
/// let factory = FactoryBuilder::new(FactoryConfig::default())
///     .register::<Texture>()
///     .register::<Shader>()
///     .build()?;
/// assert!(factory.is_registered::<Shader>());
/// # Ok::<(), kiln_core::FactoryError>(())
/// ```
pub struct FactoryBuilder {
    config: FactoryConfig,
    pools: HashMap<TypeId, PoolEntry>,
    duplicate: Option<&'static str>,
}

impl FactoryBuilder {
    /// Starts a builder with the given configuration.
    #[must_use]
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            config,
            pools: HashMap::new(),
            duplicate: None,
        }
    }

    /// Adds a pool for `T`.
    ///
    /// Registering a type twice is reported by [`build`](Self::build).
    #[must_use]
    pub fn register<T: Resource>(mut self) -> Self {
        let full_name = std::any::type_name::<T>();
        let type_id = TypeId::of::<T>();
        if self.pools.contains_key(&type_id) {
            if self.duplicate.is_none() {
                self.duplicate = Some(short_type_name(full_name));
            }
            return self;
        }

        // Out-of-range sizes are rejected by `build`
        let chunk_size = self.config.chunk_size_for(full_name).max(1);
        let pool = Arc::new(TypedPool::<T>::new(chunk_size));
        let entry = PoolEntry {
            erased: Arc::clone(&pool) as Arc<dyn ErasedPool>,
            typed: pool,
        };
        self.pools.insert(type_id, entry);
        self
    }

    /// Finishes registration.
    ///
    /// # Errors
    ///
    /// `DuplicateRegistration` if any type was registered twice,
    /// `InvalidConfig` if the configuration does not validate.
    pub fn build(self) -> FactoryResult<FactoryRegistry> {
        self.config.validate()?;
        if let Some(type_name) = self.duplicate {
            return Err(FactoryError::DuplicateRegistration { type_name });
        }

        debug!(
            pools = self.pools.len(),
            policy = ?self.config.release_policy,
            "factory registry built"
        );
        Ok(FactoryRegistry {
            inner: Arc::new(RegistryInner {
                config: self.config,
                pools: self.pools,
            }),
        })
    }
}

/// Owns one pool per registered resource type and mints handles into them.
///
/// Cloning a registry (or [`rebind`](Self::rebind)ing one) shares storage:
/// both observe the same pools, so a handle created through one is valid
/// through the other.
#[derive(Clone)]
pub struct FactoryRegistry {
    inner: Arc<RegistryInner>,
}

impl FactoryRegistry {
    /// Starts a builder with the default configuration.
    #[must_use]
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::new(FactoryConfig::default())
    }

    /// Configuration the registry was built with.
    #[must_use]
    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    /// Checks if `T` has a pool.
    #[must_use]
    pub fn is_registered<T: Resource>(&self) -> bool {
        self.inner.pools.contains_key(&TypeId::of::<T>())
    }

    /// Stores `value` in the pool for `T` and returns the first handle to it.
    ///
    /// # Errors
    ///
    /// `UnregisteredType` if `T` has no pool, `PoolBusy` if the pool is held
    /// by a live access guard.
    pub fn create<T: Resource>(&self, value: T) -> FactoryResult<Handle<T>> {
        let pool = self.pool::<T>()?;
        let id = ResourceId::next();
        let header = Arc::new(SlotHeader::new(id));

        let mut slots = pool.slots.try_write().ok_or_else(|| pool.busy())?;
        let index = slots.allocate(ManagedSlot::new(Arc::clone(&header), value));
        // Count reaches 1 before the lock is released, so no sweep can see it at 0
        let handle = Handle::new(id, index, header, Arc::clone(&pool));
        drop(slots);

        trace!(pool = pool.type_name, %id, index, "resource created");
        Ok(handle)
    }

    /// Frees the resource behind `handle`, whatever its reference count.
    ///
    /// Every handle to the resource becomes invalid. Destroying a null or
    /// stale handle does nothing and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// `UnregisteredType` if `T` has no pool, `ForeignHandle` if the handle
    /// came from a registry that does not share storage with this one,
    /// `PoolBusy` if the pool is held by a live access guard.
    pub fn destroy<T: Resource>(&self, handle: &Handle<T>) -> FactoryResult<bool> {
        if !handle.is_valid() {
            trace!(?handle, "destroy of stale handle ignored");
            return Ok(false);
        }

        let pool = self.pool::<T>()?;
        if !handle.belongs_to(&pool) {
            return Err(FactoryError::ForeignHandle {
                type_name: pool.type_name,
            });
        }

        pool.destroy_slot(handle.index(), handle.id()).ok_or_else(|| pool.busy())
    }

    /// Frees the component behind `key`, whatever its reference count.
    ///
    /// Returns `Ok(false)` if the key is stale, or if its type has no pool
    /// here (a key minted by an unrelated registry never matches a slot,
    /// since tokens are unique per process).
    ///
    /// # Errors
    ///
    /// `PoolBusy` if the pool is held by a live access guard.
    pub fn destroy_component(&self, key: ComponentKey) -> FactoryResult<bool> {
        let Some(entry) = self.inner.pools.get(&key.type_id()) else {
            trace!(id = %key.id(), "destroy of component with unregistered type ignored");
            return Ok(false);
        };
        entry
            .erased
            .destroy_slot(key.index(), key.id())
            .ok_or_else(|| FactoryError::PoolBusy {
                type_name: entry.erased.type_name(),
            })
    }

    /// Makes this registry share `other`'s pools.
    ///
    /// Pools previously reachable only through `self` are released once
    /// their last registry and handle are gone.
    pub fn rebind(&mut self, other: &FactoryRegistry) {
        self.inner = Arc::clone(&other.inner);
    }

    /// Checks if both registries observe the same pools.
    #[must_use]
    pub fn shares_storage_with(&self, other: &FactoryRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Live resources of type `T`.
    ///
    /// # Errors
    ///
    /// `UnregisteredType` if `T` has no pool, `PoolBusy` if the pool is held
    /// by a live exclusive guard.
    pub fn live_count<T: Resource>(&self) -> FactoryResult<usize> {
        let pool = self.pool::<T>()?;
        let count = pool
            .slots
            .try_read()
            .map(|slots| slots.allocated_count())
            .ok_or_else(|| pool.busy())?;
        Ok(count)
    }

    /// Occupancy of the pool for `T`.
    ///
    /// # Errors
    ///
    /// `UnregisteredType` if `T` has no pool, `PoolBusy` if the pool is held
    /// by a live exclusive guard.
    pub fn pool_stats<T: Resource>(&self) -> FactoryResult<PoolStats> {
        let pool = self.pool::<T>()?;
        ErasedPool::stats(pool.as_ref()).ok_or_else(|| pool.busy())
    }

    /// Occupancy of every pool, sorted by type name.
    ///
    /// Pools held by a live exclusive guard are left out.
    #[must_use]
    pub fn stats(&self) -> Vec<PoolStats> {
        let mut stats: Vec<PoolStats> = self
            .inner
            .pools
            .values()
            .filter_map(|entry| entry.erased.stats())
            .collect();
        stats.sort_by(|a, b| a.type_name.cmp(b.type_name));
        stats
    }

    /// Calls `visit` with every live resource of type `T`, in index order.
    ///
    /// The pool is read-locked for the duration, so creating or destroying
    /// resources of type `T` inside `visit` fails with `PoolBusy`.
    ///
    /// # Errors
    ///
    /// `UnregisteredType` if `T` has no pool, `PoolBusy` if the pool is held
    /// by a live exclusive guard.
    pub fn visit<T: Resource>(&self, mut visit: impl FnMut(ResourceId, &T)) -> FactoryResult<()> {
        let pool = self.pool::<T>()?;
        let slots = pool.slots.try_read().ok_or_else(|| pool.busy())?;
        for (_, slot) in slots.iter() {
            visit(slot.id(), &slot.value);
        }
        Ok(())
    }

    /// Frees every live resource with no handles, in every pool.
    ///
    /// Pools held by an access guard are skipped until the next call.
    pub fn collect_unreferenced(&self) -> usize {
        let freed: usize = self
            .inner
            .pools
            .values()
            .map(|entry| entry.erased.collect_unreferenced())
            .sum();
        if freed > 0 {
            debug!(freed, "unreferenced resources collected");
        }
        freed
    }

    /// Per-frame upkeep. Sweeps unreferenced resources under
    /// [`ReleasePolicy::Deferred`], does nothing otherwise.
    pub fn maintain(&self) -> usize {
        match self.inner.config.release_policy {
            ReleasePolicy::Explicit => 0,
            ReleasePolicy::Deferred => self.collect_unreferenced(),
        }
    }

    /// Frees every resource in every pool and reports what was still referenced.
    ///
    /// Registries sharing storage with this one observe empty pools afterwards.
    pub fn shutdown(self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        for entry in self.inner.pools.values() {
            let name = entry.erased.type_name();
            match entry.erased.release_all() {
                Some(release) => {
                    report.released += release.released;
                    report.outstanding += release.outstanding;
                    if release.outstanding > 0 {
                        warn!(
                            pool = name,
                            outstanding = release.outstanding,
                            "resources still referenced at shutdown"
                        );
                    }
                }
                None => {
                    warn!(pool = name, "pool locked at shutdown, left in place");
                    report.skipped_pools += 1;
                }
            }
        }
        debug!(released = report.released, "factory registry shut down");
        report
    }

    fn pool<T: Resource>(&self) -> FactoryResult<Arc<TypedPool<T>>> {
        let unregistered = || FactoryError::UnregisteredType {
            type_name: short_type_name(std::any::type_name::<T>()),
        };
        let entry = self
            .inner
            .pools
            .get(&TypeId::of::<T>())
            .ok_or_else(unregistered)?;
        Arc::clone(&entry.typed)
            .downcast::<TypedPool<T>>()
            .map_err(|_| unregistered())
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("pools", &self.inner.pools.len())
            .field("release_policy", &self.inner.config.release_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[derive(Debug)]
    struct Texture {
        width: u32,
    }

    #[derive(Debug)]
    struct Shader;

    struct Unregistered;

    fn factory() -> FactoryRegistry {
        FactoryRegistry::builder()
            .register::<Texture>()
            .register::<Shader>()
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_and_access() {
        let factory = factory();
        let handle = factory.create(Texture { width: 256 }).unwrap();

        assert!(handle.is_valid());
        assert_eq!(handle.ref_count(), 1);
        assert_eq!(handle.read().width, 256);
        assert_eq!(factory.live_count::<Texture>().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_registration() {
        let err = FactoryRegistry::builder()
            .register::<Texture>()
            .register::<Texture>()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            FactoryError::DuplicateRegistration {
                type_name: "Texture"
            }
        );
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let config = FactoryConfig {
            chunk_size: 0,
            ..FactoryConfig::default()
        };
        let err = FactoryBuilder::new(config).build().unwrap_err();
        assert!(matches!(err, FactoryError::InvalidConfig(_)));
    }

    #[test]
    fn test_unregistered_type() {
        let factory = factory();
        assert!(!factory.is_registered::<Unregistered>());
        let err = factory.create(Unregistered).unwrap_err();
        assert_eq!(
            err,
            FactoryError::UnregisteredType {
                type_name: "Unregistered"
            }
        );
    }

    #[test]
    fn test_destroy_ignores_ref_count() {
        let factory = factory();
        let h1 = factory.create(Texture { width: 1 }).unwrap();
        let h2 = h1.clone();

        assert!(factory.destroy(&h1).unwrap());
        assert!(!h1.is_valid());
        assert!(!h2.is_valid());
        assert_eq!(factory.live_count::<Texture>().unwrap(), 0);
    }

    #[test]
    fn test_double_destroy_is_noop() {
        let factory = factory();
        let handle = factory.create(Shader).unwrap();

        assert!(factory.destroy(&handle).unwrap());
        assert!(!factory.destroy(&handle).unwrap());
        assert!(!factory.destroy(&Handle::<Shader>::null()).unwrap());
    }

    #[test]
    fn test_reused_index_gets_new_token() {
        let factory = factory();
        let old = factory.create(Texture { width: 1 }).unwrap();
        let old_index = old.index();
        factory.destroy(&old).unwrap();

        let new = factory.create(Texture { width: 2 }).unwrap();
        assert_eq!(new.index(), old_index);
        assert_ne!(new.id(), old.id());
        assert!(!old.is_valid());
        assert!(old.get().is_none());
        assert_eq!(new.read().width, 2);
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let a = factory();
        let b = factory();
        let handle = a.create(Texture { width: 1 }).unwrap();

        let err = b.destroy(&handle).unwrap_err();
        assert_eq!(
            err,
            FactoryError::ForeignHandle {
                type_name: "Texture"
            }
        );
        assert!(handle.is_valid());
    }

    #[test]
    fn test_destroy_while_guard_alive_is_busy() {
        let factory = factory();
        let handle = factory.create(Texture { width: 1 }).unwrap();

        let guard = handle.read();
        let err = factory.destroy(&handle).unwrap_err();
        assert!(matches!(err, FactoryError::PoolBusy { .. }));
        drop(guard);

        assert!(factory.destroy(&handle).unwrap());
    }

    #[test]
    fn test_reads_while_exclusive_guard_alive_are_busy() {
        let factory = factory();
        let a = factory.create(Texture { width: 1 }).unwrap();
        let b = factory.create(Texture { width: 2 }).unwrap();
        let shader = factory.create(Shader).unwrap();

        let guard = a.write();
        assert!(b.get().is_none());
        assert!(matches!(
            factory.live_count::<Texture>(),
            Err(FactoryError::PoolBusy { .. })
        ));
        assert!(factory.visit::<Texture>(|_, _| {}).is_err());
        assert_eq!(factory.stats().len(), 1);

        // Other pools are unaffected
        assert!(shader.get_mut().is_some());
        drop(guard);

        assert_eq!(factory.live_count::<Texture>().unwrap(), 2);
        assert_eq!(b.read().width, 2);
    }

    #[test]
    fn test_copy_between_resources_of_one_type() {
        let factory = factory();
        let texture = factory.create(Texture { width: 7 }).unwrap();
        let sink = factory.create(Texture { width: 0 }).unwrap();

        let width = texture.read().width;
        sink.write().width = width;
        assert_eq!(sink.read().width, 7);
    }

    #[test]
    fn test_destroy_component_by_key() {
        let factory = factory();
        let handle = factory.create(Texture { width: 1 }).unwrap();
        let key = ComponentKey::of(&handle);

        let guard = handle.read();
        assert!(matches!(
            factory.destroy_component(key),
            Err(FactoryError::PoolBusy { type_name: "Texture" })
        ));
        drop(guard);

        assert!(factory.destroy_component(key).unwrap());
        assert!(!handle.is_valid());
        assert!(!factory.destroy_component(key).unwrap());

        // A key from an unrelated registry never matches a slot here
        let other = FactoryRegistry::builder()
            .register::<Texture>()
            .build()
            .unwrap();
        let foreign = other.create(Texture { width: 1 }).unwrap();
        let _local = factory.create(Texture { width: 2 }).unwrap();
        assert!(!factory.destroy_component(ComponentKey::of(&foreign)).unwrap());
        assert!(foreign.is_valid());

        let unregistered = FactoryRegistry::builder()
            .register::<Unregistered>()
            .build()
            .unwrap();
        let key = ComponentKey::of(&unregistered.create(Unregistered).unwrap());
        assert!(!factory.destroy_component(key).unwrap());
    }

    #[test]
    fn test_rebind_shares_storage() {
        let global = factory();
        let mut scene = factory();
        assert!(!scene.shares_storage_with(&global));

        scene.rebind(&global);
        assert!(scene.shares_storage_with(&global));

        let handle = global.create(Texture { width: 4 }).unwrap();
        assert_eq!(scene.live_count::<Texture>().unwrap(), 1);
        assert!(scene.destroy(&handle).unwrap());
        assert_eq!(global.live_count::<Texture>().unwrap(), 0);
    }

    #[test]
    fn test_stats_and_visit() {
        let factory = factory();
        let a = factory.create(Texture { width: 1 }).unwrap();
        let _b = factory.create(Texture { width: 2 }).unwrap();
        let _a2 = a.clone();

        let stats = factory.pool_stats::<Texture>().unwrap();
        assert_eq!(stats.type_name, "Texture");
        assert_eq!(stats.live, 2);
        assert_eq!(stats.referenced, 3);
        assert_eq!(stats.chunks, 1);

        let names: Vec<_> = factory.stats().into_iter().map(|s| s.type_name).collect();
        assert_eq!(names, vec!["Shader", "Texture"]);

        let mut widths = Vec::new();
        factory
            .visit::<Texture>(|_, texture| widths.push(texture.width))
            .unwrap();
        assert_eq!(widths, vec![1, 2]);
    }

    #[test]
    fn test_explicit_policy_keeps_unreferenced() {
        let factory = factory();
        drop(factory.create(Texture { width: 1 }).unwrap());

        assert_eq!(factory.maintain(), 0);
        assert_eq!(factory.live_count::<Texture>().unwrap(), 1);

        assert_eq!(factory.collect_unreferenced(), 1);
        assert_eq!(factory.live_count::<Texture>().unwrap(), 0);
    }

    #[test]
    fn test_deferred_policy_sweeps() {
        let config = FactoryConfig {
            release_policy: ReleasePolicy::Deferred,
            ..FactoryConfig::default()
        };
        let factory = FactoryBuilder::new(config)
            .register::<Texture>()
            .build()
            .unwrap();

        let kept = factory.create(Texture { width: 1 }).unwrap();
        drop(factory.create(Texture { width: 2 }).unwrap());

        assert_eq!(factory.maintain(), 1);
        assert!(kept.is_valid());
        assert_eq!(factory.live_count::<Texture>().unwrap(), 1);
    }

    #[test]
    fn test_shutdown_reports_outstanding() {
        let factory = factory();
        let survivor = factory.create(Texture { width: 1 }).unwrap();
        drop(factory.create(Shader).unwrap());
        let view = factory.clone();

        let report = factory.shutdown();
        assert_eq!(report.released, 2);
        assert_eq!(report.outstanding, 1);
        assert_eq!(report.skipped_pools, 0);
        assert!(!survivor.is_valid());
        assert_eq!(view.live_count::<Texture>().unwrap(), 0);
    }

    #[test]
    fn test_chunk_override_applies() {
        let config = FactoryConfig::from_toml_str("[pools.Texture]\nchunk_size = 2").unwrap();
        let factory = FactoryBuilder::new(config)
            .register::<Texture>()
            .build()
            .unwrap();

        let _handles: Vec<_> = (0..5)
            .map(|width| factory.create(Texture { width }).unwrap())
            .collect();
        let stats = factory.pool_stats::<Texture>().unwrap();
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.capacity, 6);
    }

    proptest! {
        /// Distinct live handles never share (token, index), and every
        /// handle outliving its resource reads as invalid.
        #[test]
        fn live_handles_are_distinct(ops in prop::collection::vec(any::<Option<u8>>(), 1..200)) {
            let factory = factory();
            let mut live: Vec<Handle<Texture>> = Vec::new();
            let mut dead: Vec<Handle<Texture>> = Vec::new();

            for op in ops {
                match op {
                    Some(pick) if !live.is_empty() => {
                        let handle = live.swap_remove(usize::from(pick) % live.len());
                        prop_assert!(factory.destroy(&handle).unwrap());
                        dead.push(handle);
                    }
                    _ => live.push(factory.create(Texture { width: 0 }).unwrap()),
                }

                let ids: HashSet<_> = live.iter().map(|h| (h.id(), h.index())).collect();
                let indices: HashSet<_> = live.iter().map(Handle::index).collect();
                prop_assert_eq!(ids.len(), live.len());
                prop_assert_eq!(indices.len(), live.len());
                prop_assert!(live.iter().all(Handle::is_valid));
                prop_assert!(dead.iter().all(|h| !h.is_valid()));
            }
        }
    }
}
