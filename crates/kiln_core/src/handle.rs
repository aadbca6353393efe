//! # Resource Handles
//!
//! A [`Handle`] is the only way consumers reach a pooled resource.
//!
//! ## Validity
//!
//! ```text
//! Handle { id: #7, index: 3 } ──► pool[3].header.id == #7 ?  ──► valid
//!                                                 == #9 ?  ──► stale (slot reused)
//!                                                 == null? ──► stale (destroyed)
//! ```
//!
//! Validity is decided by identity comparison, never by the reference count.
//! Every allocation gets its own [`SlotHeader`], and tokens are never reused,
//! so an index recycled for a new resource can never alias an old handle.
//!
//! ## Reference counting
//!
//! Cloning a valid handle increments the count stored in the slot header,
//! dropping one decrements it. Neither takes the pool lock. Reaching zero does
//! not free the slot; see [`ReleasePolicy`](crate::config::ReleasePolicy).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};

use crate::factory::TypedPool;
use crate::identity::ResourceId;

/// Slot index carried by null handles.
pub const INVALID_INDEX: usize = usize::MAX;

/// Anything that can live in a factory pool.
///
/// Blanket-implemented; pools are shared across threads behind a lock, so
/// resources must be `Send + Sync`.
pub trait Resource: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Resource for T {}

/// Shared read access to a pooled resource.
pub type ResourceRef<'a, T> = MappedRwLockReadGuard<'a, T>;

/// Exclusive write access to a pooled resource.
pub type ResourceMut<'a, T> = MappedRwLockWriteGuard<'a, T>;

/// Identity token and reference count of one allocation.
///
/// Shared between the pool slot and every handle to it, so handles can be
/// validated, cloned and dropped without touching the pool.
#[derive(Debug)]
pub struct SlotHeader {
    /// Live token, or null once the slot is torn down.
    id: AtomicU64,
    /// Number of live handles.
    ref_count: AtomicUsize,
}

impl SlotHeader {
    pub(crate) fn new(id: ResourceId) -> Self {
        Self {
            id: AtomicU64::new(id.get()),
            ref_count: AtomicUsize::new(0),
        }
    }

    /// Token of the resource currently held, or null.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ResourceId {
        ResourceId::from_raw(self.id.load(Ordering::Acquire))
    }

    /// Number of live handles.
    #[inline]
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Clears the token. Every handle to this allocation becomes invalid.
    #[inline]
    pub(crate) fn retire(&self) {
        self.id.store(ResourceId::NULL.get(), Ordering::Release);
    }
}

/// The pool's stored unit: value plus its shared header.
pub(crate) struct ManagedSlot<T> {
    pub(crate) header: Arc<SlotHeader>,
    pub(crate) value: T,
}

impl<T> ManagedSlot<T> {
    pub(crate) fn new(header: Arc<SlotHeader>, value: T) -> Self {
        Self { header, value }
    }

    #[inline]
    pub(crate) fn id(&self) -> ResourceId {
        self.header.id()
    }
}

impl<T> Drop for ManagedSlot<T> {
    fn drop(&mut self) {
        self.header.retire();
    }
}

/// Reference-counted handle to a resource owned by a factory pool.
///
/// The pool owns the storage; the handle only references it. Moving a handle
/// never touches the count. [`take`](Self::take) moves out and leaves a null
/// handle behind.
///
/// # Example
///
/// ```rust
/// use kiln_core::{FactoryRegistry, Handle};
///
/// struct Mesh(&'static str);
///
/// let factory = FactoryRegistry::builder().register::<Mesh>().build()?;
///
/// let h1 = factory.create(Mesh("crate"))?;
/// let h2 = h1.clone();
/// assert_eq!(h1.ref_count(), 2);
///
/// factory.destroy(&h1)?;
/// assert!(!h2.is_valid());
/// assert!(h2.get().is_none());
/// # Ok::<(), kiln_core::FactoryError>(())
/// ```
pub struct Handle<T: Resource> {
    id: ResourceId,
    index: usize,
    header: Option<Arc<SlotHeader>>,
    pool: Option<Arc<TypedPool<T>>>,
    /// Resource type name, for debugger and log output only.
    #[cfg(feature = "diagnostics")]
    type_name: &'static str,
}

impl<T: Resource> Handle<T> {
    /// Wraps a freshly allocated slot and takes the first reference.
    pub(crate) fn new(
        id: ResourceId,
        index: usize,
        header: Arc<SlotHeader>,
        pool: Arc<TypedPool<T>>,
    ) -> Self {
        let handle = Self {
            id,
            index,
            header: Some(header),
            pool: Some(pool),
            #[cfg(feature = "diagnostics")]
            type_name: std::any::type_name::<T>(),
        };
        handle.retain();
        handle
    }

    /// Creates a null handle that refers to nothing.
    #[must_use]
    pub fn null() -> Self {
        Self {
            id: ResourceId::NULL,
            index: INVALID_INDEX,
            header: None,
            pool: None,
            #[cfg(feature = "diagnostics")]
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Identity token this handle was minted with.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// Pool slot index, or [`INVALID_INDEX`] for a null handle.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Checks if this is a null handle.
    ///
    /// A non-null handle may still be stale; use [`is_valid`](Self::is_valid).
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.index == INVALID_INDEX
    }

    /// True iff the slot is live and still holds the resource this handle was minted for.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.live_header().is_some()
    }

    /// Number of live handles to the resource, or 0 if this handle is stale.
    #[inline]
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.live_header().map_or(0, SlotHeader::ref_count)
    }

    /// Moves the reference out, leaving a null handle in its place.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Shared access to the resource.
    ///
    /// `None` if the handle is stale, or if the pool is held by a live
    /// exclusive guard (on any handle of the same type).
    #[must_use]
    pub fn get(&self) -> Option<ResourceRef<'_, T>> {
        if !self.is_valid() {
            return None;
        }
        let pool = self.pool.as_ref()?;
        let (id, index) = (self.id, self.index);
        RwLockReadGuard::try_map(pool.slots.try_read()?, |slots| {
            slots
                .get(index)
                .filter(|slot| slot.id() == id)
                .map(|slot| &slot.value)
        })
        .ok()
    }

    /// Exclusive access to the resource.
    ///
    /// `None` if the handle is stale, or if the pool is held by any live
    /// guard (on any handle of the same type).
    #[must_use]
    pub fn get_mut(&self) -> Option<ResourceMut<'_, T>> {
        if !self.is_valid() {
            return None;
        }
        let pool = self.pool.as_ref()?;
        let (id, index) = (self.id, self.index);
        RwLockWriteGuard::try_map(pool.slots.try_write()?, |slots| {
            slots
                .get_mut(index)
                .filter(|slot| slot.id() == id)
                .map(|slot| &mut slot.value)
        })
        .ok()
    }

    /// Shared access to the resource.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null or stale, or if the pool is held by a
    /// live exclusive guard. Never blocks.
    #[must_use]
    pub fn read(&self) -> ResourceRef<'_, T> {
        match self.get() {
            Some(guard) => guard,
            None => self.access_failed(),
        }
    }

    /// Exclusive access to the resource.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null or stale, or if the pool is held by any
    /// live guard. Never blocks.
    #[must_use]
    pub fn write(&self) -> ResourceMut<'_, T> {
        match self.get_mut() {
            Some(guard) => guard,
            None => self.access_failed(),
        }
    }

    /// Live header, for bookkeeping that must notice destruction later.
    pub(crate) fn header(&self) -> Option<&Arc<SlotHeader>> {
        self.live_header()?;
        self.header.as_ref()
    }

    /// Checks if this handle was minted by `pool`.
    pub(crate) fn belongs_to(&self, pool: &Arc<TypedPool<T>>) -> bool {
        self.pool.as_ref().is_some_and(|own| Arc::ptr_eq(own, pool))
    }

    #[inline]
    fn live_header(&self) -> Option<&SlotHeader> {
        if self.id.is_null() || self.index == INVALID_INDEX {
            return None;
        }
        self.header
            .as_deref()
            .filter(|header| header.id() == self.id)
    }

    #[cold]
    fn access_failed(&self) -> ! {
        if self.is_valid() {
            panic!("pool busy: {self:?} is borrowed by another live guard");
        }
        panic!("dereferenced stale handle {self:?}");
    }

    fn retain(&self) {
        if let Some(header) = self.live_header() {
            header.ref_count.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn release(&self) {
        if let Some(header) = self.live_header() {
            let released = header
                .ref_count
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1));
            debug_assert!(released.is_ok(), "reference count underflow on {self:?}");
        }
    }
}

impl<T: Resource> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Resource> Clone for Handle<T> {
    fn clone(&self) -> Self {
        self.retain();
        Self {
            id: self.id,
            index: self.index,
            header: self.header.clone(),
            pool: self.pool.clone(),
            #[cfg(feature = "diagnostics")]
            type_name: self.type_name,
        }
    }
}

impl<T: Resource> Drop for Handle<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Resource> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.index == other.index
    }
}

impl<T: Resource> Eq for Handle<T> {}

impl<T: Resource> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.index.hash(state);
    }
}

impl<T: Resource> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Handle");
        #[cfg(feature = "diagnostics")]
        out.field("type", &self.type_name);
        out.field("id", &self.id)
            .field("index", &self.index)
            .field("valid", &self.is_valid())
            .finish()
    }
}
