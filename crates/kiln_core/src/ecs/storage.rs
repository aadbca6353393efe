//! # Component Storage
//!
//! Dense per-entity storage for one [`Component`] type, sized once with the
//! world. Access is O(1) by entity index.

use super::component::Component;

/// Pre-allocated storage for a single component type.
pub struct ComponentStorage<C: Component> {
    data: Box<[C]>,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates storage with `capacity` default-initialised slots.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            data: vec![C::default(); capacity].into_boxed_slice(),
        }
    }

    /// Component at `index`, or `None` out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)
    }

    /// Overwrites the slot at `index`, returning the old value.
    ///
    /// `None` if the index is out of bounds.
    #[inline]
    pub fn replace(&mut self, index: usize, component: C) -> Option<C> {
        self.data
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, component))
    }

    /// Resets a slot to the component's default value.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = C::default();
        }
    }

    /// Resets every slot.
    pub fn clear(&mut self) {
        self.data.fill(C::default());
    }
}
