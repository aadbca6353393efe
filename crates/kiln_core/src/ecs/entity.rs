//! # Entities
//!
//! An [`EntityId`] packs a slot index with the generation of that slot, so an
//! id kept past its entity's despawn stops matching once the slot is reused.

use std::fmt;

use super::component::Component;

/// Generational entity id.
///
/// Bits 0..32 hold the slot index, bits 32..64 the generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// The id that never names an entity.
    pub const NULL: Self = Self(u64::MAX);

    /// Packs a slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Slot index.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation of the slot when this id was issued.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this is [`EntityId::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    /// The id the next occupant of this slot will get.
    #[inline]
    #[must_use]
    pub const fn next_generation(self) -> Self {
        Self::new(self.index(), self.generation().wrapping_add(1))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "entity(null)")
        } else {
            write!(f, "entity({}v{})", self.index(), self.generation())
        }
    }
}

/// One entity slot of a [`World`](super::World).
#[derive(Clone, Copy, Debug)]
pub struct Entity {
    id: EntityId,
    dense: u64,
    alive: bool,
}

impl Entity {
    /// Live slot holding `id`, with no dense components.
    #[inline]
    #[must_use]
    pub(crate) const fn spawned(id: EntityId) -> Self {
        Self {
            id,
            dense: 0,
            alive: true,
        }
    }

    /// Empty slot that remembers the last id it held.
    #[inline]
    #[must_use]
    pub(crate) const fn vacant(last: EntityId) -> Self {
        Self {
            id: last,
            dense: 0,
            alive: false,
        }
    }

    /// Id of the entity in this slot (the last one, if vacant).
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Checks if the slot holds a live entity.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Checks if the entity has a `C`.
    #[inline]
    #[must_use]
    pub const fn has<C: Component>(&self) -> bool {
        self.dense & (1 << C::ID) != 0
    }

    #[inline]
    pub(crate) fn insert<C: Component>(&mut self) {
        self.dense |= 1 << C::ID;
    }
}
