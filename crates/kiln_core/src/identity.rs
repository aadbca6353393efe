//! # Resource Identity
//!
//! Identity tokens distinguish the "generations" of a reused pool slot.
//!
//! Every token comes from one process-wide monotonic counter, so a token is
//! never issued twice during the lifetime of the process. A handle that
//! remembers the token it was minted with can therefore always tell whether
//! the slot it points at still holds *its* resource.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for [`ResourceId`] allocation. Zero is reserved for null.
static RESOURCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque, totally ordered identity token of a pooled resource.
///
/// Tokens have no meaning across processes and are never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ResourceId(u64);

impl ResourceId {
    /// The reserved "no resource" token.
    pub const NULL: Self = Self(0);

    /// Allocates a fresh token.
    ///
    /// Each call returns a token strictly greater than every token returned
    /// before it within this process. Thread-safe.
    ///
    /// # Panics
    ///
    /// Panics if the 64-bit counter wraps, which would break uniqueness.
    #[must_use]
    pub fn next() -> Self {
        let raw = RESOURCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        assert!(raw != u64::MAX, "resource identity counter exhausted");
        Self(raw)
    }

    /// Rebuilds a token read back from a slot header.
    #[inline]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the null token.
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self::NULL
    }

    /// Checks if this is the null token.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Raw counter value, for logging and inspectors.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
