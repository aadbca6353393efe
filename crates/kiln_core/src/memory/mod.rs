//! # Memory Management
//!
//! Slot-stable pools backing every managed resource.
//!
//! ## Design Philosophy
//!
//! - Storage grows by appending chunks, never by moving live slots
//! - Freed slots are reused, so steady-state churn does not allocate
//! - Indices are the only thing handed out; validation lives one layer up

mod pool;

pub use pool::{PoolAllocator, DEFAULT_CHUNK_SIZE};
