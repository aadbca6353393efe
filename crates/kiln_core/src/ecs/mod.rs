//! # Entity Component System
//!
//! Minimal ECS for scenes.
//!
//! ## Design Philosophy
//!
//! - Dense plain-data components (transforms, mesh bounds) live in the world
//! - Resource-backed components live in factory pools and are tied to their
//!   entity through the [`OwnerIndex`]
//! - Entity IDs are indices with generation counters

mod component;
mod entity;
mod owner;
mod storage;
mod world;

pub use component::{Component, MeshBounds, Transform};
pub use entity::{Entity, EntityId};
pub use owner::{ComponentKey, OwnerIndex};
pub use storage::ComponentStorage;
pub use world::World;
