//! # KILN Core
//!
//! Resource ownership by handle, for a real-time 3D engine:
//! - Pooled, slot-stable storage per resource type
//! - Reference-counted handles that detect use after free
//! - Component-to-owner bindings for scene entities
//!
//! ## Architecture Rules
//!
//! 1. **Pools own resources** - Consumers only ever hold a [`Handle`]
//! 2. **Identity, not addresses** - A handle is (token, index); tokens are never reused
//! 3. **Stale access fails loudly** - Checked accessors return `None`, asserting ones panic
//!
//! ## Example
//!
//! ```rust
//! use kiln_core::FactoryRegistry;
//!
//! struct Texture { width: u32 }
//!
//! let factory = FactoryRegistry::builder().register::<Texture>().build()?;
//! let texture = factory.create(Texture { width: 512 })?;
//! assert_eq!(texture.read().width, 512);
//!
//! factory.destroy(&texture)?;
//! assert!(!texture.is_valid());
//! # Ok::<(), kiln_core::FactoryError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod factory;
pub mod handle;
pub mod identity;
pub mod memory;

pub use config::{FactoryConfig, PoolConfig, ReleasePolicy};
pub use ecs::{ComponentKey, EntityId, OwnerIndex, World};
pub use error::{FactoryError, FactoryResult};
pub use factory::{FactoryBuilder, FactoryRegistry, PoolStats, ShutdownReport};
pub use handle::{Handle, Resource, ResourceMut, ResourceRef};
pub use identity::ResourceId;
pub use memory::PoolAllocator;
