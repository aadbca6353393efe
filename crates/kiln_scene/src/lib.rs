//! # KILN Scene
//!
//! Scenes and scene components built on `kiln_core`.
//!
//! ## Responsibilities
//!
//! - **Resources**: texture, shader, mesh and sphere shape values stored in factory pools
//! - **Backend**: the [`GraphicsBackend`] trait that builds graphics resources
//! - **Collider**: a sphere collider that reads its owner's transform through the owner index
//! - **Scenes**: named worlds sharing one factory, switched by the [`SceneManager`]
//!
//! ## Example
//!
//! ```rust
//! use kiln_scene::{SceneConfig, SceneManager};
//!
//! let mut scenes = SceneManager::with_builtin_resources(SceneConfig::default())?;
//! scenes.create_scene("Level1")?;
//! scenes.load_scene("Level1")?;
//! assert_eq!(scenes.current_scene().map(|s| s.name()), Some("Level1"));
//! # Ok::<(), kiln_scene::SceneError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backend;
pub mod collider;
pub mod config;
pub mod error;
pub mod manager;
pub mod resources;
pub mod scene;

pub use backend::{GraphicsBackend, HeadlessBackend};
pub use collider::SphereCollider;
pub use config::SceneConfig;
pub use error::{SceneError, SceneResult};
pub use manager::SceneManager;
pub use resources::{Aabb, BoundingSphere, Mesh, Shader, SphereShape, Texture, TextureOptions};
pub use scene::Scene;
