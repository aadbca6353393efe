//! # Scene Error Types

use kiln_core::FactoryError;
use thiserror::Error;

/// Errors that can occur while managing scenes and their resources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A resource factory operation failed.
    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// No scene with this name exists.
    #[error("scene {0:?} does not exist")]
    NotFound(String),

    /// A scene with this name already exists.
    #[error("scene {0:?} already exists")]
    AlreadyExists(String),

    /// The global scene cannot be loaded or destroyed.
    #[error("scene {0:?} is the global scene")]
    GlobalSceneProtected(String),

    /// The scene is currently loaded.
    #[error("scene {0:?} is currently loaded")]
    SceneInUse(String),

    /// The backend has no asset at this path.
    #[error("asset {0:?} not found")]
    AssetNotFound(String),

    /// The asset exists but cannot be used.
    #[error("invalid asset {path:?}: {reason}")]
    InvalidAsset {
        /// Asset path or name.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The world has no free entity slots.
    #[error("world capacity of {0} entities reached")]
    WorldFull(usize),

    /// The entity does not exist or was despawned.
    #[error("entity is not alive")]
    DeadEntity,

    /// The resource handle is null or its resource was destroyed.
    #[error("resource handle is stale")]
    StaleResource,

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
