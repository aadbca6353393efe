//! # Factory Error Types
//!
//! All errors that can be returned by the resource factory.
//!
//! Stale handle access is deliberately absent: it is reported through
//! `Option` on the checked accessors and through a panic on the asserting
//! ones. Out-of-memory aborts.

use thiserror::Error;

/// Errors that can occur in the resource factory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    /// The resource type was never registered with this factory.
    #[error("resource type {type_name} is not registered with this factory")]
    UnregisteredType {
        /// Name of the requested type.
        type_name: &'static str,
    },

    /// The same resource type was registered more than once.
    #[error("resource type {type_name} registered more than once")]
    DuplicateRegistration {
        /// Name of the duplicated type.
        type_name: &'static str,
    },

    /// The pool is held by a live access guard and cannot be mutated.
    #[error("pool for {type_name} is borrowed by an outstanding access guard")]
    PoolBusy {
        /// Name of the pool's resource type.
        type_name: &'static str,
    },

    /// The handle was minted by a factory that does not share storage with this one.
    #[error("handle to {type_name} belongs to a different factory")]
    ForeignHandle {
        /// Name of the handle's resource type.
        type_name: &'static str,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(String),
}

/// Result type for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;
