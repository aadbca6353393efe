//! # Factory Configuration
//!
//! Loaded once at startup from TOML.
//!
//! ```toml
//! chunk_size = 64
//! release_policy = "explicit"
//!
//! [pools.Texture]
//! chunk_size = 16
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FactoryError, FactoryResult};
use crate::memory::DEFAULT_CHUNK_SIZE;

/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 1 << 16;

/// What happens to a slot whose last handle is dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleasePolicy {
    /// Nothing. Slots live until `destroy` is called on the factory.
    #[default]
    Explicit,
    /// Unreferenced slots are freed by the next `maintain` sweep.
    Deferred,
}

/// Per-type pool overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Cells appended per growth step for this type.
    pub chunk_size: usize,
}

/// Configuration for a [`FactoryRegistry`](crate::factory::FactoryRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Cells appended per growth step, for types without an override.
    pub chunk_size: usize,
    /// Zero-reference release policy.
    pub release_policy: ReleasePolicy,
    /// Overrides keyed by the short type name (`Texture`, not `my_crate::Texture`).
    pub pools: HashMap<String, PoolConfig>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            release_policy: ReleasePolicy::Explicit,
            pools: HashMap::new(),
        }
    }
}

impl FactoryConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `ConfigLoad` on malformed TOML, `InvalidConfig` on out-of-range values.
    pub fn from_toml_str(source: &str) -> FactoryResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| FactoryError::ConfigLoad(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `ConfigLoad` if the file cannot be read or parsed, `InvalidConfig` on
    /// out-of-range values.
    pub fn from_file(path: impl AsRef<Path>) -> FactoryResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| FactoryError::ConfigLoad(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks every chunk size is within `1..=MAX_CHUNK_SIZE`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first offending entry.
    pub fn validate(&self) -> FactoryResult<()> {
        check_chunk_size("chunk_size", self.chunk_size)?;
        for (name, pool) in &self.pools {
            check_chunk_size(&format!("pools.{name}.chunk_size"), pool.chunk_size)?;
        }
        Ok(())
    }

    /// Chunk size for a type, honouring overrides.
    #[must_use]
    pub fn chunk_size_for(&self, type_name: &str) -> usize {
        self.pools
            .get(short_type_name(type_name))
            .map_or(self.chunk_size, |pool| pool.chunk_size)
    }
}

fn check_chunk_size(key: &str, value: usize) -> FactoryResult<()> {
    if value == 0 || value > MAX_CHUNK_SIZE {
        return Err(FactoryError::InvalidConfig(format!(
            "{key} must be in 1..={MAX_CHUNK_SIZE}, got {value}"
        )));
    }
    Ok(())
}

/// Strips the module path (and generic arguments) from a type name.
#[must_use]
pub fn short_type_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}
