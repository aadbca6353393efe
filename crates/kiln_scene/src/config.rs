//! # Scene Configuration
//!
//! ```toml
//! global_scene = "Global"
//! entity_capacity = 4096
//!
//! [factory]
//! chunk_size = 64
//! release_policy = "deferred"
//! ```

use std::path::Path;

use kiln_core::FactoryConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// Name of the always-present scene.
pub const DEFAULT_GLOBAL_SCENE: &str = "Global";

/// Default entity capacity of each scene's world.
pub const DEFAULT_ENTITY_CAPACITY: usize = 4096;

/// Configuration for a [`SceneManager`](crate::manager::SceneManager).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Name of the protected global scene.
    pub global_scene: String,
    /// Entity capacity of every scene world.
    pub entity_capacity: usize,
    /// Resource factory shared by all scenes.
    pub factory: FactoryConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            global_scene: DEFAULT_GLOBAL_SCENE.to_owned(),
            entity_capacity: DEFAULT_ENTITY_CAPACITY,
            factory: FactoryConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `ConfigLoad` on malformed TOML, `InvalidConfig` on out-of-range values.
    pub fn from_toml_str(source: &str) -> SceneResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| SceneError::ConfigLoad(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `ConfigLoad` if the file cannot be read or parsed, `InvalidConfig` on
    /// out-of-range values.
    pub fn from_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| SceneError::ConfigLoad(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Validates every field, including the nested factory section.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the offending entry.
    pub fn validate(&self) -> SceneResult<()> {
        if self.global_scene.trim().is_empty() {
            return Err(SceneError::InvalidConfig(
                "global_scene must not be empty".into(),
            ));
        }
        if self.entity_capacity == 0 || u32::try_from(self.entity_capacity).is_err() {
            return Err(SceneError::InvalidConfig(format!(
                "entity_capacity must be in 1..={}, got {}",
                u32::MAX,
                self.entity_capacity
            )));
        }
        self.factory.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::ReleasePolicy;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.global_scene, "Global");
        assert_eq!(config.entity_capacity, DEFAULT_ENTITY_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_with_factory_section() {
        let config = SceneConfig::from_toml_str(
            r#"
            global_scene = "Persistent"
            entity_capacity = 128

            [factory]
            release_policy = "deferred"
            "#,
        )
        .unwrap();

        assert_eq!(config.global_scene, "Persistent");
        assert_eq!(config.entity_capacity, 128);
        assert_eq!(config.factory.release_policy, ReleasePolicy::Deferred);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            SceneConfig::from_toml_str("entity_capacity = 0"),
            Err(SceneError::InvalidConfig(_))
        ));
        assert!(matches!(
            SceneConfig::from_toml_str("global_scene = \"  \""),
            Err(SceneError::InvalidConfig(_))
        ));
        assert!(matches!(
            SceneConfig::from_toml_str("[factory]\nchunk_size = 0"),
            Err(SceneError::Factory(_))
        ));
        assert!(matches!(
            SceneConfig::from_toml_str("entity_capacity = \"many\""),
            Err(SceneError::ConfigLoad(_))
        ));
    }
}
