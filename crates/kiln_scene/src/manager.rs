//! # Scene Manager
//!
//! Owns every scene and the factory they share.
//!
//! ```text
//! SceneManager
//!   ├─ FactoryRegistry           (one per engine; every scene holds a shared clone)
//!   ├─ "Global"  (always loaded, cannot be loaded/destroyed by name)
//!   ├─ "Menu"
//!   └─ "Level1"  ◄── current
//! ```

use std::collections::HashMap;

use kiln_core::{FactoryBuilder, FactoryRegistry, ShutdownReport};
use tracing::{debug, warn};

use crate::collider::SphereCollider;
use crate::config::SceneConfig;
use crate::error::{SceneError, SceneResult};
use crate::resources::register_all;
use crate::scene::Scene;

/// Named scenes plus the protected global scene.
pub struct SceneManager {
    config: SceneConfig,
    factory: FactoryRegistry,
    global: Scene,
    scenes: HashMap<String, Scene>,
    current: Option<String>,
}

impl SceneManager {
    /// Creates a manager over an existing factory.
    ///
    /// The global scene is created and loaded immediately.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` or a factory error if `config` does not validate.
    pub fn new(config: SceneConfig, factory: FactoryRegistry) -> SceneResult<Self> {
        config.validate()?;
        let mut global = Scene::new(
            config.global_scene.clone(),
            factory.clone(),
            config.entity_capacity,
        );
        global.on_load();

        Ok(Self {
            config,
            factory,
            global,
            scenes: HashMap::new(),
            current: None,
        })
    }

    /// Creates a manager with a factory holding every built-in resource type.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` or a factory error if `config` does not validate.
    pub fn with_builtin_resources(config: SceneConfig) -> SceneResult<Self> {
        let factory = register_all(FactoryBuilder::new(config.factory.clone()))
            .register::<SphereCollider>()
            .build()?;
        Self::new(config, factory)
    }

    /// The shared resource factory.
    #[must_use]
    pub fn factory(&self) -> &FactoryRegistry {
        &self.factory
    }

    /// Configuration the manager was built with.
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Creates an unloaded scene sharing the global factory.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the name is taken, including by the global scene.
    pub fn create_scene(&mut self, name: &str) -> SceneResult<&mut Scene> {
        if self.scene_exists(name) {
            return Err(SceneError::AlreadyExists(name.to_owned()));
        }

        let factory = self.global.factory().clone();
        let scene = Scene::new(name, factory, self.config.entity_capacity);
        debug!(scene = name, "scene created");
        Ok(self.scenes.entry(name.to_owned()).or_insert(scene))
    }

    /// Makes `name` the current scene, unloading the previous one first.
    ///
    /// # Errors
    ///
    /// `GlobalSceneProtected` for the global scene, `NotFound` for an unknown name.
    pub fn load_scene(&mut self, name: &str) -> SceneResult<()> {
        if self.is_global(name) {
            warn!(scene = name, "the global scene is always loaded");
            return Err(SceneError::GlobalSceneProtected(name.to_owned()));
        }
        if !self.scenes.contains_key(name) {
            return Err(SceneError::NotFound(name.to_owned()));
        }

        if let Some(previous) = self.current.take() {
            if let Some(scene) = self.scenes.get_mut(&previous) {
                scene.on_unload();
            }
        }
        if let Some(scene) = self.scenes.get_mut(name) {
            scene.on_load();
        }
        self.current = Some(name.to_owned());
        Ok(())
    }

    /// Removes a scene, despawning its entities and destroying the
    /// components they owned.
    ///
    /// # Errors
    ///
    /// `GlobalSceneProtected` for the global scene, `NotFound` for an unknown
    /// name, `SceneInUse` for the current scene. A factory error if a
    /// component pool is busy; the scene is kept, with its entities gone.
    pub fn destroy_scene(&mut self, name: &str) -> SceneResult<()> {
        if self.is_global(name) {
            return Err(SceneError::GlobalSceneProtected(name.to_owned()));
        }
        if self.current.as_deref() == Some(name) {
            return Err(SceneError::SceneInUse(name.to_owned()));
        }
        let scene = self
            .scenes
            .get_mut(name)
            .ok_or_else(|| SceneError::NotFound(name.to_owned()))?;

        let destroyed = scene.clear()?;
        self.scenes.remove(name);
        debug!(scene = name, destroyed, "scene destroyed");
        Ok(())
    }

    /// The current scene, if one was loaded.
    #[must_use]
    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.as_deref().and_then(|name| self.scenes.get(name))
    }

    /// Mutable access to the current scene.
    pub fn current_scene_mut(&mut self) -> Option<&mut Scene> {
        let name = self.current.as_deref()?;
        self.scenes.get_mut(name)
    }

    /// The global scene.
    #[must_use]
    pub fn global_scene(&self) -> &Scene {
        &self.global
    }

    /// Mutable access to the global scene.
    pub fn global_scene_mut(&mut self) -> &mut Scene {
        &mut self.global
    }

    /// Scene by name, including the global scene.
    #[must_use]
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        if self.is_global(name) {
            return Some(&self.global);
        }
        self.scenes.get(name)
    }

    /// Mutable scene by name, including the global scene.
    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        if self.is_global(name) {
            return Some(&mut self.global);
        }
        self.scenes.get_mut(name)
    }

    /// Checks if a scene with this name exists, including the global scene.
    #[must_use]
    pub fn scene_exists(&self, name: &str) -> bool {
        self.is_global(name) || self.scenes.contains_key(name)
    }

    /// Names of the non-global scenes, sorted.
    #[must_use]
    pub fn scene_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scenes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Per-frame resource upkeep.
    pub fn maintain(&self) -> usize {
        self.factory.maintain()
    }

    /// Drops every scene and tears down the factory.
    pub fn shutdown(self) -> ShutdownReport {
        let Self {
            factory,
            global,
            scenes,
            ..
        } = self;
        drop(scenes);
        drop(global);
        factory.shutdown()
    }

    fn is_global(&self, name: &str) -> bool {
        self.config.global_scene == name
    }
}
