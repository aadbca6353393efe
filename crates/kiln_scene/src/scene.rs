//! # Scene
//!
//! A named world sharing the engine-wide resource factory.

use kiln_core::ecs::World;
use kiln_core::{ComponentKey, EntityId, FactoryRegistry, Handle};
use tracing::{debug, warn};

use crate::backend::GraphicsBackend;
use crate::error::{SceneError, SceneResult};
use crate::resources::{Mesh, Shader, Texture, TextureOptions};

/// A named set of entities.
///
/// Every scene shares the factory of the scene manager, so resources created
/// in one scene stay valid when another is loaded.
pub struct Scene {
    name: String,
    factory: FactoryRegistry,
    world: World,
    loaded: bool,
}

impl Scene {
    /// Creates an unloaded scene with room for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(name: impl Into<String>, factory: FactoryRegistry, capacity: usize) -> Self {
        Self {
            name: name.into(),
            factory,
            world: World::new(capacity),
            loaded: false,
        }
    }

    /// Scene name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Factory backing this scene's resources.
    #[must_use]
    pub fn factory(&self) -> &FactoryRegistry {
        &self.factory
    }

    /// The scene's entities.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the scene's entities.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Checks if the scene is currently loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Called when the scene becomes current.
    pub fn on_load(&mut self) {
        self.loaded = true;
        debug!(scene = %self.name, entities = self.world.alive_count(), "scene loaded");
    }

    /// Called when another scene replaces this one.
    ///
    /// Entities are kept; deferred resource sweeps run here.
    pub fn on_unload(&mut self) {
        self.loaded = false;
        let freed = self.factory.maintain();
        let pruned = self.world.prune_owners();
        debug!(scene = %self.name, freed, pruned, "scene unloaded");
    }

    /// Spawns an entity.
    ///
    /// # Errors
    ///
    /// `WorldFull` if the world has no free slots.
    pub fn spawn(&mut self) -> SceneResult<EntityId> {
        let entity = self.world.spawn();
        if entity.is_null() {
            return Err(SceneError::WorldFull(self.world.capacity()));
        }
        Ok(entity)
    }

    /// Despawns `entity` and destroys every component it owned.
    ///
    /// Returns the number of components destroyed.
    ///
    /// # Errors
    ///
    /// `DeadEntity` if `entity` is not alive, or `PoolBusy` if a component
    /// pool is held by a live access guard. The entity is gone either way.
    pub fn despawn(&mut self, entity: EntityId) -> SceneResult<usize> {
        let owned = self
            .world
            .despawn_with_components(entity)
            .ok_or(SceneError::DeadEntity)?;
        let destroyed = self.destroy_components(owned)?;
        debug!(scene = %self.name, %entity, destroyed, "entity despawned");
        Ok(destroyed)
    }

    /// Despawns every entity and destroys the components they owned.
    ///
    /// # Errors
    ///
    /// `PoolBusy` if a component pool is held by a live access guard.
    pub fn clear(&mut self) -> SceneResult<usize> {
        let owned = self.world.clear();
        self.destroy_components(owned)
    }

    /// Loads a texture through `backend` into the factory.
    ///
    /// # Errors
    ///
    /// Backend errors, or a factory error if the texture pool is unavailable.
    pub fn load_texture(
        &self,
        backend: &mut dyn GraphicsBackend,
        path: &str,
        options: TextureOptions,
    ) -> SceneResult<Handle<Texture>> {
        let texture = backend.load_texture(path, options)?;
        Ok(self.factory.create(texture)?)
    }

    /// Loads a texture, substituting `fallback` if the asset is missing or unusable.
    ///
    /// # Errors
    ///
    /// Factory errors only; asset errors are replaced by the fallback.
    pub fn load_texture_or(
        &self,
        backend: &mut dyn GraphicsBackend,
        path: &str,
        options: TextureOptions,
        fallback: &Handle<Texture>,
    ) -> SceneResult<Handle<Texture>> {
        match self.load_texture(backend, path, options) {
            Err(err @ (SceneError::AssetNotFound(_) | SceneError::InvalidAsset { .. })) => {
                warn!(path, backend = backend.name(), %err, "texture load failed, using fallback");
                Ok(fallback.clone())
            }
            other => other,
        }
    }

    /// Loads a shader program through `backend` into the factory.
    ///
    /// # Errors
    ///
    /// Backend errors, or a factory error if the shader pool is unavailable.
    pub fn load_shader(
        &self,
        backend: &mut dyn GraphicsBackend,
        vertex_path: &str,
        fragment_path: &str,
    ) -> SceneResult<Handle<Shader>> {
        let shader = backend.load_shader(vertex_path, fragment_path)?;
        Ok(self.factory.create(shader)?)
    }

    /// Uploads a mesh through `backend` into the factory.
    ///
    /// # Errors
    ///
    /// Backend errors, or a factory error if the mesh pool is unavailable.
    pub fn create_mesh(
        &self,
        backend: &mut dyn GraphicsBackend,
        name: &str,
        positions: &[[f32; 3]],
        indices: &[u32],
    ) -> SceneResult<Handle<Mesh>> {
        let mesh = backend.create_mesh(name, positions, indices)?;
        Ok(self.factory.create(mesh)?)
    }

    /// Gives `entity` a mesh: attaches the handle and copies the mesh bounds.
    ///
    /// # Errors
    ///
    /// `StaleResource` if the mesh handle is stale, `DeadEntity` if the
    /// entity is not alive.
    pub fn attach_mesh(&mut self, entity: EntityId, mesh: &Handle<Mesh>) -> SceneResult<()> {
        let bounds = mesh.get().map(|mesh| mesh.bounds).ok_or(SceneError::StaleResource)?;
        if !self.world.attach(entity, mesh) {
            return Err(SceneError::DeadEntity);
        }
        self.world.set_mesh_bounds(entity, bounds.into());
        Ok(())
    }

    fn destroy_components(&self, owned: Vec<ComponentKey>) -> SceneResult<usize> {
        let mut destroyed = 0;
        let mut first_error = None;
        for key in owned {
            match self.factory.destroy_component(key) {
                Ok(true) => destroyed += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(scene = %self.name, id = %key.id(), %err, "component left alive");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(destroyed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::resources::register_all;
    use kiln_core::FactoryBuilder;

    fn scene() -> Scene {
        let factory = register_all(FactoryBuilder::new(Default::default()))
            .build()
            .unwrap();
        Scene::new("Level1", factory, 4)
    }

    #[test]
    fn test_load_flags() {
        let mut scene = scene();
        assert!(!scene.is_loaded());
        scene.on_load();
        assert!(scene.is_loaded());
        scene.on_unload();
        assert!(!scene.is_loaded());
        assert_eq!(scene.name(), "Level1");
    }

    #[test]
    fn test_spawn_until_full() {
        let mut scene = scene();
        for _ in 0..4 {
            scene.spawn().unwrap();
        }
        assert_eq!(scene.spawn(), Err(SceneError::WorldFull(4)));
    }

    #[test]
    fn test_texture_fallback() {
        let scene = scene();
        let mut backend = HeadlessBackend::new();
        backend.add_image("default.png", 1, 1, 4);
        backend.add_image("grass.png", 64, 64, 3);

        let fallback = scene
            .load_texture(&mut backend, "default.png", TextureOptions::default())
            .unwrap();
        let grass = scene
            .load_texture_or(&mut backend, "grass.png", TextureOptions::default(), &fallback)
            .unwrap();
        assert_ne!(grass, fallback);

        let missing = scene
            .load_texture_or(&mut backend, "rock.png", TextureOptions::default(), &fallback)
            .unwrap();
        assert_eq!(missing, fallback);
        assert_eq!(fallback.ref_count(), 2);
    }

    #[test]
    fn test_attach_mesh_copies_bounds() {
        let mut scene = scene();
        let mut backend = HeadlessBackend::new();
        let mesh = scene
            .create_mesh(
                &mut backend,
                "quad",
                &[[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]],
                &[0, 1, 2, 0, 2, 3],
            )
            .unwrap();
        let entity = scene.spawn().unwrap();

        scene.attach_mesh(entity, &mesh).unwrap();
        assert_eq!(scene.world().owner_of(&mesh), Some(entity));
        let bounds = scene.world().mesh_bounds(entity).unwrap();
        assert!((bounds.radius - 2.0_f32.sqrt()).abs() < 1e-5);

        scene.factory().destroy(&mesh).unwrap();
        assert!(scene.world().owners().components_of(entity).is_empty());
        assert_eq!(scene.attach_mesh(entity, &mesh), Err(SceneError::StaleResource));
    }

    #[test]
    fn test_despawn_destroys_owned_components() {
        let mut scene = scene();
        let mut backend = HeadlessBackend::new();
        let mesh = scene
            .create_mesh(&mut backend, "tri", &[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[0, 1, 2])
            .unwrap();
        let entity = scene.spawn().unwrap();
        let bystander = scene.spawn().unwrap();
        scene.attach_mesh(entity, &mesh).unwrap();

        assert_eq!(scene.despawn(entity), Ok(1));
        assert!(!mesh.is_valid());
        assert_eq!(scene.factory().live_count::<Mesh>().unwrap(), 0);
        assert_eq!(scene.despawn(entity), Err(SceneError::DeadEntity));
        assert!(scene.world().is_alive(bystander));
    }

    #[test]
    fn test_despawn_with_borrowed_component_reports_busy() {
        let mut scene = scene();
        let mut backend = HeadlessBackend::new();
        let mesh = scene
            .create_mesh(&mut backend, "tri", &[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[0, 1, 2])
            .unwrap();
        let entity = scene.spawn().unwrap();
        scene.attach_mesh(entity, &mesh).unwrap();

        let guard = mesh.read();
        assert!(matches!(
            scene.despawn(entity),
            Err(SceneError::Factory(kiln_core::FactoryError::PoolBusy { .. }))
        ));
        drop(guard);
        assert!(!scene.world().is_alive(entity));
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_clear_destroys_everything_owned() {
        let mut scene = scene();
        let mut backend = HeadlessBackend::new();
        let points = [[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        for _ in 0..3 {
            let mesh = scene.create_mesh(&mut backend, "tri", &points, &[0, 1, 2]).unwrap();
            let entity = scene.spawn().unwrap();
            scene.attach_mesh(entity, &mesh).unwrap();
        }

        assert_eq!(scene.clear(), Ok(3));
        assert_eq!(scene.world().alive_count(), 0);
        assert_eq!(scene.factory().live_count::<Mesh>().unwrap(), 0);
    }

    #[test]
    fn test_shader_load() {
        let scene = scene();
        let mut backend = HeadlessBackend::new();
        backend.add_source("lit.vert", "void main() {}");
        backend.add_source("lit.frag", "void main() {}");

        let shader = scene
            .load_shader(&mut backend, "lit.vert", "lit.frag")
            .unwrap();
        assert_eq!(shader.read().vertex_path, "lit.vert");
        assert_eq!(scene.factory().live_count::<Shader>().unwrap(), 1);
    }
}
