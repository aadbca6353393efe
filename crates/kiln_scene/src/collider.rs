//! # Sphere Collider
//!
//! A pool-resident component wrapping a physics [`SphereShape`].
//!
//! The collider stores only its shape handle. Transform and mesh bounds are
//! read from the owning entity, found through the world's owner index:
//!
//! ```text
//! Handle<SphereCollider> ──ComponentKey──► OwnerIndex ──► EntityId ──► World { Transform, MeshBounds }
//! ```
//!
//! The shape is registered to the same owner, so
//! [`Scene::despawn`](crate::scene::Scene::despawn) frees both.

use kiln_core::ecs::{MeshBounds, World};
use kiln_core::{EntityId, FactoryRegistry, Handle};
use tracing::debug;

use crate::error::{SceneError, SceneResult};
use crate::resources::{Aabb, BoundingSphere, SphereShape};

/// Where the current shape came from.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ShapeSource {
    /// Unit sphere, never fitted.
    Default,
    /// Fitted to the owner's mesh bounds.
    Mesh(MeshBounds),
    /// Set explicitly; not refitted.
    Manual,
}

/// Sphere collider component.
#[derive(Debug)]
pub struct SphereCollider {
    shape: Handle<SphereShape>,
    source: ShapeSource,
    changed: bool,
}

impl SphereCollider {
    /// Creates a collider for `owner`, attaches it, and fits it to the
    /// owner's mesh bounds if it has any.
    ///
    /// # Errors
    ///
    /// `DeadEntity` if `owner` is not alive, or a factory error if either
    /// pool is unregistered or busy.
    pub fn init(
        factory: &FactoryRegistry,
        world: &mut World,
        owner: EntityId,
    ) -> SceneResult<Handle<Self>> {
        if !world.is_alive(owner) {
            return Err(SceneError::DeadEntity);
        }

        let shape = factory.create(SphereShape::new(BoundingSphere::default()))?;
        world.attach(owner, &shape);
        let collider = factory.create(Self {
            shape,
            source: ShapeSource::Default,
            changed: true,
        })?;
        world.attach(owner, &collider);
        Self::update_collider(&collider, factory, world)?;
        Ok(collider)
    }

    /// Refits the shape if the owner's mesh bounds changed since the last fit.
    ///
    /// Returns `true` if a new shape was created. Stale or detached
    /// colliders and manually sized shapes are left alone.
    ///
    /// # Errors
    ///
    /// A factory error if the shape pool is unregistered or busy.
    pub fn update_collider(
        this: &Handle<Self>,
        factory: &FactoryRegistry,
        world: &mut World,
    ) -> SceneResult<bool> {
        let Some(owner) = world.owner_of(this) else {
            return Ok(false);
        };
        let Some(bounds) = world.mesh_bounds(owner) else {
            return Ok(false);
        };
        let Some(mut collider) = this.get_mut() else {
            return Ok(false);
        };

        let refit = match collider.source {
            ShapeSource::Default => true,
            ShapeSource::Mesh(previous) => previous != bounds,
            ShapeSource::Manual => false,
        };
        if refit {
            collider.replace_shape(factory, world, Some(owner), bounds.into())?;
            collider.source = ShapeSource::Mesh(bounds);
        }
        Ok(refit)
    }

    /// Replaces the shape with one built from `sphere` (mesh space).
    ///
    /// The shape is not refitted to mesh bounds afterwards.
    ///
    /// # Errors
    ///
    /// A factory error if the shape pool is unregistered or busy.
    pub fn set_bounding_sphere(
        this: &Handle<Self>,
        factory: &FactoryRegistry,
        world: &mut World,
        sphere: BoundingSphere,
    ) -> SceneResult<()> {
        let owner = world.owner_of(this);
        if let Some(mut collider) = this.get_mut() {
            collider.replace_shape(factory, world, owner, sphere)?;
            collider.source = ShapeSource::Manual;
        }
        Ok(())
    }

    /// World-space bounding box, or `None` if the collider is stale, detached
    /// or its owner has no transform.
    #[must_use]
    pub fn aabb(this: &Handle<Self>, world: &World) -> Option<Aabb> {
        let transform = world.transform(world.owner_of(this)?)?;
        let collider = this.get()?;
        let shape = collider.shape.get()?;
        Some(shape.aabb(transform))
    }

    /// World-space bounding sphere, under the same conditions as [`aabb`](Self::aabb).
    #[must_use]
    pub fn bounding_sphere(this: &Handle<Self>, world: &World) -> Option<BoundingSphere> {
        let transform = world.transform(world.owner_of(this)?)?;
        let collider = this.get()?;
        let shape = collider.shape.get()?;
        Some(shape.bounding_sphere(transform))
    }

    /// Destroys the collider and its shape and detaches it from its owner.
    ///
    /// # Errors
    ///
    /// A factory error if either pool is busy.
    pub fn destroy(
        this: &Handle<Self>,
        factory: &FactoryRegistry,
        world: &mut World,
    ) -> SceneResult<bool> {
        world.detach(this);
        let shape = match this.get() {
            Some(collider) => collider.shape.clone(),
            None => return Ok(false),
        };
        world.detach(&shape);
        factory.destroy(&shape)?;
        Ok(factory.destroy(this)?)
    }

    /// Handle to the physics shape.
    #[must_use]
    pub fn native_shape(&self) -> &Handle<SphereShape> {
        &self.shape
    }

    /// Checks if the shape was replaced since the flag was last cleared.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.changed
    }

    /// Clears the change flag, typically after the physics world picked up the new shape.
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    fn replace_shape(
        &mut self,
        factory: &FactoryRegistry,
        world: &mut World,
        owner: Option<EntityId>,
        sphere: BoundingSphere,
    ) -> SceneResult<()> {
        let shape = factory.create(SphereShape::new(sphere))?;
        if let Some(owner) = owner {
            world.attach(owner, &shape);
        }
        let previous = std::mem::replace(&mut self.shape, shape);
        world.detach(&previous);
        factory.destroy(&previous)?;
        self.changed = true;
        debug!(radius = sphere.radius, "collider shape replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::ecs::Transform;
    use kiln_core::ComponentKey;

    fn setup() -> (FactoryRegistry, World, EntityId) {
        let factory = FactoryRegistry::builder()
            .register::<SphereShape>()
            .register::<SphereCollider>()
            .build()
            .unwrap();
        let mut world = World::new(8);
        let owner = world.spawn();
        (factory, world, owner)
    }

    #[test]
    fn test_init_without_mesh_uses_unit_sphere() {
        let (factory, mut world, owner) = setup();
        let collider = SphereCollider::init(&factory, &mut world, owner).unwrap();

        assert_eq!(world.owner_of(&collider), Some(owner));
        let sphere = SphereCollider::bounding_sphere(&collider, &world).unwrap();
        assert_eq!(sphere, BoundingSphere::default());
        assert!(collider.read().is_changed());
    }

    #[test]
    fn test_init_fits_mesh_bounds() {
        let (factory, mut world, owner) = setup();
        world.set_mesh_bounds(owner, MeshBounds::new([0.0, 1.0, 0.0], 3.0));
        world.set_transform(owner, Transform::from_translation(5.0, 0.0, 0.0));

        let collider = SphereCollider::init(&factory, &mut world, owner).unwrap();
        let sphere = SphereCollider::bounding_sphere(&collider, &world).unwrap();
        assert_eq!(sphere, BoundingSphere::new([5.0, 1.0, 0.0], 3.0));

        let aabb = SphereCollider::aabb(&collider, &world).unwrap();
        assert_eq!(aabb.min, [2.0, -2.0, -3.0]);
        assert_eq!(aabb.max, [8.0, 4.0, 3.0]);

        // Only the fitted shape is live; the default one was destroyed
        assert_eq!(factory.live_count::<SphereShape>().unwrap(), 1);
    }

    #[test]
    fn test_update_refits_only_on_change() {
        let (factory, mut world, owner) = setup();
        world.set_mesh_bounds(owner, MeshBounds::new([0.0; 3], 1.0));
        let collider = SphereCollider::init(&factory, &mut world, owner).unwrap();
        collider.write().clear_changed();
        let first_shape = collider.read().native_shape().clone();

        assert!(!SphereCollider::update_collider(&collider, &factory, &mut world).unwrap());
        assert!(!collider.read().is_changed());

        world.set_mesh_bounds(owner, MeshBounds::new([0.0; 3], 2.0));
        assert!(SphereCollider::update_collider(&collider, &factory, &mut world).unwrap());
        assert!(collider.read().is_changed());
        assert!(!first_shape.is_valid());

        // The owner owns the collider and its current shape only
        let shape = ComponentKey::of(collider.read().native_shape());
        assert_eq!(
            world.owners().components_of(owner),
            vec![ComponentKey::of(&collider), shape]
        );
    }

    #[test]
    fn test_manual_sphere_sticks() {
        let (factory, mut world, owner) = setup();
        world.set_mesh_bounds(owner, MeshBounds::new([0.0; 3], 1.0));
        let collider = SphereCollider::init(&factory, &mut world, owner).unwrap();

        SphereCollider::set_bounding_sphere(
            &collider,
            &factory,
            &mut world,
            BoundingSphere::new([0.0; 3], 9.0),
        )
        .unwrap();
        world.set_mesh_bounds(owner, MeshBounds::new([0.0; 3], 2.0));
        assert!(!SphereCollider::update_collider(&collider, &factory, &mut world).unwrap());

        let sphere = SphereCollider::bounding_sphere(&collider, &world).unwrap();
        assert_eq!(sphere.radius, 9.0);
    }

    #[test]
    fn test_init_on_dead_entity() {
        let (factory, mut world, owner) = setup();
        world.despawn(owner);
        assert_eq!(
            SphereCollider::init(&factory, &mut world, owner).unwrap_err(),
            SceneError::DeadEntity
        );
    }

    #[test]
    fn test_despawned_owner_makes_queries_none() {
        let (factory, mut world, owner) = setup();
        let collider = SphereCollider::init(&factory, &mut world, owner).unwrap();

        world.despawn(owner);
        assert!(SphereCollider::aabb(&collider, &world).is_none());
        assert!(!SphereCollider::update_collider(&collider, &factory, &mut world).unwrap());
    }

    #[test]
    fn test_destroy_releases_both_pools() {
        let (factory, mut world, owner) = setup();
        let collider = SphereCollider::init(&factory, &mut world, owner).unwrap();

        assert!(SphereCollider::destroy(&collider, &factory, &mut world).unwrap());
        assert_eq!(factory.live_count::<SphereShape>().unwrap(), 0);
        assert_eq!(factory.live_count::<SphereCollider>().unwrap(), 0);
        assert!(world.owners().is_empty());
        assert!(!SphereCollider::destroy(&collider, &factory, &mut world).unwrap());
    }
}
