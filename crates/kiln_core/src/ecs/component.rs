//! # Dense Components
//!
//! Plain-data components stored inline in the [`World`](super::World), one
//! slot per entity. Resource-backed components (colliders, mesh renderers)
//! live in factory pools instead and are tied to entities by the
//! [`OwnerIndex`](super::OwnerIndex).

use bytemuck::{Pod, Zeroable};

/// Marker trait for dense ECS components.
///
/// Components must be `Copy + Pod` so a slot can be reset by overwrite.
pub trait Component: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// Bit in the entity component mask (0-63).
    const ID: u8;
}

/// World-space placement of an entity.
///
/// Scale is uniform.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// World-space translation.
    pub translation: [f32; 3],
    /// Uniform scale factor.
    pub scale: f32,
}

impl Component for Transform {
    const ID: u8 = 0;
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No translation, unit scale.
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        scale: 1.0,
    };

    /// Creates a transform at `translation` with unit scale.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: [x, y, z],
            scale: 1.0,
        }
    }

    /// Returns a copy with the given uniform scale.
    #[inline]
    #[must_use]
    pub const fn with_scale(self, scale: f32) -> Self {
        Self {
            translation: self.translation,
            scale,
        }
    }

    /// Maps a local-space point into world space.
    #[inline]
    #[must_use]
    pub fn transform_point(self, point: [f32; 3]) -> [f32; 3] {
        let [x, y, z] = point;
        let [tx, ty, tz] = self.translation;
        [x * self.scale + tx, y * self.scale + ty, z * self.scale + tz]
    }
}

/// Local-space bounding sphere of the mesh an entity renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MeshBounds {
    /// Sphere center in mesh space.
    pub center: [f32; 3],
    /// Sphere radius in mesh space.
    pub radius: f32,
}

impl Component for MeshBounds {
    const ID: u8 = 1;
}

impl MeshBounds {
    /// Creates mesh bounds.
    #[inline]
    #[must_use]
    pub const fn new(center: [f32; 3], radius: f32) -> Self {
        Self { center, radius }
    }
}
