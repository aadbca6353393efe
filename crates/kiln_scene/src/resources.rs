//! # Pooled Resource Types
//!
//! Values stored in the factory pools. Graphics resources are built by a
//! [`GraphicsBackend`](crate::backend::GraphicsBackend); sphere shapes come
//! from the physics side.

use kiln_core::ecs::{MeshBounds, Transform};
use kiln_core::FactoryBuilder;

/// Registers every resource type in this module.
#[must_use]
pub fn register_all(builder: FactoryBuilder) -> FactoryBuilder {
    builder
        .register::<Texture>()
        .register::<Shader>()
        .register::<Mesh>()
        .register::<SphereShape>()
}

/// Texture loading options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureOptions {
    /// Generate the mip chain after upload.
    pub generate_mipmaps: bool,
    /// Flip rows so the first row is the bottom of the image.
    pub flip_vertically: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            generate_mipmaps: true,
            flip_vertically: true,
        }
    }
}

/// A texture uploaded by the graphics backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    /// Source path.
    pub path: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channels per pixel.
    pub channels: u8,
    /// Number of mip levels, including the base level.
    pub mip_levels: u32,
}

impl Texture {
    /// Mip levels of a full chain for the given size.
    #[must_use]
    pub fn full_mip_chain(width: u32, height: u32) -> u32 {
        u32::BITS - width.max(height).max(1).leading_zeros()
    }
}

/// A compiled vertex + fragment shader program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shader {
    /// Vertex stage source path.
    pub vertex_path: String,
    /// Fragment stage source path.
    pub fragment_path: String,
    /// Backend program id.
    pub program: u32,
}

/// Vertex and index data uploaded as one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Debug name.
    pub name: String,
    /// Number of vertices.
    pub vertex_count: usize,
    /// Number of indices.
    pub index_count: usize,
    /// Mesh-space bounding sphere.
    pub bounds: BoundingSphere,
}

/// Sphere in either mesh or world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    /// Center point.
    pub center: [f32; 3],
    /// Radius.
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            radius: 1.0,
        }
    }
}

impl BoundingSphere {
    /// Creates a sphere.
    #[must_use]
    pub const fn new(center: [f32; 3], radius: f32) -> Self {
        Self { center, radius }
    }

    /// Smallest sphere around the centroid that contains every point.
    ///
    /// `None` for an empty point set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let count = points.len() as f32;
        let mut center = [0.0_f32; 3];
        for point in points {
            for (sum, coord) in center.iter_mut().zip(point) {
                *sum += coord / count;
            }
        }
        let radius = points
            .iter()
            .map(|point| distance(center, *point))
            .fold(0.0_f32, f32::max);
        Some(Self { center, radius })
    }

    /// Places the sphere in world space.
    #[must_use]
    pub fn transformed(self, transform: Transform) -> Self {
        Self {
            center: transform.transform_point(self.center),
            radius: self.radius * transform.scale.abs(),
        }
    }
}

impl From<MeshBounds> for BoundingSphere {
    fn from(bounds: MeshBounds) -> Self {
        Self::new(bounds.center, bounds.radius)
    }
}

impl From<BoundingSphere> for MeshBounds {
    fn from(sphere: BoundingSphere) -> Self {
        Self::new(sphere.center, sphere.radius)
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Aabb {
    /// Box enclosing a sphere.
    #[must_use]
    pub fn around(sphere: BoundingSphere) -> Self {
        let [x, y, z] = sphere.center;
        let r = sphere.radius;
        Self {
            min: [x - r, y - r, z - r],
            max: [x + r, y + r, z + r],
        }
    }

    /// Edge lengths.
    #[must_use]
    pub fn extent(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Physics sphere shape, centered on its local origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereShape {
    /// Local radius.
    pub radius: f32,
    /// Local center offset.
    pub offset: [f32; 3],
}

impl SphereShape {
    /// Shape matching a mesh-space bounding sphere.
    #[must_use]
    pub const fn new(sphere: BoundingSphere) -> Self {
        Self {
            radius: sphere.radius,
            offset: sphere.center,
        }
    }

    /// World-space bounding sphere under `transform`.
    #[must_use]
    pub fn bounding_sphere(&self, transform: Transform) -> BoundingSphere {
        BoundingSphere::new(self.offset, self.radius).transformed(transform)
    }

    /// World-space bounding box under `transform`.
    #[must_use]
    pub fn aabb(&self, transform: Transform) -> Aabb {
        Aabb::around(self.bounding_sphere(transform))
    }
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
