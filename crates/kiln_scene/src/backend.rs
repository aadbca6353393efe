//! # Graphics Backend Interface
//!
//! The backend constructs graphics resources; the factory owns them once
//! built. Any retry or fallback policy belongs to the caller, see
//! [`Scene::load_texture_or`](crate::scene::Scene::load_texture_or).

use std::collections::HashMap;
use std::fmt::Debug;

use tracing::debug;

use crate::error::{SceneError, SceneResult};
use crate::resources::{BoundingSphere, Mesh, Shader, Texture, TextureOptions};

/// Builds graphics resources for a rendering API.
pub trait GraphicsBackend: Debug {
    /// Human-readable backend name, for logs.
    fn name(&self) -> &str;

    /// Loads and uploads a texture.
    ///
    /// # Errors
    ///
    /// `AssetNotFound` if the path is unknown, `InvalidAsset` if the image
    /// cannot be used.
    fn load_texture(&mut self, path: &str, options: TextureOptions) -> SceneResult<Texture>;

    /// Loads and links a vertex + fragment program.
    ///
    /// # Errors
    ///
    /// `AssetNotFound` if either source is unknown, `InvalidAsset` if a
    /// stage is empty.
    fn load_shader(&mut self, vertex_path: &str, fragment_path: &str) -> SceneResult<Shader>;

    /// Uploads triangle-list mesh data.
    ///
    /// # Errors
    ///
    /// `InvalidAsset` for empty vertex data, a partial triangle or an
    /// out-of-range index.
    fn create_mesh(
        &mut self,
        name: &str,
        positions: &[[f32; 3]],
        indices: &[u32],
    ) -> SceneResult<Mesh>;
}

#[derive(Clone, Copy, Debug)]
struct ImageInfo {
    width: u32,
    height: u32,
    channels: u8,
}

/// CPU-only backend backed by an in-memory asset table.
///
/// Used by tools and tests that need real resource lifecycles without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    images: HashMap<String, ImageInfo>,
    sources: HashMap<String, String>,
    next_program: u32,
    uploads: usize,
}

impl HeadlessBackend {
    /// Creates a backend with no assets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes an image available at `path`.
    pub fn add_image(&mut self, path: impl Into<String>, width: u32, height: u32, channels: u8) {
        self.images.insert(
            path.into(),
            ImageInfo {
                width,
                height,
                channels,
            },
        );
    }

    /// Makes shader source available at `path`.
    pub fn add_source(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(path.into(), source.into());
    }

    /// Number of successful uploads so far.
    #[must_use]
    pub const fn uploads(&self) -> usize {
        self.uploads
    }

    fn source(&self, path: &str) -> SceneResult<&str> {
        let source = self
            .sources
            .get(path)
            .ok_or_else(|| SceneError::AssetNotFound(path.to_owned()))?;
        if source.trim().is_empty() {
            return Err(invalid(path, "empty shader stage"));
        }
        Ok(source)
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn load_texture(&mut self, path: &str, options: TextureOptions) -> SceneResult<Texture> {
        let image = *self
            .images
            .get(path)
            .ok_or_else(|| SceneError::AssetNotFound(path.to_owned()))?;
        if image.width == 0 || image.height == 0 {
            return Err(invalid(path, "zero-sized image"));
        }
        if !(1..=4).contains(&image.channels) {
            return Err(invalid(path, "unsupported channel count"));
        }

        let mip_levels = if options.generate_mipmaps {
            Texture::full_mip_chain(image.width, image.height)
        } else {
            1
        };
        self.uploads += 1;
        debug!(path, width = image.width, height = image.height, mip_levels, "texture uploaded");
        Ok(Texture {
            path: path.to_owned(),
            width: image.width,
            height: image.height,
            channels: image.channels,
            mip_levels,
        })
    }

    fn load_shader(&mut self, vertex_path: &str, fragment_path: &str) -> SceneResult<Shader> {
        self.source(vertex_path)?;
        self.source(fragment_path)?;

        self.next_program += 1;
        self.uploads += 1;
        debug!(vertex_path, fragment_path, program = self.next_program, "shader linked");
        Ok(Shader {
            vertex_path: vertex_path.to_owned(),
            fragment_path: fragment_path.to_owned(),
            program: self.next_program,
        })
    }

    fn create_mesh(
        &mut self,
        name: &str,
        positions: &[[f32; 3]],
        indices: &[u32],
    ) -> SceneResult<Mesh> {
        let bounds =
            BoundingSphere::from_points(positions).ok_or_else(|| invalid(name, "no vertices"))?;
        if indices.len() % 3 != 0 {
            return Err(invalid(name, "index count is not a multiple of 3"));
        }
        if indices
            .iter()
            .any(|&index| usize::try_from(index).map_or(true, |i| i >= positions.len()))
        {
            return Err(invalid(name, "index out of range"));
        }

        self.uploads += 1;
        Ok(Mesh {
            name: name.to_owned(),
            vertex_count: positions.len(),
            index_count: indices.len(),
            bounds,
        })
    }
}

fn invalid(path: &str, reason: &str) -> SceneError {
    SceneError::InvalidAsset {
        path: path.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

    #[test]
    fn test_texture_load() {
        let mut backend = HeadlessBackend::new();
        backend.add_image("bricks.png", 512, 256, 4);

        let texture = backend
            .load_texture("bricks.png", TextureOptions::default())
            .unwrap();
        assert_eq!(texture.width, 512);
        assert_eq!(texture.mip_levels, 10);

        let flat = backend
            .load_texture(
                "bricks.png",
                TextureOptions {
                    generate_mipmaps: false,
                    ..TextureOptions::default()
                },
            )
            .unwrap();
        assert_eq!(flat.mip_levels, 1);
        assert_eq!(backend.uploads(), 2);
    }

    #[test]
    fn test_texture_errors() {
        let mut backend = HeadlessBackend::new();
        backend.add_image("empty.png", 0, 16, 4);
        backend.add_image("weird.png", 16, 16, 7);

        assert_eq!(
            backend.load_texture("missing.png", TextureOptions::default()),
            Err(SceneError::AssetNotFound("missing.png".into()))
        );
        assert!(matches!(
            backend.load_texture("empty.png", TextureOptions::default()),
            Err(SceneError::InvalidAsset { .. })
        ));
        assert!(matches!(
            backend.load_texture("weird.png", TextureOptions::default()),
            Err(SceneError::InvalidAsset { .. })
        ));
        assert_eq!(backend.uploads(), 0);
    }

    #[test]
    fn test_shader_programs_are_distinct() {
        let mut backend = HeadlessBackend::new();
        backend.add_source("basic.vert", "void main() {}");
        backend.add_source("basic.frag", "void main() {}");
        backend.add_source("blank.frag", "   ");

        let a = backend.load_shader("basic.vert", "basic.frag").unwrap();
        let b = backend.load_shader("basic.vert", "basic.frag").unwrap();
        assert_ne!(a.program, b.program);

        assert!(matches!(
            backend.load_shader("basic.vert", "blank.frag"),
            Err(SceneError::InvalidAsset { .. })
        ));
        assert!(matches!(
            backend.load_shader("nope.vert", "basic.frag"),
            Err(SceneError::AssetNotFound(_))
        ));
    }

    #[test]
    fn test_mesh_validation() {
        let mut backend = HeadlessBackend::new();

        let mesh = backend.create_mesh("tri", &TRIANGLE, &[0, 1, 2]).unwrap();
        assert_eq!(mesh.vertex_count, 3);
        assert!(mesh.bounds.radius > 0.0);

        assert!(backend.create_mesh("empty", &[], &[]).is_err());
        assert!(backend.create_mesh("partial", &TRIANGLE, &[0, 1]).is_err());
        assert!(backend.create_mesh("oob", &TRIANGLE, &[0, 1, 3]).is_err());
        assert_eq!(backend.name(), "headless");
    }
}
