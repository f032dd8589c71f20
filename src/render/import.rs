//! File importers that turn model files into an [`ImportedScene`].
//!
//! The scene is plain CPU data. [`Model`](super::model::Model) walks it and
//! does every GPU upload, so the importers never touch the device.

use std::{
  collections::HashMap,
  path::{Component, Path, PathBuf},
};

use glam::Mat4;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use log::{debug, warn};
use thiserror::Error;

use super::texture::TextureKind;

#[derive(Debug, Error)]
pub enum ImportError {
  #[error(transparent)]
  Obj(#[from] tobj::LoadError),
  #[error(transparent)]
  Gltf(#[from] gltf::Error),
}

/// Model file formats with an importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
  Obj,
  Gltf,
}

impl ModelFormat {
  /// Picks the importer from the file extension, case-insensitively.
  pub fn from_path(path: &Path) -> Option<Self> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
      "obj" => Some(ModelFormat::Obj),
      "gltf" | "glb" => Some(ModelFormat::Gltf),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
  pub triangulate: bool,
  /// Flip texture coordinates so `v = 0` is the first image row.
  pub flip_uvs:    bool,
}

/// Where a material's texture comes from.
#[derive(Debug, Clone)]
pub enum TextureSource {
  /// Path as written in the model file, relative to the model's directory.
  File(PathBuf),
  /// Pixels the importer already decoded, identified by `key`.
  Decoded { key: PathBuf, image: DynamicImage },
}

impl TextureSource {
  /// Cache identity, resolved against the model directory and normalised, so
  /// `a.png`, `./a.png` and `maps/../a.png` name one texture.
  pub fn key(&self, directory: &Path) -> PathBuf {
    match self {
      TextureSource::File(path) => normalize_path(&directory.join(path)),
      TextureSource::Decoded { key, .. } => normalize_path(key),
    }
  }
}

/// Drops `.` components and folds `..` into the component before it, without
/// touching the file system. Leading `..` of a relative path are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match normalized.components().next_back() {
        Some(Component::Normal(_)) => {
          normalized.pop();
        }
        Some(Component::RootDir | Component::Prefix(_)) => {}
        _ => normalized.push(".."),
      },
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

#[derive(Debug, Clone, Default)]
pub struct ImportedMaterial {
  pub name:     String,
  pub textures: Vec<(TextureKind, TextureSource)>,
}

impl ImportedMaterial {
  pub fn textures_of(&self, kind: TextureKind) -> impl Iterator<Item = &TextureSource> {
    self
      .textures
      .iter()
      .filter(move |(k, _)| *k == kind)
      .map(|(_, source)| source)
  }
}

#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
  pub name:       String,
  pub positions:  Vec<[f32; 3]>,
  /// Empty or one per position.
  pub normals:    Vec<[f32; 3]>,
  /// Empty or one per position.
  pub tex_coords: Vec<[f32; 2]>,
  pub indices:    Vec<u32>,
  pub material:   Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ImportedNode {
  pub transform: Mat4,
  /// Indices into [`ImportedScene::meshes`].
  pub meshes:    Vec<usize>,
  /// Indices into [`ImportedScene::nodes`].
  pub children:  Vec<usize>,
}

impl Default for ImportedNode {
  fn default() -> Self {
    Self {
      transform: Mat4::IDENTITY,
      meshes:    Vec::new(),
      children:  Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
  pub nodes:     Vec<ImportedNode>,
  pub roots:     Vec<usize>,
  pub meshes:    Vec<ImportedMesh>,
  pub materials: Vec<ImportedMaterial>,
}

impl ImportedScene {
  /// Number of sub-mesh references reachable from the roots.
  pub fn referenced_mesh_count(&self) -> usize {
    let mut count = 0;
    let mut stack = self.roots.clone();
    while let Some(node) = stack.pop() {
      let Some(node) = self.nodes.get(node) else {
        continue;
      };
      count += node.meshes.len();
      stack.extend(&node.children);
    }
    count
  }
}

pub fn import(path: &Path, format: ModelFormat, options: ImportOptions) -> Result<ImportedScene, ImportError> {
  let scene = match format {
    ModelFormat::Obj => import_obj(path, options)?,
    ModelFormat::Gltf => import_gltf(path, options)?,
  };
  debug!(
    "Imported {}: {} nodes, {} meshes, {} materials",
    path.display(),
    scene.nodes.len(),
    scene.meshes.len(),
    scene.materials.len()
  );
  Ok(scene)
}

fn import_obj(path: &Path, options: ImportOptions) -> Result<ImportedScene, ImportError> {
  let (models, materials) = tobj::load_obj(path, &tobj::LoadOptions {
    triangulate: options.triangulate,
    single_index: true,
    ..Default::default()
  })?;

  let materials = materials.unwrap_or_else(|err| {
    warn!("Failed to load materials for {}: {err}", path.display());
    Vec::new()
  });

  let materials = materials
    .into_iter()
    .map(|material| {
      let mut textures = Vec::new();
      let slots = [
        (TextureKind::Diffuse, material.diffuse_texture),
        (TextureKind::Specular, material.specular_texture),
        (TextureKind::Normal, material.normal_texture),
        (TextureKind::Height, material.unknown_param.get("disp").cloned()),
      ];
      for (kind, texture) in slots {
        if let Some(texture) = texture.filter(|t| !t.is_empty()) {
          // MTL files written on Windows use backslash separators.
          let texture = texture.replace('\\', "/");
          textures.push((kind, TextureSource::File(PathBuf::from(texture))));
        }
      }
      ImportedMaterial {
        name: material.name,
        textures,
      }
    })
    .collect();

  let meshes: Vec<ImportedMesh> = models
    .into_iter()
    .map(|model| {
      let mesh = model.mesh;
      ImportedMesh {
        name:       model.name,
        positions:  mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect(),
        normals:    mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect(),
        tex_coords: mesh
          .texcoords
          .chunks_exact(2)
          .map(|uv| {
            if options.flip_uvs {
              [uv[0], 1.0 - uv[1]]
            } else {
              [uv[0], uv[1]]
            }
          })
          .collect(),
        indices:    mesh.indices,
        material:   mesh.material_id,
      }
    })
    .collect();

  // OBJ has no hierarchy: one root holding every object in file order.
  let root = ImportedNode {
    meshes: (0..meshes.len()).collect(),
    ..ImportedNode::default()
  };

  Ok(ImportedScene {
    nodes: vec![root],
    roots: vec![0],
    meshes,
    materials,
  })
}

fn import_gltf(path: &Path, _options: ImportOptions) -> Result<ImportedScene, ImportError> {
  // glTF texture coordinates already put v = 0 at the first image row.
  let (document, buffers, images) = gltf::import(path)?;
  let directory = path.parent().unwrap_or(Path::new(""));

  let images: Vec<Option<DynamicImage>> = images.into_iter().map(decoded_image).collect();
  let texture_source = |texture: gltf::Texture<'_>| -> Option<TextureSource> {
    let image = texture.source();
    let key = match image.source() {
      gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => directory.join(uri),
      _ => PathBuf::from(format!("{}#image{}", path.display(), image.index())),
    };
    match images.get(image.index()).cloned().flatten() {
      Some(image) => Some(TextureSource::Decoded { key, image }),
      None => {
        warn!("Skipping texture {} with an unsupported pixel format", key.display());
        None
      }
    }
  };

  let materials = document
    .materials()
    .map(|material| {
      let pbr = material.pbr_metallic_roughness();
      let slots = [
        (
          TextureKind::Diffuse,
          pbr.base_color_texture().map(|info| info.texture()),
        ),
        (
          TextureKind::Specular,
          pbr.metallic_roughness_texture().map(|info| info.texture()),
        ),
        (
          TextureKind::Normal,
          material.normal_texture().map(|info| info.texture()),
        ),
      ];
      let textures = slots
        .into_iter()
        .filter_map(|(kind, texture)| Some((kind, texture_source(texture?)?)))
        .collect();
      ImportedMaterial {
        name: material.name().unwrap_or_default().to_string(),
        textures,
      }
    })
    .collect();

  // One imported mesh per triangle primitive, grouped by glTF mesh index.
  let mut meshes = Vec::new();
  let mut primitives_of: HashMap<usize, Vec<usize>> = HashMap::new();
  for mesh in document.meshes() {
    for primitive in mesh.primitives() {
      if primitive.mode() != gltf::mesh::Mode::Triangles {
        warn!(
          "Skipping {:?} primitive of mesh {} in {}",
          primitive.mode(),
          mesh.index(),
          path.display()
        );
        continue;
      }
      let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
      let Some(positions) = reader.read_positions() else {
        warn!("Skipping primitive without positions in {}", path.display());
        continue;
      };
      let positions: Vec<[f32; 3]> = positions.collect();
      let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
      };

      primitives_of.entry(mesh.index()).or_default().push(meshes.len());
      meshes.push(ImportedMesh {
        name: mesh.name().unwrap_or_default().to_string(),
        normals: reader.read_normals().map(Iterator::collect).unwrap_or_default(),
        tex_coords: reader
          .read_tex_coords(0)
          .map(|uvs| uvs.into_f32().collect())
          .unwrap_or_default(),
        positions,
        indices,
        material: primitive.material().index(),
      });
    }
  }

  let nodes = document
    .nodes()
    .map(|node| ImportedNode {
      transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
      meshes:    node
        .mesh()
        .and_then(|mesh| primitives_of.get(&mesh.index()).cloned())
        .unwrap_or_default(),
      children:  node.children().map(|child| child.index()).collect(),
    })
    .collect();

  let roots = document
    .default_scene()
    .or_else(|| document.scenes().next())
    .map(|scene| scene.nodes().map(|node| node.index()).collect())
    .unwrap_or_default();

  Ok(ImportedScene {
    nodes,
    roots,
    meshes,
    materials,
  })
}

fn decoded_image(data: gltf::image::Data) -> Option<DynamicImage> {
  use gltf::image::Format;

  let (width, height) = (data.width, data.height);
  match data.format {
    Format::R8 => GrayImage::from_raw(width, height, data.pixels).map(DynamicImage::ImageLuma8),
    Format::R8G8 => {
      GrayAlphaImage::from_raw(width, height, data.pixels).map(DynamicImage::ImageLumaA8)
    }
    Format::R8G8B8 => RgbImage::from_raw(width, height, data.pixels).map(DynamicImage::ImageRgb8),
    Format::R8G8B8A8 => {
      RgbaImage::from_raw(width, height, data.pixels).map(DynamicImage::ImageRgba8)
    }
    _ => None,
  }
}
