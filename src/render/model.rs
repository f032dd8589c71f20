//! Models: every mesh of an imported file, with textures shared by path.
//!
//! Loading runs in two steps. [`import`](super::import) turns the file into a
//! CPU-side [`ImportedScene`]; [`Model::from_scene`] then walks its node tree
//! depth first and uploads one [`Mesh`] per referenced sub-mesh.
//!
//! # Example
//!
//! ```ignore
//! let model = Model::load_or_empty(&device, Path::new("assets/models/nanosuit/nanosuit.obj"), ModelOptions::default());
//! shader.use_program();
//! model.draw(&shader);
//! ```

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  rc::Rc,
};

use glam::{Mat3, Mat4, Vec2, Vec3};
use log::{error, info, warn};
use thiserror::Error;

use super::{
  device::{Device, SamplerSettings},
  import::{self, ImportError, ImportOptions, ImportedMesh, ImportedScene, ModelFormat, TextureSource},
  mesh::{Mesh, MeshError, TextureSlot, check_indices},
  shader::Shader,
  texture::{ChannelLayout, Texture, TextureError, TextureKind},
  vertex::Vertex,
};

/// Colour of the stand-in for a texture that failed to load.
const MISSING_TEXTURE_COLOR: [u8; 4] = [255, 0, 255, 255];
/// Stand-in for a missing normal map: the unperturbed tangent-space normal.
const FLAT_NORMAL_COLOR: [u8; 4] = [128, 128, 255, 255];

fn placeholder_color(kind: TextureKind) -> [u8; 4] {
  match kind {
    TextureKind::Normal => FLAT_NORMAL_COLOR,
    _ => MISSING_TEXTURE_COLOR,
  }
}

#[derive(Debug, Error)]
pub enum ModelError {
  #[error("failed to import model {}: {source}", path.display())]
  Import {
    path:   PathBuf,
    #[source]
    source: ImportError,
  },
  #[error("no importer for model file {}", path.display())]
  UnsupportedFormat { path: PathBuf },
  #[error("invalid mesh {index} in model: {source}")]
  Mesh {
    index:  usize,
    #[source]
    source: MeshError,
  },
  #[error("node {node} is its own ancestor")]
  NodeCycle { node: usize },
  #[error(transparent)]
  Texture(#[from] TextureError),
}

/// Import settings. The default triangulates and flips UVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOptions {
  /// Split polygons into triangles at import.
  pub triangulate:   bool,
  /// Put `v = 0` at the first image row for formats that store it last.
  pub flip_uvs:      bool,
  /// Generate per-vertex tangents and bitangents from positions and UVs.
  pub calc_tangents: bool,
}

impl Default for ModelOptions {
  fn default() -> Self {
    Self {
      triangulate:   true,
      flip_uvs:      true,
      calc_tangents: false,
    }
  }
}

/// Every mesh of one model file, in node order.
pub struct Model {
  meshes:          Vec<Mesh>,
  /// Resolved texture path to the one upload of it.
  textures_loaded: HashMap<PathBuf, Rc<Texture>>,
}

impl Model {
  /// Imports `path` with the importer its extension selects and uploads every mesh.
  ///
  /// Texture paths resolve against the model file's directory. Textures that
  /// fail to decode become placeholders; the model still loads.
  pub fn load(device: &Rc<dyn Device>, path: &Path, options: ModelOptions) -> Result<Self, ModelError> {
    let format = ModelFormat::from_path(path).ok_or_else(|| ModelError::UnsupportedFormat {
      path: path.to_path_buf(),
    })?;

    let scene = import::import(path, format, ImportOptions {
      triangulate: options.triangulate,
      flip_uvs:    options.flip_uvs,
    })
    .map_err(|source| ModelError::Import {
      path: path.to_path_buf(),
      source,
    })?;

    let directory = path.parent().unwrap_or(Path::new(""));
    let model = Self::from_scene(device, &scene, directory, options)?;
    info!(
      "Loaded model {} ({} meshes, {} textures)",
      path.display(),
      model.meshes.len(),
      model.textures_loaded.len()
    );
    Ok(model)
  }

  /// Like [`Model::load`], but logs the failure and returns a model with no meshes.
  pub fn load_or_empty(device: &Rc<dyn Device>, path: &Path, options: ModelOptions) -> Self {
    Self::load(device, path, options).unwrap_or_else(|err| {
      error!("{err}; continuing with an empty model");
      Self::empty()
    })
  }

  /// A model with no meshes. Drawing it issues no calls.
  pub fn empty() -> Self {
    Self {
      meshes:          Vec::new(),
      textures_loaded: HashMap::new(),
    }
  }

  /// Builds meshes from an already imported scene. Texture paths resolve against `directory`.
  pub fn from_scene(
    device: &Rc<dyn Device>,
    scene: &ImportedScene,
    directory: &Path,
    options: ModelOptions,
  ) -> Result<Self, ModelError> {
    let mut loader = SceneLoader {
      device,
      scene,
      directory,
      options,
      ancestors: Vec::new(),
      model: Self::empty(),
    };
    for &root in &scene.roots {
      loader.process_node(root, Mat4::IDENTITY)?;
    }
    Ok(loader.model)
  }

  pub fn meshes(&self) -> &[Mesh] {
    &self.meshes
  }

  /// Distinct textures uploaded for this model.
  pub fn texture_count(&self) -> usize {
    self.textures_loaded.len()
  }

  /// Draws every mesh in load order. `shader` must already be in use.
  pub fn draw(&self, shader: &Shader) {
    for mesh in &self.meshes {
      mesh.draw(shader);
    }
  }
}

struct SceneLoader<'a> {
  device:    &'a Rc<dyn Device>,
  scene:     &'a ImportedScene,
  directory: &'a Path,
  options:   ModelOptions,
  /// Nodes on the path from the current root to the node being processed.
  ancestors: Vec<usize>,
  model:     Model,
}

impl SceneLoader<'_> {
  /// This node's meshes in order, then each child subtree.
  fn process_node(&mut self, index: usize, parent: Mat4) -> Result<(), ModelError> {
    let Some(node) = self.scene.nodes.get(index) else {
      warn!("Scene references missing node {index}");
      return Ok(());
    };
    if self.ancestors.contains(&index) {
      error!("Node {index} is its own ancestor; refusing to walk the cycle");
      return Err(ModelError::NodeCycle { node: index });
    }
    let transform = parent * node.transform;

    for &mesh_index in &node.meshes {
      let Some(imported) = self.scene.meshes.get(mesh_index) else {
        warn!("Node {index} references missing mesh {mesh_index}");
        continue;
      };
      let mesh = self.process_mesh(imported, transform).map_err(|err| match err {
        ModelError::Mesh { source, .. } => ModelError::Mesh {
          index: mesh_index,
          source,
        },
        other => other,
      })?;
      self.model.meshes.push(mesh);
    }

    self.ancestors.push(index);
    for &child in &node.children {
      self.process_node(child, transform)?;
    }
    self.ancestors.pop();
    Ok(())
  }

  fn process_mesh(&mut self, imported: &ImportedMesh, transform: Mat4) -> Result<Mesh, ModelError> {
    check_indices(&imported.indices, imported.positions.len())
      .map_err(|source| ModelError::Mesh { index: 0, source })?;

    let mut vertices = build_vertices(imported, transform);
    if self.options.calc_tangents {
      compute_tangents(&mut vertices, &imported.indices);
    }

    let mut textures = Vec::new();
    if let Some(material) = imported.material.and_then(|m| self.scene.materials.get(m)) {
      for kind in TextureKind::ALL {
        for source in material.textures_of(kind) {
          let texture = self.load_material_texture(kind, source)?;
          textures.push(TextureSlot::new(kind, texture));
        }
      }
    }

    Mesh::new(self.device, vertices, imported.indices.clone(), textures)
      .map_err(|source| ModelError::Mesh { index: 0, source })
  }

  /// Returns the cached texture for this source's path, loading it on first use.
  ///
  /// The cached texture keeps the kind it was first loaded as; callers record
  /// the slot kind separately in a [`TextureSlot`].
  fn load_material_texture(
    &mut self,
    kind: TextureKind,
    source: &TextureSource,
  ) -> Result<Rc<Texture>, ModelError> {
    let key = source.key(self.directory);
    if let Some(texture) = self.model.textures_loaded.get(&key) {
      return Ok(Rc::clone(texture));
    }

    let loaded = match source {
      TextureSource::File(_) => Texture::from_file(
        self.device,
        &key,
        kind,
        ChannelLayout::Auto,
        SamplerSettings::repeat(),
      ),
      TextureSource::Decoded { image, .. } => Texture::from_image(
        self.device,
        image.clone(),
        &key,
        kind,
        ChannelLayout::Auto,
        SamplerSettings::repeat(),
      ),
    };

    let texture = match loaded {
      Ok(texture) => texture,
      Err(err) => {
        warn!("{err}; using a placeholder");
        Texture::placeholder(self.device, kind, placeholder_color(kind), &key)?
      }
    };

    let texture = Rc::new(texture);
    self.model.textures_loaded.insert(key, Rc::clone(&texture));
    Ok(texture)
  }
}

/// Interleaves the imported attributes with `transform` baked into positions and normals.
fn build_vertices(imported: &ImportedMesh, transform: Mat4) -> Vec<Vertex> {
  let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
  let baked = transform != Mat4::IDENTITY;

  imported
    .positions
    .iter()
    .enumerate()
    .map(|(i, &position)| {
      let mut position = Vec3::from(position);
      let mut normal = imported.normals.get(i).map_or(Vec3::ZERO, |&n| Vec3::from(n));
      if baked {
        position = transform.transform_point3(position);
        normal = (normal_matrix * normal).normalize_or_zero();
      }
      Vertex::new(
        position.to_array(),
        normal.to_array(),
        imported.tex_coords.get(i).copied().unwrap_or_default(),
      )
    })
    .collect()
}

/// Accumulates per-triangle tangent frames onto their vertices, then normalises.
///
/// Indices must already be checked against `vertices.len()`.
fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) {
  let mut tangents = vec![Vec3::ZERO; vertices.len()];
  let mut bitangents = vec![Vec3::ZERO; vertices.len()];

  for triangle in indices.chunks_exact(3) {
    let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
    let (pa, pb, pc) = (
      Vec3::from(vertices[a].position),
      Vec3::from(vertices[b].position),
      Vec3::from(vertices[c].position),
    );
    let (ua, ub, uc) = (
      Vec2::from(vertices[a].tex_coord),
      Vec2::from(vertices[b].tex_coord),
      Vec2::from(vertices[c].tex_coord),
    );

    let (edge1, edge2) = (pb - pa, pc - pa);
    let (duv1, duv2) = (ub - ua, uc - ua);
    let det = duv1.x * duv2.y - duv2.x * duv1.y;
    if det.abs() <= f32::EPSILON {
      continue;
    }
    let f = 1.0 / det;
    let tangent = f * (duv2.y * edge1 - duv1.y * edge2);
    let bitangent = f * (-duv2.x * edge1 + duv1.x * edge2);

    for i in [a, b, c] {
      tangents[i] += tangent;
      bitangents[i] += bitangent;
    }
  }

  for ((vertex, tangent), bitangent) in vertices.iter_mut().zip(tangents).zip(bitangents) {
    vertex.tangent = tangent.normalize_or_zero().to_array();
    vertex.bitangent = bitangent.normalize_or_zero().to_array();
  }
}

#[cfg(test)]
mod tests {
  use image::{Rgb, RgbImage};

  use super::*;
  use crate::render::{
    import::{ImportedMaterial, ImportedNode},
    recording::{RecordingDevice, fixture_dir, write_gltf_fixture},
  };

  fn device() -> (Rc<RecordingDevice>, Rc<dyn Device>) {
    let recording = Rc::new(RecordingDevice::new());
    let device: Rc<dyn Device> = recording.clone();
    (recording, device)
  }

  fn shader(device: &Rc<dyn Device>) -> Shader {
    Shader::from_sources(device, "void main() {}", "void main() {}", None).unwrap()
  }

  fn triangle(material: Option<usize>, size: f32) -> ImportedMesh {
    ImportedMesh {
      name: String::new(),
      positions: vec![[0.0, 0.0, 0.0], [size, 0.0, 0.0], [0.0, size, 0.0]],
      normals: vec![[0.0, 0.0, 1.0]; 3],
      tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
      indices: vec![0, 1, 2],
      material,
    }
  }

  /// Two objects sharing one material, written next to an existing diffuse map.
  fn write_shared_material_obj(dir: &Path) {
    std::fs::write(
      dir.join("pair.obj"),
      "mtllib pair.mtl\n\
       vt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\n\
       o first\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl shared\nf 1/1/1 2/2/1 3/3/1\n\
       o second\nv 0 0 1\nv 1 0 1\nv 0 1 1\nusemtl shared\nf 4/1/1 5/2/1 6/3/1\n",
    )
    .unwrap();
    std::fs::write(
      dir.join("pair.mtl"),
      "newmtl shared\nKd 1 1 1\nmap_Kd checker.png\nmap_Ks missing_spec.png\n",
    )
    .unwrap();
    RgbImage::from_pixel(2, 2, Rgb([40, 80, 120]))
      .save(dir.join("checker.png"))
      .unwrap();
  }

  #[test]
  fn shared_texture_path_uploads_once() {
    let (recording, device) = device();
    let dir = fixture_dir("model-dedup");
    write_shared_material_obj(&dir);

    let model = Model::load(&device, &dir.join("pair.obj"), ModelOptions::default()).unwrap();

    assert_eq!(model.meshes().len(), 2);
    // One diffuse map plus one placeholder for the missing specular map.
    assert_eq!(recording.textures_created(), 2);
    assert_eq!(model.texture_count(), 2);
    let first = model.meshes()[0].textures();
    let second = model.meshes()[1].textures();
    assert_eq!(first.len(), 2);
    assert!(Rc::ptr_eq(&first[0].texture, &second[0].texture));
    assert_eq!(first[0].kind, TextureKind::Diffuse);
    assert_eq!(first[1].kind, TextureKind::Specular);
    assert_eq!(first[1].texture.size(), (1, 1));
  }

  #[test]
  fn dropping_model_frees_all_gpu_objects() {
    let (recording, device) = device();
    let dir = fixture_dir("model-drop");
    write_shared_material_obj(&dir);

    let model = Model::load(&device, &dir.join("pair.obj"), ModelOptions::default()).unwrap();
    drop(model);

    assert_eq!(recording.live_textures(), 0);
    assert_eq!(recording.live_vertex_arrays(), 0);
  }

  #[test]
  fn draw_issues_one_call_per_mesh() {
    let (recording, device) = device();
    let dir = fixture_dir("model-draw");
    write_shared_material_obj(&dir);
    let model = Model::load(&device, &dir.join("pair.obj"), ModelOptions::default()).unwrap();
    let shader = shader(&device);

    shader.use_program();
    model.draw(&shader);

    assert_eq!(recording.draw_calls(), 2);
  }

  #[test]
  fn nonexistent_path_fails_and_falls_back_to_empty() {
    let (recording, device) = device();
    let dir = fixture_dir("model-missing");
    let path = dir.join("nanosuit.obj");

    assert!(matches!(
      Model::load(&device, &path, ModelOptions::default()),
      Err(ModelError::Import { .. })
    ));

    let model = Model::load_or_empty(&device, &path, ModelOptions::default());
    let shader = shader(&device);
    model.draw(&shader);

    assert!(model.meshes().is_empty());
    assert_eq!(recording.draw_calls(), 0);
  }

  #[test]
  fn unknown_extension_is_unsupported() {
    let (_recording, device) = device();

    let result = Model::load(&device, Path::new("models/thing.fbx"), ModelOptions::default());

    assert!(matches!(result, Err(ModelError::UnsupportedFormat { .. })));
  }

  #[test]
  fn node_meshes_precede_children_and_transforms_accumulate() {
    let (_recording, device) = device();
    let scene = ImportedScene {
      nodes:     vec![
        ImportedNode {
          transform: Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)),
          meshes:    vec![1],
          children:  vec![1],
        },
        ImportedNode {
          transform: Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)),
          meshes:    vec![0, 1],
          children:  Vec::new(),
        },
      ],
      roots:     vec![0],
      meshes:    vec![triangle(None, 1.0), triangle(None, 2.0)],
      materials: Vec::new(),
    };

    let model = Model::from_scene(&device, &scene, Path::new(""), ModelOptions::default()).unwrap();

    assert_eq!(model.meshes().len(), scene.referenced_mesh_count());
    let origins: Vec<_> = model.meshes().iter().map(|m| m.vertices()[0].position).collect();
    assert_eq!(origins, vec![[10.0, 0.0, 0.0], [10.0, 5.0, 0.0], [10.0, 5.0, 0.0]]);
    assert_eq!(model.meshes()[0].vertices()[1].position, [12.0, 0.0, 0.0]);
    assert_eq!(model.meshes()[1].vertices()[1].position, [11.0, 5.0, 0.0]);
  }

  #[test]
  fn rotated_node_rotates_normals() {
    let (_recording, device) = device();
    let scene = ImportedScene {
      nodes:     vec![ImportedNode {
        transform: Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2),
        meshes:    vec![0],
        children:  Vec::new(),
      }],
      roots:     vec![0],
      meshes:    vec![triangle(None, 1.0)],
      materials: Vec::new(),
    };

    let model = Model::from_scene(&device, &scene, Path::new(""), ModelOptions::default()).unwrap();

    let normal = Vec3::from(model.meshes()[0].vertices()[0].normal);
    assert!(normal.abs_diff_eq(Vec3::new(0.0, -1.0, 0.0), 1e-5));
  }

  #[test]
  fn invalid_index_reports_mesh() {
    let (_recording, device) = device();
    let mut broken = triangle(None, 1.0);
    broken.indices = vec![0, 1, 7];
    let scene = ImportedScene {
      nodes:     vec![ImportedNode {
        meshes: vec![0, 1],
        ..ImportedNode::default()
      }],
      roots:     vec![0],
      meshes:    vec![triangle(None, 1.0), broken],
      materials: Vec::new(),
    };

    let result = Model::from_scene(&device, &scene, Path::new(""), ModelOptions::default());

    assert!(matches!(result, Err(ModelError::Mesh {
      index: 1,
      source: MeshError::IndexOutOfRange { index: 7, .. }
    })));
  }

  #[test]
  fn tangents_follow_uv_axes() {
    let (_recording, device) = device();
    let scene = ImportedScene {
      nodes:     vec![ImportedNode {
        meshes: vec![0],
        ..ImportedNode::default()
      }],
      roots:     vec![0],
      meshes:    vec![triangle(Some(0), 1.0)],
      materials: vec![ImportedMaterial::default()],
    };
    let options = ModelOptions {
      calc_tangents: true,
      ..ModelOptions::default()
    };

    let model = Model::from_scene(&device, &scene, Path::new(""), options).unwrap();

    let vertex = model.meshes()[0].vertices()[0];
    assert_eq!(vertex.tangent, [1.0, 0.0, 0.0]);
    assert_eq!(vertex.bitangent, [0.0, 1.0, 0.0]);
  }

  #[test]
  fn tangent_generation_reports_bad_index_instead_of_panicking() {
    let (recording, device) = device();
    let mut broken = triangle(None, 1.0);
    broken.indices = vec![0, 1, 7];
    let scene = ImportedScene {
      nodes:     vec![ImportedNode {
        meshes: vec![0],
        ..ImportedNode::default()
      }],
      roots:     vec![0],
      meshes:    vec![broken],
      materials: Vec::new(),
    };
    let options = ModelOptions {
      calc_tangents: true,
      ..ModelOptions::default()
    };

    let result = Model::from_scene(&device, &scene, Path::new(""), options);

    assert!(matches!(result, Err(ModelError::Mesh {
      index: 0,
      source: MeshError::IndexOutOfRange {
        index: 7,
        position: 2,
        vertex_count: 3
      }
    })));
    assert_eq!(recording.live_vertex_arrays(), 0);
  }

  #[test]
  fn one_image_as_diffuse_and_specular_binds_both_samplers() {
    let (recording, device) = device();
    let dir = fixture_dir("model-two-slots");
    std::fs::write(
      dir.join("wall.obj"),
      "mtllib wall.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nusemtl wall\nf 1/1 2/1 3/1\n",
    )
    .unwrap();
    std::fs::write(dir.join("wall.mtl"), "newmtl wall\nmap_Kd tex.png\nmap_Ks tex.png\n").unwrap();
    RgbImage::from_pixel(2, 2, Rgb([200, 10, 10]))
      .save(dir.join("tex.png"))
      .unwrap();
    let model = Model::load(&device, &dir.join("wall.obj"), ModelOptions::default()).unwrap();
    let shader = shader(&device);
    recording.clear_calls();

    shader.use_program();
    model.draw(&shader);

    assert_eq!(model.texture_count(), 1);
    let samplers: Vec<_> = recording.uniform_writes().into_iter().map(|(name, _)| name).collect();
    assert_eq!(samplers, vec!["material.diffuse", "material.specular"]);
  }

  #[test]
  fn equivalent_relative_paths_share_one_texture() {
    let (recording, device) = device();
    let dir = fixture_dir("model-dot-paths");
    std::fs::create_dir_all(dir.join("maps")).unwrap();
    RgbImage::from_pixel(1, 1, Rgb([1, 2, 3]))
      .save(dir.join("a.png"))
      .unwrap();
    let sources = ["a.png", "./a.png", "maps/../a.png"];
    let scene = ImportedScene {
      nodes:     vec![ImportedNode {
        meshes: vec![0, 1, 2],
        ..ImportedNode::default()
      }],
      roots:     vec![0],
      meshes:    (0..sources.len()).map(|m| triangle(Some(m), 1.0)).collect(),
      materials: sources
        .iter()
        .map(|path| ImportedMaterial {
          name:     String::new(),
          textures: vec![(TextureKind::Diffuse, TextureSource::File(PathBuf::from(path)))],
        })
        .collect(),
    };

    let model = Model::from_scene(&device, &scene, &dir, ModelOptions::default()).unwrap();

    assert_eq!(recording.textures_created(), 1);
    assert_eq!(model.texture_count(), 1);
    assert_eq!(model.meshes()[2].textures()[0].texture.path(), dir.join("a.png"));
  }

  #[test]
  fn cyclic_node_graph_is_an_error() {
    let (recording, device) = device();
    let scene = ImportedScene {
      nodes:     vec![
        ImportedNode {
          meshes: vec![0],
          children: vec![1],
          ..ImportedNode::default()
        },
        ImportedNode {
          children: vec![0],
          ..ImportedNode::default()
        },
      ],
      roots:     vec![0],
      meshes:    vec![triangle(None, 1.0)],
      materials: Vec::new(),
    };

    let result = Model::from_scene(&device, &scene, Path::new(""), ModelOptions::default());

    assert!(matches!(result, Err(ModelError::NodeCycle { node: 0 })));
    assert_eq!(recording.live_vertex_arrays(), 0);
  }

  #[test]
  fn shared_child_is_not_a_cycle() {
    let (_recording, device) = device();
    let scene = ImportedScene {
      nodes:     vec![
        ImportedNode {
          children: vec![2],
          ..ImportedNode::default()
        },
        ImportedNode {
          children: vec![2],
          ..ImportedNode::default()
        },
        ImportedNode {
          meshes: vec![0],
          ..ImportedNode::default()
        },
      ],
      roots:     vec![0, 1],
      meshes:    vec![triangle(None, 1.0)],
      materials: Vec::new(),
    };

    let model = Model::from_scene(&device, &scene, Path::new(""), ModelOptions::default()).unwrap();

    assert_eq!(model.meshes().len(), 2);
  }

  #[test]
  fn missing_normal_map_is_flat() {
    let (recording, device) = device();
    let dir = fixture_dir("model-flat-normal");
    let scene = ImportedScene {
      nodes:     vec![ImportedNode {
        meshes: vec![0],
        ..ImportedNode::default()
      }],
      roots:     vec![0],
      meshes:    vec![triangle(Some(0), 1.0)],
      materials: vec![ImportedMaterial {
        name:     String::new(),
        textures: vec![(TextureKind::Normal, TextureSource::File(PathBuf::from("gone.png")))],
      }],
    };

    let model = Model::from_scene(&device, &scene, &dir, ModelOptions::default()).unwrap();

    assert_eq!(model.meshes()[0].textures()[0].kind, TextureKind::Normal);
    assert_eq!(placeholder_color(TextureKind::Normal), FLAT_NORMAL_COLOR);
    assert_eq!(recording.textures_created(), 1);
  }

  #[test]
  fn gltf_model_bakes_node_transforms() {
    let (recording, device) = device();
    let dir = fixture_dir("model-gltf");
    let path = write_gltf_fixture(&dir);

    let model = Model::load(&device, &path, ModelOptions::default()).unwrap();

    assert_eq!(model.meshes().len(), 1);
    let positions: Vec<_> = model.meshes()[0].vertices().iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![[10.0, 5.0, 0.0], [11.0, 5.0, 0.0], [10.0, 6.0, 0.0]]);
    let slots = model.meshes()[0].textures();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].kind, TextureKind::Diffuse);
    assert_eq!(slots[0].texture.size(), (2, 2));
    assert_eq!(recording.textures_created(), 1);
  }
}
