//! Indexed triangle meshes with their material textures.
//!
//! A [`Mesh`] owns one vertex array and refers to its textures through
//! [`TextureSlot`]s. The slot, not the texture, decides which sampler uniform
//! the texture is bound to, so one image can serve several material slots.
//!
//! # Example
//!
//! ```ignore
//! let slots = vec![
//!   TextureSlot::new(TextureKind::Diffuse, Rc::clone(&bricks)),
//!   TextureSlot::new(TextureKind::Specular, Rc::clone(&bricks)),
//! ];
//! let mesh = Mesh::new(&device, vertices, indices, slots)?;
//!
//! shader.use_program();
//! // Binds unit 0 to `material.diffuse`, unit 1 to `material.specular`.
//! mesh.draw(&shader);
//! ```

use std::{collections::HashMap, rc::Rc};

use thiserror::Error;

use super::{
  device::{Device, VertexArray},
  shader::Shader,
  texture::{Texture, TextureKind},
  vertex::Vertex,
};

#[derive(Debug, Error)]
pub enum MeshError {
  #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
  IndexOutOfRange {
    index:        u32,
    position:     usize,
    vertex_count: usize,
  },
  #[error("device failed to create mesh buffers: {0}")]
  Device(String),
}

/// Sampler uniform for the `occurrence`-th texture of `kind` on a mesh.
///
/// The first of each kind has no suffix: `material.diffuse`, `material.diffuse1`, ...
pub fn sampler_uniform_name(kind: TextureKind, occurrence: u32) -> String {
  if occurrence == 0 {
    format!("material.{kind}")
  } else {
    format!("material.{kind}{occurrence}")
  }
}

/// Fails on the first index that does not name one of `vertex_count` vertices.
pub fn check_indices(indices: &[u32], vertex_count: usize) -> Result<(), MeshError> {
  match indices
    .iter()
    .enumerate()
    .find(|&(_, &index)| index as usize >= vertex_count)
  {
    Some((position, &index)) => Err(MeshError::IndexOutOfRange {
      index,
      position,
      vertex_count,
    }),
    None => Ok(()),
  }
}

/// A texture as used by one material slot of a mesh.
#[derive(Debug, Clone)]
pub struct TextureSlot {
  /// Slot the texture fills. Names the sampler uniform.
  pub kind:    TextureKind,
  pub texture: Rc<Texture>,
}

impl TextureSlot {
  pub fn new(kind: TextureKind, texture: Rc<Texture>) -> Self {
    Self { kind, texture }
  }
}

/// One drawable unit: a vertex array plus the textures its material samples.
///
/// Vertices and indices are kept on the CPU side as well, read-only, for
/// inspection. GPU buffers are freed on drop or by [`Mesh::release`].
pub struct Mesh {
  device:   Rc<dyn Device>,
  vertices: Vec<Vertex>,
  indices:  Vec<u32>,
  /// Bound to units `0..n` in this order.
  textures: Vec<TextureSlot>,
  /// `None` for meshes without indices and after [`Mesh::release`].
  array:    Option<VertexArray>,
}

impl Mesh {
  /// Validates the indices and uploads the buffers.
  ///
  /// # Parameters
  ///
  /// - `vertices`: interleaved vertex data, see [`Vertex::layout`].
  /// - `indices`: triangle list; every entry must be below `vertices.len()`.
  /// - `textures`: material slots, bound to sequential units at draw time.
  pub fn new(
    device: &Rc<dyn Device>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<TextureSlot>,
  ) -> Result<Self, MeshError> {
    check_indices(&indices, vertices.len())?;

    let array = if indices.is_empty() {
      None
    } else {
      Some(
        device
          .create_vertex_array(
            &Vertex::layout(),
            bytemuck::cast_slice(vertices.as_slice()),
            Some(indices.as_slice()),
          )
          .map_err(MeshError::Device)?,
      )
    };

    Ok(Self {
      device: Rc::clone(device),
      vertices,
      indices,
      textures,
      array,
    })
  }

  pub fn vertices(&self) -> &[Vertex] {
    &self.vertices
  }

  pub fn indices(&self) -> &[u32] {
    &self.indices
  }

  pub fn textures(&self) -> &[TextureSlot] {
    &self.textures
  }

  /// Binds texture `i` to unit `i`, points its sampler uniform at it and
  /// issues one indexed draw. Leaves unit 0 active.
  ///
  /// `shader` must already be in use.
  pub fn draw(&self, shader: &Shader) {
    let Some(array) = &self.array else {
      return;
    };

    let mut occurrences: HashMap<TextureKind, u32> = HashMap::new();
    for (unit, slot) in self.textures.iter().enumerate() {
      let occurrence = occurrences.entry(slot.kind).or_insert(0);
      shader.set_int(&sampler_uniform_name(slot.kind, *occurrence), unit as i32);
      *occurrence += 1;
      slot.texture.bind(unit as u32);
    }

    self.device.draw_elements(array, self.indices.len() as u32);
    self.device.active_texture(0);
  }

  /// Frees the GPU buffers now instead of on drop. Drawing afterwards does nothing.
  pub fn release(&mut self) {
    if let Some(array) = self.array.take() {
      self.device.delete_vertex_array(&array);
    }
  }
}

impl Drop for Mesh {
  fn drop(&mut self) {
    self.release();
  }
}
