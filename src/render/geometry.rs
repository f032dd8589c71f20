//! Hard-coded, non-indexed shapes used by the scenes.

use std::rc::Rc;

use glam::Mat4;
use thiserror::Error;

use super::device::{BufferId, Device, VertexArray, VertexLayout};

/// First attribute location of the per-instance model matrix. A `mat4`
/// attribute takes four consecutive locations, one per column.
pub const INSTANCE_MATRIX_LOCATION: u32 = 3;

#[derive(Debug, Error)]
pub enum GeometryError {
  #[error("{floats} floats do not divide into vertices of {per_vertex} floats")]
  Layout { floats: usize, per_vertex: usize },
  #[error("device failed to create geometry buffers: {0}")]
  Device(String),
}

/// Interleaved float vertex data drawn with one non-indexed call.
pub struct StaticGeometry {
  device:       Rc<dyn Device>,
  array:        VertexArray,
  vertex_count: u32,
}

impl StaticGeometry {
  pub fn new(device: &Rc<dyn Device>, vertices: &[f32], layout: VertexLayout) -> Result<Self, GeometryError> {
    let per_vertex = layout.floats_per_vertex();
    if per_vertex == 0 || vertices.len() % per_vertex != 0 {
      return Err(GeometryError::Layout {
        floats: vertices.len(),
        per_vertex,
      });
    }

    let array = device
      .create_vertex_array(&layout, bytemuck::cast_slice(vertices), None)
      .map_err(GeometryError::Device)?;

    Ok(Self {
      device: Rc::clone(device),
      array,
      vertex_count: (vertices.len() / per_vertex) as u32,
    })
  }

  /// Unit cube centred on the origin: position, normal, uv. 36 vertices.
  pub fn cube(device: &Rc<dyn Device>) -> Result<Self, GeometryError> {
    Self::new(device, &CUBE_VERTICES, VertexLayout::interleaved(&[3, 3, 2]))
  }

  /// Square in the XZ plane at `y`, facing up, with UVs repeating `uv_repeat` times.
  pub fn plane(device: &Rc<dyn Device>, half_extent: f32, y: f32, uv_repeat: f32) -> Result<Self, GeometryError> {
    let (e, r) = (half_extent, uv_repeat);
    #[rustfmt::skip]
    let vertices = [
       e, y,  e,  0.0, 1.0, 0.0,  r,   0.0,
      -e, y, -e,  0.0, 1.0, 0.0,  0.0, r,
      -e, y,  e,  0.0, 1.0, 0.0,  0.0, 0.0,

       e, y,  e,  0.0, 1.0, 0.0,  r,   0.0,
       e, y, -e,  0.0, 1.0, 0.0,  r,   r,
      -e, y, -e,  0.0, 1.0, 0.0,  0.0, r,
    ];
    Self::new(device, &vertices, VertexLayout::interleaved(&[3, 3, 2]))
  }

  /// Full-screen quad in normalised device coordinates: position (2), uv.
  pub fn screen_quad(device: &Rc<dyn Device>) -> Result<Self, GeometryError> {
    #[rustfmt::skip]
    let vertices = [
      -1.0,  1.0,  0.0, 1.0,
      -1.0, -1.0,  0.0, 0.0,
       1.0, -1.0,  1.0, 0.0,

      -1.0,  1.0,  0.0, 1.0,
       1.0, -1.0,  1.0, 0.0,
       1.0,  1.0,  1.0, 1.0,
    ];
    Self::new(device, &vertices, VertexLayout::interleaved(&[2, 2]))
  }

  pub fn vertex_count(&self) -> u32 {
    self.vertex_count
  }

  pub fn draw(&self) {
    self.device.draw_arrays(&self.array, 0, self.vertex_count);
  }

  /// Adds one model matrix per instance, read by the vertex shader at
  /// [`INSTANCE_MATRIX_LOCATION`].
  pub fn instanced(self, transforms: &[Mat4]) -> Result<InstancedGeometry, GeometryError> {
    let layout = VertexLayout::interleaved(&[4, 4, 4, 4]).starting_at(INSTANCE_MATRIX_LOCATION);
    let buffer = self
      .device
      .create_instance_buffer(&self.array, &layout, bytemuck::cast_slice(transforms))
      .map_err(GeometryError::Device)?;

    Ok(InstancedGeometry {
      geometry: self,
      buffer,
      instance_count: transforms.len() as u32,
    })
  }
}

impl Drop for StaticGeometry {
  fn drop(&mut self) {
    self.device.delete_vertex_array(&self.array);
  }
}

/// A [`StaticGeometry`] drawn many times in one call, once per transform.
pub struct InstancedGeometry {
  geometry:       StaticGeometry,
  buffer:         BufferId,
  instance_count: u32,
}

impl InstancedGeometry {
  pub fn instance_count(&self) -> u32 {
    self.instance_count
  }

  pub fn draw(&self) {
    let geometry = &self.geometry;
    geometry
      .device
      .draw_arrays_instanced(&geometry.array, 0, geometry.vertex_count, self.instance_count);
  }
}

impl Drop for InstancedGeometry {
  fn drop(&mut self) {
    self.geometry.device.delete_buffer(self.buffer);
  }
}

#[rustfmt::skip]
const CUBE_VERTICES: [f32; 288] = [
  // back face
  -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0,
   0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0,
   0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 0.0,
   0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0,
  -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0,
  -0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 1.0,
  // front face
  -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0,
   0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 0.0,
   0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0,
   0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0,
  -0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 1.0,
  -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0,
  // left face
  -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0,
  -0.5,  0.5, -0.5, -1.0,  0.0,  0.0,  1.0, 1.0,
  -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0,
  -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0,
  -0.5, -0.5,  0.5, -1.0,  0.0,  0.0,  0.0, 0.0,
  -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0,
  // right face
   0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0,
   0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0,
   0.5,  0.5, -0.5,  1.0,  0.0,  0.0,  1.0, 1.0,
   0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0,
   0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0,
   0.5, -0.5,  0.5,  1.0,  0.0,  0.0,  0.0, 0.0,
  // bottom face
  -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0,
   0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  1.0, 1.0,
   0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0,
   0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0,
  -0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  0.0, 0.0,
  -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0,
  // top face
  -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0,
   0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0,
   0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  1.0, 1.0,
   0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0,
  -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0,
  -0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  0.0, 0.0,
];
