use bytemuck::{Pod, Zeroable};

use super::device::VertexLayout;

/// Interleaved vertex shared by every mesh.
///
/// Attribute locations: 0 position, 1 normal, 2 tex coord, 3 tangent, 4 bitangent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
  pub position:  [f32; 3],
  pub normal:    [f32; 3],
  pub tex_coord: [f32; 2],
  /// Zero unless tangents were generated at import.
  pub tangent:   [f32; 3],
  pub bitangent: [f32; 3],
}

impl Vertex {
  pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
    Self {
      position,
      normal,
      tex_coord,
      ..Self::default()
    }
  }

  pub fn layout() -> VertexLayout {
    VertexLayout::interleaved(&[3, 3, 2, 3, 3])
  }
}
