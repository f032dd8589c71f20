//! The narrow slice of the OpenGL state machine the renderer talks to.
//!
//! Everything that touches the GPU goes through [`Device`]. The production
//! implementation is [`GlDevice`](crate::render::gl::GlDevice); unit tests run
//! the same code paths against a recording device that never needs a context.
//!
//! Handles are plain copyable ids. Ownership lives one level up: `Shader`,
//! `Texture`, `Mesh`, `StaticGeometry` and `Framebuffer` each delete what they
//! created when dropped.
//!
//! # Example
//!
//! ```ignore
//! let device: Rc<dyn Device> = Rc::new(GlDevice::new(gl));
//! device.set_capability(Capability::DepthTest, true);
//! device.clear(ClearRequest::color_and_depth([0.1, 0.1, 0.1, 1.0]));
//! ```

use std::num::NonZeroU32;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

macro_rules! gpu_handle {
  ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
    $(
      $(#[$meta])*
      #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
      pub struct $name(pub NonZeroU32);
    )*
  };
}

gpu_handle!(
  /// A compiled but unlinked shader stage.
  StageId,
  /// A linked shader program.
  ProgramId,
  TextureId,
  /// A vertex, index or per-instance buffer.
  BufferId,
  VertexArrayId,
  FramebufferId,
  RenderbufferId,
);

/// Location of a uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
  Vertex,
  Geometry,
  Fragment,
}

impl ShaderStage {
  pub fn as_str(self) -> &'static str {
    match self {
      ShaderStage::Vertex => "vertex",
      ShaderStage::Geometry => "geometry",
      ShaderStage::Fragment => "fragment",
    }
  }
}

impl std::fmt::Display for ShaderStage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A value written into a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
  Int(i32),
  Float(f32),
  Vec2(Vec2),
  Vec3(Vec3),
  Vec4(Vec4),
  Mat3(Mat3),
  Mat4(Mat4),
}

/// Pixel storage of a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
  R8,
  Rgb8,
  Rgba8,
  /// 24-bit depth, only ever written by the GPU.
  Depth,
}

impl TextureFormat {
  /// Bytes per pixel of the upload data, `None` for formats never uploaded from the CPU.
  pub fn bytes_per_pixel(self) -> Option<usize> {
    match self {
      TextureFormat::R8 => Some(1),
      TextureFormat::Rgb8 => Some(3),
      TextureFormat::Rgba8 => Some(4),
      TextureFormat::Depth => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
  Repeat,
  ClampToEdge,
  ClampToBorder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
  Nearest,
  Linear,
}

/// Sampling parameters baked into a texture at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerSettings {
  pub wrap_s:       Wrap,
  pub wrap_t:       Wrap,
  pub min_filter:   Filter,
  pub mag_filter:   Filter,
  /// Generate a full mip chain after upload; minification then blends between levels.
  pub mipmaps:      bool,
  /// Only used with [`Wrap::ClampToBorder`].
  pub border_color: Option<[f32; 4]>,
}

impl SamplerSettings {
  /// Repeat wrap, trilinear filtering, mipmapped. What model textures use.
  pub const fn repeat() -> Self {
    Self {
      wrap_s:       Wrap::Repeat,
      wrap_t:       Wrap::Repeat,
      min_filter:   Filter::Linear,
      mag_filter:   Filter::Linear,
      mipmaps:      true,
      border_color: None,
    }
  }

  /// Clamped, linear, no mipmaps. What colour render targets use.
  pub const fn render_target() -> Self {
    Self {
      wrap_s:       Wrap::ClampToEdge,
      wrap_t:       Wrap::ClampToEdge,
      min_filter:   Filter::Linear,
      mag_filter:   Filter::Linear,
      mipmaps:      false,
      border_color: None,
    }
  }

  /// Nearest sampling, white border outside the map so out-of-frustum fragments stay lit.
  pub const fn shadow_map() -> Self {
    Self {
      wrap_s:       Wrap::ClampToBorder,
      wrap_t:       Wrap::ClampToBorder,
      min_filter:   Filter::Nearest,
      mag_filter:   Filter::Nearest,
      mipmaps:      false,
      border_color: Some([1.0, 1.0, 1.0, 1.0]),
    }
  }
}

impl Default for SamplerSettings {
  fn default() -> Self {
    Self::repeat()
  }
}

/// Everything needed to allocate a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDesc {
  pub width:   u32,
  pub height:  u32,
  pub format:  TextureFormat,
  pub sampler: SamplerSettings,
}

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
  pub location:   u32,
  pub components: u32,
  /// Byte offset from the start of the vertex.
  pub offset:     u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
  /// Byte size of one vertex.
  pub stride:     u32,
  pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
  /// Tightly packed float attributes at locations `0..n`, e.g. `&[3, 3, 2]` for
  /// position/normal/uv.
  pub fn interleaved(components: &[u32]) -> Self {
    let mut offset = 0;
    let attributes = components
      .iter()
      .enumerate()
      .map(|(location, &components)| {
        let attribute = VertexAttribute {
          location: location as u32,
          components,
          offset,
        };
        offset += components * std::mem::size_of::<f32>() as u32;
        attribute
      })
      .collect();

    Self {
      stride: offset,
      attributes,
    }
  }

  /// Moves every attribute up so the first sits at `location`.
  ///
  /// Per-instance data uses this to follow the per-vertex attributes.
  pub fn starting_at(mut self, location: u32) -> Self {
    let first = self.attributes.iter().map(|a| a.location).min().unwrap_or(0);
    for attribute in &mut self.attributes {
      attribute.location = attribute.location - first + location;
    }
    self
  }

  /// Number of floats in one vertex.
  pub fn floats_per_vertex(&self) -> usize {
    self.stride as usize / std::mem::size_of::<f32>()
  }
}

/// GPU objects backing one drawable vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexArray {
  pub vao:           VertexArrayId,
  pub vertex_buffer: BufferId,
  pub index_buffer:  Option<BufferId>,
}

/// Framebuffer attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
  Color(u32),
  Depth,
  DepthStencil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
  Complete,
  /// Raw status code reported by the driver.
  Incomplete(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
  DepthTest,
  StencilTest,
  CullFace,
  Multisample,
}

/// Comparison between the stencil reference and the stored stencil value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilFunc {
  Always,
  Equal,
  NotEqual,
}

/// What happens to the stored stencil value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
  Keep,
  Zero,
  /// Write the reference value.
  Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
  Front,
  Back,
}

/// Buffers to clear on the bound framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearRequest {
  /// Clear colour, `None` leaves the colour buffer alone.
  pub color:   Option<[f32; 4]>,
  pub depth:   bool,
  /// Clears to 0. Only bits enabled by the stencil write mask are cleared.
  pub stencil: bool,
}

impl ClearRequest {
  pub const fn color_and_depth(color: [f32; 4]) -> Self {
    Self {
      color:   Some(color),
      depth:   true,
      stencil: false,
    }
  }

  pub const fn depth_only() -> Self {
    Self {
      color:   None,
      depth:   true,
      stencil: false,
    }
  }

  pub const fn all(color: [f32; 4]) -> Self {
    Self {
      color:   Some(color),
      depth:   true,
      stencil: true,
    }
  }
}

/// The graphics API boundary.
///
/// Calls are synchronous and must happen on the thread that owns the context.
/// Creation calls return the driver's message on failure; everything else is
/// fire-and-forget, as in GL itself.
pub trait Device {
  /// Compiles one stage. On failure the stage object is already deleted and
  /// the error is the driver's info log.
  fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<StageId, String>;
  fn delete_stage(&self, stage: StageId);
  /// Links the given stages. Stages stay attached only for the duration of the call.
  fn link_program(&self, stages: &[StageId]) -> Result<ProgramId, String>;
  fn delete_program(&self, program: ProgramId);
  /// `None` unbinds any program.
  fn use_program(&self, program: Option<ProgramId>);
  /// `None` if the program has no active uniform called `name`.
  fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
  /// Writes into the currently bound program.
  fn set_uniform(&self, location: UniformLocation, value: UniformValue);

  /// Allocates a 2D texture and uploads `pixels` if given.
  ///
  /// # Parameters
  ///
  /// - `desc`: size, format and sampler state.
  /// - `pixels`: tightly packed rows, top row first, in `desc.format`. `None`
  ///   leaves the storage uninitialised.
  fn create_texture(&self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<TextureId, String>;
  /// Makes `unit` active and binds `texture` to its 2D target.
  fn bind_texture(&self, unit: u32, texture: Option<TextureId>);
  /// Selects the active texture unit without changing any binding.
  fn active_texture(&self, unit: u32);
  fn delete_texture(&self, texture: TextureId);

  /// Uploads vertex data (and indices, if any) into a new vertex array.
  ///
  /// # Parameters
  ///
  /// - `layout`: float attributes inside each interleaved vertex.
  /// - `vertices`: raw vertex bytes, a whole number of `layout.stride`s.
  /// - `indices`: triangle-list indices; `None` for arrays drawn with
  ///   [`Device::draw_arrays`].
  fn create_vertex_array(
    &self,
    layout: &VertexLayout,
    vertices: &[u8],
    indices: Option<&[u32]>,
  ) -> Result<VertexArray, String>;
  /// Deletes the vertex array and every buffer it owns.
  fn delete_vertex_array(&self, array: &VertexArray);
  /// Adds a buffer of per-instance attributes to `array`.
  ///
  /// Each attribute in `layout` advances once per instance instead of once
  /// per vertex. The buffer is not owned by the array; free it with
  /// [`Device::delete_buffer`].
  fn create_instance_buffer(
    &self,
    array: &VertexArray,
    layout: &VertexLayout,
    data: &[u8],
  ) -> Result<BufferId, String>;
  fn delete_buffer(&self, buffer: BufferId);
  /// Indexed triangle-list draw of `index_count` indices.
  fn draw_elements(&self, array: &VertexArray, index_count: u32);
  /// Non-indexed triangle-list draw of `count` vertices from `first`.
  fn draw_arrays(&self, array: &VertexArray, first: u32, count: u32);
  /// [`Device::draw_arrays`] repeated for `instances` instances in one call.
  fn draw_arrays_instanced(&self, array: &VertexArray, first: u32, count: u32, instances: u32);

  fn create_framebuffer(&self) -> Result<FramebufferId, String>;
  fn attach_texture(&self, framebuffer: FramebufferId, attachment: Attachment, texture: TextureId);
  /// Creates write-only storage sized `width` by `height` and attaches it.
  fn attach_renderbuffer(
    &self,
    framebuffer: FramebufferId,
    attachment: Attachment,
    width: u32,
    height: u32,
  ) -> Result<RenderbufferId, String>;
  /// Routes fragment outputs `0..count` to colour attachments `0..count`.
  /// Zero marks a depth-only framebuffer with no colour buffer to draw or read.
  fn draw_buffers(&self, framebuffer: FramebufferId, count: u32);
  fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus;
  /// `None` binds the default (window) framebuffer.
  fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>);
  fn delete_framebuffer(&self, framebuffer: FramebufferId);
  fn delete_renderbuffer(&self, renderbuffer: RenderbufferId);

  fn viewport(&self, x: i32, y: i32, width: u32, height: u32);
  fn clear(&self, request: ClearRequest);
  fn set_capability(&self, capability: Capability, enabled: bool);
  /// Faces dropped while [`Capability::CullFace`] is enabled.
  fn cull_face(&self, face: Face);
  /// Line rasterisation for both faces when `wireframe`, filled otherwise.
  fn polygon_mode(&self, wireframe: bool);
  /// Stencil test: passes when `func(reference & mask, stored & mask)` holds.
  fn stencil_func(&self, func: StencilFunc, reference: i32, mask: u32);
  /// Updates applied when the stencil test fails, when it passes but the depth
  /// test fails, and when both pass.
  fn stencil_op(&self, stencil_fail: StencilOp, depth_fail: StencilOp, pass: StencilOp);
  /// Bits of the stencil buffer that draws and clears may write.
  fn stencil_mask(&self, mask: u32);
}
