//! [`Device`] implementation on top of `glow`.

use std::sync::Arc;

use glow::{HasContext, PixelUnpackData};
use log::info;

use super::device::*;

/// OpenGL 3.3 core device. Must only be used while its context is current.
pub struct GlDevice {
  gl: Arc<glow::Context>,
}

impl GlDevice {
  pub fn new(gl: glow::Context) -> Self {
    let device = Self { gl: Arc::new(gl) };
    device.log_driver_info();
    device
  }

  pub fn context(&self) -> &Arc<glow::Context> {
    &self.gl
  }

  fn log_driver_info(&self) {
    unsafe {
      let gl = &self.gl;
      info!(
        "OpenGL driver: {} [{}], {}, GLSL {}",
        gl.get_parameter_string(glow::RENDERER).trim(),
        gl.get_parameter_string(glow::VENDOR).trim(),
        gl.get_parameter_string(glow::VERSION).trim(),
        gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION).trim(),
      );
    }
  }
}

fn stage_enum(stage: ShaderStage) -> u32 {
  match stage {
    ShaderStage::Vertex => glow::VERTEX_SHADER,
    ShaderStage::Geometry => glow::GEOMETRY_SHADER,
    ShaderStage::Fragment => glow::FRAGMENT_SHADER,
  }
}

fn wrap_enum(wrap: Wrap) -> i32 {
  (match wrap {
    Wrap::Repeat => glow::REPEAT,
    Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
    Wrap::ClampToBorder => glow::CLAMP_TO_BORDER,
  }) as i32
}

fn min_filter_enum(filter: Filter, mipmaps: bool) -> i32 {
  (match (filter, mipmaps) {
    (Filter::Nearest, false) => glow::NEAREST,
    (Filter::Linear, false) => glow::LINEAR,
    (Filter::Nearest, true) => glow::NEAREST_MIPMAP_NEAREST,
    (Filter::Linear, true) => glow::LINEAR_MIPMAP_LINEAR,
  }) as i32
}

fn mag_filter_enum(filter: Filter) -> i32 {
  (match filter {
    Filter::Nearest => glow::NEAREST,
    Filter::Linear => glow::LINEAR,
  }) as i32
}

/// `(internal format, pixel format, pixel type)`
fn format_enums(format: TextureFormat) -> (u32, u32, u32) {
  match format {
    TextureFormat::R8 => (glow::R8, glow::RED, glow::UNSIGNED_BYTE),
    TextureFormat::Rgb8 => (glow::RGB8, glow::RGB, glow::UNSIGNED_BYTE),
    TextureFormat::Rgba8 => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
    TextureFormat::Depth => (glow::DEPTH_COMPONENT24, glow::DEPTH_COMPONENT, glow::FLOAT),
  }
}

fn attachment_enum(attachment: Attachment) -> u32 {
  match attachment {
    Attachment::Color(index) => glow::COLOR_ATTACHMENT0 + index,
    Attachment::Depth => glow::DEPTH_ATTACHMENT,
    Attachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
  }
}

fn capability_enum(capability: Capability) -> u32 {
  match capability {
    Capability::DepthTest => glow::DEPTH_TEST,
    Capability::StencilTest => glow::STENCIL_TEST,
    Capability::CullFace => glow::CULL_FACE,
    Capability::Multisample => glow::MULTISAMPLE,
  }
}

fn stencil_func_enum(func: StencilFunc) -> u32 {
  match func {
    StencilFunc::Always => glow::ALWAYS,
    StencilFunc::Equal => glow::EQUAL,
    StencilFunc::NotEqual => glow::NOTEQUAL,
  }
}

fn stencil_op_enum(op: StencilOp) -> u32 {
  match op {
    StencilOp::Keep => glow::KEEP,
    StencilOp::Zero => glow::ZERO,
    StencilOp::Replace => glow::REPLACE,
  }
}

impl Device for GlDevice {
  fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<StageId, String> {
    unsafe {
      let shader = self.gl.create_shader(stage_enum(stage))?;
      self.gl.shader_source(shader, source);
      self.gl.compile_shader(shader);
      if !self.gl.get_shader_compile_status(shader) {
        let log = self.gl.get_shader_info_log(shader);
        self.gl.delete_shader(shader);
        return Err(log);
      }
      Ok(StageId(shader.0))
    }
  }

  fn delete_stage(&self, stage: StageId) {
    unsafe { self.gl.delete_shader(glow::NativeShader(stage.0)) }
  }

  fn link_program(&self, stages: &[StageId]) -> Result<ProgramId, String> {
    unsafe {
      let program = self.gl.create_program()?;
      for stage in stages {
        self.gl.attach_shader(program, glow::NativeShader(stage.0));
      }
      self.gl.link_program(program);
      for stage in stages {
        self.gl.detach_shader(program, glow::NativeShader(stage.0));
      }
      if !self.gl.get_program_link_status(program) {
        let log = self.gl.get_program_info_log(program);
        self.gl.delete_program(program);
        return Err(log);
      }
      Ok(ProgramId(program.0))
    }
  }

  fn delete_program(&self, program: ProgramId) {
    unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
  }

  fn use_program(&self, program: Option<ProgramId>) {
    unsafe { self.gl.use_program(program.map(|p| glow::NativeProgram(p.0))) }
  }

  fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
    unsafe {
      self
        .gl
        .get_uniform_location(glow::NativeProgram(program.0), name)
        .map(|location| UniformLocation(location.0))
    }
  }

  fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
    let location = glow::NativeUniformLocation(location.0);
    let location = Some(&location);
    unsafe {
      match value {
        UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
        UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
        UniformValue::Vec2(v) => self.gl.uniform_2_f32(location, v.x, v.y),
        UniformValue::Vec3(v) => self.gl.uniform_3_f32(location, v.x, v.y, v.z),
        UniformValue::Vec4(v) => self.gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
        UniformValue::Mat3(m) => {
          self
            .gl
            .uniform_matrix_3_f32_slice(location, false, &m.to_cols_array())
        }
        UniformValue::Mat4(m) => {
          self
            .gl
            .uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
        }
      }
    }
  }

  fn create_texture(&self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<TextureId, String> {
    let (internal, format, ty) = format_enums(desc.format);
    let sampler = &desc.sampler;
    unsafe {
      let gl = &self.gl;
      let texture = gl.create_texture()?;
      gl.bind_texture(glow::TEXTURE_2D, Some(texture));

      // Rows of RGB8 and R8 images are not 4-byte aligned in general.
      gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

      gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap_enum(sampler.wrap_s));
      gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap_enum(sampler.wrap_t));
      gl.tex_parameter_i32(
        glow::TEXTURE_2D,
        glow::TEXTURE_MIN_FILTER,
        min_filter_enum(sampler.min_filter, sampler.mipmaps),
      );
      gl.tex_parameter_i32(
        glow::TEXTURE_2D,
        glow::TEXTURE_MAG_FILTER,
        mag_filter_enum(sampler.mag_filter),
      );
      if let Some(border) = sampler.border_color {
        gl.tex_parameter_f32_slice(glow::TEXTURE_2D, glow::TEXTURE_BORDER_COLOR, &border);
      }

      gl.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        internal as i32,
        desc.width as i32,
        desc.height as i32,
        0,
        format,
        ty,
        PixelUnpackData::Slice(pixels),
      );

      if sampler.mipmaps {
        gl.generate_mipmap(glow::TEXTURE_2D);
      }

      gl.bind_texture(glow::TEXTURE_2D, None);
      Ok(TextureId(texture.0))
    }
  }

  fn bind_texture(&self, unit: u32, texture: Option<TextureId>) {
    unsafe {
      self.gl.active_texture(glow::TEXTURE0 + unit);
      self
        .gl
        .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)));
    }
  }

  fn active_texture(&self, unit: u32) {
    unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
  }

  fn delete_texture(&self, texture: TextureId) {
    unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
  }

  fn create_vertex_array(
    &self,
    layout: &VertexLayout,
    vertices: &[u8],
    indices: Option<&[u32]>,
  ) -> Result<VertexArray, String> {
    unsafe {
      let gl = &self.gl;
      let vao = gl.create_vertex_array()?;
      let vbo = gl.create_buffer()?;

      gl.bind_vertex_array(Some(vao));
      gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
      gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, vertices, glow::STATIC_DRAW);

      for attribute in &layout.attributes {
        gl.vertex_attrib_pointer_f32(
          attribute.location,
          attribute.components as i32,
          glow::FLOAT,
          false,
          layout.stride as i32,
          attribute.offset as i32,
        );
        gl.enable_vertex_attrib_array(attribute.location);
      }

      let ebo = match indices {
        Some(indices) => {
          let ebo = gl.create_buffer()?;
          gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
          gl.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(indices),
            glow::STATIC_DRAW,
          );
          Some(ebo)
        }
        None => None,
      };

      // Unbind the VAO first so the element buffer binding stays recorded in it.
      gl.bind_vertex_array(None);
      gl.bind_buffer(glow::ARRAY_BUFFER, None);

      Ok(VertexArray {
        vao:           VertexArrayId(vao.0),
        vertex_buffer: BufferId(vbo.0),
        index_buffer:  ebo.map(|b| BufferId(b.0)),
      })
    }
  }

  fn delete_vertex_array(&self, array: &VertexArray) {
    unsafe {
      self.gl.delete_vertex_array(glow::NativeVertexArray(array.vao.0));
      self.gl.delete_buffer(glow::NativeBuffer(array.vertex_buffer.0));
      if let Some(ebo) = array.index_buffer {
        self.gl.delete_buffer(glow::NativeBuffer(ebo.0));
      }
    }
  }

  fn create_instance_buffer(
    &self,
    array: &VertexArray,
    layout: &VertexLayout,
    data: &[u8],
  ) -> Result<BufferId, String> {
    unsafe {
      let gl = &self.gl;
      let buffer = gl.create_buffer()?;
      gl.bind_vertex_array(Some(glow::NativeVertexArray(array.vao.0)));
      gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
      gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW);

      for attribute in &layout.attributes {
        gl.vertex_attrib_pointer_f32(
          attribute.location,
          attribute.components as i32,
          glow::FLOAT,
          false,
          layout.stride as i32,
          attribute.offset as i32,
        );
        gl.enable_vertex_attrib_array(attribute.location);
        gl.vertex_attrib_divisor(attribute.location, 1);
      }

      gl.bind_vertex_array(None);
      gl.bind_buffer(glow::ARRAY_BUFFER, None);
      Ok(BufferId(buffer.0))
    }
  }

  fn delete_buffer(&self, buffer: BufferId) {
    unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
  }

  fn draw_elements(&self, array: &VertexArray, index_count: u32) {
    unsafe {
      self.gl.bind_vertex_array(Some(glow::NativeVertexArray(array.vao.0)));
      self
        .gl
        .draw_elements(glow::TRIANGLES, index_count as i32, glow::UNSIGNED_INT, 0);
      self.gl.bind_vertex_array(None);
    }
  }

  fn draw_arrays(&self, array: &VertexArray, first: u32, count: u32) {
    unsafe {
      self.gl.bind_vertex_array(Some(glow::NativeVertexArray(array.vao.0)));
      self.gl.draw_arrays(glow::TRIANGLES, first as i32, count as i32);
      self.gl.bind_vertex_array(None);
    }
  }

  fn draw_arrays_instanced(&self, array: &VertexArray, first: u32, count: u32, instances: u32) {
    unsafe {
      self.gl.bind_vertex_array(Some(glow::NativeVertexArray(array.vao.0)));
      self
        .gl
        .draw_arrays_instanced(glow::TRIANGLES, first as i32, count as i32, instances as i32);
      self.gl.bind_vertex_array(None);
    }
  }

  fn create_framebuffer(&self) -> Result<FramebufferId, String> {
    unsafe { self.gl.create_framebuffer().map(|fb| FramebufferId(fb.0)) }
  }

  fn attach_texture(&self, framebuffer: FramebufferId, attachment: Attachment, texture: TextureId) {
    unsafe {
      self
        .gl
        .bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
      self.gl.framebuffer_texture_2d(
        glow::FRAMEBUFFER,
        attachment_enum(attachment),
        glow::TEXTURE_2D,
        Some(glow::NativeTexture(texture.0)),
        0,
      );
      self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
    }
  }

  fn attach_renderbuffer(
    &self,
    framebuffer: FramebufferId,
    attachment: Attachment,
    width: u32,
    height: u32,
  ) -> Result<RenderbufferId, String> {
    let storage = match attachment {
      Attachment::DepthStencil => glow::DEPTH24_STENCIL8,
      Attachment::Depth => glow::DEPTH_COMPONENT24,
      Attachment::Color(_) => glow::RGBA8,
    };
    unsafe {
      let gl = &self.gl;
      let renderbuffer = gl.create_renderbuffer()?;
      gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
      gl.renderbuffer_storage(glow::RENDERBUFFER, storage, width as i32, height as i32);
      gl.bind_renderbuffer(glow::RENDERBUFFER, None);

      gl.bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
      gl.framebuffer_renderbuffer(
        glow::FRAMEBUFFER,
        attachment_enum(attachment),
        glow::RENDERBUFFER,
        Some(renderbuffer),
      );
      gl.bind_framebuffer(glow::FRAMEBUFFER, None);
      Ok(RenderbufferId(renderbuffer.0))
    }
  }

  fn draw_buffers(&self, framebuffer: FramebufferId, count: u32) {
    unsafe {
      self
        .gl
        .bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
      if count == 0 {
        self.gl.draw_buffer(glow::NONE);
        self.gl.read_buffer(glow::NONE);
      } else {
        let buffers: Vec<u32> = (0..count).map(|i| glow::COLOR_ATTACHMENT0 + i).collect();
        self.gl.draw_buffers(&buffers);
      }
      self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
    }
  }

  fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
    unsafe {
      self
        .gl
        .bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
      let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
      self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
      if status == glow::FRAMEBUFFER_COMPLETE {
        FramebufferStatus::Complete
      } else {
        FramebufferStatus::Incomplete(status)
      }
    }
  }

  fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
    unsafe {
      self
        .gl
        .bind_framebuffer(glow::FRAMEBUFFER, framebuffer.map(|fb| glow::NativeFramebuffer(fb.0)))
    }
  }

  fn delete_framebuffer(&self, framebuffer: FramebufferId) {
    unsafe { self.gl.delete_framebuffer(glow::NativeFramebuffer(framebuffer.0)) }
  }

  fn delete_renderbuffer(&self, renderbuffer: RenderbufferId) {
    unsafe { self.gl.delete_renderbuffer(glow::NativeRenderbuffer(renderbuffer.0)) }
  }

  fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
    unsafe { self.gl.viewport(x, y, width as i32, height as i32) }
  }

  fn clear(&self, request: ClearRequest) {
    let mut mask = 0;
    unsafe {
      if let Some([r, g, b, a]) = request.color {
        self.gl.clear_color(r, g, b, a);
        mask |= glow::COLOR_BUFFER_BIT;
      }
      if request.depth {
        mask |= glow::DEPTH_BUFFER_BIT;
      }
      if request.stencil {
        self.gl.clear_stencil(0);
        mask |= glow::STENCIL_BUFFER_BIT;
      }
      if mask != 0 {
        self.gl.clear(mask);
      }
    }
  }

  fn set_capability(&self, capability: Capability, enabled: bool) {
    unsafe {
      if enabled {
        self.gl.enable(capability_enum(capability));
      } else {
        self.gl.disable(capability_enum(capability));
      }
    }
  }

  fn cull_face(&self, face: Face) {
    let face = match face {
      Face::Front => glow::FRONT,
      Face::Back => glow::BACK,
    };
    unsafe { self.gl.cull_face(face) }
  }

  fn polygon_mode(&self, wireframe: bool) {
    let mode = if wireframe { glow::LINE } else { glow::FILL };
    unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) }
  }

  fn stencil_func(&self, func: StencilFunc, reference: i32, mask: u32) {
    unsafe { self.gl.stencil_func(stencil_func_enum(func), reference, mask) }
  }

  fn stencil_op(&self, stencil_fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
    unsafe {
      self.gl.stencil_op(
        stencil_op_enum(stencil_fail),
        stencil_op_enum(depth_fail),
        stencil_op_enum(pass),
      )
    }
  }

  fn stencil_mask(&self, mask: u32) {
    unsafe { self.gl.stencil_mask(mask) }
  }
}
