//! A [`Device`] that records calls instead of issuing them, for unit tests.

use std::{
  cell::{Cell, RefCell},
  collections::{HashMap, HashSet},
  num::NonZeroU32,
  path::{Path, PathBuf},
};

use image::{Rgba, RgbaImage};

use super::device::*;

/// A fresh, empty directory for one test's fixture files.
pub fn fixture_dir(name: &str) -> PathBuf {
  let dir = std::env::temp_dir()
    .join("learngl-app-tests")
    .join(format!("{name}-{}", std::process::id()));
  let _ = std::fs::remove_dir_all(&dir);
  std::fs::create_dir_all(&dir).unwrap();
  dir
}

/// Writes `scene.gltf` and `scene.bin` into `dir` and returns the `.gltf` path.
///
/// Node 0 (translated by (10, 0, 0)) is the scene root, and its child node 1
/// (translated by (0, 5, 0)) holds mesh 0. The mesh has a triangle primitive
/// at (0,0,0) (1,0,0) (0,1,0), with a base colour texture, and a points
/// primitive. The texture is a 2x2 PNG stored in the binary buffer, not a file.
pub fn write_gltf_fixture(dir: &Path) -> PathBuf {
  let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
  let uvs: [f32; 6] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
  let indices: [u16; 4] = [0, 1, 2, 0];

  let png_path = dir.join("embedded.png");
  RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]))
    .save(&png_path)
    .unwrap();
  let png = std::fs::read(&png_path).unwrap();
  std::fs::remove_file(&png_path).unwrap();

  let mut bin = Vec::new();
  bin.extend_from_slice(bytemuck::cast_slice(&positions));
  bin.extend_from_slice(bytemuck::cast_slice(&uvs));
  // Three indices plus one padding entry keep the image view 4-byte aligned.
  bin.extend_from_slice(bytemuck::cast_slice(&indices));
  let image_offset = bin.len();
  bin.extend_from_slice(&png);
  std::fs::write(dir.join("scene.bin"), &bin).unwrap();

  let json = format!(
    r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [
    {{ "name": "root", "translation": [10.0, 0.0, 0.0], "children": [1] }},
    {{ "name": "leaf", "translation": [0.0, 5.0, 0.0], "mesh": 0 }}
  ],
  "meshes": [{{
    "name": "tri",
    "primitives": [
      {{ "attributes": {{ "POSITION": 0, "TEXCOORD_0": 1 }}, "indices": 2, "material": 0 }},
      {{ "attributes": {{ "POSITION": 0 }}, "mode": 0 }}
    ]
  }}],
  "materials": [{{
    "name": "green",
    "pbrMetallicRoughness": {{ "baseColorTexture": {{ "index": 0 }} }}
  }}],
  "textures": [{{ "source": 0 }}],
  "images": [{{ "bufferView": 3, "mimeType": "image/png" }}],
  "buffers": [{{ "uri": "scene.bin", "byteLength": {total} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 24 }},
    {{ "buffer": 0, "byteOffset": 60, "byteLength": 6 }},
    {{ "buffer": 0, "byteOffset": {image_offset}, "byteLength": {image_len} }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" }},
    {{ "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#,
    total = bin.len(),
    image_len = png.len(),
  );
  let path = dir.join("scene.gltf");
  std::fs::write(&path, json).unwrap();
  path
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
  CompileStage(ShaderStage),
  LinkProgram(ProgramId),
  UseProgram(Option<ProgramId>),
  SetUniform(String, UniformValue),
  CreateTexture(TextureDesc),
  BindTexture(u32, Option<TextureId>),
  ActiveTexture(u32),
  CreateVertexArray { vertex_bytes: usize, index_count: usize },
  DrawElements(VertexArrayId, u32),
  DrawArrays(VertexArrayId, u32, u32),
  CreateInstanceBuffer { bytes: usize, locations: Vec<u32> },
  DrawArraysInstanced(VertexArrayId, u32, u32),
  DrawBuffers(FramebufferId, u32),
  BindFramebuffer(Option<FramebufferId>),
  Viewport(i32, i32, u32, u32),
  Clear(ClearRequest),
  SetCapability(Capability, bool),
  CullFace(Face),
  PolygonMode(bool),
  StencilFunc(StencilFunc, i32, u32),
  StencilOp(StencilOp, StencilOp, StencilOp),
  StencilMask(u32),
}

#[derive(Default)]
pub struct RecordingDevice {
  next_id:             Cell<u32>,
  calls:               RefCell<Vec<Call>>,
  live_stages:         RefCell<HashSet<StageId>>,
  live_programs:       RefCell<HashSet<ProgramId>>,
  live_textures:       RefCell<HashSet<TextureId>>,
  live_arrays:         RefCell<HashSet<VertexArrayId>>,
  live_buffers:        RefCell<HashSet<BufferId>>,
  live_framebuffers:   RefCell<HashSet<FramebufferId>>,
  live_renderbuffers:  RefCell<HashSet<RenderbufferId>>,
  locations:           RefCell<HashMap<(ProgramId, String), UniformLocation>>,
  location_names:      RefCell<HashMap<UniformLocation, String>>,
  absent_uniforms:     RefCell<HashSet<String>>,
  failing_stage:       Cell<Option<ShaderStage>>,
  failing_link:        Cell<bool>,
  incomplete_status:   Cell<Option<u32>>,
}

impl RecordingDevice {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every program reports `name` as inactive (location lookup yields nothing).
  pub fn with_absent_uniform(self, name: &str) -> Self {
    self.absent_uniforms.borrow_mut().insert(name.to_string());
    self
  }

  pub fn with_failing_stage(self, stage: ShaderStage) -> Self {
    self.failing_stage.set(Some(stage));
    self
  }

  pub fn with_failing_link(self) -> Self {
    self.failing_link.set(true);
    self
  }

  pub fn with_incomplete_framebuffers(self, status: u32) -> Self {
    self.incomplete_status.set(Some(status));
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.borrow().clone()
  }

  pub fn clear_calls(&self) {
    self.calls.borrow_mut().clear();
  }

  pub fn draw_calls(&self) -> usize {
    self
      .calls
      .borrow()
      .iter()
      .filter(|call| matches!(
        call,
        Call::DrawElements(..) | Call::DrawArrays(..) | Call::DrawArraysInstanced(..)
      ))
      .count()
  }

  pub fn textures_created(&self) -> usize {
    self
      .calls
      .borrow()
      .iter()
      .filter(|call| matches!(call, Call::CreateTexture(_)))
      .count()
  }

  pub fn uniform_writes(&self) -> Vec<(String, UniformValue)> {
    self
      .calls
      .borrow()
      .iter()
      .filter_map(|call| match call {
        Call::SetUniform(name, value) => Some((name.clone(), *value)),
        _ => None,
      })
      .collect()
  }

  pub fn current_program(&self) -> Option<ProgramId> {
    self.calls.borrow().iter().rev().find_map(|call| match call {
      Call::UseProgram(program) => Some(*program),
      _ => None,
    })?
  }

  pub fn live_stages(&self) -> usize {
    self.live_stages.borrow().len()
  }

  pub fn live_programs(&self) -> usize {
    self.live_programs.borrow().len()
  }

  pub fn live_textures(&self) -> usize {
    self.live_textures.borrow().len()
  }

  pub fn live_vertex_arrays(&self) -> usize {
    self.live_arrays.borrow().len()
  }

  /// Standalone buffers, not counting those owned by a vertex array.
  pub fn live_buffers(&self) -> usize {
    self.live_buffers.borrow().len()
  }

  pub fn live_framebuffers(&self) -> usize {
    self.live_framebuffers.borrow().len() + self.live_renderbuffers.borrow().len()
  }

  fn next(&self) -> NonZeroU32 {
    let id = self.next_id.get() + 1;
    self.next_id.set(id);
    NonZeroU32::new(id).unwrap()
  }

  fn record(&self, call: Call) {
    self.calls.borrow_mut().push(call);
  }
}

impl Device for RecordingDevice {
  fn compile_stage(&self, stage: ShaderStage, _source: &str) -> Result<StageId, String> {
    self.record(Call::CompileStage(stage));
    if self.failing_stage.get() == Some(stage) {
      return Err(format!("0:1(1): error: {stage} stage rejected"));
    }
    let id = StageId(self.next());
    self.live_stages.borrow_mut().insert(id);
    Ok(id)
  }

  fn delete_stage(&self, stage: StageId) {
    self.live_stages.borrow_mut().remove(&stage);
  }

  fn link_program(&self, stages: &[StageId]) -> Result<ProgramId, String> {
    assert!(
      stages.iter().all(|s| self.live_stages.borrow().contains(s)),
      "linking a deleted stage"
    );
    if self.failing_link.get() {
      return Err("error: unresolved varying".to_string());
    }
    let id = ProgramId(self.next());
    self.live_programs.borrow_mut().insert(id);
    self.record(Call::LinkProgram(id));
    Ok(id)
  }

  fn delete_program(&self, program: ProgramId) {
    assert!(self.live_programs.borrow_mut().remove(&program), "double delete of {program:?}");
  }

  fn use_program(&self, program: Option<ProgramId>) {
    self.record(Call::UseProgram(program));
  }

  fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
    if self.absent_uniforms.borrow().contains(name) {
      return None;
    }
    let mut locations = self.locations.borrow_mut();
    let next = UniformLocation(locations.len() as u32);
    let location = *locations.entry((program, name.to_string())).or_insert(next);
    self.location_names.borrow_mut().insert(location, name.to_string());
    Some(location)
  }

  fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
    let name = self
      .location_names
      .borrow()
      .get(&location)
      .cloned()
      .unwrap_or_default();
    self.record(Call::SetUniform(name, value));
  }

  fn create_texture(&self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<TextureId, String> {
    if let (Some(pixels), Some(bpp)) = (pixels, desc.format.bytes_per_pixel()) {
      assert_eq!(pixels.len(), desc.width as usize * desc.height as usize * bpp);
    }
    self.record(Call::CreateTexture(*desc));
    let id = TextureId(self.next());
    self.live_textures.borrow_mut().insert(id);
    Ok(id)
  }

  fn bind_texture(&self, unit: u32, texture: Option<TextureId>) {
    self.record(Call::BindTexture(unit, texture));
  }

  fn active_texture(&self, unit: u32) {
    self.record(Call::ActiveTexture(unit));
  }

  fn delete_texture(&self, texture: TextureId) {
    assert!(self.live_textures.borrow_mut().remove(&texture), "double delete of {texture:?}");
  }

  fn create_vertex_array(
    &self,
    _layout: &VertexLayout,
    vertices: &[u8],
    indices: Option<&[u32]>,
  ) -> Result<VertexArray, String> {
    self.record(Call::CreateVertexArray {
      vertex_bytes: vertices.len(),
      index_count:  indices.map_or(0, <[u32]>::len),
    });
    let array = VertexArray {
      vao:           VertexArrayId(self.next()),
      vertex_buffer: BufferId(self.next()),
      index_buffer:  indices.map(|_| BufferId(self.next())),
    };
    self.live_arrays.borrow_mut().insert(array.vao);
    Ok(array)
  }

  fn delete_vertex_array(&self, array: &VertexArray) {
    assert!(self.live_arrays.borrow_mut().remove(&array.vao), "double delete of {array:?}");
  }

  fn create_instance_buffer(
    &self,
    array: &VertexArray,
    layout: &VertexLayout,
    data: &[u8],
  ) -> Result<BufferId, String> {
    assert!(self.live_arrays.borrow().contains(&array.vao), "instancing a deleted array");
    self.record(Call::CreateInstanceBuffer {
      bytes:     data.len(),
      locations: layout.attributes.iter().map(|a| a.location).collect(),
    });
    let id = BufferId(self.next());
    self.live_buffers.borrow_mut().insert(id);
    Ok(id)
  }

  fn delete_buffer(&self, buffer: BufferId) {
    assert!(self.live_buffers.borrow_mut().remove(&buffer), "double delete of {buffer:?}");
  }

  fn draw_elements(&self, array: &VertexArray, index_count: u32) {
    self.record(Call::DrawElements(array.vao, index_count));
  }

  fn draw_arrays(&self, array: &VertexArray, first: u32, count: u32) {
    self.record(Call::DrawArrays(array.vao, first, count));
  }

  fn draw_arrays_instanced(&self, array: &VertexArray, _first: u32, count: u32, instances: u32) {
    self.record(Call::DrawArraysInstanced(array.vao, count, instances));
  }

  fn create_framebuffer(&self) -> Result<FramebufferId, String> {
    let id = FramebufferId(self.next());
    self.live_framebuffers.borrow_mut().insert(id);
    Ok(id)
  }

  fn attach_texture(&self, _framebuffer: FramebufferId, _attachment: Attachment, _texture: TextureId) {}

  fn attach_renderbuffer(
    &self,
    _framebuffer: FramebufferId,
    _attachment: Attachment,
    _width: u32,
    _height: u32,
  ) -> Result<RenderbufferId, String> {
    let id = RenderbufferId(self.next());
    self.live_renderbuffers.borrow_mut().insert(id);
    Ok(id)
  }

  fn draw_buffers(&self, framebuffer: FramebufferId, count: u32) {
    self.record(Call::DrawBuffers(framebuffer, count));
  }

  fn framebuffer_status(&self, _framebuffer: FramebufferId) -> FramebufferStatus {
    match self.incomplete_status.get() {
      Some(status) => FramebufferStatus::Incomplete(status),
      None => FramebufferStatus::Complete,
    }
  }

  fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
    self.record(Call::BindFramebuffer(framebuffer));
  }

  fn delete_framebuffer(&self, framebuffer: FramebufferId) {
    self.live_framebuffers.borrow_mut().remove(&framebuffer);
  }

  fn delete_renderbuffer(&self, renderbuffer: RenderbufferId) {
    self.live_renderbuffers.borrow_mut().remove(&renderbuffer);
  }

  fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
    self.record(Call::Viewport(x, y, width, height));
  }

  fn clear(&self, request: ClearRequest) {
    self.record(Call::Clear(request));
  }

  fn set_capability(&self, capability: Capability, enabled: bool) {
    self.record(Call::SetCapability(capability, enabled));
  }

  fn cull_face(&self, face: Face) {
    self.record(Call::CullFace(face));
  }

  fn polygon_mode(&self, wireframe: bool) {
    self.record(Call::PolygonMode(wireframe));
  }

  fn stencil_func(&self, func: StencilFunc, reference: i32, mask: u32) {
    self.record(Call::StencilFunc(func, reference, mask));
  }

  fn stencil_op(&self, stencil_fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
    self.record(Call::StencilOp(stencil_fail, depth_fail, pass));
  }

  fn stencil_mask(&self, mask: u32) {
    self.record(Call::StencilMask(mask));
  }
}
