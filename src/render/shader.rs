//! Shader programs and by-name uniform writes.

use std::{
  fs,
  path::{Path, PathBuf},
  rc::Rc,
};

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use log::{debug, error, trace};
use thiserror::Error;

use super::device::{Device, ProgramId, ShaderStage, StageId, UniformValue};

#[derive(Debug, Error)]
pub enum ShaderError {
  #[error("failed to read shader source {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("{stage} shader failed to compile:\n{log}")]
  Compile { stage: ShaderStage, log: String },
  #[error("shader program failed to link:\n{log}")]
  Link { log: String },
}

/// File names of one program's stages, relative to a shader directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
  pub vertex:   &'static str,
  pub fragment: &'static str,
  pub geometry: Option<&'static str>,
}

impl ShaderSource {
  pub const fn new(vertex: &'static str, fragment: &'static str) -> Self {
    Self {
      vertex,
      fragment,
      geometry: None,
    }
  }

  pub const fn with_geometry(self, geometry: &'static str) -> Self {
    Self {
      geometry: Some(geometry),
      ..self
    }
  }
}

/// A linked GPU program. The program is deleted when the `Shader` drops.
pub struct Shader {
  device:  Rc<dyn Device>,
  program: ProgramId,
}

impl Shader {
  /// Reads and compiles the stage files, then links them.
  pub fn from_files(
    device: &Rc<dyn Device>,
    vertex: &Path,
    fragment: &Path,
    geometry: Option<&Path>,
  ) -> Result<Self, ShaderError> {
    let vertex_src = read_source(vertex)?;
    let fragment_src = read_source(fragment)?;
    let geometry_src = geometry.map(read_source).transpose()?;

    debug!(
      "Compiling shader {} + {}{}",
      vertex.display(),
      fragment.display(),
      geometry.map(|g| format!(" + {}", g.display())).unwrap_or_default()
    );

    Self::from_sources(device, &vertex_src, &fragment_src, geometry_src.as_deref())
  }

  pub fn from_sources(
    device: &Rc<dyn Device>,
    vertex: &str,
    fragment: &str,
    geometry: Option<&str>,
  ) -> Result<Self, ShaderError> {
    let mut stages = Vec::with_capacity(3);
    let sources = [
      (ShaderStage::Vertex, Some(vertex)),
      (ShaderStage::Geometry, geometry),
      (ShaderStage::Fragment, Some(fragment)),
    ];

    for (stage, source) in sources {
      let Some(source) = source else { continue };
      match device.compile_stage(stage, source) {
        Ok(id) => stages.push(id),
        Err(log) => {
          error!("{stage} shader failed to compile:\n{log}");
          delete_stages(device.as_ref(), &stages);
          return Err(ShaderError::Compile { stage, log });
        }
      }
    }

    let linked = device.link_program(&stages);
    delete_stages(device.as_ref(), &stages);

    match linked {
      Ok(program) => Ok(Self {
        device: Rc::clone(device),
        program,
      }),
      Err(log) => {
        error!("Shader program failed to link:\n{log}");
        Err(ShaderError::Link { log })
      }
    }
  }

  pub fn id(&self) -> ProgramId {
    self.program
  }

  /// Makes this the current program. The `set_*` calls write to whichever
  /// program is current, so call this first.
  pub fn use_program(&self) {
    self.device.use_program(Some(self.program));
  }

  /// Writes `value` into the uniform called `name` of the currently bound program.
  ///
  /// A name the linker optimised out (or never declared) is skipped.
  pub fn set(&self, name: &str, value: UniformValue) {
    match self.device.uniform_location(self.program, name) {
      Some(location) => self.device.set_uniform(location, value),
      None => trace!("Uniform `{name}` is not active in program {:?}", self.program),
    }
  }

  /// GLSL `bool` uniforms are written as 0 or 1.
  pub fn set_bool(&self, name: &str, value: bool) {
    self.set(name, UniformValue::Int(value as i32));
  }

  pub fn set_int(&self, name: &str, value: i32) {
    self.set(name, UniformValue::Int(value));
  }

  pub fn set_float(&self, name: &str, value: f32) {
    self.set(name, UniformValue::Float(value));
  }

  pub fn set_vec2(&self, name: &str, value: Vec2) {
    self.set(name, UniformValue::Vec2(value));
  }

  pub fn set_vec3(&self, name: &str, value: Vec3) {
    self.set(name, UniformValue::Vec3(value));
  }

  pub fn set_vec4(&self, name: &str, value: Vec4) {
    self.set(name, UniformValue::Vec4(value));
  }

  pub fn set_mat3(&self, name: &str, value: Mat3) {
    self.set(name, UniformValue::Mat3(value));
  }

  pub fn set_mat4(&self, name: &str, value: Mat4) {
    self.set(name, UniformValue::Mat4(value));
  }
}

impl Drop for Shader {
  fn drop(&mut self) {
    self.device.delete_program(self.program);
  }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
  fs::read_to_string(path).map_err(|source| {
    error!("Failed to read shader source {}: {source}", path.display());
    ShaderError::Io {
      path: path.to_path_buf(),
      source,
    }
  })
}

fn delete_stages(device: &dyn Device, stages: &[StageId]) {
  for &stage in stages {
    device.delete_stage(stage);
  }
}
