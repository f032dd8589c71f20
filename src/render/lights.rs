//! Phong light and material parameter blocks.
//!
//! Each type writes itself into a shader under a GLSL struct prefix such as
//! `dirLight` or `pointLights[2]`.

use glam::Vec3;

use super::shader::Shader;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirLight {
  pub direction: Vec3,
  pub ambient:   Vec3,
  pub diffuse:   Vec3,
  pub specular:  Vec3,
}

impl DirLight {
  pub fn apply(&self, shader: &Shader, prefix: &str) {
    shader.set_vec3(&format!("{prefix}.direction"), self.direction);
    shader.set_vec3(&format!("{prefix}.ambient"), self.ambient);
    shader.set_vec3(&format!("{prefix}.diffuse"), self.diffuse);
    shader.set_vec3(&format!("{prefix}.specular"), self.specular);
  }
}

impl Default for DirLight {
  fn default() -> Self {
    Self {
      direction: Vec3::new(-0.2, -1.0, -0.3),
      ambient:   Vec3::splat(0.05),
      diffuse:   Vec3::splat(0.4),
      specular:  Vec3::splat(0.5),
    }
  }
}

/// Distance falloff `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
  pub constant:  f32,
  pub linear:    f32,
  pub quadratic: f32,
}

impl Attenuation {
  /// Reaches roughly zero at 50 units.
  pub const RANGE_50: Self = Self {
    constant:  1.0,
    linear:    0.09,
    quadratic: 0.032,
  };

  fn apply(&self, shader: &Shader, prefix: &str) {
    shader.set_float(&format!("{prefix}.constant"), self.constant);
    shader.set_float(&format!("{prefix}.linear"), self.linear);
    shader.set_float(&format!("{prefix}.quadratic"), self.quadratic);
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
  pub position:    Vec3,
  pub ambient:     Vec3,
  pub diffuse:     Vec3,
  pub specular:    Vec3,
  pub attenuation: Attenuation,
}

impl PointLight {
  /// White-ish light of `color` with the usual ambient/diffuse/specular split.
  pub fn new(position: Vec3, color: Vec3) -> Self {
    Self {
      position,
      ambient: color * 0.05,
      diffuse: color * 0.8,
      specular: color,
      attenuation: Attenuation::RANGE_50,
    }
  }

  pub fn apply(&self, shader: &Shader, prefix: &str) {
    shader.set_vec3(&format!("{prefix}.position"), self.position);
    shader.set_vec3(&format!("{prefix}.ambient"), self.ambient);
    shader.set_vec3(&format!("{prefix}.diffuse"), self.diffuse);
    shader.set_vec3(&format!("{prefix}.specular"), self.specular);
    self.attenuation.apply(shader, prefix);
  }
}

/// A cone light. Cut-offs are stored as cosines, as the shaders compare against them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
  pub position:      Vec3,
  pub direction:     Vec3,
  pub ambient:       Vec3,
  pub diffuse:       Vec3,
  pub specular:      Vec3,
  pub attenuation:   Attenuation,
  pub cut_off:       f32,
  pub outer_cut_off: f32,
}

impl SpotLight {
  /// A flashlight with a soft edge between `inner_degrees` and `outer_degrees`.
  pub fn flashlight(position: Vec3, direction: Vec3, inner_degrees: f32, outer_degrees: f32) -> Self {
    Self {
      position,
      direction,
      ambient: Vec3::ZERO,
      diffuse: Vec3::ONE,
      specular: Vec3::ONE,
      attenuation: Attenuation::RANGE_50,
      cut_off: inner_degrees.to_radians().cos(),
      outer_cut_off: outer_degrees.to_radians().cos(),
    }
  }

  pub fn apply(&self, shader: &Shader, prefix: &str) {
    shader.set_vec3(&format!("{prefix}.position"), self.position);
    shader.set_vec3(&format!("{prefix}.direction"), self.direction);
    shader.set_vec3(&format!("{prefix}.ambient"), self.ambient);
    shader.set_vec3(&format!("{prefix}.diffuse"), self.diffuse);
    shader.set_vec3(&format!("{prefix}.specular"), self.specular);
    self.attenuation.apply(shader, prefix);
    shader.set_float(&format!("{prefix}.cutOff"), self.cut_off);
    shader.set_float(&format!("{prefix}.outerCutOff"), self.outer_cut_off);
  }
}

/// Scalar part of a textured Phong material; the maps are bound by the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
  pub shininess: f32,
}

impl PhongMaterial {
  pub fn apply(&self, shader: &Shader, prefix: &str) {
    shader.set_float(&format!("{prefix}.shininess"), self.shininess);
  }
}

impl Default for PhongMaterial {
  fn default() -> Self {
    Self { shininess: 32.0 }
  }
}
