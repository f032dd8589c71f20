//! An imported model under a directional light and one point light that
//! orbits it.

use std::rc::Rc;

use glam::Vec3;

use super::{DEMO_MODEL, FrameContext, Scene, SceneContext, SceneError, SceneKind, model_matrix};
use crate::render::{
  Device,
  Model,
  ModelOptions,
  ShaderRegistry,
  ShaderSource,
  device::{Capability, ClearRequest},
  lights::{DirLight, PhongMaterial, PointLight},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
  Model,
}

const SHADERS: &[(Program, ShaderSource)] = &[(Program::Model, ShaderSource::new("model.vert", "model.frag"))];

const CLEAR_COLOR: [f32; 4] = [0.05, 0.05, 0.08, 1.0];
const ORBIT_RADIUS: f32 = 2.0;

pub struct ModelViewerScene {
  device:   Rc<dyn Device>,
  shaders:  ShaderRegistry<Program>,
  model:    Model,
  sun:      DirLight,
  orbiter:  PointLight,
  material: PhongMaterial,
}

impl ModelViewerScene {
  pub fn new(context: &SceneContext<'_>) -> Result<Self, SceneError> {
    let shaders = ShaderRegistry::from_manifest(context.device, &context.shader_dir(), SHADERS)?;
    let model = Model::load_or_empty(context.device, &context.asset(DEMO_MODEL), ModelOptions::default());

    Ok(Self {
      device: Rc::clone(context.device),
      shaders,
      model,
      sun: DirLight::default(),
      orbiter: PointLight::new(Vec3::new(ORBIT_RADIUS, 1.0, 0.0), Vec3::new(1.0, 0.9, 0.7)),
      material: PhongMaterial::default(),
    })
  }

  pub fn model(&self) -> &Model {
    &self.model
  }
}

impl Scene for ModelViewerScene {
  fn kind(&self) -> SceneKind {
    SceneKind::ModelViewer
  }

  fn update(&mut self, frame: &FrameContext) {
    let (sin, cos) = frame.time.sin_cos();
    self.orbiter.position = Vec3::new(cos * ORBIT_RADIUS, 1.0, sin * ORBIT_RADIUS);
  }

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError> {
    self.device.set_capability(Capability::DepthTest, true);
    self.device.clear(ClearRequest::color_and_depth(CLEAR_COLOR));

    let shader = self.shaders.get(Program::Model)?;
    shader.use_program();
    shader.set_mat4("view", frame.view);
    shader.set_mat4("projection", frame.projection);
    shader.set_vec3("viewPos", frame.camera_position);
    shader.set_mat4("model", model_matrix(Vec3::new(0.0, -1.75, 0.0), Vec3::Y, 0.0, 0.2));

    self.material.apply(shader, "material");
    self.sun.apply(shader, "dirLight");
    self.orbiter.apply(shader, "pointLight");

    self.model.draw(shader);
    Ok(())
  }

  fn status(&self) -> Option<String> {
    Some(format!("{} meshes", self.model.meshes().len()))
  }
}
