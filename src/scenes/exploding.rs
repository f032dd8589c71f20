//! A model whose triangles are pushed out along their face normals by a
//! geometry shader, driven by elapsed time.

use std::rc::Rc;

use glam::Vec3;
use winit::keyboard::KeyCode;

use super::{DEMO_MODEL, FrameContext, Scene, SceneContext, SceneError, SceneKind, model_matrix};
use crate::render::{
  Device,
  Model,
  ModelOptions,
  ShaderRegistry,
  ShaderSource,
  device::{Capability, ClearRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
  Explode,
}

const SHADERS: &[(Program, ShaderSource)] = &[(
  Program::Explode,
  ShaderSource::new("explode.vert", "explode.frag").with_geometry("explode.geom"),
)];

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

pub struct ExplodingScene {
  device:  Rc<dyn Device>,
  shaders: ShaderRegistry<Program>,
  model:   Model,
  paused:  bool,
  /// Animation clock; stops advancing while paused.
  clock:   f32,
}

impl ExplodingScene {
  pub fn new(context: &SceneContext<'_>) -> Result<Self, SceneError> {
    let shaders = ShaderRegistry::from_manifest(context.device, &context.shader_dir(), SHADERS)?;
    let model = Model::load_or_empty(context.device, &context.asset(DEMO_MODEL), ModelOptions::default());

    Ok(Self {
      device: Rc::clone(context.device),
      shaders,
      model,
      paused: false,
      clock: 0.0,
    })
  }
}

impl Scene for ExplodingScene {
  fn kind(&self) -> SceneKind {
    SceneKind::Exploding
  }

  fn update(&mut self, frame: &FrameContext) {
    if !self.paused {
      self.clock += frame.delta_time;
    }
  }

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError> {
    self.device.set_capability(Capability::DepthTest, true);
    self.device.clear(ClearRequest::color_and_depth(CLEAR_COLOR));

    let shader = self.shaders.get(Program::Explode)?;
    shader.use_program();
    shader.set_mat4("view", frame.view);
    shader.set_mat4("projection", frame.projection);
    shader.set_mat4("model", model_matrix(Vec3::new(0.0, -1.75, 0.0), Vec3::Y, 0.0, 0.2));
    shader.set_float("time", self.clock);

    self.model.draw(shader);
    Ok(())
  }

  /// P pauses the explosion.
  fn handle_key(&mut self, key: KeyCode) -> bool {
    if key != KeyCode::KeyP {
      return false;
    }
    self.paused = !self.paused;
    true
  }

  fn status(&self) -> Option<String> {
    self.paused.then(|| "paused".to_string())
  }
}
