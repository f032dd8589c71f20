//! Object outlining with the stencil buffer: the crates write 1 into the
//! stencil, then slightly larger copies are drawn only where it is not 1.

use std::rc::Rc;

use glam::{Mat4, Vec3};
use winit::keyboard::KeyCode;

use super::{FrameContext, Scene, SceneContext, SceneError, SceneKind, model_matrix};
use crate::render::{
  Device,
  Shader,
  ShaderRegistry,
  ShaderSource,
  StaticGeometry,
  Texture,
  TextureKind,
  device::{Capability, ClearRequest, StencilFunc, StencilOp},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
  Textured,
  Outline,
}

const SHADERS: &[(Program, ShaderSource)] = &[
  (Program::Textured, ShaderSource::new("textured.vert", "textured.frag")),
  (Program::Outline, ShaderSource::new("textured.vert", "single_color.frag")),
];

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
const CRATES: [Vec3; 2] = [Vec3::new(-1.0, 0.0, -1.0), Vec3::new(2.0, 0.0, 0.0)];
const OUTLINE_SCALE: f32 = 1.1;
const ALL_BITS: u32 = 0xFF;

pub struct OutlineScene {
  device:   Rc<dyn Device>,
  shaders:  ShaderRegistry<Program>,
  cube:     StaticGeometry,
  floor:    StaticGeometry,
  marble:   Rc<Texture>,
  metal:    Rc<Texture>,
  outlines: bool,
}

impl OutlineScene {
  pub fn new(context: &SceneContext<'_>) -> Result<Self, SceneError> {
    let shaders = ShaderRegistry::from_manifest(context.device, &context.shader_dir(), SHADERS)?;

    Ok(Self {
      device: Rc::clone(context.device),
      shaders,
      cube: StaticGeometry::cube(context.device)?,
      floor: StaticGeometry::plane(context.device, 5.0, -0.5, 2.0)?,
      marble: context.texture_or_placeholder("textures/marble.jpg", TextureKind::Diffuse, [200, 200, 190, 255])?,
      metal: context.texture_or_placeholder("textures/metal.png", TextureKind::Diffuse, [90, 90, 100, 255])?,
      outlines: true,
    })
  }

  fn draw_crates(&self, shader: &Shader, scale: f32) {
    for position in CRATES {
      shader.set_mat4("model", model_matrix(position, Vec3::Y, 0.0, scale));
      self.cube.draw();
    }
  }
}

impl Scene for OutlineScene {
  fn kind(&self) -> SceneKind {
    SceneKind::Outline
  }

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError> {
    let device = self.device.as_ref();
    device.set_capability(Capability::DepthTest, true);
    device.set_capability(Capability::StencilTest, true);
    device.stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Replace);
    device.clear(ClearRequest::all(CLEAR_COLOR));

    let textured = self.shaders.get(Program::Textured)?;
    textured.use_program();
    textured.set_mat4("view", frame.view);
    textured.set_mat4("projection", frame.projection);
    textured.set_int("texture1", 0);

    // The floor must not mark the stencil.
    device.stencil_mask(0x00);
    self.metal.bind(0);
    textured.set_mat4("model", Mat4::IDENTITY);
    self.floor.draw();

    device.stencil_func(StencilFunc::Always, 1, ALL_BITS);
    device.stencil_mask(ALL_BITS);
    self.marble.bind(0);
    self.draw_crates(textured, 1.0);

    if self.outlines {
      device.stencil_func(StencilFunc::NotEqual, 1, ALL_BITS);
      device.stencil_mask(0x00);
      device.set_capability(Capability::DepthTest, false);

      let outline = self.shaders.get(Program::Outline)?;
      outline.use_program();
      outline.set_mat4("view", frame.view);
      outline.set_mat4("projection", frame.projection);
      self.draw_crates(outline, OUTLINE_SCALE);
    }

    // The next clear only resets bits the write mask allows.
    device.stencil_mask(ALL_BITS);
    device.stencil_func(StencilFunc::Always, 0, ALL_BITS);
    device.set_capability(Capability::DepthTest, true);
    device.set_capability(Capability::StencilTest, false);
    Ok(())
  }

  /// O toggles the outlines.
  fn handle_key(&mut self, key: KeyCode) -> bool {
    if key != KeyCode::KeyO {
      return false;
    }
    self.outlines = !self.outlines;
    true
  }

  fn status(&self) -> Option<String> {
    Some(format!("outlines {}", if self.outlines { "on" } else { "off" }))
  }
}
