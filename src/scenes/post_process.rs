//! Renders into an off-screen colour target, then draws it to the window
//! through a full-screen kernel effect.

use std::{fmt, rc::Rc};

use glam::Vec3;
use log::{debug, info};
use winit::keyboard::KeyCode;

use super::{FrameContext, Scene, SceneContext, SceneError, SceneKind, model_matrix};
use crate::render::{
  Device,
  Framebuffer,
  ShaderRegistry,
  ShaderSource,
  StaticGeometry,
  TargetAttachment,
  Texture,
  TextureKind,
  device::{Capability, ClearRequest, TextureFormat},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
  Textured,
  Screen,
}

const SHADERS: &[(Program, ShaderSource)] = &[
  (Program::Textured, ShaderSource::new("textured.vert", "textured.frag")),
  (Program::Screen, ShaderSource::new("screen.vert", "screen.frag")),
];

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

/// Effect applied by the screen pass. The discriminant is the `effect` uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostEffect {
  #[default]
  None = 0,
  Inversion = 1,
  Grayscale = 2,
  Sharpen = 3,
}

impl PostEffect {
  pub fn next(self) -> Self {
    match self {
      PostEffect::None => PostEffect::Inversion,
      PostEffect::Inversion => PostEffect::Grayscale,
      PostEffect::Grayscale => PostEffect::Sharpen,
      PostEffect::Sharpen => PostEffect::None,
    }
  }
}

impl fmt::Display for PostEffect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      PostEffect::None => "none",
      PostEffect::Inversion => "inversion",
      PostEffect::Grayscale => "grayscale",
      PostEffect::Sharpen => "sharpen",
    };
    f.write_str(name)
  }
}

pub struct PostProcessScene {
  device:  Rc<dyn Device>,
  shaders: ShaderRegistry<Program>,
  target:  Framebuffer,
  cube:    StaticGeometry,
  floor:   StaticGeometry,
  quad:    StaticGeometry,
  crate_:  Rc<Texture>,
  metal:   Rc<Texture>,
  effect:  PostEffect,
}

fn color_target(device: &Rc<dyn Device>, (width, height): (u32, u32)) -> Result<Framebuffer, SceneError> {
  Ok(Framebuffer::new(
    device,
    width.max(1),
    height.max(1),
    &[
      TargetAttachment::Color(TextureFormat::Rgb8),
      TargetAttachment::DepthStencilBuffer,
    ],
  )?)
}

impl PostProcessScene {
  pub fn new(context: &SceneContext<'_>) -> Result<Self, SceneError> {
    let shaders = ShaderRegistry::from_manifest(context.device, &context.shader_dir(), SHADERS)?;

    Ok(Self {
      device: Rc::clone(context.device),
      shaders,
      target: color_target(context.device, context.viewport)?,
      cube: StaticGeometry::cube(context.device)?,
      floor: StaticGeometry::plane(context.device, 5.0, -0.5, 2.0)?,
      quad: StaticGeometry::screen_quad(context.device)?,
      crate_: context.texture_or_placeholder("textures/container.jpg", TextureKind::Diffuse, [170, 130, 70, 255])?,
      metal: context.texture_or_placeholder("textures/metal.png", TextureKind::Diffuse, [90, 90, 100, 255])?,
      effect: PostEffect::default(),
    })
  }

  pub fn effect(&self) -> PostEffect {
    self.effect
  }

  pub fn target_size(&self) -> (u32, u32) {
    self.target.size()
  }
}

impl Scene for PostProcessScene {
  fn kind(&self) -> SceneKind {
    SceneKind::PostProcess
  }

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError> {
    self.target.bind();
    self.device.set_capability(Capability::DepthTest, true);
    self.device.clear(ClearRequest::color_and_depth(CLEAR_COLOR));

    let textured = self.shaders.get(Program::Textured)?;
    textured.use_program();
    textured.set_mat4("view", frame.view);
    textured.set_mat4("projection", frame.projection);
    textured.set_int("texture1", 0);

    self.crate_.bind(0);
    for position in [Vec3::new(-1.0, 0.0, -1.0), Vec3::new(2.0, 0.0, 0.0)] {
      textured.set_mat4("model", model_matrix(position, Vec3::Y, 0.0, 1.0));
      self.cube.draw();
    }
    self.metal.bind(0);
    textured.set_mat4("model", glam::Mat4::IDENTITY);
    self.floor.draw();

    self.target.unbind();
    frame.restore_viewport(self.device.as_ref());
    self.device.set_capability(Capability::DepthTest, false);
    self.device.clear(ClearRequest {
      color: Some([1.0, 1.0, 1.0, 1.0]),
      ..ClearRequest::default()
    });

    let screen = self.shaders.get(Program::Screen)?;
    screen.use_program();
    screen.set_int("screenTexture", 0);
    screen.set_int("effect", self.effect as i32);
    if let Some(color) = self.target.color_texture(0) {
      color.bind(0);
    }
    self.quad.draw();

    self.device.set_capability(Capability::DepthTest, true);
    Ok(())
  }

  fn resize(&mut self, width: u32, height: u32) -> Result<(), SceneError> {
    if self.target.size() == (width, height) || width == 0 || height == 0 {
      return Ok(());
    }
    debug!("Recreating post-process target at {width}x{height}");
    self.target = color_target(&self.device, (width, height))?;
    Ok(())
  }

  /// F2 cycles the screen effect.
  fn handle_key(&mut self, key: KeyCode) -> bool {
    if key != KeyCode::F2 {
      return false;
    }
    self.effect = self.effect.next();
    info!("Post effect: {}", self.effect);
    true
  }

  fn status(&self) -> Option<String> {
    Some(format!("effect: {}", self.effect))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    render::{
      device::UniformValue,
      recording::{Call, RecordingDevice},
    },
    scenes::tests::{assets, frame},
  };

  fn scene() -> (Rc<RecordingDevice>, PostProcessScene) {
    let recording = Rc::new(RecordingDevice::new());
    let device: Rc<dyn Device> = recording.clone();
    let root = assets();
    let scene = PostProcessScene::new(&SceneContext {
      device:     &device,
      asset_root: &root,
      viewport:   (1280, 720),
    })
    .unwrap();
    (recording, scene)
  }

  #[test]
  fn effects_cycle_back_to_none() {
    let mut effect = PostEffect::None;
    for _ in 0..4 {
      effect = effect.next();
    }
    assert_eq!(effect, PostEffect::None);
  }

  #[test]
  fn screen_pass_reads_the_offscreen_target() {
    let (recording, mut scene) = scene();
    assert!(scene.handle_key(KeyCode::F2));
    assert!(scene.handle_key(KeyCode::F2));
    recording.clear_calls();

    scene.render(&frame()).unwrap();

    assert!(
      recording
        .uniform_writes()
        .contains(&("effect".to_string(), UniformValue::Int(PostEffect::Grayscale as i32)))
    );
    let calls = recording.calls();
    let unbind = calls.iter().position(|call| *call == Call::BindFramebuffer(None)).unwrap();
    let depth_off = calls
      .iter()
      .position(|call| *call == Call::SetCapability(Capability::DepthTest, false))
      .unwrap();
    assert!(unbind < depth_off);
    // Two crates, the floor and the screen quad.
    assert_eq!(recording.draw_calls(), 4);
  }

  #[test]
  fn resize_rebuilds_target_once_per_size() {
    let (recording, mut scene) = scene();

    scene.resize(1280, 720).unwrap();
    assert_eq!(recording.live_framebuffers(), 2);

    scene.resize(640, 480).unwrap();
    assert_eq!(scene.target_size(), (640, 480));
    // Framebuffer plus its depth-stencil renderbuffer, old pair released.
    assert_eq!(recording.live_framebuffers(), 2);

    scene.resize(0, 0).unwrap();
    assert_eq!(scene.target_size(), (640, 480));
  }
}
