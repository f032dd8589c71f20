//! Directional shadow mapping: a depth pass from the light into a depth
//! texture, then a lit pass that samples it.

use std::rc::Rc;

use glam::{Mat4, Vec3};
use winit::keyboard::KeyCode;

use super::{FrameContext, Scene, SceneContext, SceneError, SceneKind, model_matrix};
use crate::render::{
  Device,
  Framebuffer,
  Shader,
  ShaderRegistry,
  ShaderSource,
  StaticGeometry,
  TargetAttachment,
  Texture,
  TextureKind,
  device::{Capability, ClearRequest, Face},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
  Depth,
  Lit,
}

const SHADERS: &[(Program, ShaderSource)] = &[
  (Program::Depth, ShaderSource::new("shadow_depth.vert", "shadow_depth.frag")),
  (Program::Lit, ShaderSource::new("shadow_lit.vert", "shadow_lit.frag")),
];

pub const SHADOW_MAP_SIZE: u32 = 2048;

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
const LIGHT_NEAR: f32 = 1.0;
const LIGHT_FAR: f32 = 7.5;

const CUBES: [(Vec3, f32); 3] = [
  (Vec3::new(0.0, 1.5, 0.0), 0.5),
  (Vec3::new(2.0, 0.0, 1.0), 0.5),
  (Vec3::new(-1.0, 0.0, 2.0), 0.25),
];

pub struct ShadowMapScene {
  device:       Rc<dyn Device>,
  shaders:      ShaderRegistry<Program>,
  depth_map:    Framebuffer,
  cube:         StaticGeometry,
  floor:        StaticGeometry,
  wood:         Rc<Texture>,
  light_pos:    Vec3,
  orbit_light:  bool,
}

impl ShadowMapScene {
  pub fn new(context: &SceneContext<'_>) -> Result<Self, SceneError> {
    let shaders = ShaderRegistry::from_manifest(context.device, &context.shader_dir(), SHADERS)?;
    let depth_map = Framebuffer::new(
      context.device,
      SHADOW_MAP_SIZE,
      SHADOW_MAP_SIZE,
      &[TargetAttachment::DepthTexture],
    )?;
    let wood = context.texture_or_placeholder("textures/wood.png", TextureKind::Diffuse, [160, 120, 80, 255])?;

    Ok(Self {
      device: Rc::clone(context.device),
      shaders,
      depth_map,
      cube: StaticGeometry::cube(context.device)?,
      floor: StaticGeometry::plane(context.device, 25.0, -0.5, 25.0)?,
      wood,
      light_pos: Vec3::new(-2.0, 4.0, -1.0),
      orbit_light: false,
    })
  }

  /// Projection and view of the light, as one matrix.
  pub fn light_space_matrix(&self) -> Mat4 {
    let projection = Mat4::orthographic_rh_gl(-10.0, 10.0, -10.0, 10.0, LIGHT_NEAR, LIGHT_FAR);
    projection * Mat4::look_at_rh(self.light_pos, Vec3::ZERO, Vec3::Y)
  }

  fn draw_scene(&self, shader: &Shader) {
    shader.set_mat4("model", Mat4::IDENTITY);
    self.floor.draw();
    for (i, &(position, scale)) in CUBES.iter().enumerate() {
      let angle = if i == 2 { 60f32.to_radians() } else { 0.0 };
      shader.set_mat4("model", model_matrix(position, Vec3::new(1.0, 0.0, 1.0), angle, scale));
      self.cube.draw();
    }
  }
}

impl Scene for ShadowMapScene {
  fn kind(&self) -> SceneKind {
    SceneKind::ShadowMap
  }

  fn update(&mut self, frame: &FrameContext) {
    if self.orbit_light {
      let (sin, cos) = (frame.time * 0.5).sin_cos();
      self.light_pos = Vec3::new(cos * 3.0, 4.0, sin * 3.0);
    }
  }

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError> {
    let light_space = self.light_space_matrix();
    self.device.set_capability(Capability::DepthTest, true);

    // Depth pass. Culling front faces keeps closed objects off their own shadow.
    let depth = self.shaders.get(Program::Depth)?;
    depth.use_program();
    depth.set_mat4("lightSpaceMatrix", light_space);
    self.depth_map.bind();
    self.device.clear(ClearRequest::depth_only());
    self.device.set_capability(Capability::CullFace, true);
    self.device.cull_face(Face::Front);
    self.draw_scene(depth);
    self.device.cull_face(Face::Back);
    self.device.set_capability(Capability::CullFace, false);
    self.depth_map.unbind();

    frame.restore_viewport(self.device.as_ref());
    self.device.clear(ClearRequest::color_and_depth(CLEAR_COLOR));

    let lit = self.shaders.get(Program::Lit)?;
    lit.use_program();
    lit.set_mat4("projection", frame.projection);
    lit.set_mat4("view", frame.view);
    lit.set_vec3("viewPos", frame.camera_position);
    lit.set_vec3("lightPos", self.light_pos);
    lit.set_mat4("lightSpaceMatrix", light_space);
    lit.set_int("diffuseTexture", 0);
    lit.set_int("shadowMap", 1);
    self.wood.bind(0);
    if let Some(shadow_map) = self.depth_map.depth_texture() {
      shadow_map.bind(1);
    }
    self.draw_scene(lit);
    self.device.active_texture(0);

    Ok(())
  }

  /// L toggles the orbiting light.
  fn handle_key(&mut self, key: KeyCode) -> bool {
    if key != KeyCode::KeyL {
      return false;
    }
    self.orbit_light = !self.orbit_light;
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    render::recording::{Call, RecordingDevice},
    scenes::tests::{assets, frame},
  };

  #[test]
  fn depth_pass_precedes_lit_pass() {
    let recording = Rc::new(RecordingDevice::new());
    let device: Rc<dyn Device> = recording.clone();
    let root = assets();
    let mut scene = ShadowMapScene::new(&SceneContext {
      device:     &device,
      asset_root: &root,
      viewport:   (1280, 720),
    })
    .unwrap();
    recording.clear_calls();

    scene.render(&frame()).unwrap();

    let calls = recording.calls();
    let position = |wanted: &Call| calls.iter().position(|call| call == wanted).unwrap();
    let shadow_viewport = position(&Call::Viewport(0, 0, SHADOW_MAP_SIZE, SHADOW_MAP_SIZE));
    let window_viewport = position(&Call::Viewport(0, 0, 1280, 720));
    assert!(shadow_viewport < window_viewport);
    assert!(calls.contains(&Call::CullFace(Face::Front)));
    // Floor plus cubes, once per pass.
    assert_eq!(recording.draw_calls(), 2 * (1 + CUBES.len()));
  }

  #[test]
  fn light_space_maps_origin_inside_the_depth_range() {
    let recording = Rc::new(RecordingDevice::new());
    let device: Rc<dyn Device> = recording.clone();
    let root = assets();
    let scene = ShadowMapScene::new(&SceneContext {
      device:     &device,
      asset_root: &root,
      viewport:   (1280, 720),
    })
    .unwrap();

    let clip = scene.light_space_matrix() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);

    assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
    assert!(clip.z > -1.0 && clip.z < 1.0);
  }
}
