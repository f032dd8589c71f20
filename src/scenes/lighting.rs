//! Textured crates lit by a directional light, four point lights and a
//! camera-mounted flashlight.

use std::rc::Rc;

use glam::Vec3;
use winit::keyboard::KeyCode;

use super::{FrameContext, Scene, SceneContext, SceneError, SceneKind, model_matrix};
use crate::render::{
  Device,
  ShaderRegistry,
  ShaderSource,
  StaticGeometry,
  Texture,
  TextureKind,
  device::{Capability, ClearRequest},
  lights::{DirLight, PhongMaterial, PointLight, SpotLight},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
  Phong,
  Lamp,
}

const SHADERS: &[(Program, ShaderSource)] = &[
  (Program::Phong, ShaderSource::new("lighting.vert", "lighting.frag")),
  (Program::Lamp, ShaderSource::new("lighting.vert", "lamp.frag")),
];

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

const CUBE_POSITIONS: [Vec3; 10] = [
  Vec3::new(0.0, 0.0, 0.0),
  Vec3::new(2.0, 5.0, -15.0),
  Vec3::new(-1.5, -2.2, -2.5),
  Vec3::new(-3.8, -2.0, -12.3),
  Vec3::new(2.4, -0.4, -3.5),
  Vec3::new(-1.7, 3.0, -7.5),
  Vec3::new(1.3, -2.0, -2.5),
  Vec3::new(1.5, 2.0, -2.5),
  Vec3::new(1.5, 0.2, -1.5),
  Vec3::new(-1.3, 1.0, -1.5),
];

const POINT_LIGHT_POSITIONS: [Vec3; 4] = [
  Vec3::new(0.7, 0.2, 2.0),
  Vec3::new(2.3, -3.3, -4.0),
  Vec3::new(-4.0, 2.0, -12.0),
  Vec3::new(0.0, 0.0, -3.0),
];

pub struct LightingScene {
  device:       Rc<dyn Device>,
  shaders:      ShaderRegistry<Program>,
  cube:         StaticGeometry,
  diffuse:      Rc<Texture>,
  specular:     Rc<Texture>,
  dir_light:    DirLight,
  point_lights: Vec<PointLight>,
  material:     PhongMaterial,
  flashlight:   bool,
}

impl LightingScene {
  pub fn new(context: &SceneContext<'_>) -> Result<Self, SceneError> {
    let shaders = ShaderRegistry::from_manifest(context.device, &context.shader_dir(), SHADERS)?;
    let diffuse =
      context.texture_or_placeholder("textures/container2.png", TextureKind::Diffuse, [150, 110, 60, 255])?;
    let specular = context.texture_or_placeholder(
      "textures/container2_specular.png",
      TextureKind::Specular,
      [128, 128, 128, 255],
    )?;

    Ok(Self {
      device: Rc::clone(context.device),
      shaders,
      cube: StaticGeometry::cube(context.device)?,
      diffuse,
      specular,
      dir_light: DirLight::default(),
      point_lights: POINT_LIGHT_POSITIONS
        .iter()
        .map(|&position| PointLight::new(position, Vec3::ONE))
        .collect(),
      material: PhongMaterial::default(),
      flashlight: true,
    })
  }
}

impl Scene for LightingScene {
  fn kind(&self) -> SceneKind {
    SceneKind::Lighting
  }

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError> {
    self.device.set_capability(Capability::DepthTest, true);
    self.device.clear(ClearRequest::color_and_depth(CLEAR_COLOR));

    let phong = self.shaders.get(Program::Phong)?;
    phong.use_program();
    phong.set_mat4("view", frame.view);
    phong.set_mat4("projection", frame.projection);
    phong.set_vec3("viewPos", frame.camera_position);

    phong.set_int("material.diffuse", 0);
    phong.set_int("material.specular", 1);
    self.material.apply(phong, "material");
    self.diffuse.bind(0);
    self.specular.bind(1);

    phong.set_bool("useDirLight", true);
    self.dir_light.apply(phong, "dirLight");
    phong.set_int("pointLightCount", self.point_lights.len() as i32);
    for (i, light) in self.point_lights.iter().enumerate() {
      light.apply(phong, &format!("pointLights[{i}]"));
    }
    phong.set_bool("useSpotLight", self.flashlight);
    if self.flashlight {
      SpotLight::flashlight(frame.camera_position, frame.camera_front, 12.5, 15.0).apply(phong, "spotLight");
    }

    for (i, &position) in CUBE_POSITIONS.iter().enumerate() {
      let angle = (20.0 * i as f32).to_radians();
      phong.set_mat4("model", model_matrix(position, Vec3::new(1.0, 0.3, 0.5), angle, 1.0));
      self.cube.draw();
    }
    self.device.active_texture(0);

    let lamp = self.shaders.get(Program::Lamp)?;
    lamp.use_program();
    lamp.set_mat4("view", frame.view);
    lamp.set_mat4("projection", frame.projection);
    for light in &self.point_lights {
      lamp.set_vec3("lightColor", light.diffuse);
      lamp.set_mat4("model", model_matrix(light.position, Vec3::Y, 0.0, 0.2));
      self.cube.draw();
    }

    Ok(())
  }

  /// F toggles the flashlight.
  fn handle_key(&mut self, key: KeyCode) -> bool {
    if key != KeyCode::KeyF {
      return false;
    }
    self.flashlight = !self.flashlight;
    true
  }

  fn status(&self) -> Option<String> {
    Some(format!("flashlight {}", if self.flashlight { "on" } else { "off" }))
  }
}
