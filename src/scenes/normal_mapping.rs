//! A brick wall lit per fragment with normals read from a tangent-space
//! normal map.

use std::{path::PathBuf, rc::Rc};

use glam::{Mat4, Vec3};
use log::info;
use winit::keyboard::KeyCode;

use super::{FrameContext, Scene, SceneContext, SceneError, SceneKind, model_matrix};
use crate::render::{
  Device,
  Model,
  ModelOptions,
  ShaderRegistry,
  ShaderSource,
  StaticGeometry,
  TextureKind,
  device::{Capability, ClearRequest},
  import::{ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene, TextureSource},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
  NormalMap,
  Lamp,
}

const SHADERS: &[(Program, ShaderSource)] = &[
  (Program::NormalMap, ShaderSource::new("normal_map.vert", "normal_map.frag")),
  (Program::Lamp, ShaderSource::new("lighting.vert", "lamp.frag")),
];

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
const LIGHT_POSITION: Vec3 = Vec3::new(0.5, 1.0, 0.3);

/// Degrees per second the wall turns about (1, 0, 1).
const SPIN_RATE: f32 = -10.0;

/// Unit quad in the XY plane facing +Z, with the wall's two textures.
fn wall_scene() -> ImportedScene {
  ImportedScene {
    nodes:     vec![ImportedNode {
      meshes: vec![0],
      ..ImportedNode::default()
    }],
    roots:     vec![0],
    meshes:    vec![ImportedMesh {
      name:       "wall".to_string(),
      positions:  vec![[-1.0, 1.0, 0.0], [-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]],
      normals:    vec![[0.0, 0.0, 1.0]; 4],
      tex_coords: vec![[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
      indices:    vec![0, 1, 2, 0, 2, 3],
      material:   Some(0),
    }],
    materials: vec![ImportedMaterial {
      name:     "brickwall".to_string(),
      textures: vec![
        (TextureKind::Diffuse, TextureSource::File(PathBuf::from("textures/brickwall.jpg"))),
        (TextureKind::Normal, TextureSource::File(PathBuf::from("textures/brickwall_normal.jpg"))),
      ],
    }],
  }
}

pub struct NormalMappingScene {
  device:         Rc<dyn Device>,
  shaders:        ShaderRegistry<Program>,
  wall:           Model,
  lamp:           StaticGeometry,
  normal_mapping: bool,
}

impl NormalMappingScene {
  pub fn new(context: &SceneContext<'_>) -> Result<Self, SceneError> {
    let shaders = ShaderRegistry::from_manifest(context.device, &context.shader_dir(), SHADERS)?;
    let options = ModelOptions {
      calc_tangents: true,
      ..ModelOptions::default()
    };
    let wall = Model::from_scene(context.device, &wall_scene(), context.asset_root, options)?;

    Ok(Self {
      device: Rc::clone(context.device),
      shaders,
      wall,
      lamp: StaticGeometry::cube(context.device)?,
      normal_mapping: true,
    })
  }
}

impl Scene for NormalMappingScene {
  fn kind(&self) -> SceneKind {
    SceneKind::NormalMapping
  }

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError> {
    self.device.set_capability(Capability::DepthTest, true);
    self.device.clear(ClearRequest::color_and_depth(CLEAR_COLOR));

    let shader = self.shaders.get(Program::NormalMap)?;
    shader.use_program();
    shader.set_mat4("view", frame.view);
    shader.set_mat4("projection", frame.projection);
    shader.set_mat4(
      "model",
      model_matrix(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), (frame.time * SPIN_RATE).to_radians(), 1.0),
    );
    shader.set_vec3("viewPos", frame.camera_position);
    shader.set_vec3("lightPos", LIGHT_POSITION);
    shader.set_bool("normalMapping", self.normal_mapping);
    self.wall.draw(shader);

    let lamp = self.shaders.get(Program::Lamp)?;
    lamp.use_program();
    lamp.set_mat4("view", frame.view);
    lamp.set_mat4("projection", frame.projection);
    lamp.set_mat4("model", Mat4::from_translation(LIGHT_POSITION) * Mat4::from_scale(Vec3::splat(0.1)));
    lamp.set_vec3("lightColor", Vec3::ONE);
    self.lamp.draw();

    Ok(())
  }

  /// N switches between the normal map and the flat surface normal.
  fn handle_key(&mut self, key: KeyCode) -> bool {
    if key != KeyCode::KeyN {
      return false;
    }
    self.normal_mapping = !self.normal_mapping;
    info!("Normal mapping {}", if self.normal_mapping { "on" } else { "off" });
    true
  }

  fn status(&self) -> Option<String> {
    Some(format!("normal map {}", if self.normal_mapping { "on" } else { "off" }))
  }
}
