//! A planet inside a belt of rocks. Every rock is drawn by one instanced
//! call, with per-instance model matrices uploaded once at startup.

use std::rc::Rc;

use glam::{Mat4, Vec3};
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{FrameContext, Scene, SceneContext, SceneError, SceneKind, model_matrix};
use crate::render::{
  Device,
  InstancedGeometry,
  Model,
  ModelOptions,
  ShaderRegistry,
  ShaderSource,
  StaticGeometry,
  Texture,
  TextureKind,
  device::{Capability, ClearRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Program {
  Planet,
  Rock,
}

const SHADERS: &[(Program, ShaderSource)] = &[
  (Program::Planet, ShaderSource::new("textured.vert", "planet.frag")),
  (Program::Rock, ShaderSource::new("instanced.vert", "textured.frag")),
];

const PLANET_MODEL: &str = "models/planet/planet.obj";
const CLEAR_COLOR: [f32; 4] = [0.05, 0.05, 0.05, 1.0];

pub const ROCK_COUNT: usize = 10_000;
const BELT_SEED: u64 = 0x0b17;
const BELT_RADIUS: f32 = 30.0;
const BELT_OFFSET: f32 = 5.0;
/// Radians per second the belt turns about the planet's axis.
const BELT_SPEED: f32 = 0.05;

/// Model matrices for `count` rocks scattered around a ring in the XZ plane.
///
/// The same `seed` always yields the same belt.
pub fn belt_transforms(count: usize, seed: u64) -> Vec<Mat4> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..count)
    .map(|i| {
      let angle = i as f32 / count as f32 * std::f32::consts::TAU;
      let (sin, cos) = angle.sin_cos();
      let position = Vec3::new(
        sin * BELT_RADIUS + rng.gen_range(-BELT_OFFSET..BELT_OFFSET),
        // Thinner vertically than across.
        rng.gen_range(-BELT_OFFSET..BELT_OFFSET) * 0.4,
        cos * BELT_RADIUS + rng.gen_range(-BELT_OFFSET..BELT_OFFSET),
      );
      let scale = rng.gen_range(0.05..0.25);
      let spin = rng.gen_range(0.0..360.0f32).to_radians();
      model_matrix(position, Vec3::new(0.4, 0.6, 0.8), spin, scale)
    })
    .collect()
}

pub struct InstancingScene {
  device:  Rc<dyn Device>,
  shaders: ShaderRegistry<Program>,
  planet:  Model,
  rocks:   InstancedGeometry,
  rock:    Rc<Texture>,
  /// Belt rotation so far, in radians.
  spin:    f32,
}

impl InstancingScene {
  pub fn new(context: &SceneContext<'_>) -> Result<Self, SceneError> {
    let shaders = ShaderRegistry::from_manifest(context.device, &context.shader_dir(), SHADERS)?;
    let planet = Model::load_or_empty(context.device, &context.asset(PLANET_MODEL), ModelOptions::default());

    let transforms = belt_transforms(ROCK_COUNT, BELT_SEED);
    let rocks = StaticGeometry::cube(context.device)?.instanced(&transforms)?;
    debug!("Uploaded {} rock transforms", rocks.instance_count());

    Ok(Self {
      device: Rc::clone(context.device),
      shaders,
      planet,
      rocks,
      rock: context.texture_or_placeholder("textures/rock.png", TextureKind::Diffuse, [110, 100, 90, 255])?,
      spin: 0.0,
    })
  }
}

impl Scene for InstancingScene {
  fn kind(&self) -> SceneKind {
    SceneKind::Instancing
  }

  fn update(&mut self, frame: &FrameContext) {
    self.spin = (self.spin + frame.delta_time * BELT_SPEED) % std::f32::consts::TAU;
  }

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError> {
    self.device.set_capability(Capability::DepthTest, true);
    self.device.clear(ClearRequest::color_and_depth(CLEAR_COLOR));

    let planet = self.shaders.get(Program::Planet)?;
    planet.use_program();
    planet.set_mat4("view", frame.view);
    planet.set_mat4("projection", frame.projection);
    planet.set_mat4("model", model_matrix(Vec3::new(0.0, -3.0, 0.0), Vec3::Y, 0.0, 4.0));
    self.planet.draw(planet);

    let rocks = self.shaders.get(Program::Rock)?;
    rocks.use_program();
    rocks.set_mat4("view", frame.view);
    rocks.set_mat4("projection", frame.projection);
    rocks.set_mat4("belt", Mat4::from_rotation_y(self.spin));
    rocks.set_int("texture1", 0);
    self.rock.bind(0);
    self.rocks.draw();

    Ok(())
  }

  fn status(&self) -> Option<String> {
    Some(format!("{} rocks", self.rocks.instance_count()))
  }
}
