//! Rendering techniques driven by the [`App`](crate::App) harness.

mod exploding;
mod instancing;
mod lighting;
mod model_viewer;
mod normal_mapping;
mod outline;
mod post_process;
mod shadow_map;

use std::{
  fmt,
  path::{Path, PathBuf},
  rc::Rc,
};

use glam::{Mat4, Vec3};
use log::warn;
use thiserror::Error;
use winit::keyboard::KeyCode;

pub use exploding::ExplodingScene;
pub use instancing::{InstancingScene, ROCK_COUNT, belt_transforms};
pub use lighting::LightingScene;
pub use model_viewer::ModelViewerScene;
pub use normal_mapping::NormalMappingScene;
pub use outline::OutlineScene;
pub use post_process::{PostEffect, PostProcessScene};
pub use shadow_map::ShadowMapScene;

use crate::render::{
  ChannelLayout,
  Device,
  FramebufferError,
  GeometryError,
  MeshError,
  ModelError,
  RegistryError,
  Texture,
  TextureError,
  TextureKind,
  device::SamplerSettings,
};

/// Model shown by the model viewer and the explosion demo, relative to the asset root.
pub const DEMO_MODEL: &str = "models/nanosuit/nanosuit.obj";

#[derive(Debug, Error)]
pub enum SceneError {
  #[error(transparent)]
  Registry(#[from] RegistryError),
  #[error(transparent)]
  Texture(#[from] TextureError),
  #[error(transparent)]
  Model(#[from] ModelError),
  #[error(transparent)]
  Mesh(#[from] MeshError),
  #[error(transparent)]
  Geometry(#[from] GeometryError),
  #[error(transparent)]
  Framebuffer(#[from] FramebufferError),
}

/// Per-frame camera and timing state handed to the active scene.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
  pub view:            Mat4,
  pub projection:      Mat4,
  pub camera_position: Vec3,
  pub camera_front:    Vec3,
  /// Seconds since the application started.
  pub time:            f32,
  pub delta_time:      f32,
  /// Window framebuffer size in pixels.
  pub viewport:        (u32, u32),
}

impl FrameContext {
  /// Restores the window framebuffer's viewport after drawing off-screen.
  pub fn restore_viewport(&self, device: &dyn Device) {
    device.viewport(0, 0, self.viewport.0, self.viewport.1);
  }
}

/// What a scene needs to build its GPU resources.
pub struct SceneContext<'a> {
  pub device:     &'a Rc<dyn Device>,
  pub asset_root: &'a Path,
  pub viewport:   (u32, u32),
}

impl SceneContext<'_> {
  pub fn shader_dir(&self) -> PathBuf {
    self.asset_root.join("shaders")
  }

  pub fn asset(&self, relative: &str) -> PathBuf {
    self.asset_root.join(relative)
  }

  /// Loads a texture from the asset root, substituting a flat colour if it fails.
  pub fn texture_or_placeholder(
    &self,
    relative: &str,
    kind: TextureKind,
    fallback: [u8; 4],
  ) -> Result<Rc<Texture>, TextureError> {
    let path = self.asset(relative);
    let texture = match Texture::from_file(
      self.device,
      &path,
      kind,
      ChannelLayout::Auto,
      SamplerSettings::repeat(),
    ) {
      Ok(texture) => texture,
      Err(err) => {
        warn!("{err}; using a placeholder");
        Texture::placeholder(self.device, kind, fallback, &path)?
      }
    };
    Ok(Rc::new(texture))
  }
}

/// One rendering technique. Owns every GPU object it uses; dropping it frees them.
pub trait Scene {
  fn kind(&self) -> SceneKind;

  fn update(&mut self, _frame: &FrameContext) {}

  fn render(&mut self, frame: &FrameContext) -> Result<(), SceneError>;

  /// Called after the window framebuffer changed size.
  fn resize(&mut self, _width: u32, _height: u32) -> Result<(), SceneError> {
    Ok(())
  }

  /// Scene-specific key press. Returns whether the key was used.
  fn handle_key(&mut self, _key: KeyCode) -> bool {
    false
  }

  /// Extra text for the window title.
  fn status(&self) -> Option<String> {
    None
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
  Lighting,
  ModelViewer,
  ShadowMap,
  PostProcess,
  Exploding,
  Outline,
  NormalMapping,
  Instancing,
}

impl SceneKind {
  pub const ALL: [SceneKind; 8] = [
    SceneKind::Lighting,
    SceneKind::ModelViewer,
    SceneKind::ShadowMap,
    SceneKind::PostProcess,
    SceneKind::Exploding,
    SceneKind::Outline,
    SceneKind::NormalMapping,
    SceneKind::Instancing,
  ];

  /// Number keys 1 to 8 select scenes in [`SceneKind::ALL`] order.
  pub fn from_key(key: KeyCode) -> Option<Self> {
    let index = match key {
      KeyCode::Digit1 | KeyCode::Numpad1 => 0,
      KeyCode::Digit2 | KeyCode::Numpad2 => 1,
      KeyCode::Digit3 | KeyCode::Numpad3 => 2,
      KeyCode::Digit4 | KeyCode::Numpad4 => 3,
      KeyCode::Digit5 | KeyCode::Numpad5 => 4,
      KeyCode::Digit6 | KeyCode::Numpad6 => 5,
      KeyCode::Digit7 | KeyCode::Numpad7 => 6,
      KeyCode::Digit8 | KeyCode::Numpad8 => 7,
      _ => return None,
    };
    Some(Self::ALL[index])
  }

  pub fn title(self) -> &'static str {
    match self {
      SceneKind::Lighting => "Lighting",
      SceneKind::ModelViewer => "Model viewer",
      SceneKind::ShadowMap => "Shadow mapping",
      SceneKind::PostProcess => "Post-processing",
      SceneKind::Exploding => "Exploding model",
      SceneKind::Outline => "Stencil outlining",
      SceneKind::NormalMapping => "Normal mapping",
      SceneKind::Instancing => "Asteroid instancing",
    }
  }

  pub fn build(self, context: &SceneContext<'_>) -> Result<Box<dyn Scene>, SceneError> {
    Ok(match self {
      SceneKind::Lighting => Box::new(LightingScene::new(context)?),
      SceneKind::ModelViewer => Box::new(ModelViewerScene::new(context)?),
      SceneKind::ShadowMap => Box::new(ShadowMapScene::new(context)?),
      SceneKind::PostProcess => Box::new(PostProcessScene::new(context)?),
      SceneKind::Exploding => Box::new(ExplodingScene::new(context)?),
      SceneKind::Outline => Box::new(OutlineScene::new(context)?),
      SceneKind::NormalMapping => Box::new(NormalMappingScene::new(context)?),
      SceneKind::Instancing => Box::new(InstancingScene::new(context)?),
    })
  }
}

impl fmt::Display for SceneKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.title())
  }
}

/// Translation, then rotation about `axis`, then uniform scale.
pub(crate) fn model_matrix(position: Vec3, axis: Vec3, angle: f32, scale: f32) -> Mat4 {
  Mat4::from_translation(position)
    * Mat4::from_axis_angle(axis.normalize_or_zero(), angle)
    * Mat4::from_scale(Vec3::splat(scale))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::render::recording::RecordingDevice;

  pub(crate) fn assets() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")
  }

  pub(crate) fn frame() -> FrameContext {
    FrameContext {
      view:            Mat4::look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y),
      projection:      Mat4::perspective_rh_gl(45f32.to_radians(), 16.0 / 9.0, 0.1, 100.0),
      camera_position: Vec3::new(0.0, 0.0, 3.0),
      camera_front:    Vec3::NEG_Z,
      time:            1.0,
      delta_time:      1.0 / 60.0,
      viewport:        (1280, 720),
    }
  }

  fn build(recording: RecordingDevice, kind: SceneKind) -> (Rc<RecordingDevice>, Result<Box<dyn Scene>, SceneError>) {
    let recording = Rc::new(recording);
    let device: Rc<dyn Device> = recording.clone();
    let root = assets();
    let scene = kind.build(&SceneContext {
      device:     &device,
      asset_root: &root,
      viewport:   (1280, 720),
    });
    (recording, scene)
  }

  #[test]
  fn number_keys_map_to_scenes() {
    assert_eq!(SceneKind::from_key(KeyCode::Digit1), Some(SceneKind::Lighting));
    assert_eq!(SceneKind::from_key(KeyCode::Numpad4), Some(SceneKind::PostProcess));
    assert_eq!(SceneKind::from_key(KeyCode::Digit5), Some(SceneKind::Exploding));
    assert_eq!(SceneKind::from_key(KeyCode::Digit6), Some(SceneKind::Outline));
    assert_eq!(SceneKind::from_key(KeyCode::Numpad8), Some(SceneKind::Instancing));
    assert_eq!(SceneKind::from_key(KeyCode::Digit9), None);
  }

  #[test]
  fn every_scene_builds_renders_and_releases() {
    for kind in SceneKind::ALL {
      let (recording, scene) = build(RecordingDevice::new(), kind);
      let mut scene = scene.unwrap_or_else(|err| panic!("{kind} failed to build: {err}"));
      assert_eq!(scene.kind(), kind);

      scene.update(&frame());
      scene.render(&frame()).unwrap();
      drop(scene);

      assert_eq!(recording.live_programs(), 0, "{kind} leaked programs");
      assert_eq!(recording.live_textures(), 0, "{kind} leaked textures");
      assert_eq!(recording.live_vertex_arrays(), 0, "{kind} leaked vertex arrays");
      assert_eq!(recording.live_framebuffers(), 0, "{kind} leaked framebuffers");
      assert_eq!(recording.live_buffers(), 0, "{kind} leaked buffers");
    }
  }

  #[test]
  fn incomplete_framebuffer_fails_scene_build() {
    let (recording, scene) = build(RecordingDevice::new().with_incomplete_framebuffers(0x8cd6), SceneKind::ShadowMap);

    assert!(matches!(
      scene.err(),
      Some(SceneError::Framebuffer(FramebufferError::Incomplete { status: 0x8cd6 }))
    ));
    assert_eq!(recording.live_programs(), 0);
  }

  #[test]
  fn missing_shader_fails_scene_build() {
    let recording = Rc::new(RecordingDevice::new());
    let device: Rc<dyn Device> = recording.clone();
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("no-such-assets");

    let scene = SceneKind::Lighting.build(&SceneContext {
      device:     &device,
      asset_root: &root,
      viewport:   (640, 480),
    });

    assert!(matches!(scene.err(), Some(SceneError::Registry(RegistryError::Shader { .. }))));
  }
}
