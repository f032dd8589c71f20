use std::path::PathBuf;

use log::info;

use crate::scenes::SceneKind;

/// Environment variable that overrides [`AppConfig::asset_root`].
pub const ASSET_ROOT_VAR: &str = "LEARNGL_ASSET_ROOT";

/// Window and startup settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub title:         String,
  pub width:         u32,
  pub height:        u32,
  pub vsync:         bool,
  /// Samples per pixel of the window surface. 0 disables multisampling.
  pub msaa_samples:  u8,
  /// Directory holding `shaders/`, `models/` and `textures/`.
  pub asset_root:    PathBuf,
  pub initial_scene: SceneKind,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      title:         "LearnOpenGL".to_string(),
      width:         1280,
      height:        720,
      vsync:         true,
      msaa_samples:  4,
      asset_root:    PathBuf::from("assets"),
      initial_scene: SceneKind::Lighting,
    }
  }
}

impl AppConfig {
  /// Defaults with the environment overrides applied.
  pub fn from_env() -> Self {
    Self::default().with_asset_root_override(std::env::var_os(ASSET_ROOT_VAR).map(PathBuf::from))
  }

  fn with_asset_root_override(mut self, root: Option<PathBuf>) -> Self {
    if let Some(root) = root.filter(|r| !r.as_os_str().is_empty()) {
      info!("Using asset root {} from {ASSET_ROOT_VAR}", root.display());
      self.asset_root = root;
    }
    self
  }

  pub fn shader_dir(&self) -> PathBuf {
    self.asset_root.join("shaders")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let config = AppConfig::default();

    assert_eq!((config.width, config.height), (1280, 720));
    assert!(config.vsync);
    assert_eq!(config.msaa_samples, 4);
    assert_eq!(config.shader_dir(), PathBuf::from("assets/shaders"));
    assert_eq!(config.initial_scene, SceneKind::Lighting);
  }

  #[test]
  fn asset_root_override() {
    let config = AppConfig::default().with_asset_root_override(Some(PathBuf::from("/opt/demo")));
    assert_eq!(config.asset_root, PathBuf::from("/opt/demo"));

    let config = AppConfig::default().with_asset_root_override(Some(PathBuf::new()));
    assert_eq!(config.asset_root, PathBuf::from("assets"));
  }
}
