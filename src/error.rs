use thiserror::Error;

use crate::scenes::SceneError;

/// Failures that stop the application.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("event loop error: {0}")]
  EventLoop(#[from] winit::error::EventLoopError),
  #[error("failed to create window: {0}")]
  Window(#[from] winit::error::OsError),
  #[error("window handle unavailable: {0}")]
  Handle(#[from] raw_window_handle::HandleError),
  #[error("OpenGL context error: {0}")]
  Context(#[from] glutin::error::Error),
  #[error("no OpenGL framebuffer configuration matches the request")]
  NoGlConfig,
  #[error(transparent)]
  Scene(#[from] SceneError),
}
