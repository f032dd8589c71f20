use std::{num::NonZeroU32, rc::Rc};

use glutin::{
  config::{Config, ConfigTemplateBuilder},
  context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
  display::{Display, DisplayApiPreference},
  prelude::*,
  surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};
use log::{debug, info, warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use winit::{
  dpi::{LogicalSize, PhysicalSize},
  event_loop::ActiveEventLoop,
  window::Window,
};

use crate::{AppConfig, error::AppError, render::GlDevice};

/// A window with a current OpenGL 3.3 core context.
///
/// Fields drop in declaration order: the GL function table and context go
/// before the surface, and the surface before the window it draws into.
pub struct GlWindow {
  pub device:  Rc<GlDevice>,
  pub context: PossiblyCurrentContext,
  pub surface: Surface<WindowSurface>,
  pub window:  Window,
}

impl GlWindow {
  pub fn resize(&self, size: PhysicalSize<u32>) {
    self
      .surface
      .resize(&self.context, non_zero(size.width), non_zero(size.height));
  }

  pub fn swap_buffers(&self) -> Result<(), AppError> {
    Ok(self.surface.swap_buffers(&self.context)?)
  }
}

/// Creates the window, picks a framebuffer config and makes a 3.3 core context current on it.
pub fn create_gl_window(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<GlWindow, AppError> {
  let attributes = Window::default_attributes()
    .with_decorations(true)
    .with_title(config.title.clone())
    .with_inner_size(LogicalSize::new(config.width, config.height));
  let window = event_loop.create_window(attributes)?;

  let display_handle = window.display_handle()?.as_raw();
  let window_handle = window.window_handle()?.as_raw();

  #[cfg(target_os = "windows")]
  let preference = {
    debug!("Using WGL for OpenGL context.");
    DisplayApiPreference::Wgl(Some(window_handle))
  };
  #[cfg(target_os = "macos")]
  let preference = {
    debug!("Using CGL for OpenGL context.");
    DisplayApiPreference::Cgl
  };
  #[cfg(all(unix, not(target_os = "macos")))]
  let preference = {
    debug!("Using EGL for OpenGL context.");
    DisplayApiPreference::Egl
  };

  let display = unsafe { Display::new(display_handle, preference)? };

  let gl_config = match find_config(&display, window_handle, config.msaa_samples)? {
    Some(found) => found,
    None if config.msaa_samples > 0 => {
      warn!(
        "No config with {}x MSAA, falling back to no multisampling",
        config.msaa_samples
      );
      find_config(&display, window_handle, 0)?.ok_or(AppError::NoGlConfig)?
    }
    None => return Err(AppError::NoGlConfig),
  };
  info!(
    "GL framebuffer config: {} samples, depth {}, stencil {}",
    gl_config.num_samples(),
    gl_config.depth_size(),
    gl_config.stencil_size()
  );

  let size = window.inner_size();
  let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
    window_handle,
    non_zero(size.width),
    non_zero(size.height),
  );
  let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes)? };

  let context_attributes = ContextAttributesBuilder::new()
    .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
    .with_profile(GlProfile::Core)
    .build(Some(window_handle));
  let context =
    unsafe { display.create_context(&gl_config, &context_attributes)? }.make_current(&surface)?;

  let interval = if config.vsync {
    SwapInterval::Wait(NonZeroU32::MIN)
  } else {
    SwapInterval::DontWait
  };
  match surface.set_swap_interval(&context, interval) {
    Ok(()) => debug!("VSync {}", if config.vsync { "on" } else { "off" }),
    Err(err) => warn!("Failed to set swap interval (VSync): {err}"),
  }

  let gl = unsafe { glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name)) };

  Ok(GlWindow {
    device: Rc::new(GlDevice::new(gl)),
    context,
    surface,
    window,
  })
}

/// The matching config with the most samples, at least `samples` when non-zero.
fn find_config(
  display: &Display,
  window_handle: RawWindowHandle,
  samples: u8,
) -> Result<Option<Config>, AppError> {
  let mut template = ConfigTemplateBuilder::new()
    .with_depth_size(24)
    .with_stencil_size(8)
    .with_transparency(false)
    .compatible_with_native_window(window_handle);
  if samples > 0 {
    template = template.with_multisampling(samples);
  }

  let configs = unsafe { display.find_configs(template.build())? };
  Ok(configs.reduce(|best, candidate| {
    if candidate.num_samples() > best.num_samples() {
      candidate
    } else {
      best
    }
  }))
}

fn non_zero(value: u32) -> NonZeroU32 {
  NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}
