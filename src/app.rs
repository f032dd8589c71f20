//! Window, input and frame loop.
//!
//! [`App`] implements winit's [`ApplicationHandler`]:
//! * `resumed` creates the window and GL context, then builds the first scene
//! * `window_event` handles resize, keyboard, mouse buttons and scroll
//! * `device_event` feeds raw mouse motion to the camera while the cursor is captured
//! * `about_to_wait` requests the next frame and advances gamepad state
//!
//! # Frame Loop
//! Each redraw:
//! 1. Measure and clamp the frame time
//! 2. Apply keyboard, gamepad and mouse input to the camera
//! 3. Let the active scene update and render
//! 4. Swap buffers and refresh the FPS shown in the title

use std::{
  path::Path,
  rc::Rc,
  time::{Duration, Instant},
};

use gilrs::Gilrs;
use log::{debug, error, info, warn};
use winit::{
  application::ApplicationHandler,
  dpi::PhysicalSize,
  event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
  event_loop::ActiveEventLoop,
  keyboard::{KeyCode, PhysicalKey},
  window::{CursorGrabMode, WindowId},
};

use crate::{
  AppConfig,
  Camera,
  core::init::{GlWindow, create_gl_window},
  error::AppError,
  input::InputState,
  render::{
    Device,
    device::{Capability, ClearRequest},
  },
  scenes::{FrameContext, Scene, SceneContext, SceneKind},
};

/// Longest frame time fed to the simulation, in seconds.
const MAX_FRAME_TIME: f64 = 0.1;
/// Field of view change per scroll line, in degrees.
const ZOOM_PER_LINE: f32 = 2.0;
const PIXELS_PER_LINE: f64 = 50.0;

/// Counts frames and reports the rate once per interval.
#[derive(Debug)]
struct FpsCounter {
  interval:     Duration,
  window_start: Instant,
  frames:       u32,
}

impl FpsCounter {
  fn new(now: Instant) -> Self {
    Self {
      interval:     Duration::from_secs(1),
      window_start: now,
      frames:       0,
    }
  }

  /// Records one frame. Returns the average rate when an interval has elapsed.
  fn tick(&mut self, now: Instant) -> Option<f64> {
    self.frames += 1;
    let elapsed = now.duration_since(self.window_start);
    if elapsed < self.interval {
      return None;
    }
    let fps = self.frames as f64 / elapsed.as_secs_f64();
    self.frames = 0;
    self.window_start = now;
    Some(fps)
  }
}

/// The scene is declared first so its GPU objects are released while the
/// context is still alive.
struct RenderState {
  scene: Box<dyn Scene>,
  gl:    GlWindow,
}

impl RenderState {
  fn device(&self) -> Rc<dyn Device> {
    self.gl.device.clone()
  }
}

/// Application state: configuration, camera, input and, once resumed, the
/// window with its active scene.
///
/// # Example Usage
/// ```no_run
/// use learngl_app::{App, AppConfig};
/// use winit::event_loop::EventLoop;
///
/// let event_loop = EventLoop::new()?;
/// let mut app = App::new(AppConfig::from_env());
/// event_loop.run_app(&mut app)?;
/// app.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct App {
  config: AppConfig,
  rcx:    Option<RenderState>,

  // Timing
  start_time:      Instant,
  last_frame_time: Instant,
  fps:             FpsCounter,
  last_fps:        f64,

  camera: Camera,
  input:  InputState,
  gilrs:  Option<Gilrs>,

  wireframe:       bool,
  cursor_captured: bool,

  /// Set when startup failed; returned by [`App::finish`].
  fatal: Option<AppError>,
}

impl App {
  pub fn new(config: AppConfig) -> Self {
    let gilrs = match Gilrs::new() {
      Ok(gilrs) => {
        for (_id, gamepad) in gilrs.gamepads() {
          info!("Gamepad connected: {}", gamepad.name());
        }
        Some(gilrs)
      }
      Err(err) => {
        warn!("Gamepad support unavailable: {err}");
        None
      }
    };

    let now = Instant::now();
    Self {
      config,
      rcx: None,
      start_time: now,
      last_frame_time: now,
      fps: FpsCounter::new(now),
      last_fps: 0.0,
      camera: Camera::new(),
      input: InputState::default(),
      gilrs,
      wireframe: false,
      cursor_captured: false,
      fatal: None,
    }
  }

  /// The error that stopped the event loop, if any.
  pub fn finish(self) -> Result<(), AppError> {
    match self.fatal {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<RenderState, AppError> {
    let gl = create_gl_window(event_loop, &self.config)?;
    let device: Rc<dyn Device> = gl.device.clone();
    device.set_capability(Capability::DepthTest, true);
    if self.config.msaa_samples > 0 {
      device.set_capability(Capability::Multisample, true);
    }

    let size = gl.window.inner_size();
    let scene = build_scene(
      self.config.initial_scene,
      &device,
      &self.config.asset_root,
      (size.width, size.height),
    )?;
    info!("Started with scene: {}", scene.kind());
    Ok(RenderState { scene, gl })
  }

  /// Replaces the active scene. On failure the current scene keeps running.
  fn switch_scene(&mut self, kind: SceneKind) {
    let Some(rcx) = self.rcx.as_mut() else {
      return;
    };
    if rcx.scene.kind() == kind {
      return;
    }

    let size = rcx.gl.window.inner_size();
    match build_scene(kind, &rcx.device(), &self.config.asset_root, (size.width, size.height)) {
      Ok(scene) => {
        info!("Switched to scene: {kind}");
        rcx.scene = scene;
        self.update_title();
      }
      Err(err) => error!("Could not build scene {kind}, keeping {}: {err}", rcx.scene.kind()),
    }
  }

  fn capture_cursor(&mut self) {
    let Some(rcx) = self.rcx.as_ref() else {
      return;
    };
    let window = &rcx.gl.window;
    if let Err(err) = window
      .set_cursor_grab(CursorGrabMode::Locked)
      .or_else(|_e| window.set_cursor_grab(CursorGrabMode::Confined))
    {
      warn!("Failed to grab cursor: {err}");
      return;
    }
    window.set_cursor_visible(false);
    self.cursor_captured = true;
  }

  fn release_cursor(&mut self) {
    self.cursor_captured = false;
    self.input.release_keys();
    if let Some(rcx) = self.rcx.as_ref() {
      if let Err(err) = rcx.gl.window.set_cursor_grab(CursorGrabMode::None) {
        warn!("Failed to release cursor: {err}");
      }
      rcx.gl.window.set_cursor_visible(true);
    }
  }

  fn handle_key(&mut self, key: KeyCode, state: ElementState) {
    let pressed = state == ElementState::Pressed;
    if self.cursor_captured && self.input.set_key(key, pressed) {
      return;
    }
    if !pressed {
      return;
    }

    match key {
      KeyCode::Escape => self.release_cursor(),
      KeyCode::F1 => {
        self.wireframe = !self.wireframe;
        if let Some(rcx) = self.rcx.as_ref() {
          rcx.gl.device.polygon_mode(self.wireframe);
        }
        debug!("Wireframe {}", if self.wireframe { "on" } else { "off" });
      }
      _ => {
        if let Some(kind) = SceneKind::from_key(key) {
          self.switch_scene(kind);
          return;
        }
        let handled = self.rcx.as_mut().is_some_and(|rcx| rcx.scene.handle_key(key));
        if handled {
          self.update_title();
        }
      }
    }
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    let Some(rcx) = self.rcx.as_mut() else {
      return;
    };
    if size.width == 0 || size.height == 0 {
      return;
    }
    rcx.gl.resize(size);
    if let Err(err) = rcx.scene.resize(size.width, size.height) {
      error!("Scene {} failed to resize: {err}", rcx.scene.kind());
    }
  }

  fn update_camera(&mut self, delta_time: f64) {
    if let Some(gilrs) = &mut self.gilrs {
      self.input.poll_gamepad(gilrs);
    }

    let movement = self.input.movement(self.camera.yaw);
    self.camera.update_movement(movement, delta_time);

    let (look_x, look_y) = self.input.look();
    self.camera.update_gamepad_rotation(look_x, look_y, delta_time);
  }

  fn redraw(&mut self) {
    let now = Instant::now();
    let frame_time = now.duration_since(self.last_frame_time).as_secs_f64();
    self.last_frame_time = now;
    let delta_time = frame_time.min(MAX_FRAME_TIME);
    self.update_camera(delta_time);

    let Some(rcx) = self.rcx.as_mut() else {
      return;
    };
    let size = rcx.gl.window.inner_size();
    if size.width == 0 || size.height == 0 {
      return;
    }

    let frame = FrameContext {
      view:            self.camera.view_matrix(),
      projection:      self.camera.projection_matrix(size.width as f32 / size.height as f32),
      camera_position: self.camera.position.as_vec3(),
      camera_front:    self.camera.front.as_vec3(),
      time:            now.duration_since(self.start_time).as_secs_f32(),
      delta_time:      delta_time as f32,
      viewport:        (size.width, size.height),
    };

    let device = rcx.device();
    device.viewport(0, 0, size.width, size.height);
    device.clear(ClearRequest::color_and_depth([0.0, 0.0, 0.0, 1.0]));

    rcx.scene.update(&frame);
    if let Err(err) = rcx.scene.render(&frame) {
      error!("Scene {} failed to render: {err}", rcx.scene.kind());
    }
    if let Err(err) = rcx.gl.swap_buffers() {
      error!("Failed to present frame: {err}");
    }

    if let Some(fps) = self.fps.tick(now) {
      self.last_fps = fps;
      self.update_title();
    }
  }

  fn update_title(&self) {
    let Some(rcx) = self.rcx.as_ref() else {
      return;
    };
    let mut title = format!("{} | {}", self.config.title, rcx.scene.kind());
    if let Some(status) = rcx.scene.status() {
      title.push_str(&format!(" ({status})"));
    }
    title.push_str(&format!(" | {:.0} FPS", self.last_fps));
    rcx.gl.window.set_title(&title);
  }
}

fn build_scene(
  kind: SceneKind,
  device: &Rc<dyn Device>,
  asset_root: &Path,
  viewport: (u32, u32),
) -> Result<Box<dyn Scene>, AppError> {
  Ok(kind.build(&SceneContext {
    device,
    asset_root,
    viewport,
  })?)
}

impl ApplicationHandler for App {
  fn resumed(&mut self, event_loop: &ActiveEventLoop) {
    if self.rcx.is_some() {
      return;
    }

    match self.init(event_loop) {
      Ok(rcx) => {
        self.rcx = Some(rcx);
        self.update_title();
      }
      Err(err) => {
        error!("Startup failed: {err}");
        self.fatal = Some(err);
        event_loop.exit();
      }
    }
  }

  fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
    match event {
      WindowEvent::CloseRequested => {
        // Free scene resources while the context is still current.
        self.rcx = None;
        event_loop.exit();
      }
      WindowEvent::Resized(size) => self.resize(size),
      WindowEvent::Focused(false) => self.input.release_keys(),
      WindowEvent::MouseInput {
        state: ElementState::Pressed,
        button: MouseButton::Left,
        ..
      } => self.capture_cursor(),
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            physical_key: PhysicalKey::Code(key),
            state,
            repeat: false,
            ..
          },
        ..
      } => self.handle_key(key, state),
      WindowEvent::MouseWheel { delta, .. } => {
        let lines = match delta {
          MouseScrollDelta::LineDelta(_, y) => y,
          MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
        };
        self.camera.zoom_by(lines * ZOOM_PER_LINE);
      }
      WindowEvent::RedrawRequested => self.redraw(),
      _ => {}
    }
  }

  fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
    if let DeviceEvent::MouseMotion { delta } = event {
      if self.cursor_captured {
        self.camera.process_mouse_motion(delta.0, delta.1);
      }
    }
  }

  fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
    if let Some(rcx) = self.rcx.as_ref() {
      rcx.gl.window.request_redraw();
    }
    if let Some(gilrs) = &mut self.gilrs {
      gilrs.inc();
    }
  }
}
