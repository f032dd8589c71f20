//! Fly camera with physics-based movement.
//!
//! Position and orientation are tracked in 64-bit precision. The camera
//! accelerates towards the requested movement direction and decelerates when
//! input stops. Matrices are handed to shaders in 32-bit.
//!
//! # Example
//! ```
//! use learngl_app::Camera;
//! use glam::DVec3;
//!
//! let mut camera = Camera::new();
//! camera.rotate(0.1, 0.0);
//! camera.update_movement(DVec3::new(0.0, 0.0, -1.0), 0.016);
//! let view = camera.view_matrix();
//! ```

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::{DVec3, Mat4, Vec3};

/// Narrowest field of view reachable by zooming, in degrees.
pub const MIN_ZOOM: f32 = 1.0;
/// Widest (and default) field of view, in degrees.
pub const MAX_ZOOM: f32 = 45.0;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;

/// A 3D camera oriented by yaw and pitch.
///
/// `yaw` is measured in radians from +X towards +Z, so the default yaw of
/// `-π/2` looks down -Z. `pitch` is clamped to ±89° so the view never flips.
#[derive(Debug)]
pub struct Camera {
  /// Current position in world space
  pub position:              DVec3,
  /// Horizontal rotation in radians, kept in `(-π, π]`
  pub yaw:                   f64,
  /// Vertical rotation in radians
  pub pitch:                 f64,
  /// Unit vector the camera is facing
  pub front:                 DVec3,
  /// Current movement velocity
  pub velocity:              DVec3,
  /// Rate of acceleration when movement input is received
  pub movement_acceleration: f64,
  /// Rate of deceleration when no movement input is present
  pub movement_deceleration: f64,
  /// Maximum movement speed in units per second
  pub max_speed:             f64,
  /// Vertical field of view in degrees, within [`MIN_ZOOM`, `MAX_ZOOM`]
  pub zoom:                  f32,
  /// Mouse/Gamepad look sensitivity in radians per unit of input
  pub mouse_sensitivity:     f64,
}

impl Camera {
  /// Camera three units back from the origin, looking down -Z.
  pub fn new() -> Self {
    Self::looking_from(DVec3::new(0.0, 0.0, 3.0), -FRAC_PI_2, 0.0)
  }

  pub fn looking_from(position: DVec3, yaw: f64, pitch: f64) -> Self {
    let mut camera = Self {
      position,
      yaw: 0.0,
      pitch: 0.0,
      front: DVec3::NEG_Z,
      velocity: DVec3::ZERO,
      movement_acceleration: 20.0,
      movement_deceleration: 10.0,
      max_speed: 2.5,
      zoom: MAX_ZOOM,
      mouse_sensitivity: 0.002,
    };
    camera.rotate(yaw, pitch);
    camera
  }

  /// Moves the camera towards `movement_input * max_speed`.
  ///
  /// # Parameters
  /// * `movement_input` - Movement direction in world space, length at most 1
  /// * `delta_time` - Time elapsed since last update in seconds
  pub fn update_movement(&mut self, movement_input: DVec3, delta_time: f64) {
    let has_input = movement_input.length_squared() > 0.0;
    let target_velocity = if has_input {
      movement_input * self.max_speed
    } else {
      DVec3::ZERO
    };
    let accel = if has_input {
      self.movement_acceleration
    } else {
      self.movement_deceleration
    };

    self.velocity = self
      .velocity
      .lerp(target_velocity, (accel * delta_time).min(1.0));

    if self.velocity.length_squared() > 0.0 {
      self.position += self.velocity * delta_time;
    }
  }

  /// Rotates by the given yaw and pitch deltas (radians).
  ///
  /// Yaw wraps around to stay in `(-π, π]`. Pitch is clamped to ±89°.
  pub fn rotate(&mut self, yaw_delta: f64, pitch_delta: f64) {
    self.yaw += yaw_delta;
    self.yaw -= TAU * (self.yaw / TAU).floor();
    if self.yaw > PI {
      self.yaw -= TAU;
    }

    self.pitch = (self.pitch + pitch_delta).clamp(-89.0f64.to_radians(), 89.0f64.to_radians());

    let (yaw_sin, yaw_cos) = self.yaw.sin_cos();
    let (pitch_sin, pitch_cos) = self.pitch.sin_cos();
    self.front = DVec3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize();
  }

  /// Turns by raw mouse motion in pixels. Moving the mouse up looks up.
  pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
    self.rotate(
      delta_x * self.mouse_sensitivity,
      -delta_y * self.mouse_sensitivity,
    );
  }

  /// Turns by right stick input that already went through the deadzone curve.
  pub fn update_gamepad_rotation(&mut self, right_stick_x: f64, right_stick_y: f64, delta_time: f64) {
    // Full deflection turns about 2.5 rad/s.
    let rotation_speed = self.mouse_sensitivity * 1250.0 * delta_time;
    if right_stick_x != 0.0 || right_stick_y != 0.0 {
      self.rotate(right_stick_x * rotation_speed, -right_stick_y * rotation_speed);
    }
  }

  /// Narrows the field of view by `delta` degrees (negative widens it).
  pub fn zoom_by(&mut self, delta: f32) {
    self.zoom = (self.zoom - delta).clamp(MIN_ZOOM, MAX_ZOOM);
  }

  /// Horizontal unit vector pointing to the camera's right.
  pub fn right(&self) -> DVec3 {
    self.front.cross(DVec3::Y).normalize_or_zero()
  }

  /// World-to-view transform for OpenGL's right-handed, +Y up convention.
  pub fn view_matrix(&self) -> Mat4 {
    Mat4::look_at_rh(
      self.position.as_vec3(),
      (self.position + self.front).as_vec3(),
      Vec3::Y,
    )
  }

  pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_rh_gl(self.zoom.to_radians(), aspect_ratio, NEAR_PLANE, FAR_PLANE)
  }
}

impl Default for Camera {
  fn default() -> Self {
    Self::new()
  }
}
