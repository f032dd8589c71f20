//! Keyboard and gamepad movement state.

use gilrs::{Axis, Button, Gilrs};
use glam::DVec3;
use winit::keyboard::KeyCode;

/// Stick deflection below this is ignored.
pub const STICK_DEADZONE: f64 = 0.15;

/// Held movement keys and the latest gamepad stick positions.
#[derive(Debug, Default, Clone)]
pub struct InputState {
  forward_pressed: bool,
  back_pressed:    bool,
  left_pressed:    bool,
  right_pressed:   bool,
  up_pressed:      bool,
  down_pressed:    bool,

  left_stick_x:         f64,
  left_stick_y:         f64,
  right_stick_x:        f64,
  right_stick_y:        f64,
  gamepad_up_pressed:   bool, // A button
  gamepad_down_pressed: bool, // B button
}

impl InputState {
  /// Records a movement key. Returns `false` for keys that do not move the camera.
  pub fn set_key(&mut self, key: KeyCode, pressed: bool) -> bool {
    let slot = match key {
      KeyCode::KeyW => &mut self.forward_pressed,
      KeyCode::KeyS => &mut self.back_pressed,
      KeyCode::KeyA => &mut self.left_pressed,
      KeyCode::KeyD => &mut self.right_pressed,
      KeyCode::Space => &mut self.up_pressed,
      KeyCode::ShiftLeft => &mut self.down_pressed,
      _ => return false,
    };
    *slot = pressed;
    true
  }

  /// Forgets held keys, e.g. when the cursor is released mid-press.
  pub fn release_keys(&mut self) {
    self.forward_pressed = false;
    self.back_pressed = false;
    self.left_pressed = false;
    self.right_pressed = false;
    self.up_pressed = false;
    self.down_pressed = false;
  }

  /// Drains pending gamepad events and samples the sticks of the pad that sent them.
  pub fn poll_gamepad(&mut self, gilrs: &mut Gilrs) {
    while let Some(event) = gilrs.next_event() {
      let gamepad = gilrs.gamepad(event.id);
      let axis = |axis| {
        gamepad
          .axis_data(axis)
          .map(|a| a.value() as f64)
          .unwrap_or(0.0)
      };

      self.left_stick_x = axis(Axis::LeftStickX);
      self.left_stick_y = -axis(Axis::LeftStickY);
      self.right_stick_x = axis(Axis::RightStickX);
      self.right_stick_y = -axis(Axis::RightStickY);

      self.gamepad_up_pressed = gamepad.is_pressed(Button::South);
      self.gamepad_down_pressed = gamepad.is_pressed(Button::East);
    }
  }

  /// World-space movement direction for a camera facing `yaw`.
  ///
  /// Keyboard input wins over the left stick. The horizontal part is
  /// normalised so diagonals are not faster.
  pub fn movement(&self, yaw: f64) -> DVec3 {
    let mut movement = DVec3::ZERO;
    if self.up_pressed || self.gamepad_up_pressed {
      movement.y += 1.0;
    }
    if self.down_pressed || self.gamepad_down_pressed {
      movement.y -= 1.0;
    }

    // yaw = 0 faces +X; right is then +Z.
    let (yaw_sin, yaw_cos) = yaw.sin_cos();
    let forward = DVec3::new(yaw_cos, 0.0, yaw_sin);
    let right = DVec3::new(-yaw_sin, 0.0, yaw_cos);

    let mut horizontal = DVec3::ZERO;
    if self.forward_pressed {
      horizontal += forward;
    }
    if self.back_pressed {
      horizontal -= forward;
    }
    if self.right_pressed {
      horizontal += right;
    }
    if self.left_pressed {
      horizontal -= right;
    }

    if horizontal == DVec3::ZERO {
      let (stick_x, stick_y) = apply_deadzone(self.left_stick_x, self.left_stick_y, STICK_DEADZONE);
      // Pushing the stick up reads as negative y after the flip in `poll_gamepad`.
      horizontal = right * stick_x - forward * stick_y;
      if horizontal.length_squared() > 1.0 {
        horizontal = horizontal.normalize();
      }
    } else {
      horizontal = horizontal.normalize_or_zero();
    }

    movement + horizontal
  }

  /// Right stick deflection after the deadzone curve.
  pub fn look(&self) -> (f64, f64) {
    apply_deadzone(self.right_stick_x, self.right_stick_y, STICK_DEADZONE)
  }
}

/// Rescales stick input so the deadzone edge reads as zero, with a quadratic
/// response curve beyond it.
pub fn apply_deadzone(x: f64, y: f64, deadzone: f64) -> (f64, f64) {
  let length = (x * x + y * y).sqrt();
  if length <= deadzone {
    return (0.0, 0.0);
  }

  let normalized_length = ((length - deadzone) / (1.0 - deadzone)).min(1.0);
  let scale = normalized_length / length;
  let curve = normalized_length * normalized_length;

  (x * scale * curve, y * scale * curve)
}

#[cfg(test)]
mod tests {
  use std::f64::consts::FRAC_PI_2;

  use super::*;

  #[test]
  fn deadzone_swallows_small_deflection() {
    assert_eq!(apply_deadzone(0.1, 0.05, STICK_DEADZONE), (0.0, 0.0));

    let (x, y) = apply_deadzone(1.0, 0.0, STICK_DEADZONE);
    assert!((x - 1.0).abs() < 1e-12);
    assert_eq!(y, 0.0);
  }

  #[test]
  fn deadzone_curve_is_quadratic() {
    let halfway = STICK_DEADZONE + (1.0 - STICK_DEADZONE) / 2.0;

    let (x, _) = apply_deadzone(halfway, 0.0, STICK_DEADZONE);

    assert!((x - 0.125).abs() < 1e-12);
  }

  #[test]
  fn forward_follows_yaw() {
    let mut input = InputState::default();
    assert!(input.set_key(KeyCode::KeyW, true));

    let movement = input.movement(-FRAC_PI_2);

    assert!(movement.abs_diff_eq(DVec3::NEG_Z, 1e-12));
  }

  #[test]
  fn diagonal_is_normalised_and_vertical_kept() {
    let mut input = InputState::default();
    input.set_key(KeyCode::KeyW, true);
    input.set_key(KeyCode::KeyD, true);
    input.set_key(KeyCode::Space, true);

    let movement = input.movement(0.0);

    assert!((DVec3::new(movement.x, 0.0, movement.z).length() - 1.0).abs() < 1e-12);
    assert_eq!(movement.y, 1.0);
    assert!(movement.x > 0.0 && movement.z > 0.0);
  }

  #[test]
  fn released_keys_stop_movement() {
    let mut input = InputState::default();
    input.set_key(KeyCode::KeyA, true);
    assert!(!input.set_key(KeyCode::KeyQ, true));

    input.release_keys();

    assert_eq!(input.movement(0.3), DVec3::ZERO);
  }
}
