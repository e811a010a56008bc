use glam::{Quat, Vec3};

use crate::controller::input::{Action, KeySnapshot};
use crate::model::{Camera, Renderable};

/// Degrees per second applied to controllable objects by the arrow keys.
pub const OBJECT_ROTATION_SPEED: f32 = 90.0;

/// What the frame loop should do after an input update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Continue,
    Quit,
}

/// Flycam: pointer motion turns the camera, held keys move it.
#[derive(Debug, Clone)]
pub struct CameraController {
    /// Units per second
    pub speed: f32,
    /// Degrees per pixel
    pub sensitivity: f32,
    last_pointer: Option<(f64, f64)>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(2.5, 0.1)
    }
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self { speed, sensitivity, last_pointer: None }
    }

    /// Feed an absolute pointer position. The first sample after construction
    /// or [`reset_pointer`](Self::reset_pointer) only seeds the tracker.
    pub fn on_pointer(&mut self, camera: &mut Camera, x: f64, y: f64) {
        let Some((last_x, last_y)) = self.last_pointer.replace((x, y)) else {
            return;
        };

        let dx = (x - last_x) as f32 * self.sensitivity;
        // screen y grows downwards
        let dy = (last_y - y) as f32 * self.sensitivity;
        camera.rotate_by(dx, dy);
    }

    pub fn reset_pointer(&mut self) {
        self.last_pointer = None;
    }

    /// Apply held movement keys for `dt` seconds.
    pub fn update(&self, camera: &mut Camera, keys: &KeySnapshot, dt: f32) -> ControlSignal {
        let step = self.speed * dt;
        let front = camera.front();
        let right = front.cross(camera.world_up).normalize_or_zero();
        let up = camera.world_up;

        let mut delta = Vec3::ZERO;
        if keys.is_held(Action::Forward) {
            delta += front;
        }
        if keys.is_held(Action::Back) {
            delta -= front;
        }
        if keys.is_held(Action::Left) {
            delta -= right;
        }
        if keys.is_held(Action::Right) {
            delta += right;
        }
        if keys.is_held(Action::Down) {
            delta -= up;
        }
        if keys.is_held(Action::Up) {
            delta += up;
        }
        camera.position += delta * step;

        if keys.is_held(Action::Quit) {
            ControlSignal::Quit
        } else {
            ControlSignal::Continue
        }
    }

    /// Spin every controllable renderable with the arrow keys.
    pub fn rotate_objects(&self, renderables: &mut [Renderable], keys: &KeySnapshot, dt: f32) {
        let Some(delta) = object_rotation(keys, dt) else {
            return;
        };
        for renderable in renderables.iter_mut().filter(|r| r.controllable) {
            renderable.transform.rotate(delta);
        }
    }
}

/// Yaw about +Y composed with pitch about +X for the held arrow keys, or
/// `None` when no rotation key is held.
pub fn object_rotation(keys: &KeySnapshot, dt: f32) -> Option<Quat> {
    let axis = |pos: Action, neg: Action| -> f32 {
        (keys.is_held(pos) as i32 - keys.is_held(neg) as i32) as f32
    };
    let yaw = axis(Action::RotateRight, Action::RotateLeft);
    let pitch = axis(Action::RotateDown, Action::RotateUp);
    if yaw == 0.0 && pitch == 0.0 {
        return None;
    }

    let step = (OBJECT_ROTATION_SPEED * dt).to_radians();
    Some(Quat::from_rotation_y(yaw * step) * Quat::from_rotation_x(pitch * step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::camera::PITCH_LIMIT_DEG;
    use crate::model::Transform;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_first_pointer_sample_only_seeds() {
        let mut controller = CameraController::default();
        let mut camera = Camera::default();
        controller.on_pointer(&mut camera, 400.0, 300.0);
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn test_second_pointer_sample_rotates() {
        let mut controller = CameraController::default();
        let mut camera = Camera::default();
        controller.on_pointer(&mut camera, 400.0, 300.0);
        controller.on_pointer(&mut camera, 410.0, 290.0);

        assert!((camera.yaw() - (-89.0)).abs() < 1e-4);
        assert!((camera.pitch() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_reset_pointer_reseeds() {
        let mut controller = CameraController::default();
        let mut camera = Camera::default();
        controller.on_pointer(&mut camera, 0.0, 0.0);
        controller.reset_pointer();
        controller.on_pointer(&mut camera, 500.0, 500.0);
        assert_eq!(camera.yaw(), -90.0);
    }

    #[test]
    fn test_pitch_clamped_under_large_deltas() {
        let mut controller = CameraController::default();
        let mut camera = Camera::default();
        controller.on_pointer(&mut camera, 0.0, 0.0);
        controller.on_pointer(&mut camera, 0.0, -100_000.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT_DEG);
        controller.on_pointer(&mut camera, 0.0, 100_000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT_DEG);
        assert!((camera.front().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_movement_scaled_by_dt() {
        let controller = CameraController::default();
        let mut camera = Camera::default();
        let keys = KeySnapshot::default().with(Action::Forward);

        let signal = controller.update(&mut camera, &keys, 0.5);
        assert_eq!(signal, ControlSignal::Continue);
        // default camera looks down -Z from (0, 0, 3)
        assert!(approx(camera.position, Vec3::new(0.0, 0.0, 1.75)));
    }

    #[test]
    fn test_strafe_and_vertical() {
        let controller = CameraController::default();
        let mut camera = Camera::default();
        let keys = KeySnapshot::default().with(Action::Right).with(Action::Up);

        controller.update(&mut camera, &keys, 1.0);
        assert!(approx(camera.position, Vec3::new(2.5, 2.5, 3.0)));
    }

    #[test]
    fn test_quit_signal() {
        let controller = CameraController::default();
        let mut camera = Camera::default();
        let keys = KeySnapshot::default().with(Action::Quit);
        assert_eq!(controller.update(&mut camera, &keys, 0.016), ControlSignal::Quit);
    }

    #[test]
    fn test_object_rotation_idle() {
        assert!(object_rotation(&KeySnapshot::default(), 1.0).is_none());
        let both = KeySnapshot::default().with(Action::RotateLeft).with(Action::RotateRight);
        assert!(object_rotation(&both, 1.0).is_none());
    }

    #[test]
    fn test_object_rotation_yaw() {
        let keys = KeySnapshot::default().with(Action::RotateRight);
        let delta = object_rotation(&keys, 1.0).unwrap();

        let mut transform = Transform::default();
        transform.rotate(delta);
        // 90 degrees about +Y takes -Z to -X
        assert!(approx(transform.rotation * Vec3::NEG_Z, Vec3::NEG_X));
    }
}
