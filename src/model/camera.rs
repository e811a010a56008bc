use glam::{Mat4, Vec3};

pub const PITCH_LIMIT_DEG: f32 = 89.0;

/// First-person camera. Orientation is the yaw/pitch pair (degrees); `front`,
/// `right` and `up` are derived from it whenever it changes.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub world_up: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        // yaw of -90 points the camera along -Z
        Self::new(Vec3::new(0.0, 0.0, 3.0), -90.0, 0.0)
    }
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            world_up: Vec3::Y,
            yaw: 0.0,
            pitch: 0.0,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        };
        camera.set_orientation(yaw, pitch);
        camera
    }

    pub fn yaw(&self) -> f32 { self.yaw }

    pub fn pitch(&self) -> f32 { self.pitch }

    pub fn front(&self) -> Vec3 { self.front }

    pub fn right(&self) -> Vec3 { self.right }

    pub fn up(&self) -> Vec3 { self.up }

    pub fn target(&self) -> Vec3 { self.position + self.front }

    /// Set yaw/pitch in degrees. Pitch is clamped to avoid flipping over the poles.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        self.update_vectors();
    }

    pub fn rotate_by(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.set_orientation(self.yaw + yaw_delta, self.pitch + pitch_delta);
    }

    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.set_orientation(
            dir.z.atan2(dir.x).to_degrees(),
            dir.y.clamp(-1.0, 1.0).asin().to_degrees(),
        );
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target(), self.up)
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_looks_down_negative_z() {
        let cam = Camera::default();
        assert!(cam.front().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(cam.right().abs_diff_eq(Vec3::X, 1e-6));
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_front_is_unit_length() {
        let mut cam = Camera::default();
        for yaw in (-720..=720).step_by(15) {
            for pitch in (-89..=89).step_by(7) {
                cam.set_orientation(yaw as f32, pitch as f32);
                assert!((cam.front().length() - 1.0).abs() < 1e-5);
                assert!((cam.up().length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut cam = Camera::default();
        cam.rotate_by(0.0, 500.0);
        assert_eq!(cam.pitch(), PITCH_LIMIT_DEG);
        cam.rotate_by(0.0, -10_000.0);
        assert_eq!(cam.pitch(), -PITCH_LIMIT_DEG);
    }

    #[test]
    fn test_set_look_at() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0, 0.0);
        cam.set_look_at(Vec3::new(0.0, 0.0, -5.0));
        assert!(cam.front().abs_diff_eq(Vec3::NEG_Z, 1e-5));

        let before = cam.front();
        cam.set_look_at(Vec3::ZERO);
        assert_eq!(cam.front(), before);
    }

    #[test]
    fn test_view_matrix_puts_target_ahead() {
        let cam = Camera::default();
        let p = cam.view_matrix().transform_point3(Vec3::ZERO);
        // origin is 3 units in front of the camera, i.e. on the -Z axis in view space
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -3.0), 1e-5));
    }
}
