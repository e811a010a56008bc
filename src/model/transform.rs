use glam::{Mat4, Quat, Vec3};

/// Position / rotation / scale of a renderable.
///
/// `rotation` is kept unit length; every composition goes through [`Transform::rotate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation.normalize();
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// translate * rotate * scale
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(self.scale)
    }

    /// Apply `delta` on top of the current rotation (world-space) and renormalize.
    pub fn rotate(&mut self, delta: Quat) {
        self.rotation = (delta * self.rotation).normalize();
    }

    pub fn euler(&self) -> Vec3 {
        quat_to_euler(self.rotation)
    }

    pub fn set_euler(&mut self, euler: Vec3) {
        self.rotation = euler_to_quat(euler).normalize();
    }
}

/// Quaternion to `(roll, pitch, yaw)` in radians.
pub fn quat_to_euler(q: Quat) -> Vec3 {
    let roll = (2.0 * (q.w * q.x + q.y * q.z)).atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y));
    // asin is undefined outside [-1, 1]; float drift near the poles can push it there
    let pitch = (2.0 * (q.w * q.y - q.z * q.x)).clamp(-1.0, 1.0).asin();
    let yaw = (2.0 * (q.w * q.z + q.x * q.y)).atan2(1.0 - 2.0 * (q.y * q.y + q.z * q.z));
    Vec3::new(roll, pitch, yaw)
}

/// `(roll, pitch, yaw)` in radians to quaternion (half-angle form).
pub fn euler_to_quat(euler: Vec3) -> Quat {
    let (sr, cr) = (euler.x * 0.5).sin_cos();
    let (sp, cp) = (euler.y * 0.5).sin_cos();
    let (sy, cy) = (euler.z * 0.5).sin_cos();

    Quat::from_xyzw(
        sr * cp * cy - cr * sp * sy,
        cr * sp * cy + sr * cp * sy,
        cr * cp * sy - sr * sp * cy,
        cr * cp * cy + sr * sp * sy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_translation_moves_origin() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let p = t.model_matrix().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), EPS));
    }

    #[test]
    fn test_scale_applied_before_translation() {
        let t = Transform::from_position(Vec3::new(0.0, 1.0, 0.0)).with_scale(Vec3::splat(2.0));
        let p = t.model_matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), EPS));
    }

    #[test]
    fn test_rotate_keeps_unit_norm() {
        let mut t = Transform::default();
        let step = Quat::from_rotation_y(0.013) * Quat::from_scaled_axis(Vec3::new(1e-4, 0.0, 0.0));
        for _ in 0..10_000 {
            t.rotate(step);
        }
        assert!((t.rotation.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_euler_round_trip_small_angles() {
        for &(r, p, y) in &[(0.1, 0.2, 0.3), (-0.25, 0.05, 0.4), (0.0, -0.3, -0.1), (0.5, 0.4, -0.6)] {
            let euler = Vec3::new(r, p, y);
            let back = quat_to_euler(euler_to_quat(euler));
            assert!(back.abs_diff_eq(euler, 1e-4), "{euler:?} -> {back:?}");
        }
    }

    #[test]
    fn test_euler_to_quat_matches_axis_rotations() {
        let q = euler_to_quat(Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2));
        assert!(q.abs_diff_eq(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), EPS));

        let q = euler_to_quat(Vec3::new(0.7, 0.0, 0.0));
        assert!(q.abs_diff_eq(Quat::from_rotation_x(0.7), EPS));
    }

    #[test]
    fn test_quat_to_euler_clamps_at_pole() {
        let q = Quat::from_xyzw(0.0, 0.7072, 0.0, 0.7072);
        let e = quat_to_euler(q);
        assert!(e.y.is_finite());
    }
}
