use glam::{Mat3, Quat, Vec3};

use crate::errors::LightError;
use crate::view::shader::UniformSetter;

/// Must match the `dirLights` array length in the scene shader.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Points from the light toward the scene
    pub direction: Vec3,
    /// Linear RGB, may exceed 1.0
    pub color: Vec3,
}

/// Ordered, bounded set of directional lights.
#[derive(Debug, Clone, Default)]
pub struct LightManager {
    lights: Vec<DirectionalLight>,
}

impl LightManager {
    pub fn new() -> Self {
        Self { lights: Vec::with_capacity(MAX_DIRECTIONAL_LIGHTS) }
    }

    /// Warm key light from above plus a dim cool fill from the opposite side.
    pub fn with_default_lights() -> Self {
        let mut lights = Self::new();
        // two lights always fit under MAX_DIRECTIONAL_LIGHTS
        let key = lights.add(Vec3::new(-0.3, -1.0, -0.5).normalize(), Vec3::new(1.0, 0.96, 0.9));
        let fill = lights.add(Vec3::new(0.6, 0.3, 0.8).normalize(), Vec3::new(0.15, 0.2, 0.35));
        debug_assert!(key.is_ok() && fill.is_ok());
        lights
    }

    /// Append a light; the direction is stored as given. Returns the new index.
    pub fn add(&mut self, direction: Vec3, color: Vec3) -> Result<usize, LightError> {
        if self.lights.len() >= MAX_DIRECTIONAL_LIGHTS {
            tracing::warn!("rejecting directional light #{}, capacity is {}", self.lights.len() + 1, MAX_DIRECTIONAL_LIGHTS);
            return Err(LightError::CapacityExceeded { capacity: MAX_DIRECTIONAL_LIGHTS });
        }
        self.lights.push(DirectionalLight { direction, color });
        Ok(self.lights.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Option<DirectionalLight> {
        (index < self.lights.len()).then(|| self.lights.remove(index))
    }

    pub fn clear(&mut self) {
        self.lights.clear();
    }

    pub fn get(&self, index: usize) -> Option<&DirectionalLight> {
        self.lights.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectionalLight> {
        self.lights.iter()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Aim light `index` from `from` toward `to`. Out-of-range indices and
    /// coincident points leave the light untouched.
    pub fn point_at(&mut self, index: usize, from: Vec3, to: Vec3) {
        let Some(light) = self.lights.get_mut(index) else {
            return;
        };
        let Some(orientation) = look_rotation(to - from, Vec3::Y) else {
            return;
        };
        light.direction = orientation * Vec3::NEG_Z;
    }

    /// Write `dirLightCount` and every `dirLights[i]` slot. The count is capped
    /// at the shader array length.
    pub fn upload_to_shader(&self, program: &mut impl UniformSetter) {
        let count = self.lights.len().min(MAX_DIRECTIONAL_LIGHTS);
        program.set_int("dirLightCount", count as i32);

        for (i, light) in self.lights.iter().take(count).enumerate() {
            program.set_vec3(&format!("dirLights[{i}].direction"), light.direction);
            program.set_vec3(&format!("dirLights[{i}].color"), light.color);
        }
    }
}

/// Rotation whose -Z axis points along `forward`, with `up_hint` resolving roll.
fn look_rotation(forward: Vec3, up_hint: Vec3) -> Option<Quat> {
    let forward = forward.try_normalize()?;
    let up_hint = if forward.cross(up_hint).length_squared() < 1e-6 { Vec3::X } else { up_hint };
    let right = forward.cross(up_hint).normalize();
    let up = right.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lights() {
        let lights = LightManager::with_default_lights();
        assert_eq!(lights.len(), 2);
        assert!(lights.iter().all(|l| (l.direction.length() - 1.0).abs() < 1e-5));
    }
    use crate::view::shader::{UniformBlock, UniformLayout};

    #[test]
    fn test_add_rejects_past_capacity() {
        let mut lights = LightManager::new();
        for i in 0..MAX_DIRECTIONAL_LIGHTS {
            assert_eq!(lights.add(Vec3::NEG_Y, Vec3::ONE), Ok(i));
        }
        assert_eq!(
            lights.add(Vec3::NEG_Y, Vec3::ONE),
            Err(LightError::CapacityExceeded { capacity: MAX_DIRECTIONAL_LIGHTS })
        );
        assert_eq!(lights.len(), MAX_DIRECTIONAL_LIGHTS);
    }

    #[test]
    fn test_point_at() {
        let mut lights = LightManager::new();
        lights.add(Vec3::X, Vec3::ONE).unwrap();

        lights.point_at(0, Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
        assert!(lights.get(0).unwrap().direction.abs_diff_eq(Vec3::NEG_Y, 1e-5));

        lights.point_at(0, Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0));
        assert!(lights.get(0).unwrap().direction.abs_diff_eq(Vec3::new(0.6, 0.0, 0.8), 1e-5));
    }

    #[test]
    fn test_point_at_ignores_bad_input() {
        let mut lights = LightManager::new();
        lights.add(Vec3::X, Vec3::ONE).unwrap();

        lights.point_at(7, Vec3::ZERO, Vec3::Y);
        lights.point_at(0, Vec3::ONE, Vec3::ONE);
        assert_eq!(lights.get(0).unwrap().direction, Vec3::X);
    }

    #[test]
    fn test_upload_writes_indexed_slots() {
        let mut block = UniformBlock::new(UniformLayout::frame());
        let mut lights = LightManager::new();
        lights.add(Vec3::NEG_Y, Vec3::new(2.0, 1.0, 0.5)).unwrap();
        lights.add(Vec3::X, Vec3::ONE).unwrap();

        lights.upload_to_shader(&mut block);

        assert_eq!(block.get_int("dirLightCount"), Some(2));
        assert_eq!(block.get_vec3("dirLights[0].direction"), Some(Vec3::NEG_Y));
        assert_eq!(block.get_vec3("dirLights[0].color"), Some(Vec3::new(2.0, 1.0, 0.5)));
        assert_eq!(block.get_vec3("dirLights[1].direction"), Some(Vec3::X));
        assert_eq!(block.get_vec3("dirLights[2].direction"), Some(Vec3::ZERO));
    }

    #[test]
    fn test_upload_count_never_exceeds_capacity() {
        let mut block = UniformBlock::new(UniformLayout::frame());
        let mut lights = LightManager::new();
        for _ in 0..MAX_DIRECTIONAL_LIGHTS + 3 {
            let _ = lights.add(Vec3::NEG_Y, Vec3::ONE);
        }
        lights.upload_to_shader(&mut block);
        assert_eq!(block.get_int("dirLightCount"), Some(MAX_DIRECTIONAL_LIGHTS as i32));
    }
}
