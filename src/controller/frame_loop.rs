use std::time::Instant;

use glam::Mat4;
use winit::keyboard::KeyCode;

use crate::config::AppConfig;
use crate::controller::camera_controller::{CameraController, ControlSignal};
use crate::controller::input::{Action, InputEvent, InputState, KeyBindings};
use crate::model::{Camera, LightManager, Scene, UploadContext};
use crate::view::gpu_init::{GpuContext, DEPTH_FORMAT};
use crate::view::render::{self, FrameOutcome, OverlayPaint};
use crate::view::shader::{ShaderProgram, UniformSetter};

pub const AMBIENT_STRENGTH: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Terminal: nothing is updated or drawn once shutting down.
    ShuttingDown,
}

/// Seconds between consecutive ticks.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: Instant,
    last_dt: f32,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self { last: now, last_dt: 0.0 }
    }

    pub fn tick(&mut self, now: Instant) -> f32 {
        self.last_dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        self.last_dt
    }

    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        let mut projection = Self { fov_y_deg: 45.0, near: 0.1, far: 100.0, aspect: 1.0 };
        projection.resize(width, height);
        projection
    }

    /// Returns false (keeping the previous aspect) for zero-sized frames.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.aspect = width as f32 / height as f32;
        true
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }
}

/// Owns everything that changes from frame to frame.
pub struct FrameLoop {
    pub scene: Scene,
    pub camera: Camera,
    pub controller: CameraController,
    pub projection: Projection,
    program: ShaderProgram,
    clock: FrameClock,
    input: InputState,
    bindings: KeyBindings,
    state: LoopState,
    wireframe: bool,
    show_overlay: bool,
    depth_view: wgpu::TextureView,
}

impl FrameLoop {
    pub fn new(gpu: &GpuContext, config: &AppConfig, now: Instant) -> Self {
        let program = ShaderProgram::scene(&gpu.device, gpu.format, DEPTH_FORMAT);
        if !program.is_valid() {
            tracing::error!("program '{}' is invalid; scene geometry will not be drawn", program.label());
        }

        Self {
            scene: Scene::new(LightManager::with_default_lights()),
            camera: Camera::default(),
            controller: CameraController::new(config.camera_speed, config.mouse_sensitivity),
            projection: Projection::new(gpu.config.width, gpu.config.height),
            program,
            clock: FrameClock::new(now),
            input: InputState::new(),
            bindings: KeyBindings::default(),
            state: LoopState::Running,
            wireframe: false,
            show_overlay: true,
            depth_view: gpu.create_depth_texture(),
        }
    }

    /// Handles for creating renderables against this loop's program.
    pub fn upload_context<'a>(&'a self, gpu: &'a GpuContext) -> UploadContext<'a> {
        UploadContext {
            device: &gpu.device,
            queue: &gpu.queue,
            program: &self.program,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn wireframe_supported(&self) -> bool {
        self.program.supports_wireframe()
    }

    pub fn show_overlay(&self) -> bool {
        self.show_overlay
    }

    pub fn last_dt(&self) -> f32 {
        self.clock.last_dt()
    }

    /// Unbound keys are ignored.
    pub fn handle_key(&mut self, code: KeyCode, pressed: bool) {
        let Some(action) = self.bindings.action_for(code) else {
            return;
        };
        let event = if pressed { InputEvent::KeyDown(action) } else { InputEvent::KeyUp(action) };
        self.input.process_event(event);
    }

    pub fn handle_pointer(&mut self, x: f64, y: f64) {
        self.input.process_event(InputEvent::PointerMoved { x, y });
    }

    pub fn focus_lost(&mut self) {
        self.input.process_event(InputEvent::FocusLost);
    }

    /// Advance the clock and apply this frame's input.
    pub fn update(&mut self, now: Instant) -> LoopState {
        if self.state == LoopState::ShuttingDown {
            return self.state;
        }
        let dt = self.clock.tick(now);

        for toggle in self.input.take_toggles() {
            match toggle {
                Action::ToggleWireframe if self.program.supports_wireframe() => {
                    self.wireframe = !self.wireframe;
                    tracing::info!("wireframe {}", if self.wireframe { "on" } else { "off" });
                }
                Action::ToggleWireframe => tracing::warn!("wireframe not supported by this adapter"),
                Action::ToggleOverlay => self.show_overlay = !self.show_overlay,
                _ => {}
            }
        }

        if self.input.take_pointer_reset() {
            self.controller.reset_pointer();
        }
        for (x, y) in self.input.take_pointer_samples() {
            self.controller.on_pointer(&mut self.camera, x, y);
        }

        let keys = self.input.snapshot();
        let signal = self.controller.update(&mut self.camera, &keys, dt);
        self.controller.rotate_objects(self.scene.renderables_mut(), &keys, dt);

        if signal == ControlSignal::Quit {
            tracing::info!("quit requested");
            self.state = LoopState::ShuttingDown;
        }
        self.state
    }

    /// Stage camera, projection and lighting into the program, then upload.
    pub fn upload_frame_uniforms(&mut self, queue: &wgpu::Queue) {
        write_frame_uniforms(&mut self.program, &self.camera, &self.projection, &self.scene.lights);
        self.program.flush(queue);
    }

    pub fn render(&mut self, gpu: &GpuContext, overlay: Option<(&mut egui_wgpu::Renderer, OverlayPaint)>) -> FrameOutcome {
        if self.state == LoopState::ShuttingDown {
            return FrameOutcome::Skipped;
        }
        self.upload_frame_uniforms(&gpu.queue);

        let outcome = render::draw_frame(
            gpu,
            &self.depth_view,
            &self.program,
            self.wireframe,
            self.scene.renderables_mut(),
            overlay,
        );
        if outcome == FrameOutcome::Fatal {
            self.state = LoopState::ShuttingDown;
        }
        outcome
    }

    /// Projection first, so the next frame already uses the new aspect.
    pub fn resize(&mut self, gpu: &mut GpuContext, width: u32, height: u32) {
        if !self.projection.resize(width, height) {
            tracing::debug!("ignoring zero-sized resize");
            return;
        }
        if gpu.resize(width, height) {
            self.depth_view = gpu.create_depth_texture();
        }
    }

    /// Release every renderable while the device is still alive.
    pub fn shutdown(&mut self) {
        self.state = LoopState::ShuttingDown;
        self.scene.clear();
    }
}

/// Write view, projection, camera position and lights into `target`.
pub fn write_frame_uniforms(
    target: &mut impl UniformSetter,
    camera: &Camera,
    projection: &Projection,
    lights: &LightManager,
) {
    target.set_mat4("view", camera.view_matrix());
    target.set_mat4("projection", projection.matrix());
    target.set_vec3("viewPos", camera.position);
    lights.upload_to_shader(&mut *target);
    target.set_float("ambientStrength", AMBIENT_STRENGTH);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::shader::{UniformBlock, UniformLayout};
    use glam::Vec3;
    use std::time::Duration;

    #[test]
    fn test_frame_clock_tick() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let dt = clock.tick(start + Duration::from_millis(250));
        assert!((dt - 0.25).abs() < 1e-6);
        let dt = clock.tick(start + Duration::from_millis(500));
        assert!((dt - 0.25).abs() < 1e-6);
        assert_eq!(clock.last_dt(), dt);
    }

    #[test]
    fn test_frame_clock_never_negative() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start + Duration::from_secs(1));
        assert_eq!(clock.tick(start), 0.0);
    }

    #[test]
    fn test_projection_resize_updates_immediately() {
        let mut projection = Projection::new(800, 600);
        let before = projection.matrix();
        assert!(projection.resize(1600, 600));
        let after = projection.matrix();

        assert!((projection.aspect() - 1600.0 / 600.0).abs() < 1e-6);
        // x scale is f / aspect
        assert!((after.x_axis.x - before.x_axis.x / 2.0).abs() < 1e-5);
        assert_eq!(after.y_axis.y, before.y_axis.y);
    }

    #[test]
    fn test_projection_ignores_zero_size() {
        let mut projection = Projection::new(800, 600);
        let before = projection;
        assert!(!projection.resize(0, 600));
        assert!(!projection.resize(800, 0));
        assert_eq!(projection, before);
    }

    #[test]
    fn test_frame_uniforms_written() {
        let mut block = UniformBlock::new(UniformLayout::frame());
        let camera = Camera::default();
        let projection = Projection::new(1920, 1080);
        let lights = LightManager::with_default_lights();

        write_frame_uniforms(&mut block, &camera, &projection, &lights);

        assert_eq!(block.get_mat4("view"), Some(camera.view_matrix()));
        assert_eq!(block.get_mat4("projection"), Some(projection.matrix()));
        assert_eq!(block.get_vec3("viewPos"), Some(Vec3::new(0.0, 0.0, 3.0)));
        assert_eq!(block.get_int("dirLightCount"), Some(lights.len() as i32));
        assert_eq!(block.get_float("ambientStrength"), Some(AMBIENT_STRENGTH));
    }
}
