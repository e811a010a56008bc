use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window},
};

use meshview::{
    config::AppConfig,
    controller::{FrameLoop, LoopState},
    errors::ContextInitError,
    logging,
    model::{ObjImporter, Renderable, Transform},
    ui,
    view::{FrameOutcome, GpuContext, OverlayPaint},
};

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    frame_loop: FrameLoop,

    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // virtual cursor fed by raw mouse motion while the pointer is grabbed
    pointer: (f64, f64),
}

impl App {
    async fn new(window: Arc<Window>, config: &AppConfig) -> Result<Self, ContextInitError> {
        let gpu = GpuContext::new_native(window.clone(), config.vsync).await?;
        let mut frame_loop = FrameLoop::new(&gpu, config, Instant::now());

        let renderable = {
            let ctx = frame_loop.upload_context(&gpu);
            let texture = config.texture_path.as_deref();
            match &config.mesh_path {
                Some(path) => Renderable::from_path(&ctx, &ObjImporter, path, texture, Transform::default()),
                None => Renderable::cube(&ctx, 1.0, texture, Transform::default()),
            }
        };
        frame_loop.scene.add(renderable.controllable(true));
        frame_loop.camera.set_look_at(Vec3::ZERO);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.format,
            egui_wgpu::RendererOptions::default(),
        );

        let app = Self {
            window,
            gpu,
            frame_loop,
            egui_renderer,
            egui_state,
            egui_ctx,
            pointer: (0.0, 0.0),
        };
        app.grab_pointer(true);
        Ok(app)
    }

    fn grab_pointer(&self, grab: bool) {
        if grab {
            let grabbed = self
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                tracing::warn!("could not grab cursor: {e}");
            }
        } else {
            let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        }
        self.window.set_cursor_visible(!grab);
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        if self.frame_loop.show_overlay()
            && self.egui_state.on_window_event(self.window.as_ref(), event).consumed
        {
            return true;
        }

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, repeat, .. }, .. } => {
                if let PhysicalKey::Code(code) = physical_key {
                    if !repeat {
                        self.frame_loop.handle_key(*code, *state == ElementState::Pressed);
                    }
                }
                true
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.frame_loop.focus_lost();
                }
                self.grab_pointer(*focused);
                true
            }
            _ => false,
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.pointer.0 += dx;
        self.pointer.1 += dy;
        self.frame_loop.handle_pointer(self.pointer.0, self.pointer.1);
    }

    fn redraw(&mut self) -> LoopState {
        if self.frame_loop.update(Instant::now()) == LoopState::ShuttingDown {
            return LoopState::ShuttingDown;
        }

        let overlay = if self.frame_loop.show_overlay() {
            let raw_input = self.egui_state.take_egui_input(&self.window);
            let stats = ui::OverlayStats {
                camera: &self.frame_loop.camera,
                scene: &self.frame_loop.scene,
                dt: self.frame_loop.last_dt(),
                wireframe: self.frame_loop.wireframe(),
                wireframe_supported: self.frame_loop.wireframe_supported(),
            };
            let output = self.egui_ctx.run(raw_input, |ctx| ui::build_overlay(ctx, &stats));
            self.egui_state.handle_platform_output(&self.window, output.platform_output);
            let pixels_per_point = output.pixels_per_point;
            Some(OverlayPaint {
                primitives: self.egui_ctx.tessellate(output.shapes, pixels_per_point),
                textures_delta: output.textures_delta,
                pixels_per_point,
            })
        } else {
            None
        };

        let outcome = self
            .frame_loop
            .render(&self.gpu, overlay.map(|paint| (&mut self.egui_renderer, paint)));
        if outcome == FrameOutcome::Fatal {
            return LoopState::ShuttingDown;
        }
        self.frame_loop.state()
    }

    fn shutdown(&mut self) {
        self.grab_pointer(false);
        self.frame_loop.shutdown();
    }
}

fn run(config: AppConfig) -> Result<(), ContextInitError> {
    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window, &config))?;

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => {
                            app.shutdown();
                            elwt.exit();
                        }
                        WindowEvent::Resized(physical_size) => {
                            app.frame_loop.resize(&mut app.gpu, physical_size.width, physical_size.height);
                        }
                        WindowEvent::RedrawRequested => {
                            if app.redraw() == LoopState::ShuttingDown {
                                app.shutdown();
                                elwt.exit();
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                if app.window.has_focus() {
                    app.handle_mouse_motion(delta.0, delta.1);
                }
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn main() {
    logging::init();

    let config = AppConfig::from_env();
    tracing::info!("starting with {:?}", config);

    if let Err(e) = run(config) {
        tracing::error!("failed to start: {e}");
        std::process::exit(1);
    }
}
