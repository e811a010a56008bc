use wgpu::{
    Color, CommandEncoderDescriptor, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp, SurfaceError,
    TextureViewDescriptor,
};

use crate::model::Renderable;
use crate::view::gpu_init::GpuContext;
use crate::view::shader::ShaderProgram;

pub const CLEAR_COLOR: Color = Color { r: 0.1, g: 0.1, b: 0.15, a: 1.0 };

/// Tessellated egui output waiting to be painted over the scene.
pub struct OverlayPaint {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// No frame this time (surface reconfigured or timed out)
    Skipped,
    /// The surface can no longer be used
    Fatal,
}

/// Clear, draw every renderable with `program`, paint the overlay on top and
/// present. Validation errors raised while recording are logged, never fatal.
pub fn draw_frame(
    gpu: &GpuContext,
    depth_view: &wgpu::TextureView,
    program: &ShaderProgram,
    wireframe: bool,
    renderables: &mut [Renderable],
    overlay: Option<(&mut egui_wgpu::Renderer, OverlayPaint)>,
) -> FrameOutcome {
    let frame = match gpu.surface.get_current_texture() {
        Ok(frame) => frame,
        Err(SurfaceError::Lost | SurfaceError::Outdated) => {
            tracing::debug!("surface lost or outdated; reconfiguring");
            gpu.reconfigure();
            return FrameOutcome::Skipped;
        }
        Err(SurfaceError::OutOfMemory) => {
            tracing::error!("surface out of memory");
            return FrameOutcome::Fatal;
        }
        Err(e) => {
            tracing::warn!("skipping frame: {e}");
            return FrameOutcome::Skipped;
        }
    };

    let device = &gpu.device;
    let queue = &gpu.queue;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let view = frame.texture.create_view(&TextureViewDescriptor::default());
    let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
        label: Some("frame_encoder"),
    });

    {
        let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(CLEAR_COLOR),
                    store: StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // an invalid program still clears the frame
        if program.is_valid() {
            program.use_program(&mut rp, wireframe);
            for renderable in renderables.iter_mut() {
                renderable.draw(queue, &mut rp);
            }
        }
    }

    if let Some((renderer, paint)) = overlay {
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: paint.pixels_per_point,
        };

        for (id, image_delta) in &paint.textures_delta.set {
            renderer.update_texture(device, queue, *id, image_delta);
        }
        renderer.update_buffers(device, queue, &mut encoder, &paint.primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("overlay_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            renderer.render(&mut egui_pass.forget_lifetime(), &paint.primitives, &screen_descriptor);
        }

        for id in &paint.textures_delta.free {
            renderer.free_texture(id);
        }
    }

    queue.submit(std::iter::once(encoder.finish()));

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        tracing::error!("validation error while drawing frame: {err}");
    }

    frame.present();
    FrameOutcome::Presented
}
