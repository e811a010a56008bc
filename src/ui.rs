use egui::Context;

use crate::model::{Camera, Scene};

/// Values shown in the debug overlay for one frame.
pub struct OverlayStats<'a> {
    pub camera: &'a Camera,
    pub scene: &'a Scene,
    pub dt: f32,
    pub wireframe: bool,
    pub wireframe_supported: bool,
}

/// Lay out the debug overlay for this frame.
pub fn build_overlay(ctx: &Context, stats: &OverlayStats) {
    draw_debug_window(ctx, stats);
}

fn draw_debug_window(ctx: &Context, stats: &OverlayStats) {
    let pos = stats.camera.position;
    let fps = if stats.dt > 0.0 { 1.0 / stats.dt } else { 0.0 };
    let wireframe = match (stats.wireframe_supported, stats.wireframe) {
        (false, _) => "unsupported",
        (true, true) => "on",
        (true, false) => "off",
    };

    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("FPS: {fps:.0}")).small());
            ui.label(
                egui::RichText::new(format!("Pos: x: {:.2} y: {:.2} z: {:.2}", pos.x, pos.y, pos.z)).small(),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Yaw: {:.1} Pitch: {:.1}",
                    stats.camera.yaw(),
                    stats.camera.pitch()
                ))
                .small(),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Renderables: {}  Lights: {}",
                    stats.scene.len(),
                    stats.scene.lights.len()
                ))
                .small(),
            );
            ui.label(egui::RichText::new(format!("Wireframe: {wireframe}")).small());
            ui.separator();
            ui.label(egui::RichText::new("Controls:").small());
            ui.label(egui::RichText::new("WASD - Move").small());
            ui.label(egui::RichText::new("Q/E - Down/Up").small());
            ui.label(egui::RichText::new("Arrows - Rotate object").small());
            ui.label(egui::RichText::new("F - Toggle wireframe").small());
            ui.label(egui::RichText::new("F1 - Toggle overlay").small());
            ui.label(egui::RichText::new("Esc - Quit").small());
        });
}
