//! Interactive top-down boids viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Simulation`] and
//! implements [`eframe::App`] to drive it from the frame clock and render
//! it. The 3-D world is drawn looking straight down the `y` axis: world
//! `x` maps to screen right and world `z` to screen down. Boid height is
//! shown through brightness.

use boids_core::{Params, RunState, Simulation};
use eframe::App;
use glam::Vec3;
use tracing::error;

/// Main application state for the interactive viewer.
///
/// ### Fields
/// - `sim` - The simulation being shown and controlled.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space pan offset in pixels.
/// - `follow_pointer` - Whether hovering the view moves the seek target.
/// - `last_dt` - Elapsed time passed to the last tick (for display only).
pub struct Viewer {
    sim: Simulation,

    zoom: f32,
    pan: egui::Vec2,

    follow_pointer: bool,
    last_dt: f32,
}

impl Viewer {
    /// Creates a viewer showing `sim`.
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim,
            zoom: 8.0,
            pan: egui::vec2(0.0, 0.0),
            follow_pointer: true,
            last_dt: 0.0,
        }
    }

    /// Converts a world-space position to screen-space, dropping height.
    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y + p.z * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position to a point on the `y = 0` plane.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec3 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let z = (p.y - center.y - self.pan.y) / self.zoom;
        Vec3::new(x, 0.0, z)
    }

    /// Advances the simulation by one frame.
    ///
    /// A failed tick means the engine's internal state is inconsistent;
    /// the error is logged and the simulation paused.
    fn step(&mut self, dt: f32) {
        self.last_dt = dt;
        if let Err(err) = self.sim.tick(dt) {
            error!(%err, "tick failed, pausing");
            if self.sim.is_running() {
                self.sim.toggle_run();
            }
        }
    }

    /// Brightness factor for a boid at height `y`.
    fn height_shade(&self, y: f32) -> f32 {
        let bound = self.sim.field().boundary().half_extent.max(f32::EPSILON);
        (0.35 + 0.65 * (y / bound * 0.5 + 0.5)).clamp(0.35, 1.0)
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, modes, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.sim.is_running() { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.sim.toggle_run();
                }

                if ui.button("Reset").clicked() {
                    self.sim.reset();
                }

                ui.separator();
                let modes = self.sim.modes();
                if ui.selectable_label(modes.seeking, "Goal seeking").clicked() {
                    self.sim.toggle_seeking();
                }
                if ui.selectable_label(modes.obstacles, "Obstacles").clicked() {
                    self.sim.toggle_obstacles();
                }
                ui.checkbox(&mut self.follow_pointer, "Target follows pointer");

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 1.0..=40.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt = {:.4} s", self.last_dt));
                ui.label(format!("ticks = {}", self.sim.tick_count()));
                ui.separator();
                ui.label(format!("boids = {}", self.sim.boids().len()));
                let target = self.sim.target();
                ui.label(format!(
                    "target = ({:.1}, {:.1}, {:.1})",
                    target.x, target.y, target.z
                ));
                ui.label(match self.sim.state() {
                    RunState::Running => "running",
                    RunState::Paused => "paused",
                });
            });
        });
    }

    /// Builds the right-hand panel with every live parameter.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Params");
                let p = self.sim.params_mut();

                ui.separator();
                ui.label("Flocking");
                Self::labeled_drag_f32(ui, "avoid_factor:", &mut p.avoid_factor, 0.0..=250.0, 0.5);
                Self::labeled_drag_f32(ui, "align_factor:", &mut p.align_factor, 0.0..=50.0, 0.1);
                Self::labeled_drag_f32(
                    ui,
                    "cohesion_factor:",
                    &mut p.cohesion_factor,
                    0.0..=250.0,
                    0.5,
                );
                Self::labeled_drag_f32(
                    ui,
                    "seeking_factor:",
                    &mut p.seeking_factor,
                    0.0..=15.0,
                    0.05,
                );

                ui.separator();
                ui.label("Ranges");
                Self::labeled_drag_f32(
                    ui,
                    "protected_range:",
                    &mut p.protected_range,
                    0.0..=15.0,
                    0.05,
                );
                Self::labeled_drag_f32(
                    ui,
                    "visibility_range:",
                    &mut p.visibility_range,
                    0.0..=50.0,
                    0.1,
                );
                Self::labeled_drag_usize(ui, "nearest_count:", &mut p.nearest_count, 0..=50, 1.0);

                ui.separator();
                ui.label("Motion");
                Self::labeled_drag_f32(
                    ui,
                    "velocity_limit:",
                    &mut p.velocity_limit,
                    0.0..=150.0,
                    0.5,
                );

                ui.separator();
                ui.label("Obstacle avoidance");
                Self::labeled_drag_f32(
                    ui,
                    "detect_range:",
                    &mut p.obstacle_detect_range,
                    0.0..=50.0,
                    0.1,
                );
                Self::labeled_drag_f32(
                    ui,
                    "avoid_strength:",
                    &mut p.obstacle_avoid_factor,
                    0.0..=50_000.0,
                    50.0,
                );

                ui.separator();
                if ui.button("Reset params to default").clicked() {
                    self.sim.set_params(Params::default());
                }
            });
    }

    /// Builds the central panel where the world is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Pointer picks the seek target on the ground plane.
            if self.follow_pointer {
                if let Some(p) = response.hover_pos() {
                    self.sim.set_target(self.screen_to_world(p, rect));
                }
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(1.0, 40.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Advance before drawing so the frame shows the new state.
            if self.sim.is_running() {
                let dt = ctx.input(|i| i.stable_dt);
                self.step(dt);
                ctx.request_repaint();
            }

            // Boundary.
            let bound = self.sim.field().boundary().half_extent;
            let corners = [
                Vec3::new(-bound, 0.0, -bound),
                Vec3::new(bound, 0.0, -bound),
                Vec3::new(bound, 0.0, bound),
                Vec3::new(-bound, 0.0, bound),
            ];
            let outline: Vec<egui::Pos2> = corners
                .iter()
                .map(|&c| self.world_to_screen(c, rect))
                .collect();
            painter.add(egui::Shape::closed_line(
                outline,
                egui::Stroke::new(1.0, egui::Color32::from_rgb(0x44, 0x44, 0x88)),
            ));

            // Obstacles, dimmed while avoidance is switched off.
            let obstacle_color = if self.sim.modes().obstacles {
                egui::Color32::from_rgb(0x44, 0x88, 0x44)
            } else {
                egui::Color32::from_rgb(0x2a, 0x3a, 0x2a)
            };
            for o in self.sim.field().obstacles() {
                let p = self.world_to_screen(o.center, rect);
                painter.circle_filled(p, o.radius * self.zoom, obstacle_color);
            }

            // Boids as arrowheads along their horizontal heading.
            for b in self.sim.boids() {
                let tip_dir = egui::vec2(b.vel.x, b.vel.z);
                let dir = if tip_dir.length_sq() > 0.0 {
                    tip_dir.normalized()
                } else {
                    egui::vec2(1.0, 0.0)
                };
                let side = egui::vec2(-dir.y, dir.x);
                let c = self.world_to_screen(b.pos, rect);
                let size = (0.75 * self.zoom).max(3.0);
                let points = vec![
                    c + dir * size * 1.5,
                    c - dir * size + side * size * 0.6,
                    c - dir * size - side * size * 0.6,
                ];

                let shade = self.height_shade(b.pos.y);
                let color = egui::Color32::from_rgb(
                    (0x33 as f32 * shade) as u8,
                    (0x88 as f32 * shade) as u8,
                    (0xdd as f32 * shade) as u8,
                );
                painter.add(egui::Shape::convex_polygon(points, color, egui::Stroke::NONE));
            }

            // Seek target.
            if self.sim.modes().seeking {
                let t = self.world_to_screen(self.sim.target(), rect);
                painter.circle_filled(t, (0.5 * self.zoom).max(3.0), egui::Color32::YELLOW);
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boids_core::WorldConfig;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn test_viewer() -> Viewer {
        Viewer::new(Simulation::new(
            WorldConfig {
                boid_count: 30,
                seed: Some(1),
                ..WorldConfig::default()
            },
            Params::default(),
        ))
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip_on_ground_plane() {
        let mut viewer = test_viewer();
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, -5.0),
            Vec3::new(-3.5, 0.0, 8.25),
        ];

        let eps = 1e-4;
        for p in world_points {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);
            assert!(
                (back - p).length() < eps,
                "roundtrip mismatch: p={:?}, back={:?}",
                p,
                back
            );
        }
    }

    #[test]
    fn height_is_dropped_by_projection() {
        let viewer = test_viewer();
        let rect = test_rect();
        let low = viewer.world_to_screen(Vec3::new(1.0, -10.0, 2.0), rect);
        let high = viewer.world_to_screen(Vec3::new(1.0, 10.0, 2.0), rect);
        assert_eq!(low, high);
        assert!(viewer.height_shade(10.0) > viewer.height_shade(-10.0));
    }

    #[test]
    fn step_only_moves_a_running_simulation() {
        let mut viewer = test_viewer();
        let before = viewer.sim.boids().to_vec();

        viewer.step(0.016);
        assert_eq!(viewer.sim.boids(), &before[..]);
        assert_eq!(viewer.last_dt, 0.016);

        viewer.sim.toggle_run();
        viewer.step(0.016);
        assert_ne!(viewer.sim.boids(), &before[..]);
        assert_eq!(viewer.sim.tick_count(), 1);
    }
}
