//! Interactive Pythagoras-tree viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the generation state
//! (pipeline, growth timer, geometry cache, current tree) and implements
//! [`eframe::App`] to feed pointer/timer events in and draw the result.

use eframe::App;
use glam::DVec2;
use pyth_core::{
    config::{Config, ConfigError},
    geometry::GeometryCache,
    palette,
    pipeline::{Event, Pipeline, RootParams, Ticker},
    tree::Tree,
};

/// Main application state for the interactive viewer.
///
/// The per-frame update is:
/// 1. Collect pointer moves that land on the drawing surface.
/// 2. Poll the growth [`Ticker`] with the current frame time.
/// 3. Push both into the [`Pipeline`], drain it and apply the latest
///    [`RootParams`], regenerating the [`Tree`] when one is produced.
/// 4. Draw every drawable node, coloured by its level.
///
/// ### Fields
/// - `cfg` - Surface layout and growth settings.
/// - `pipeline` - Latest-value join of pointer and timer events.
/// - `ticker` - Growth timer, restarted by "Replay".
/// - `cache` - Geometry memo cache shared by every regeneration.
/// - `tree` - The tree currently on screen.
/// - `params` - Parameters `tree` was generated from.
pub struct Viewer {
    cfg: Config,
    pipeline: Pipeline,
    ticker: Ticker,
    cache: GeometryCache,
    tree: Tree,
    params: RootParams,
}

impl Viewer {
    /// Creates a viewer showing the bare trunk, with growth starting at `t = 0`.
    pub fn new(cfg: Config) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let pipeline = Pipeline::new(&cfg)?;
        let ticker = Ticker::from_config(&cfg, 0.0);
        let mut cache = GeometryCache::new();
        let params = RootParams {
            height_factor: 0.0,
            lean: 0.0,
            max_level: 0,
        };
        let tree = Tree::generate(params.trunk(&cfg), &mut cache, cfg.min_width);

        Ok(Self {
            cfg,
            pipeline,
            ticker,
            cache,
            tree,
            params,
        })
    }

    /// Restarts the growth animation from level 1 at time `now`.
    fn replay(&mut self, now: f64) {
        self.ticker.restart(now);
        self.pipeline.reset_level();
        log::info!("replaying growth from t={now:.2}");
    }

    /// Feeds one frame's worth of input through the pipeline.
    ///
    /// Returns `true` when the tree was regenerated.
    fn step(&mut self, now: f64, pointer_moves: impl IntoIterator<Item = DVec2>) -> bool {
        for pos in pointer_moves {
            self.pipeline.push(Event::PointerMoved(pos));
        }
        for level in self.ticker.poll(now) {
            self.pipeline.push(Event::Tick(level));
        }
        self.pipeline.drain();

        let Some(params) = self.pipeline.apply() else {
            return false;
        };
        self.params = params;
        self.tree = Tree::generate(params.trunk(&self.cfg), &mut self.cache, self.cfg.min_width);
        true
    }

    /// Uniform scale and top-left corner that fit the surface into `rect`.
    fn surface_fit(&self, rect: egui::Rect) -> (f32, egui::Pos2) {
        let size = self.cfg.surface.as_vec2();
        let scale = (rect.width() / size.x).min(rect.height() / size.y);
        let offset = (rect.size() - egui::vec2(size.x, size.y) * scale) * 0.5;
        (scale, rect.min + offset)
    }

    /// Screen rectangle occupied by the surface inside `rect`.
    fn surface_rect(&self, rect: egui::Rect) -> egui::Rect {
        let (scale, origin) = self.surface_fit(rect);
        let size = self.cfg.surface.as_vec2() * scale;
        egui::Rect::from_min_size(origin, egui::vec2(size.x, size.y))
    }

    /// Converts a surface-space position to screen-space.
    fn surface_to_screen(&self, p: DVec2, rect: egui::Rect) -> egui::Pos2 {
        let (scale, origin) = self.surface_fit(rect);
        let p = p.as_vec2();
        egui::pos2(origin.x + p.x * scale, origin.y + p.y * scale)
    }

    /// Converts a screen-space position back to surface-space.
    ///
    /// This is the inverse of [`Viewer::surface_to_screen`] up to
    /// floating point rounding.
    fn screen_to_surface(&self, p: egui::Pos2, rect: egui::Rect) -> DVec2 {
        let (scale, origin) = self.surface_fit(rect);
        DVec2::new(
            ((p.x - origin.x) / scale) as f64,
            ((p.y - origin.y) / scale) as f64,
        )
    }

    /// Surface position of a pointer, or `None` when it is off the surface.
    fn pointer_on_surface(&self, p: egui::Pos2, rect: egui::Rect) -> Option<DVec2> {
        self.surface_rect(rect)
            .contains(p)
            .then(|| self.screen_to_surface(p, rect))
    }

    /// Builds the top panel (replay control).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⟲ Replay").clicked() {
                    let now = ctx.input(|i| i.time);
                    self.replay(now);
                }
                ui.separator();
                ui.label("Move the pointer over the canvas to shape the tree.");
            });
        });
    }

    /// Builds the bottom status bar.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dropped moves = {}", self.pipeline.dropped()));
                ui.label(format!("cached = {}", self.cache.len()));
                ui.separator();
                ui.label(format!("lean = {:.3}", self.params.lean));
                ui.label(format!("height = {:.3}", self.params.height_factor));
                ui.label(format!(
                    "level = {}/{}",
                    self.tree.depth(),
                    self.params.max_level
                ));
                ui.label(format!("nodes = {}", self.tree.len()));
            });
        });
    }

    /// Builds the central panel where the tree is drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::hover());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            let moves: Vec<DVec2> = ctx.input(|i| {
                i.events
                    .iter()
                    .filter_map(|e| match e {
                        egui::Event::PointerMoved(p) => self.pointer_on_surface(*p, rect),
                        _ => None,
                    })
                    .collect()
            });
            let now = ctx.input(|i| i.time);
            self.step(now, moves);

            painter.rect_filled(self.surface_rect(rect), 0.0, egui::Color32::from_gray(12));

            for node in self.tree.nodes.iter().filter(|n| n.is_drawable()) {
                let [r, g, b, a] =
                    palette::level_fill(node.triangle.level, node.triangle.max_level);
                let points = node
                    .outline()
                    .map(|p| self.surface_to_screen(p, rect))
                    .to_vec();
                painter.add(egui::Shape::convex_polygon(
                    points,
                    egui::Color32::from_rgba_unmultiplied(r, g, b, a),
                    egui::Stroke::NONE,
                ));
            }

            if !self.ticker.is_finished() {
                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_central_panel(ctx);
    }
}
