use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use glam::DVec2;
use log::{info, warn};
use pyth_core::{
    config::Config,
    geometry::GeometryCache,
    pipeline::{Dispatch, Pipeline, RootParams},
    tree::Tree,
};

use crate::{export, viewer::Viewer};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "pythagoras_tree",
    about = "Animated Pythagoras-tree fractal driven by the pointer."
)]
pub struct AppConfig {
    /// Drawing surface width in pixels
    #[arg(long, default_value_t = 1280.0)]
    pub width: f64,

    /// Drawing surface height in pixels
    #[arg(long, default_value_t = 600.0)]
    pub height: f64,

    /// Base width of the trunk
    #[arg(long, default_value_t = 80.0)]
    pub trunk: f64,

    /// Branches narrower than this stop growing
    #[arg(long, default_value_t = 1.0)]
    pub min_width: f64,

    /// Final recursion ceiling, reached one tick at a time
    #[arg(long, default_value_t = 11)]
    pub max_level: u32,

    /// Milliseconds between growth ticks
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Build a single tree and print a summary instead of opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Height factor for headless mode (ignored with --pointer)
    #[arg(long, default_value_t = 0.5)]
    pub height_factor: f64,

    /// Lean for headless mode (ignored with --pointer)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub lean: f64,

    /// Simulated pointer position "X,Y" in surface pixels for headless mode
    #[arg(long, value_name = "X,Y", value_parser = parse_point, allow_hyphen_values = true)]
    pub pointer: Option<DVec2>,

    /// Write the headless tree as SVG
    #[arg(long, value_name = "PATH")]
    pub svg: Option<PathBuf>,
}

fn parse_point(s: &str) -> Result<DVec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x {x:?}: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y {y:?}: {e}"))?;
    Ok(DVec2::new(x, y))
}

impl AppConfig {
    pub fn to_config(&self) -> Config {
        Config {
            surface: DVec2::new(self.width, self.height),
            trunk_width: self.trunk,
            min_width: self.min_width,
            tick_interval: self.tick_ms as f64 / 1000.0,
            max_level: self.max_level,
            ..Config::default()
        }
    }

    /// Root parameters for headless mode, fully grown.
    pub fn headless_params(&self, cfg: &Config) -> Result<RootParams> {
        let Some(pos) = self.pointer else {
            return Ok(RootParams {
                height_factor: self.height_factor,
                lean: self.lean,
                max_level: cfg.max_level,
            });
        };

        let mut pipeline = Pipeline::new(cfg)?;
        pipeline.on_tick(cfg.max_level);
        if pipeline.on_pointer(pos) == Dispatch::Dropped {
            warn!("simulated pointer at {pos} was dropped");
        }
        pipeline
            .apply()
            .ok_or_else(|| anyhow!("pipeline produced no parameters"))
    }
}

pub fn run(args: &AppConfig) -> Result<()> {
    let cfg = args.to_config();
    cfg.validate().context("invalid configuration")?;

    if args.headless || args.svg.is_some() {
        return run_headless(args, &cfg);
    }

    info!(
        "opening {}x{} surface, growing to level {} every {} ms",
        cfg.surface.x, cfg.surface.y, cfg.max_level, args.tick_ms
    );

    let viewer = Viewer::new(cfg)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([cfg.surface.x as f32, cfg.surface.y as f32 + 64.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Pythagoras Tree",
        options,
        Box::new(move |_cc| Ok(Box::new(viewer))),
    )
    .map_err(|err| anyhow!("failed to launch egui window: {err}"))
}

fn run_headless(args: &AppConfig, cfg: &Config) -> Result<()> {
    let params = args.headless_params(cfg)?;
    let mut cache = GeometryCache::new();
    let tree = Tree::generate(params.trunk(cfg), &mut cache, cfg.min_width);

    let drawable = tree.nodes.iter().filter(|n| n.is_drawable()).count();
    println!(
        "height_factor={:.4} lean={:.4} max_level={}",
        params.height_factor, params.lean, params.max_level
    );
    println!(
        "nodes={} drawable={} leaves={} depth={} cached_geometries={}",
        tree.len(),
        drawable,
        tree.leaves().count(),
        tree.depth(),
        cache.len()
    );

    if let Some(path) = &args.svg {
        export::save(&tree, cfg, path)?;
    }
    Ok(())
}
