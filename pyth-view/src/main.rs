//! Application entry point for the Pythagoras-tree viewer.
//!
//! This binary parses the command line, sets up logging and either opens
//! the eframe/egui window (see [`viewer::Viewer`]) or builds a single tree
//! headlessly, optionally exporting it as SVG.

mod app;
mod export;
mod viewer;

use app::AppConfig;
use clap::Parser;

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();

    let config = AppConfig::parse();
    if let Err(err) = app::run(&config) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
