pub mod config;
pub mod feature;
pub mod geometry;
pub mod io;
pub mod render;
pub mod simplify;
pub mod style;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use config::MapConfig;
use log::{error, info};

use crate::{
    io::{geojson_input::{filter_layers, load_feature_collection, summarise}, svg_output::{save_drawing, ExportInfo}},
    render::render,
    simplify::simplify_layers,
    style::StyleTable,
};


#[derive(Parser)]
pub struct Args {
    /// Path to the map config.
    pub config: PathBuf,
}


fn main() {
    if let Err(_) = std::env::var("RUST_LOG") {
        unsafe { std::env::set_var("RUST_LOG", "info") };
    }

    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("{err:#}");
        std::process::exit(1);
    }
}


fn run(args: Args) -> Result<()> {
    let file = std::fs::File::open(&args.config).with_context(|| format!("Could not open {:?}", args.config))?;
    let config: MapConfig = serde_norway::from_reader(file)?;

    ensure!(config.tolerance.is_finite() && config.tolerance >= 0.0, "Tolerance should be a non-negative distance, got {}", config.tolerance);

    if !config.outdir.exists() {
        std::fs::create_dir_all(&config.outdir)?;
    }
    ensure!(config.outdir.is_dir(), "{:?} should be a directory", config.outdir);

    let source = load_feature_collection(&config.input)?;
    let summary = summarise(&source);

    info!("Loaded {} features with {} vertices", summary.features, summary.vertices);
    for (layer, s) in &summary.by_layer {
        info!("  {layer}: {} features, {} vertices", s.features, s.vertices);
    }

    let layers = filter_layers(&source);
    ensure!(!layers.is_empty(), "No feature in {:?} belongs to a map layer", config.input);

    let simplified = simplify_layers(&layers, config.tolerance, config.simplifier);

    let styled = StyleTable::default()
        .with_overrides(&config.styles)
        .apply(&simplified.features);

    let drawing = render(&styled, &config.page, &config.render_options())?;

    let output_path = config.outdir.join(format!("{}.svg", config.name));
    let info = ExportInfo {
        name: &config.name,
        page: &config.page,
        layout: config.layout,
        tolerance: config.tolerance,
        reduction: simplified.stats.reduction(),
    };
    save_drawing(&output_path, &drawing, &info)?;

    info!("Produced {output_path:?}");

    Ok(())
}
