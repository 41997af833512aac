mod scenarios;

use std::{f64::consts::TAU, path::Path};

use anyhow::{ensure, Result};
use geo::{Coord, LineString};

use crate::{
    feature::{Feature, FeatureSet},
    geometry::{Geometry, Page},
    io::svg_output::{save_drawing, ExportInfo},
    render::{render, Drawing, RenderOptions},
    simplify::{metres_to_degrees, simplify_layers, Backend},
    style::StyleTable,
};

pub const OUTDIR: &'_ str = "tmp/test-output/";

/// Somewhere downtown, near the latitude the metre conversion is made for
pub const ORIGIN: Coord = Coord { x: -73.578, y: 45.497 };

fn ensure_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    ensure!(dir.is_dir(), "{dir:?} should be a directory");
    Ok(())
}

pub fn init_test_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .format_timestamp(None)
        .format_target(false)
        .is_test(true)
        .try_init();
}

/// Simplify, style and render `features`, saving the drawing as `output-{name}.svg`
pub fn run(name: &str, features: &FeatureSet, options: RenderOptions) -> Result<Drawing> {
    init_test_logger();
    ensure_dir(&OUTDIR)?;

    let tolerance = 2.0;
    let page = Page::default();

    let simplified = simplify_layers(features, tolerance, Backend::Native);
    let styled = StyleTable::default().apply(&simplified.features);
    let drawing = render(&styled, &page, &options)?;

    let info = ExportInfo {
        name,
        page: &page,
        layout: options.layout,
        tolerance,
        reduction: simplified.stats.reduction(),
    };

    let output = format!("output-{name}");
    let output = Path::new(OUTDIR).join(output).with_extension("svg");
    save_drawing(&output, &drawing, &info)?;

    Ok(drawing)
}

/// A point `east` and `north` metres away from `ORIGIN`
pub fn at(east: f64, north: f64) -> Coord {
    Coord {
        x: ORIGIN.x + metres_to_degrees(east),
        y: ORIGIN.y + metres_to_degrees(north),
    }
}

/// A closed ring of `vertices` points (closing point included) around `center`
pub fn make_ring(center: (f64, f64), radius: f64, vertices: usize) -> LineString {
    let n = vertices - 1;
    let mut ring: Vec<_> = (0..n)
        .map(|i| {
            let a = TAU * i as f64 / n as f64;
            at(center.0 + radius * a.cos(), center.1 + radius * a.sin())
        })
        .collect();
    ring.push(ring[0]);

    LineString::new(ring)
}

pub fn make_building(name: &str, center: (f64, f64), radius: f64, vertices: usize) -> Feature {
    Feature::new(Geometry::Polygon(vec![make_ring(center, radius, vertices)]))
        .with_property("name", name)
}

/// A street through `points` (metres from `ORIGIN`)
pub fn make_street(name: &str, points: &[(f64, f64)]) -> Feature {
    let line = points.iter().map(|&(e, n)| at(e, n)).collect();
    Feature::new(Geometry::LineString(line))
        .with_property("name", name)
}

pub fn make_point(name: &str, east: f64, north: f64) -> Feature {
    Feature::new(Geometry::Point(at(east, north)))
        .with_property("name", name)
}
