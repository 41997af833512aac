use std::collections::BTreeMap;

use geo::LineString;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::{
    feature::{Feature, FeatureSet, Layer},
    geometry::{guard_ring, simplify_coords, DouglasPeucker, GeoRdp, Geometry, LineSimplifier},
};

/// Metres per degree of longitude at about 45.5°N.
/// Only holds for small areas near that latitude.
pub const METRES_PER_DEGREE: f64 = 78_710.0;

pub const DEFAULT_TOLERANCE_METRES: f64 = 2.0;

pub const PROP_BEFORE: &str = "_simplify_before";
pub const PROP_AFTER: &str = "_simplify_after";
pub const PROP_REDUCTION: &str = "_simplify_reduction";


pub fn metres_to_degrees(metres: f64) -> f64 {
    metres / METRES_PER_DEGREE
}


/// `round((1 - after / before) * 100)`, 0 when there was nothing to reduce
pub fn reduction_percent(before: usize, after: usize) -> u8 {
    if before == 0 {
        return 0;
    }

    let reduction = (1.0 - after as f64 / before as f64) * 100.0;
    reduction.round().clamp(0.0, 100.0) as u8
}


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexCounts {
    pub before: usize,
    pub after: usize,
}

impl VertexCounts {
    pub fn reduction(&self) -> u8 {
        reduction_percent(self.before, self.after)
    }

    fn add(&mut self, other: VertexCounts) {
        self.before += other.before;
        self.after += other.after;
    }
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimplifyStats {
    pub totals: VertexCounts,
    pub by_layer: BTreeMap<Layer, VertexCounts>,
}

impl SimplifyStats {
    pub fn reduction(&self) -> u8 {
        self.totals.reduction()
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct SimplifyResult {
    pub features: FeatureSet,
    pub stats: SimplifyStats,
}


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Douglas-Peucker implemented here
    #[default]
    Native,
    /// `geo::Simplify`, falling back to native on failure
    Geo,
}


pub struct Simplifier {
    /// In source (degree) units
    tolerance: f64,
    accelerated: Option<Box<dyn LineSimplifier>>,
}

impl Simplifier {
    pub fn new(tolerance_metres: f64) -> Self {
        Self {
            tolerance: metres_to_degrees(tolerance_metres),
            accelerated: None,
        }
    }

    pub fn with_backend(self, backend: Backend) -> Self {
        match backend {
            Backend::Native => self,
            Backend::Geo => self.with_accelerated(Box::new(GeoRdp)),
        }
    }

    pub fn with_accelerated(self, accelerated: Box<dyn LineSimplifier>) -> Self {
        Self {
            accelerated: Some(accelerated),
            ..self
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn simplify_line(&self, line: &LineString) -> LineString {
        if let Some(accelerated) = &self.accelerated {
            match accelerated.simplify_line(line, self.tolerance) {
                Ok(simplified) => return simplified,
                Err(err) => warn!("{} failed, falling back to {}: {err}", accelerated.name(), DouglasPeucker.name()),
            }
        }

        LineString::new(simplify_coords(&line.0, self.tolerance))
    }

    fn simplify_ring(&self, ring: &LineString) -> LineString {
        guard_ring(ring, self.simplify_line(ring))
    }

    fn simplify_polygon(&self, rings: &[LineString]) -> Vec<LineString> {
        rings.iter().map(|ring| self.simplify_ring(ring)).collect()
    }

    pub fn simplify_geometry(&self, geometry: &Geometry) -> Geometry {
        match geometry {
            Geometry::LineString(line) => Geometry::LineString(self.simplify_line(line)),
            Geometry::MultiLineString(lines) => Geometry::MultiLineString(
                lines.iter().map(|line| self.simplify_line(line)).collect()
            ),
            Geometry::Polygon(rings) => Geometry::Polygon(self.simplify_polygon(rings)),
            Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(
                polygons.iter().map(|rings| self.simplify_polygon(rings)).collect()
            ),
            Geometry::GeometryCollection(members) => Geometry::GeometryCollection(
                members.iter().map(|member| self.simplify_geometry(member)).collect()
            ),
            Geometry::Point(..)
            | Geometry::MultiPoint(..)
            | Geometry::Unsupported(..) => geometry.clone(),
        }
    }

    /// A simplified copy of `feature` carrying its before/after vertex counts
    pub fn simplify_feature(&self, feature: &Feature) -> (Feature, VertexCounts) {
        let geometry = feature.geometry.as_ref().map(|g| self.simplify_geometry(g));

        let simplified = feature.clone().with_geometry(geometry);
        let counts = VertexCounts {
            before: feature.vertex_count(),
            after: simplified.vertex_count(),
        };

        let simplified = simplified
            .with_property(PROP_REDUCTION, counts.reduction())
            .with_property(PROP_BEFORE, counts.before)
            .with_property(PROP_AFTER, counts.after);

        (simplified, counts)
    }

    /// Simplify every line and polygon layer; point layers are copied unchanged.
    pub fn run(&self, features: &FeatureSet) -> SimplifyResult {
        let mut result = FeatureSet::new();
        let mut stats = SimplifyStats::default();

        for (layer, layer_features) in features.layers() {
            if !layer.is_simplifiable() {
                debug!("Passing {} {} features through", layer_features.len(), layer.name());
                result = result.with_layer(layer, layer_features.to_vec());
                continue;
            }

            let mut layer_counts = VertexCounts::default();
            let mut simplified = Vec::with_capacity(layer_features.len());

            for feature in layer_features {
                let (feature, counts) = self.simplify_feature(feature);
                layer_counts.add(counts);
                simplified.push(feature);
            }

            debug!("Layer {}: {} -> {} vertices", layer.name(), layer_counts.before, layer_counts.after);

            stats.totals.add(layer_counts);
            stats.by_layer.insert(layer, layer_counts);
            result = result.with_layer(layer, simplified);
        }

        info!("Simplified {} -> {} vertices ({}% reduction)", stats.totals.before, stats.totals.after, stats.reduction());

        SimplifyResult {
            features: result,
            stats,
        }
    }
}


/// Simplify `features` with a tolerance in metres
pub fn simplify_layers(features: &FeatureSet, tolerance_metres: f64, backend: Backend) -> SimplifyResult {
    Simplifier::new(tolerance_metres)
        .with_backend(backend)
        .run(features)
}
