use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString};
use log::{debug, info};
use serde_json::{Map, Value};

use crate::{
    feature::{Feature, FeatureSet, Layer},
    geometry::Geometry,
};


const GEOMETRY_KINDS: [&str; 7] = [
    "Point", "MultiPoint", "LineString", "MultiLineString", "Polygon", "MultiPolygon", "GeometryCollection",
];


/// `[x, y, ...]`; anything after the first two numbers (altitude) is ignored
fn coord(position: &[f64]) -> Option<Coord> {
    match position {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn line(positions: &[geojson::Position]) -> LineString {
    positions.iter().filter_map(|p| coord(p)).collect()
}

fn rings(lines: &[Vec<geojson::Position>]) -> Vec<LineString> {
    lines.iter().map(|ring| line(ring)).collect()
}


/// Convert a decoded GeoJSON geometry. A point without two numbers has no geometry.
fn convert(value: &geojson::Value) -> Option<Geometry> {
    use geojson::Value as Shape;

    let geometry = match value {
        Shape::Point(position) => Geometry::Point(coord(position)?),
        Shape::MultiPoint(positions) => Geometry::MultiPoint(positions.iter().filter_map(|p| coord(p)).collect()),
        Shape::LineString(positions) => Geometry::LineString(line(positions)),
        Shape::MultiLineString(lines) => Geometry::MultiLineString(rings(lines)),
        Shape::Polygon(polygon) => Geometry::Polygon(rings(polygon)),
        Shape::MultiPolygon(polygons) => Geometry::MultiPolygon(polygons.iter().map(|p| rings(p)).collect()),
        Shape::GeometryCollection(members) => Geometry::GeometryCollection(
            members.iter().filter_map(|member| convert(&member.value)).collect()
        ),
    };

    Some(geometry)
}


/// Decode a GeoJSON geometry object.
///
/// Kinds GeoJSON does not define become [`Geometry::Unsupported`]. A known kind
/// that fails to decode gives `None`, as does anything that is not a geometry
/// object at all (including `null`).
pub fn decode_geometry(value: &Value) -> Option<Geometry> {
    let kind = value.get("type")?.as_str()?;
    if !GEOMETRY_KINDS.contains(&kind) {
        return Some(Geometry::Unsupported(kind.to_string()));
    }

    match geojson::Geometry::try_from(value.clone()) {
        Ok(geometry) => convert(&geometry.value),
        Err(err) => {
            debug!("Could not decode {kind}: {err}");
            None
        },
    }
}


/// What is wrong with a `FeatureCollection` member, if anything
fn check_member(member: &Value) -> Option<&'static str> {
    if member.get("type").and_then(Value::as_str) != Some("Feature") {
        return Some("not a Feature");
    }

    let has_kind = member.get("geometry")
        .and_then(|geometry| geometry.get("type"))
        .and_then(Value::as_str)
        .is_some_and(|kind| !kind.is_empty());
    if !has_kind {
        return Some("missing geometry");
    }

    if !member.get("properties").is_some_and(Value::is_object) {
        return Some("missing properties");
    }

    None
}


/// Features of a GeoJSON `FeatureCollection`.
///
/// Every member must be a `Feature` with a typed geometry and a properties object.
/// All offending members are listed by index otherwise.
pub fn parse_feature_collection(value: &Value) -> Result<Vec<Feature>> {
    let kind = value.get("type").and_then(Value::as_str);
    if kind != Some("FeatureCollection") {
        bail!("Expected a GeoJSON FeatureCollection, got {}", kind.unwrap_or("no type"));
    }

    let Some(members) = value.get("features").and_then(Value::as_array) else {
        bail!("FeatureCollection.features must be an array");
    };

    let invalid: Vec<_> = members.iter()
        .enumerate()
        .filter_map(|(i, member)| check_member(member).map(|problem| format!("Index {i}: {problem}")))
        .collect();

    if !invalid.is_empty() {
        bail!("Invalid features found:\n{}", invalid.join("\n"));
    }

    let features = members.iter()
        .enumerate()
        .map(|(i, member)| {
            let geometry = member.get("geometry").and_then(decode_geometry);
            if geometry.is_none() {
                debug!("Feature {i} has no usable geometry");
            }

            let properties = member.get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            Feature::default()
                .with_geometry(geometry)
                .with_properties(properties)
        })
        .collect();

    Ok(features)
}


pub fn load_feature_collection(path: &Path) -> Result<Vec<Feature>> {
    let file = File::open(path).with_context(|| format!("Could not open {path:?}"))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{path:?} is not valid JSON"))?;

    parse_feature_collection(&value).with_context(|| format!("Could not read {path:?}"))
}


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerSummary {
    pub features: usize,
    pub vertices: usize,
}


#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub features: usize,
    pub vertices: usize,
    /// Keyed by the `layer` property, `unknown` when there is none
    pub by_layer: BTreeMap<String, LayerSummary>,
}


pub fn summarise(features: &[Feature]) -> Summary {
    let mut summary = Summary::default();

    for feature in features {
        let layer = feature.text_property("layer").unwrap_or("unknown");
        let vertices = feature.vertex_count();

        let entry = summary.by_layer.entry(layer.to_string()).or_default();
        entry.features += 1;
        entry.vertices += vertices;

        summary.features += 1;
        summary.vertices += vertices;
    }

    summary
}


fn property<'f>(feature: &'f Feature, key: &str) -> &'f str {
    feature.properties.get(key).and_then(Value::as_str).unwrap_or("")
}


/// Point features for the positions listed in a building's `entrances` property
fn building_entrances(building: &Feature) -> Vec<Feature> {
    let Some(listed) = building.properties.get("entrances").and_then(Value::as_array) else {
        return vec![];
    };

    let name = building.name();
    let parent = building.properties.get("id")
        .filter(|id| !id.is_null())
        .cloned()
        .or_else(|| name.map(Value::from))
        .unwrap_or_else(|| Value::from("unknown"));

    listed.iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let position: geojson::Position = serde_json::from_value(value.clone()).ok()?;
            let at = coord(&position)?;

            let mut properties = Map::new();
            properties.insert("name".into(), format!("{} - Entrance {}", name.unwrap_or("Building"), i + 1).into());
            properties.insert("layer".into(), "entrances".into());
            properties.insert("parentBuilding".into(), parent.clone());

            Some(Feature::new(Geometry::Point(at)).with_properties(properties))
        })
        .collect()
}


/// Sort source features into map layers by their `layer`, `type` and `tag` properties.
/// Features matching no rule are dropped.
pub fn filter_layers(features: &[Feature]) -> FeatureSet {
    let mut set = Layer::ALL.iter().fold(FeatureSet::new(), |set, layer| set.with_layer(*layer, vec![]));
    let mut dropped = 0;

    for feature in features {
        let is_point = matches!(feature.geometry, Some(Geometry::Point(..)));

        let layer = match (property(feature, "layer"), property(feature, "type")) {
            ("footprints", _) if property(feature, "tag") == "campus_structure" => {
                for entrance in building_entrances(feature) {
                    set.push(Layer::Entrances, entrance);
                }
                Some(Layer::Buildings)
            },
            ("entrances", _) if is_point => Some(Layer::Entrances),
            ("thoroughfares", "pedestrian_link") => Some(Layer::Paths),
            ("thoroughfares", "major_street") => Some(Layer::MajorStreets),
            ("thoroughfares", "street") => Some(Layer::Streets),
            ("street_labels", _) if is_point => Some(Layer::StreetLabels),
            _ => None,
        };

        match layer {
            Some(layer) => set.push(layer, feature.clone()),
            None => dropped += 1,
        }
    }

    debug!("Dropped {dropped} features matching no layer");

    let counts: Vec<_> = set.layers()
        .map(|(layer, features)| format!("{} {}", features.len(), layer.name()))
        .collect();
    info!("Filtered into {}", counts.join(", "));

    set
}
