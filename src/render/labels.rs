use std::collections::HashSet;

use geo::{Coord, LineString};
use log::debug;
use svg::node::element::Text;

use crate::{
    feature::Feature,
    geometry::{round3, Geometry, MarginSide, Projection},
};


const FONT_FAMILY: &str = "Arial, sans-serif";

const STREET_FONT_SIZE: f64 = 2.2;
const STREET_COLOR: &str = "#444444";
const STREET_DY: f64 = -0.6;

const MARGIN_FONT_SIZE: f64 = 2.8;
const MARGIN_COLOR: &str = "#222222";


/// Fold an angle in degrees into (-90, 90] so text never reads upside down
pub fn upright_angle(degrees: f64) -> f64 {
    let mut angle = degrees % 360.0;

    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }

    if angle > 90.0 {
        angle -= 180.0;
    } else if angle <= -90.0 {
        angle += 180.0;
    }

    angle
}


/// Names drawn during one render pass. The first feature with a name wins.
#[derive(Default)]
pub struct SeenNames(HashSet<String>);

impl SeenNames {
    fn first(&mut self, name: &str) -> bool {
        self.0.insert(name.to_string())
    }
}


/// The line a street label is placed along
fn representative_line(geometry: &Geometry) -> Option<&LineString> {
    match geometry {
        Geometry::LineString(line) => Some(line),
        Geometry::MultiLineString(lines) => lines.iter().find(|l| l.0.len() >= 2),
        _ => None,
    }
}


/// Midpoint and upright angle of the middle segment of `line`, in page space
fn anchor(line: &LineString, projection: &Projection) -> Option<(Coord, f64)> {
    let coords = &line.0;
    if coords.len() < 2 {
        return None;
    }

    let mid = coords.len() / 2;
    let a = projection.project(coords[mid - 1]);
    let b = projection.project(coords[mid]);

    let centre = Coord {
        x: round3((a.x + b.x) / 2.0),
        y: round3((a.y + b.y) / 2.0),
    };
    let angle = (b.y - a.y).atan2(b.x - a.x).to_degrees();

    Some((centre, round3(upright_angle(angle))))
}


fn street_text(name: &str, at: Coord, angle: f64) -> Text {
    let mut text = Text::new(name)
        .set("x", at.x)
        .set("y", at.y)
        .set("text-anchor", "middle")
        .set("font-family", FONT_FAMILY)
        .set("font-size", STREET_FONT_SIZE)
        .set("fill", STREET_COLOR)
        .set("dy", STREET_DY);

    if angle != 0.0 {
        text = text.set("transform", format!("rotate({angle} {} {})", at.x, at.y));
    }

    text
}


/// Labels along named major streets, rotated to follow the street
pub fn street_labels(streets: &[Feature], projection: &Projection, seen: &mut SeenNames) -> Vec<Text> {
    let mut labels = vec![];

    for feature in streets {
        let Some(name) = feature.name() else {
            continue;
        };

        let Some((at, angle)) = feature.geometry.as_ref()
            .and_then(representative_line)
            .and_then(|line| anchor(line, projection))
        else {
            continue;
        };

        if !at.x.is_finite() || !at.y.is_finite() || !seen.first(name) {
            continue;
        }

        labels.push(street_text(name, at, angle));
    }

    labels
}


/// Unrotated labels at named label points
pub fn point_labels(points: &[Feature], projection: &Projection, seen: &mut SeenNames) -> Vec<Text> {
    let mut labels = vec![];

    for feature in points {
        let Some(name) = feature.name() else {
            continue;
        };

        let Some(at) = feature.geometry.as_ref().and_then(Geometry::centroid) else {
            continue;
        };

        let at = projection.project(at);
        if !at.x.is_finite() || !at.y.is_finite() || !seen.first(name) {
            continue;
        }

        labels.push(street_text(name, at, 0.0));
    }

    labels
}


/// Labels moved into the margin strip named by each feature's `side` tag.
/// Features without a usable side or name are skipped.
pub fn margin_labels(features: &[Feature], projection: &Projection, seen: &mut SeenNames) -> Vec<Text> {
    let mut labels = vec![];

    for feature in features {
        let Some(name) = feature.name() else {
            debug!("Skipping a margin label without a name");
            continue;
        };

        let Some(side) = feature.text_property("side").and_then(MarginSide::parse) else {
            debug!("Skipping margin label {name:?}: no usable side tag");
            continue;
        };

        let Some(source) = feature.geometry.as_ref().and_then(Geometry::centroid) else {
            debug!("Skipping margin label {name:?}: no coordinates");
            continue;
        };

        let at = projection.place_margin_label(source, side);
        if !at.x.is_finite() || !at.y.is_finite() || !seen.first(name) {
            continue;
        }

        let mut text = Text::new(name)
            .set("x", at.x)
            .set("y", at.y)
            .set("text-anchor", "middle")
            .set("dominant-baseline", "middle")
            .set("font-family", FONT_FAMILY)
            .set("font-size", MARGIN_FONT_SIZE)
            .set("fill", MARGIN_COLOR)
            .set("data-side", format!("{side:?}").to_lowercase());

        let rotation = match side {
            MarginSide::Left => Some(-90),
            MarginSide::Right => Some(90),
            MarginSide::Top | MarginSide::Bottom => None,
        };
        if let Some(rotation) = rotation {
            text = text.set("transform", format!("rotate({rotation} {} {})", at.x, at.y));
        }

        labels.push(text);
    }

    labels
}
