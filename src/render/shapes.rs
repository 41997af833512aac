use geo::{Coord, LineString};
use svg::node::element::{path::Data, Circle, Group, Path, Polygon};

use crate::{
    feature::Feature,
    geometry::{Geometry, Projection},
    style::StyleRecord,
};


const POINT_RADIUS: f64 = 2.0;
const POINT_COLOR: &str = "#e05c5c";
const POINT_STROKE_WIDTH: f64 = 0.5;

const LINE_COLOR: &str = "#000000";
const LINE_STROKE_WIDTH: f64 = 0.5;

const POLYGON_FILL: &str = "none";
const POLYGON_COLOR: &str = "#1a1a1a";
const POLYGON_STROKE_WIDTH: f64 = 2.2;


/// Record fields with the renderer's defaults filled in
struct Paint<'s>(Option<&'s StyleRecord>);

impl<'s> Paint<'s> {
    fn stroke_width(&self, default: f64) -> f64 {
        self.0.and_then(|s| s.stroke_width)
            .filter(|w| *w > 0.0)
            .unwrap_or(default)
    }

    fn stroke<'d>(&self, default: &'d str) -> &'d str
    where
        's: 'd,
    {
        self.0.and_then(|s| s.stroke_color.as_deref())
            .filter(|c| !c.is_empty())
            .unwrap_or(default)
    }

    fn fill<'d>(&self, default: &'d str) -> &'d str
    where
        's: 'd,
    {
        self.0.and_then(|s| s.fill_color.as_deref())
            .filter(|c| !c.is_empty())
            .unwrap_or(default)
    }

    fn radius(&self) -> f64 {
        self.0.and_then(|s| s.radius)
            .filter(|r| *r > 0.0)
            .unwrap_or(POINT_RADIUS)
    }

    fn dash_array(&self) -> Option<String> {
        let dashes = self.0.and_then(|s| s.dash_array.as_ref())?;
        if dashes.is_empty() {
            return None;
        }

        let dashes: Vec<_> = dashes.iter().map(f64::to_string).collect();
        Some(dashes.join(" "))
    }
}


/// One drawn feature
pub enum Shape {
    Circle(Circle),
    Path(Path),
    Polygon(Polygon),
    /// Members of a multi-geometry and how many primitives they hold
    Group(Group, usize),
}

impl Shape {
    pub fn primitives(&self) -> usize {
        match self {
            Shape::Circle(..) | Shape::Path(..) | Shape::Polygon(..) => 1,
            Shape::Group(_, count) => *count,
        }
    }

    fn named(self, name: &str) -> Self {
        match self {
            Shape::Circle(e) => Shape::Circle(e.set("data-name", name)),
            Shape::Path(e) => Shape::Path(e.set("data-name", name)),
            Shape::Polygon(e) => Shape::Polygon(e.set("data-name", name)),
            Shape::Group(e, count) => Shape::Group(e.set("data-name", name), count),
        }
    }

    pub fn add_to(self, group: Group) -> Group {
        match self {
            Shape::Circle(e) => group.add(e),
            Shape::Path(e) => group.add(e),
            Shape::Polygon(e) => group.add(e),
            Shape::Group(e, _) => group.add(e),
        }
    }

    fn group(members: impl Iterator<Item = Shape>) -> Self {
        let mut group = Group::new();
        let mut count = 0;

        for member in members {
            count += member.primitives();
            group = member.add_to(group);
        }

        Shape::Group(group, count)
    }
}


/// Project `coords`, dropping any that do not land on a finite page position
fn projected<'c>(coords: impl IntoIterator<Item = &'c Coord>, projection: &Projection) -> Vec<Coord> {
    coords.into_iter()
        .map(|c| projection.project(*c))
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect()
}


fn circle(c: &Coord, projection: &Projection, paint: &Paint) -> Option<Circle> {
    let p = projected([c], projection).pop()?;

    Some(Circle::new()
        .set("cx", p.x)
        .set("cy", p.y)
        .set("r", paint.radius())
        .set("fill", paint.fill(POINT_COLOR))
        .set("stroke", paint.stroke(POINT_COLOR))
        .set("stroke-width", paint.stroke_width(POINT_STROKE_WIDTH)))
}


fn line(line: &LineString, projection: &Projection, paint: &Paint) -> Option<Path> {
    let points = projected(line.coords(), projection);
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }

    let mut path = Path::new()
        .set("d", data)
        .set("fill", "none")
        .set("stroke", paint.stroke(LINE_COLOR))
        .set("stroke-width", paint.stroke_width(LINE_STROKE_WIDTH))
        .set("stroke-linecap", "round")
        .set("stroke-linejoin", "round");

    if let Some(dashes) = paint.dash_array() {
        path = path.set("stroke-dasharray", dashes);
    }

    Some(path)
}


/// Only the outer ring is drawn
fn polygon(rings: &[LineString], projection: &Projection, paint: &Paint) -> Option<Polygon> {
    let outer = projected(rings.first()?.coords(), projection);
    if outer.len() < 3 {
        return None;
    }

    let points: Vec<_> = outer.iter().map(|p| format!("{},{}", p.x, p.y)).collect();

    let mut polygon = Polygon::new()
        .set("points", points.join(" "))
        .set("fill", paint.fill(POLYGON_FILL))
        .set("stroke", paint.stroke(POLYGON_COLOR))
        .set("stroke-width", paint.stroke_width(POLYGON_STROKE_WIDTH))
        .set("stroke-linejoin", "round");

    if let Some(dashes) = paint.dash_array() {
        polygon = polygon.set("stroke-dasharray", dashes);
    }

    Some(polygon)
}


fn draw_geometry(geometry: &Geometry, projection: &Projection, paint: &Paint) -> Option<Shape> {
    let shape = match geometry {
        Geometry::Point(c) => Shape::Circle(circle(c, projection, paint)?),
        Geometry::LineString(l) => Shape::Path(line(l, projection, paint)?),
        Geometry::Polygon(rings) => Shape::Polygon(polygon(rings, projection, paint)?),
        Geometry::MultiPoint(coords) => Shape::group(
            coords.iter().filter_map(|c| circle(c, projection, paint)).map(Shape::Circle)
        ),
        Geometry::MultiLineString(lines) => Shape::group(
            lines.iter().filter_map(|l| line(l, projection, paint)).map(Shape::Path)
        ),
        Geometry::MultiPolygon(polygons) => Shape::group(
            polygons.iter().filter_map(|rings| polygon(rings, projection, paint)).map(Shape::Polygon)
        ),
        Geometry::GeometryCollection(members) => Shape::group(
            members.iter().filter_map(|g| draw_geometry(g, projection, paint))
        ),
        Geometry::Unsupported(..) => return None,
    };

    Some(shape)
}


/// Draw a feature with its attached style. `None` when there is nothing drawable.
pub fn draw_feature(feature: &Feature, projection: &Projection) -> Option<Shape> {
    let paint = Paint(feature.style.as_ref());
    let shape = draw_geometry(feature.geometry.as_ref()?, projection, &paint)?;

    Some(match feature.name() {
        Some(name) => shape.named(name),
        None => shape,
    })
}
