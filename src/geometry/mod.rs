pub mod douglas_peucker;
pub mod projection;

use geo::{Coord, LineString};

pub use douglas_peucker::*;
pub use projection::*;

pub trait CoordExt: Sized {
    /// Round both components to 3 decimal places
    fn round3(&self) -> Self;
}


impl CoordExt for Coord {
    fn round3(&self) -> Self {
        Self {
            x: round3(self.x),
            y: round3(self.y),
        }
    }
}


pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}


/// A geographic geometry in source coordinates (x = east, y = north).
///
/// Rings are kept exactly as they were read, the first ring of a polygon being
/// its outer boundary. `Unsupported` carries the kind name of anything else.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    LineString(LineString),
    MultiLineString(Vec<LineString>),
    Polygon(Vec<LineString>),
    MultiPolygon(Vec<Vec<LineString>>),
    GeometryCollection(Vec<Geometry>),
    Unsupported(String),
}

impl Geometry {
    pub fn kind(&self) -> &str {
        match self {
            Geometry::Point(..) => "Point",
            Geometry::MultiPoint(..) => "MultiPoint",
            Geometry::LineString(..) => "LineString",
            Geometry::MultiLineString(..) => "MultiLineString",
            Geometry::Polygon(..) => "Polygon",
            Geometry::MultiPolygon(..) => "MultiPolygon",
            Geometry::GeometryCollection(..) => "GeometryCollection",
            Geometry::Unsupported(kind) => kind.as_str(),
        }
    }

    /// Call `f` once per coordinate, depth first, in storage order.
    pub fn for_each_coord(&self, f: &mut impl FnMut(Coord)) {
        fn visit_line(line: &LineString, f: &mut impl FnMut(Coord)) {
            for c in line.coords() {
                f(*c);
            }
        }

        match self {
            Geometry::Point(c) => f(*c),
            Geometry::MultiPoint(coords) => {
                for c in coords {
                    f(*c);
                }
            },
            Geometry::LineString(line) => visit_line(line, f),
            Geometry::MultiLineString(lines)
            | Geometry::Polygon(lines) => {
                for line in lines {
                    visit_line(line, f);
                }
            },
            Geometry::MultiPolygon(polygons) => {
                for ring in polygons.iter().flatten() {
                    visit_line(ring, f);
                }
            },
            Geometry::GeometryCollection(members) => {
                for member in members {
                    member.for_each_coord(f);
                }
            },
            Geometry::Unsupported(..) => {},
        }
    }

    pub fn vertex_count(&self) -> usize {
        let mut count = 0;
        self.for_each_coord(&mut |_| count += 1);
        count
    }

    /// Arithmetic mean of all coordinates
    pub fn centroid(&self) -> Option<Coord> {
        let mut sum = Coord { x: 0.0, y: 0.0 };
        let mut count = 0;

        self.for_each_coord(&mut |c| {
            sum = sum + c;
            count += 1;
        });

        if count == 0 {
            return None;
        }

        Some(sum / count as f64)
    }
}


/// Visit the coordinates of a possibly absent geometry.
pub fn visit_coords(geometry: Option<&Geometry>, mut f: impl FnMut(Coord)) {
    if let Some(geometry) = geometry {
        geometry.for_each_coord(&mut f);
    }
}


pub fn vertex_count(geometry: Option<&Geometry>) -> usize {
    geometry.map_or(0, Geometry::vertex_count)
}


#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    fn line(points: &[(f64, f64)]) -> LineString {
        points.iter().map(|&(x, y)| coord! { x: x, y: y }).collect()
    }

    #[test]
    fn visit_order() {
        let g = Geometry::GeometryCollection(vec![
            Geometry::Point(coord! { x: 0.0, y: 0.0 }),
            Geometry::MultiPolygon(vec![
                vec![line(&[(1.0, 1.0), (2.0, 1.0)]), line(&[(3.0, 3.0)])],
                vec![line(&[(4.0, 4.0)])],
            ]),
            Geometry::MultiPoint(vec![coord! { x: 5.0, y: 5.0 }]),
        ]);

        let mut xs = vec![];
        g.for_each_coord(&mut |c| xs.push(c.x));

        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn absent_and_unsupported_visit_nothing() {
        let mut calls = 0;
        visit_coords(None, |_| calls += 1);
        visit_coords(Some(&Geometry::Unsupported("Curve".into())), |_| calls += 1);

        assert_eq!(calls, 0);
        assert_eq!(vertex_count(None), 0);
    }

    #[test]
    fn counts_every_ring() {
        let g = Geometry::Polygon(vec![
            line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            line(&[(0.2, 0.2), (0.4, 0.2), (0.4, 0.4), (0.2, 0.2)]),
        ]);

        assert_eq!(g.vertex_count(), 8);
    }

    #[test]
    fn rounding() {
        let c = coord! { x: 1.23456, y: -9.87654 }.round3();
        assert_eq!(c, coord! { x: 1.235, y: -9.877 });
    }
}
