use anyhow::{ensure, Result};
use geo::{Coord, LineString, Simplify, Vector2DOps};

/// The smallest ring that still encloses an area: 3 distinct vertices and the closing repeat
pub const MIN_RING_POINTS: usize = 4;


/// Distance from `p` to the segment `a`-`b` (not to the infinite line through it)
pub fn segment_distance(p: Coord, a: Coord, b: Coord) -> f64 {
    let ab = b - a;
    let len2 = ab.magnitude_squared();

    if len2 == 0.0 {
        return (p - a).magnitude();
    }

    let t = ((p - a).dot_product(ab) / len2).clamp(0.0, 1.0);
    (a + ab * t - p).magnitude()
}


/// Index and distance of the interior point farthest from the `first`-`last` segment.
/// The earliest point wins a tie.
fn farthest(points: &[Coord], first: usize, last: usize) -> Option<(usize, f64)> {
    let mut found: Option<(usize, f64)> = None;

    for i in first + 1..last {
        let d = segment_distance(points[i], points[first], points[last]);
        if d > found.map_or(0.0, |(_, dmax)| dmax) {
            found = Some((i, d));
        }
    }

    found
}


/// Douglas-Peucker point reduction.
///
/// Walks an explicit stack of index ranges instead of recursing, so very long
/// lines can not exhaust the call stack. The result is the same as splitting at
/// the farthest point, simplifying both halves and dropping the shared junction.
pub fn simplify_coords(points: &[Coord], tolerance: f64) -> Vec<Coord> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut ranges = vec![(0, last)];
    while let Some((first, last)) = ranges.pop() {
        if last - first < 2 {
            continue;
        }

        if let Some((index, distance)) = farthest(points, first, last) {
            if distance > tolerance {
                keep[index] = true;
                ranges.push((index, last));
                ranges.push((first, index));
            }
        }
    }

    points.iter()
        .zip(keep)
        .filter_map(|(p, k)| if k { Some(*p) } else { None })
        .collect()
}


pub trait LineSimplifier {
    fn name(&self) -> &'static str;

    /// Reduce the points of an open line or a single ring
    fn simplify_line(&self, line: &LineString, tolerance: f64) -> Result<LineString>;
}


#[derive(Clone, Copy, Debug, Default)]
pub struct DouglasPeucker;

impl LineSimplifier for DouglasPeucker {
    fn name(&self) -> &'static str {
        "douglas-peucker"
    }

    fn simplify_line(&self, line: &LineString, tolerance: f64) -> Result<LineString> {
        Ok(LineString::new(simplify_coords(&line.0, tolerance)))
    }
}


/// Ramer-Douglas-Peucker from the `geo` crate.
///
/// It silently returns its input for a non-positive tolerance and misbehaves on
/// non-finite coordinates, so both are rejected up front.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeoRdp;

impl LineSimplifier for GeoRdp {
    fn name(&self) -> &'static str {
        "geo-rdp"
    }

    fn simplify_line(&self, line: &LineString, tolerance: f64) -> Result<LineString> {
        ensure!(tolerance.is_finite() && tolerance > 0.0, "Tolerance {tolerance} is not usable by geo's simplify");
        ensure!(line.coords().all(|c| c.x.is_finite() && c.y.is_finite()), "Line has non-finite coordinates");
        Ok(line.simplify(&tolerance))
    }
}


/// Keep the original ring when simplification would leave it unable to enclose an area
pub fn guard_ring(original: &LineString, simplified: LineString) -> LineString {
    if simplified.0.len() < MIN_RING_POINTS {
        return original.clone();
    }
    simplified
}
