use anyhow::{ensure, Error, Result};
use geo::Coord;
use serde::Deserialize;

use super::{round3, visit_coords, CoordExt, Geometry};

/// Substitute extent for an axis along which every coordinate is equal
pub const DEGENERATE_RANGE: f64 = 0.001;

/// Distance kept between a margin label and the ends of its strip
pub const LABEL_INSET: f64 = 2.0;


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Grow to contain `c`. Non-finite coordinates are ignored.
    pub fn include(&mut self, c: Coord) {
        if !(c.x.is_finite() && c.y.is_finite()) {
            return;
        }

        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Bounding box of every coordinate of `geometries`, `None` if there are none
    pub fn of<'g>(geometries: impl IntoIterator<Item = Option<&'g Geometry>>) -> Option<Self> {
        let mut bbox = Self::empty();

        for geometry in geometries {
            visit_coords(geometry, |c| bbox.include(c));
        }

        if bbox.is_empty() {
            return None;
        }

        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "MarginSpec")]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(margin: f64) -> Self {
        Self {
            top: margin,
            right: margin,
            bottom: margin,
            left: margin,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MarginSpec {
    Uniform(f64),
    Sides {
        top: f64,
        right: f64,
        bottom: f64,
        left: f64,
    },
}

impl From<MarginSpec> for Margins {
    fn from(spec: MarginSpec) -> Self {
        match spec {
            MarginSpec::Uniform(margin) => Margins::uniform(margin),
            MarginSpec::Sides { top, right, bottom, left } => Margins { top, right, bottom, left },
        }
    }
}


/// The rectangle left for content once margins are taken off the page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ContentRect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}


/// Physical page in drawing units (millimetres for embossing)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "PageSpec")]
pub struct Page {
    width: f64,
    height: f64,
    margins: Margins,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PageSpec {
    #[serde(default = "PageSpec::default_width")]
    width: f64,
    #[serde(default = "PageSpec::default_height")]
    height: f64,
    #[serde(default = "PageSpec::default_margins")]
    margins: Margins,
}

impl PageSpec {
    fn default_width() -> f64 {
        297.0
    }

    fn default_height() -> f64 {
        210.0
    }

    fn default_margins() -> Margins {
        Margins::uniform(10.0)
    }
}

impl TryFrom<PageSpec> for Page {
    type Error = Error;

    fn try_from(spec: PageSpec) -> Result<Self> {
        Page::new(spec.width, spec.height, spec.margins)
    }
}

impl Default for Page {
    /// A4 landscape with 10mm margins
    fn default() -> Self {
        Self {
            width: PageSpec::default_width(),
            height: PageSpec::default_height(),
            margins: PageSpec::default_margins(),
        }
    }
}

impl Page {
    pub fn new(width: f64, height: f64, margins: Margins) -> Result<Self> {
        let Margins { top, right, bottom, left } = margins;

        ensure!(width.is_finite() && height.is_finite(), "Page size must be finite");
        ensure!([top, right, bottom, left].iter().all(|m| m.is_finite() && *m >= 0.0), "Margins must be finite and not negative: {margins:?}");
        ensure!(width - left - right > 0.0, "Horizontal margins ({left} + {right}) leave no room on a page {width} wide");
        ensure!(height - top - bottom > 0.0, "Vertical margins ({top} + {bottom}) leave no room on a page {height} high");

        Ok(Self {
            width,
            height,
            margins,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn content_rect(&self) -> ContentRect {
        ContentRect {
            left: self.margins.left,
            top: self.margins.top,
            right: self.width - self.margins.right,
            bottom: self.height - self.margins.bottom,
        }
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarginSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl MarginSide {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}


/// Clamp without panicking when the bounds cross
fn clamp_within(v: f64, lo: f64, hi: f64) -> f64 {
    if lo > hi {
        return (lo + hi) / 2.0;
    }
    v.clamp(lo, hi)
}


/// Linear, aspect-preserving mapping of source coordinates onto a page.
///
/// A single scale is used for both axes; the axis with slack is centred within
/// the content rectangle. Page y grows downwards, source y grows northwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub min_x: f64,
    pub max_y: f64,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub content: ContentRect,
    pub page_width: f64,
    pub page_height: f64,
}

impl Projection {
    pub fn fit(bbox: &BoundingBox, page: &Page) -> Self {
        let content = page.content_rect();

        let usable_w = content.width();
        let usable_h = content.height();

        let mut x_range = bbox.width();
        let mut y_range = bbox.height();

        if x_range <= 0.0 {
            x_range = DEGENERATE_RANGE;
        }
        if y_range <= 0.0 {
            y_range = DEGENERATE_RANGE;
        }

        let scale = (usable_w / x_range).min(usable_h / y_range);

        let rendered_w = x_range * scale;
        let rendered_h = y_range * scale;

        Self {
            min_x: bbox.min_x,
            max_y: bbox.max_y,
            scale,
            offset_x: content.left + (usable_w - rendered_w) / 2.0,
            offset_y: content.top + (usable_h - rendered_h) / 2.0,
            content,
            page_width: page.width(),
            page_height: page.height(),
        }
    }

    pub fn project(&self, c: Coord) -> Coord {
        Coord {
            x: self.offset_x + (c.x - self.min_x) * self.scale,
            y: self.offset_y + (self.max_y - c.y) * self.scale,
        }.round3()
    }

    /// Put a label for `source` in the middle of the margin strip on `side`,
    /// sliding it along the strip to stay level with the content.
    pub fn place_margin_label(&self, source: Coord, side: MarginSide) -> Coord {
        let p = self.project(source);
        let c = &self.content;

        let (x, y) = match side {
            MarginSide::Top => (
                clamp_within(p.x, c.left + LABEL_INSET, c.right - LABEL_INSET),
                c.top / 2.0,
            ),
            MarginSide::Bottom => (
                clamp_within(p.x, c.left + LABEL_INSET, c.right - LABEL_INSET),
                (c.bottom + self.page_height) / 2.0,
            ),
            MarginSide::Left => (
                c.left / 2.0,
                clamp_within(p.y, c.top + LABEL_INSET, c.bottom - LABEL_INSET),
            ),
            MarginSide::Right => (
                (c.right + self.page_width) / 2.0,
                clamp_within(p.y, c.top + LABEL_INSET, c.bottom - LABEL_INSET),
            ),
        };

        Coord { x: round3(x), y: round3(y) }
    }
}


#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    fn bbox(min: (f64, f64), max: (f64, f64)) -> BoundingBox {
        let mut b = BoundingBox::empty();
        b.include(coord! { x: min.0, y: min.1 });
        b.include(coord! { x: max.0, y: max.1 });
        b
    }

    #[test]
    fn bounding_box_skips_absent_and_non_finite() {
        let geometries = [
            None,
            Some(Geometry::Point(coord! { x: 1.0, y: 5.0 })),
            Some(Geometry::MultiPoint(vec![coord! { x: f64::NAN, y: 0.0 }, coord! { x: -2.0, y: 3.0 }])),
        ];

        let b = BoundingBox::of(geometries.iter().map(Option::as_ref)).unwrap();
        assert_eq!(b, bbox((-2.0, 3.0), (1.0, 5.0)));

        assert!(BoundingBox::of([None, Some(&Geometry::Unsupported("Arc".into()))]).is_none());
    }

    #[test]
    fn page_validation() {
        assert!(Page::new(297.0, 210.0, Margins::uniform(10.0)).is_ok());
        assert!(Page::new(100.0, 100.0, Margins::uniform(50.0)).is_err());
        assert!(Page::new(100.0, 100.0, Margins { top: 0.0, right: 0.0, bottom: 120.0, left: 0.0 }).is_err());
        assert!(Page::new(100.0, 100.0, Margins::uniform(-1.0)).is_err());
    }

    #[test]
    fn margins_from_yaml() -> Result<()> {
        let page: Page = serde_norway::from_str("margins: 5")?;
        assert_eq!(page.margins(), Margins::uniform(5.0));
        assert_eq!(page.width(), 297.0);

        let page: Page = serde_norway::from_str("width: 200\nheight: 100\nmargins: { top: 1, right: 2, bottom: 3, left: 4 }")?;
        assert_eq!(page.content_rect(), ContentRect { left: 4.0, top: 1.0, right: 198.0, bottom: 97.0 });

        assert!(serde_norway::from_str::<Page>("width: 10\nmargins: 6").is_err());
        Ok(())
    }

    #[test]
    fn corners_map_onto_content() {
        // 2:1 box on a 2:1 content area fills it exactly
        let page = Page::new(220.0, 120.0, Margins::uniform(10.0)).unwrap();
        let proj = Projection::fit(&bbox((0.0, 0.0), (2.0, 1.0)), &page);

        assert_eq!(proj.project(coord! { x: 0.0, y: 1.0 }), coord! { x: 10.0, y: 10.0 });
        assert_eq!(proj.project(coord! { x: 2.0, y: 0.0 }), coord! { x: 210.0, y: 110.0 });
    }

    #[test]
    fn aspect_is_preserved() {
        let page = Page::default();

        for (w, h) in [(3.0, 1.0), (1.0, 4.0), (0.02, 0.015)] {
            let proj = Projection::fit(&bbox((10.0, 20.0), (10.0 + w, 20.0 + h)), &page);
            let a = proj.project(coord! { x: 10.0, y: 20.0 + h });
            let b = proj.project(coord! { x: 10.0 + w, y: 20.0 });

            let ratio = (b.x - a.x) / (b.y - a.y);
            assert!((ratio - w / h).abs() < 0.01, "{w}x{h} rendered with ratio {ratio}");
        }
    }

    #[test]
    fn slack_axis_is_centred() {
        let page = Page::default();
        let proj = Projection::fit(&bbox((0.0, 0.0), (1.0, 1.0)), &page);

        let top_left = proj.project(coord! { x: 0.0, y: 1.0 });
        let bottom_right = proj.project(coord! { x: 1.0, y: 0.0 });

        // Height is the tight axis
        assert_eq!(top_left.y, 10.0);
        assert_eq!(bottom_right.y, 200.0);

        let left_gap = top_left.x - 0.0;
        let right_gap = page.width() - bottom_right.x;
        assert!((left_gap - right_gap).abs() < 0.001, "{left_gap} != {right_gap}");
    }

    #[test]
    fn single_point_stays_on_page() {
        let page = Page::default();
        let proj = Projection::fit(&bbox((-73.57, 45.49), (-73.57, 45.49)), &page);

        assert!(proj.scale.is_finite() && proj.scale > 0.0);

        let p = proj.project(coord! { x: -73.57, y: 45.49 });
        assert!(p.x.is_finite() && p.y.is_finite());
        assert!(p.x >= 0.0 && p.x <= page.width());
        assert!(p.y >= 0.0 && p.y <= page.height());
    }

    #[test]
    fn flat_box_gets_a_substitute_range() {
        let page = Page::default();
        let proj = Projection::fit(&bbox((0.0, 5.0), (10.0, 5.0)), &page);

        // Width is the tight axis, the zero-height axis no longer divides by zero
        assert!((proj.scale - 27.7).abs() < 1e-9);
        let p = proj.project(coord! { x: 10.0, y: 5.0 });
        assert_eq!(p.x, 287.0);
        assert!(p.y > 10.0 && p.y < 200.0);
    }

    #[test]
    fn margin_labels() {
        let page = Page::new(297.0, 210.0, Margins { top: 20.0, right: 30.0, bottom: 20.0, left: 30.0 }).unwrap();
        let proj = Projection::fit(&bbox((0.0, 0.0), (1.0, 1.0)), &page);

        let centre = coord! { x: 0.5, y: 0.5 };
        let c = proj.project(centre);

        assert_eq!(proj.place_margin_label(centre, MarginSide::Top), coord! { x: c.x, y: 10.0 });
        assert_eq!(proj.place_margin_label(centre, MarginSide::Bottom), coord! { x: c.x, y: 200.0 });
        assert_eq!(proj.place_margin_label(centre, MarginSide::Left), coord! { x: 15.0, y: c.y });
        assert_eq!(proj.place_margin_label(centre, MarginSide::Right), coord! { x: 282.0, y: c.y });

        // Far outside the content it is clamped along the strip
        let far = coord! { x: 100.0, y: -100.0 };
        assert_eq!(proj.place_margin_label(far, MarginSide::Top), coord! { x: 265.0, y: 10.0 });
        assert_eq!(proj.place_margin_label(far, MarginSide::Left), coord! { x: 15.0, y: 188.0 });
    }

    #[test]
    fn margin_side_tags() {
        assert_eq!(MarginSide::parse("Top"), Some(MarginSide::Top));
        assert_eq!(MarginSide::parse(" right "), Some(MarginSide::Right));
        assert_eq!(MarginSide::parse("north"), None);
    }
}
