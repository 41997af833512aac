pub mod labels;
pub mod legend;
pub mod shapes;

use log::{debug, info};
use serde::Deserialize;
use svg::{
    node::element::{ClipPath, Definitions, Group, Rectangle},
    Document,
};
use thiserror::Error;

use crate::{
    feature::{Feature, FeatureSet, Layer},
    geometry::{BoundingBox, Geometry, Page, Projection},
    style::StyleRecord,
};

use labels::SeenNames;
use shapes::draw_feature;


const CONTENT_CLIP_ID: &str = "content-clip";


#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("no bounding box")]
    NoBoundingBox,
    #[error("nothing to render")]
    NothingToRender,
}


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Fit every drawn layer into the content rectangle
    #[default]
    FullExtent,
    /// Fit the buildings only; streets are clipped to the content rectangle
    /// and street names move into the margins
    MarginReserved,
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Layout::FullExtent => "full_extent",
            Layout::MarginReserved => "margin_reserved",
        }
    }

    /// Layers whose coordinates decide the projection
    pub fn scanned_layers(&self) -> &'static [Layer] {
        match self {
            Layout::FullExtent => &[Layer::Streets, Layer::MajorStreets, Layer::Paths, Layer::Buildings, Layer::Entrances],
            Layout::MarginReserved => &[Layer::Buildings],
        }
    }
}


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub layout: Layout,
    pub legend: bool,
}


/// A drawn page
#[derive(Debug)]
pub struct Drawing {
    pub document: Document,
    /// Shapes drawn for features, labels and legend excluded
    pub primitives: usize,
    pub labels: usize,
    pub projection: Projection,
}


/// A feature layer in back-to-front order, with the group it is drawn into
struct Stack {
    layer: Layer,
    id: &'static str,
    label: &'static str,
}

const STACKING: [Stack; 5] = [
    Stack { layer: Layer::Streets, id: "background", label: "Minor street grid" },
    Stack { layer: Layer::MajorStreets, id: "major-streets", label: "Major streets" },
    Stack { layer: Layer::Paths, id: "midground", label: "Pedestrian paths" },
    Stack { layer: Layer::Buildings, id: "foreground", label: "Building footprints" },
    Stack { layer: Layer::Entrances, id: "poi", label: "Entrances" },
];


fn layer_group(id: &str, label: &str) -> Group {
    Group::new()
        .set("id", id)
        .set("aria-label", label)
}


fn clipped(group: Group, layout: Layout) -> Group {
    match layout {
        Layout::FullExtent => group,
        Layout::MarginReserved => group.set("clip-path", format!("url(#{CONTENT_CLIP_ID})")),
    }
}


fn fit(features: &FeatureSet, page: &Page, layout: Layout) -> Result<Projection, RenderError> {
    let scanned: Vec<&Feature> = layout.scanned_layers()
        .iter()
        .flat_map(|layer| features.layer(*layer))
        .collect();

    if scanned.is_empty() {
        return Err(RenderError::NothingToRender);
    }

    let bbox = BoundingBox::of(scanned.iter().map(|f| f.geometry.as_ref()))
        .ok_or(RenderError::NoBoundingBox)?;

    debug!("Bounding box {bbox:?} from {} features", scanned.len());

    Ok(Projection::fit(&bbox, page))
}


/// The style of the first styled feature in each drawn layer, back to front
fn legend_records(features: &FeatureSet) -> Vec<&StyleRecord> {
    STACKING.iter()
        .filter_map(|stack| features.layer(stack.layer).iter().find_map(|f| f.style.as_ref()))
        .collect()
}


/// Project and draw `features` onto `page`.
///
/// Layers are stacked in a fixed order: minor streets, major streets, paths,
/// buildings, entrances, then labels and the legend on top.
pub fn render(features: &FeatureSet, page: &Page, options: &RenderOptions) -> Result<Drawing, RenderError> {
    let layout = options.layout;
    let projection = fit(features, page, layout)?;

    let (width, height) = (page.width(), page.height());

    let mut document = Document::new()
        .set("viewBox", (0.0, 0.0, width, height))
        .set("width", format!("{width}mm"))
        .set("height", format!("{height}mm"))
        .add(Rectangle::new()
            .set("width", width)
            .set("height", height)
            .set("fill", "#ffffff"));

    if layout == Layout::MarginReserved {
        let content = page.content_rect();
        document = document.add(Definitions::new()
            .add(ClipPath::new()
                .set("id", CONTENT_CLIP_ID)
                .add(Rectangle::new()
                    .set("x", content.left)
                    .set("y", content.top)
                    .set("width", content.width())
                    .set("height", content.height()))));
    }

    let mut primitives = 0;

    for stack in &STACKING {
        let mut group = layer_group(stack.id, stack.label);

        for feature in features.layer(stack.layer) {
            match draw_feature(feature, &projection) {
                Some(shape) => {
                    primitives += shape.primitives();
                    group = shape.add_to(group);
                },
                None => debug!(
                    "Nothing to draw for a {} feature in {}",
                    feature.geometry.as_ref().map_or("missing", Geometry::kind),
                    stack.layer.name(),
                ),
            }
        }

        if matches!(stack.layer, Layer::Streets | Layer::MajorStreets) {
            group = clipped(group, layout);
        }

        document = document.add(group);
    }

    if primitives == 0 {
        return Err(RenderError::NothingToRender);
    }

    let mut seen = SeenNames::default();
    let mut label_count = 0;

    let mut street_labels = labels::street_labels(features.layer(Layer::MajorStreets), &projection, &mut seen);
    let mut margin_labels = vec![];

    match layout {
        Layout::FullExtent => street_labels.extend(
            labels::point_labels(features.layer(Layer::StreetLabels), &projection, &mut seen)
        ),
        Layout::MarginReserved => margin_labels = labels::margin_labels(
            features.layer(Layer::StreetLabels), &projection, &mut SeenNames::default()
        ),
    }

    let mut group = clipped(layer_group("street-labels", "Street names"), layout);
    for text in street_labels {
        label_count += 1;
        group = group.add(text);
    }
    document = document.add(group);

    if layout == Layout::MarginReserved {
        let mut group = layer_group("margin-labels", "Street names in the margins");
        for text in margin_labels {
            label_count += 1;
            group = group.add(text);
        }
        document = document.add(group);
    }

    if options.legend {
        document = document.add(legend::legend(legend_records(features), page));
    }

    info!("Rendered {primitives} shapes and {label_count} labels ({} layout)", layout.name());

    Ok(Drawing {
        document,
        primitives,
        labels: label_count,
        projection,
    })
}
