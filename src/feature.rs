use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{geometry::{vertex_count, Geometry}, style::{Category, StyleRecord}};


#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    Buildings,
    Paths,
    MajorStreets,
    Streets,
    Entrances,
    StreetLabels,
}

impl Layer {
    pub const ALL: [Layer; 6] = [
        Layer::Buildings,
        Layer::Paths,
        Layer::MajorStreets,
        Layer::Streets,
        Layer::Entrances,
        Layer::StreetLabels,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Buildings => "buildings",
            Layer::Paths => "paths",
            Layer::MajorStreets => "majorStreets",
            Layer::Streets => "streets",
            Layer::Entrances => "entrances",
            Layer::StreetLabels => "streetLabels",
        }
    }

    /// Layers made of lines and rings; point layers are left as they are
    pub fn is_simplifiable(&self) -> bool {
        matches!(self, Layer::Buildings | Layer::Paths | Layer::MajorStreets | Layer::Streets)
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            Layer::Buildings => Some(Category::Building),
            Layer::Paths => Some(Category::Path),
            Layer::MajorStreets => Some(Category::MajorStreet),
            Layer::Streets => Some(Category::Street),
            Layer::Entrances => Some(Category::Entrance),
            Layer::StreetLabels => None,
        }
    }
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
    pub style: Option<StyleRecord>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    pub fn with_geometry(self, geometry: Option<Geometry>) -> Self {
        Self {
            geometry,
            ..self
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn with_properties(self, properties: Map<String, Value>) -> Self {
        Self {
            properties,
            ..self
        }
    }

    pub fn with_style(self, style: StyleRecord) -> Self {
        Self {
            style: Some(style),
            ..self
        }
    }

    /// A non-empty string property
    pub fn text_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.text_property("name")
    }

    pub fn vertex_count(&self) -> usize {
        vertex_count(self.geometry.as_ref())
    }
}


/// Features grouped by layer. Order within a layer is the order features were added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSet {
    layers: BTreeMap<Layer, Vec<Feature>>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: Layer, features: Vec<Feature>) -> Self {
        self.layers.insert(layer, features);
        self
    }

    pub fn push(&mut self, layer: Layer, feature: Feature) {
        self.layers.entry(layer).or_default().push(feature);
    }

    /// Features of `layer`, empty if the layer is absent
    pub fn layer(&self, layer: Layer) -> &[Feature] {
        self.layers.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn layers(&self) -> impl Iterator<Item = (Layer, &[Feature])> {
        self.layers.iter().map(|(layer, features)| (*layer, features.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vertex_count(&self) -> usize {
        self.layers.values().flatten().map(Feature::vertex_count).sum()
    }
}


#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    #[test]
    fn layer_names_match_serde() -> anyhow::Result<()> {
        for layer in Layer::ALL {
            assert_eq!(serde_json::to_value(layer)?, Value::from(layer.name()));
        }
        Ok(())
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut set = FeatureSet::new();
        for name in ["c", "a", "b"] {
            set.push(Layer::Paths, Feature::new(Geometry::Point(coord! { x: 0.0, y: 0.0 })).with_property("name", name));
        }

        let names: Vec<_> = set.layer(Layer::Paths).iter().filter_map(Feature::name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert!(set.layer(Layer::Buildings).is_empty());
        assert_eq!(set.len(), 3);
        assert_eq!(set.vertex_count(), 3);
    }

    #[test]
    fn blank_names_are_absent() {
        let f = Feature::default().with_property("name", "  ").with_property("side", 3);
        assert_eq!(f.name(), None);
        assert_eq!(f.text_property("side"), None);
        assert_eq!(f.vertex_count(), 0);
    }
}
