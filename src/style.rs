use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::feature::FeatureSet;


#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Building,
    Path,
    Entrance,
    MajorStreet,
    Street,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Building => "building",
            Category::Path => "path",
            Category::Entrance => "entrance",
            Category::MajorStreet => "majorStreet",
            Category::Street => "street",
        }
    }
}


/// Presentation attributes attached to a feature before rendering.
/// Absent fields fall back to per-geometry defaults in the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleRecord {
    pub category: Category,
    #[serde(default)]
    pub stroke_width: Option<f64>,
    #[serde(default)]
    pub stroke_color: Option<String>,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub dash_array: Option<Vec<f64>>,
    #[serde(default)]
    pub radius: Option<f64>,
    /// Legend text
    #[serde(default)]
    pub label: Option<String>,
}

impl StyleRecord {
    fn line(category: Category, stroke_width: f64, stroke_color: &str, label: &str) -> Self {
        Self {
            category,
            stroke_width: Some(stroke_width),
            stroke_color: Some(stroke_color.to_string()),
            fill_color: Some("none".to_string()),
            dash_array: None,
            radius: None,
            label: Some(label.to_string()),
        }
    }

    pub fn legend_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.category.name())
    }
}


/// Embossing style per category
#[derive(Clone, Debug, PartialEq)]
pub struct StyleTable {
    records: BTreeMap<Category, StyleRecord>,
}

impl Default for StyleTable {
    fn default() -> Self {
        let records = [
            StyleRecord::line(Category::Building, 0.8, "#1a1a1a", "High-relief solid boundary"),
            StyleRecord {
                dash_array: Some(vec![3.0, 3.0]),
                ..StyleRecord::line(Category::Path, 0.8, "#256fba", "Raised dashed path")
            },
            StyleRecord {
                fill_color: Some("#e05c5c".to_string()),
                radius: Some(1.0),
                ..StyleRecord::line(Category::Entrance, 0.5, "#e05c5c", "Raised circle POI")
            },
            StyleRecord::line(Category::MajorStreet, 1.2, "#555555", "Major street"),
            StyleRecord::line(Category::Street, 0.3, "#cccccc", "Minor street"),
        ];

        Self {
            records: records.into_iter().map(|r| (r.category, r)).collect(),
        }
    }
}

impl StyleTable {
    /// Replace the rows for the categories of `overrides`, later entries winning
    pub fn with_overrides(mut self, overrides: &[StyleRecord]) -> Self {
        for record in overrides {
            if let Some(old) = self.records.insert(record.category, record.clone()) {
                debug!("Style for {} replaced (was {old:?})", record.category.name());
            }
        }
        self
    }

    pub fn get(&self, category: Category) -> Option<&StyleRecord> {
        self.records.get(&category)
    }

    /// A new feature set with each feature's record attached according to its layer.
    /// Layers without a category are copied as they are.
    pub fn apply(&self, features: &FeatureSet) -> FeatureSet {
        let mut styled = FeatureSet::new();

        for (layer, layer_features) in features.layers() {
            let record = layer.category().and_then(|c| self.get(c));

            if record.is_none() {
                debug!("Layer {} carries no style", layer.name());
            }

            let layer_features = layer_features.iter()
                .cloned()
                .map(|f| match record {
                    Some(record) => f.with_style(record.clone()),
                    None => f,
                })
                .collect();

            styled = styled.with_layer(layer, layer_features);
        }

        styled
    }
}
