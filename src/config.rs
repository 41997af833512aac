use std::path::PathBuf;

use serde::Deserialize;

use crate::{
    geometry::Page,
    render::{Layout, RenderOptions},
    simplify::{Backend, DEFAULT_TOLERANCE_METRES},
    style::StyleRecord,
};


fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE_METRES
}


#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    /// Stem of the output file
    pub name: String,
    /// GeoJSON FeatureCollection
    pub input: PathBuf,
    pub outdir: PathBuf,
    /// Simplification tolerance in metres
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub simplifier: Backend,
    #[serde(default)]
    pub page: Page,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub legend: bool,
    /// Replacements for rows of the built-in style table
    #[serde(default)]
    pub styles: Vec<StyleRecord>,
}

impl MapConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            layout: self.layout,
            legend: self.legend,
        }
    }
}


#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::{geometry::Margins, style::Category};

    use super::*;

    #[test]
    fn minimal_config_uses_defaults() -> Result<()> {
        let config: MapConfig = serde_norway::from_str("name: sgw\ninput: data/sgw.geojson\noutdir: out\n")?;

        assert_eq!(config.tolerance, 2.0);
        assert_eq!(config.simplifier, Backend::Native);
        assert_eq!(config.page, Page::default());
        assert_eq!(config.render_options(), RenderOptions::default());
        assert!(config.styles.is_empty());

        Ok(())
    }

    #[test]
    fn full_config() -> Result<()> {
        let config: MapConfig = serde_norway::from_str(r#"
name: sgw
input: data/sgw.geojson
outdir: out
tolerance: 5
simplifier: geo
page:
  width: 420
  height: 297
  margins: { top: 20, right: 10, bottom: 30, left: 10 }
layout: margin_reserved
legend: true
styles:
  - category: building
    stroke_width: 2.2
"#)?;

        assert_eq!(config.tolerance, 5.0);
        assert_eq!(config.simplifier, Backend::Geo);
        assert_eq!(config.page, Page::new(420.0, 297.0, Margins { top: 20.0, right: 10.0, bottom: 30.0, left: 10.0 })?);
        assert_eq!(config.layout, Layout::MarginReserved);
        assert!(config.legend);
        assert_eq!(config.styles[0].category, Category::Building);

        Ok(())
    }

    #[test]
    fn bad_pages_are_rejected() {
        let page = "name: a\ninput: b\noutdir: c\npage: { width: 20, margins: 10 }\n";
        assert!(serde_norway::from_str::<MapConfig>(page).is_err());

        let layout = "name: a\ninput: b\noutdir: c\nlayout: sideways\n";
        assert!(serde_norway::from_str::<MapConfig>(layout).is_err());
    }
}
