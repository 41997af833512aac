use std::path::Path;

use anyhow::{Context, Result};

use crate::{geometry::Page, render::{Drawing, Layout}};

pub const TACTILE_STANDARD: &str = "ProBlind_Standard_v4";

const RULE: &str = "  ============================================================";


/// What the header comment reports about a drawing
pub struct ExportInfo<'a> {
    pub name: &'a str,
    pub page: &'a Page,
    pub layout: Layout,
    pub tolerance: f64,
    pub reduction: u8,
}


/// `--` may not appear inside an XML comment
fn comment_safe(text: &str) -> String {
    let mut text = text.to_string();
    while text.contains("--") {
        text = text.replace("--", "-");
    }
    text
}


pub fn header_comment(info: &ExportInfo) -> String {
    let page = info.page;
    let m = page.margins();

    [
        "<!--".to_string(),
        RULE.to_string(),
        format!("  {TACTILE_STANDARD}"),
        RULE.to_string(),
        format!("  Map:          {}", comment_safe(info.name)),
        format!("  Format:       {} x {} mm, 1:1 emboss scale", page.width(), page.height()),
        format!("  Margins:      top {} right {} bottom {} left {} mm", m.top, m.right, m.bottom, m.left),
        format!("  Layout:       {}", info.layout.name()),
        format!("  Tolerance:    {} m", info.tolerance),
        format!("  Reduction:    {}% of vertices removed", info.reduction),
        RULE.to_string(),
        "  Print at 100% scale, do NOT scale to fit page.".to_string(),
        RULE.to_string(),
        "-->".to_string(),
    ].join("\n")
}


/// The drawing as SVG text, preceded by the header comment
pub fn drawing_to_string(drawing: &Drawing, info: &ExportInfo) -> String {
    format!("{}\n{}\n", header_comment(info), drawing.document)
}


pub fn save_drawing(path: &Path, drawing: &Drawing, info: &ExportInfo) -> Result<()> {
    std::fs::write(path, drawing_to_string(drawing, info))
        .with_context(|| format!("Could not write {path:?}"))
}
