use svg::node::element::{Circle, Group, Line, Rectangle, Text};

use crate::{geometry::Page, style::StyleRecord};


pub const WIDTH: f64 = 68.0;
pub const HEIGHT: f64 = 52.0;

const ROW_TOP: f64 = 11.0;
const ROW_HEIGHT: f64 = 8.0;
const FONT_FAMILY: &str = "Arial, sans-serif";


fn swatch(record: &StyleRecord, y: f64) -> Group {
    let color = record.stroke_color.as_deref().unwrap_or("#000000");

    if record.radius.is_some() {
        let fill = record.fill_color.as_deref()
            .filter(|f| *f != "none")
            .unwrap_or(color);

        return Group::new().add(Circle::new()
            .set("cx", 10)
            .set("cy", y + 0.5)
            .set("r", 1.5)
            .set("fill", fill));
    }

    let mut line = Line::new()
        .set("x1", 4)
        .set("y1", y + 0.5)
        .set("x2", 18)
        .set("y2", y + 0.5)
        .set("stroke", color)
        .set("stroke-width", record.stroke_width.unwrap_or(0.5))
        .set("stroke-linecap", "round");

    if let Some(dashes) = record.dash_array.as_ref().filter(|d| !d.is_empty()) {
        let dashes: Vec<_> = dashes.iter().map(f64::to_string).collect();
        line = line.set("stroke-dasharray", dashes.join(" "));
    }

    Group::new().add(line)
}


/// Key panel at the bottom-left corner of the content rectangle, one row per record
pub fn legend<'r>(records: impl IntoIterator<Item = &'r StyleRecord>, page: &Page) -> Group {
    let content = page.content_rect();

    let mut group = Group::new()
        .set("id", "legend")
        .set("aria-label", "Legend")
        .set("transform", format!("translate({} {})", content.left, content.bottom - HEIGHT))
        .add(Rectangle::new()
            .set("width", WIDTH)
            .set("height", HEIGHT)
            .set("fill", "#ffffff")
            .set("fill-opacity", 0.92)
            .set("stroke", "#cccccc")
            .set("stroke-width", 0.3)
            .set("rx", 1))
        .add(Text::new("Legend")
            .set("x", 4)
            .set("y", 6)
            .set("font-family", FONT_FAMILY)
            .set("font-size", 2.5)
            .set("font-weight", "bold")
            .set("fill", "#222222"));

    for (i, record) in records.into_iter().enumerate() {
        let y = ROW_TOP + i as f64 * ROW_HEIGHT;

        group = group
            .add(swatch(record, y))
            .add(Text::new(record.legend_label())
                .set("x", 22)
                .set("y", y + 1.5)
                .set("font-family", FONT_FAMILY)
                .set("font-size", 2.8)
                .set("fill", "#333333"));
    }

    group
}


#[cfg(test)]
mod tests {
    use crate::style::{Category, StyleTable};

    use super::*;

    #[test]
    fn rows_follow_records() {
        let table = StyleTable::default();
        let records = [Category::Path, Category::Entrance].map(|c| table.get(c).cloned().unwrap());

        let svg = legend(&records, &Page::default()).to_string();

        assert!(svg.contains(r#"translate(10 148)"#));
        assert!(svg.contains("Raised dashed path"));
        assert!(svg.contains("Raised circle POI"));
        assert!(!svg.contains("Major street"));
        assert!(svg.contains(r#"stroke-dasharray="3 3""#));
        assert_eq!(svg.matches("<circle").count(), 1);
        assert_eq!(svg.matches("<line").count(), 1);
    }
}
