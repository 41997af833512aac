use anyhow::Result;
use geo::coord;

use crate::{
    feature::Layer,
    geometry::simplify_coords,
    render::{Layout, RenderError},
    simplify::{PROP_REDUCTION, VertexCounts},
};

use super::*;

#[test]
fn shallow_bump_in_source_units() {
    let line = [coord! { x: 0.0, y: 0.0 }, coord! { x: 5.0, y: 0.01 }, coord! { x: 10.0, y: 0.0 }];
    let simplified = simplify_coords(&line, 0.01 + f64::EPSILON);

    assert_eq!(simplified, vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }]);
}

#[test]
fn fifty_vertex_building() -> Result<()> {
    init_test_logger();

    let building = make_building("Hall", (0.0, 0.0), 50.0, 50);
    ensure!(building.vertex_count() == 50);

    let features = FeatureSet::new().with_layer(Layer::Buildings, vec![building]);
    let result = simplify_layers(&features, 2.0, Backend::Native);

    let VertexCounts { before, after } = result.stats.totals;
    ensure!(before == 50, "before {before}");
    ensure!(after < before && after >= 4, "after {after}");
    ensure!(result.stats.reduction() > 0);

    let hall = &result.features.layer(Layer::Buildings)[0];
    ensure!(hall.properties[PROP_REDUCTION] == result.stats.reduction());

    Ok(())
}

#[test]
fn empty_buildings_are_nothing_to_render() -> Result<()> {
    let features = FeatureSet::new()
        .with_layer(Layer::Buildings, vec![])
        .with_layer(Layer::Streets, vec![make_street("Guy", &[(0.0, 0.0), (0.0, 100.0)])]);

    let err = run("empty-buildings", &features, RenderOptions { layout: Layout::MarginReserved, legend: false })
        .unwrap_err();

    ensure!(err.downcast_ref::<RenderError>() == Some(&RenderError::NothingToRender), "{err}");

    Ok(())
}

#[test]
fn unsided_label_is_left_out() -> Result<()> {
    let features = FeatureSet::new()
        .with_layer(Layer::Buildings, vec![make_building("Library", (0.0, 0.0), 40.0, 13)])
        .with_layer(Layer::StreetLabels, vec![
            make_point("De Maisonneuve", 0.0, 60.0).with_property("side", "top"),
            make_point("Mackay", -60.0, 0.0),
            make_point("Bishop", 60.0, 0.0).with_property("side", "Right"),
        ]);

    let drawing = run("unsided-label", &features, RenderOptions { layout: Layout::MarginReserved, legend: false })?;
    let svg = drawing.document.to_string();

    ensure!(drawing.labels == 2, "{} labels", drawing.labels);
    ensure!(svg.contains("De Maisonneuve"));
    ensure!(svg.contains("Bishop"));
    ensure!(!svg.contains("Mackay"));

    Ok(())
}

#[test]
fn single_point_stays_in_the_content() -> Result<()> {
    let features = FeatureSet::new()
        .with_layer(Layer::Entrances, vec![make_point("Door", 0.0, 0.0)]);

    let drawing = run("single-point", &features, RenderOptions::default())?;
    let p = drawing.projection.project(at(0.0, 0.0));
    let content = Page::default().content_rect();

    ensure!(drawing.primitives == 1);
    ensure!(p.x.is_finite() && p.y.is_finite());
    ensure!(p.x >= content.left && p.x <= content.right, "{p:?}");
    ensure!(p.y >= content.top && p.y <= content.bottom, "{p:?}");

    Ok(())
}

#[test]
fn wide_area_keeps_its_aspect() -> Result<()> {
    // 400 m by 100 m
    let features = FeatureSet::new()
        .with_layer(Layer::Streets, vec![
            make_street("Ste-Catherine", &[(0.0, 0.0), (400.0, 0.0)]),
            make_street("Crescent", &[(200.0, 0.0), (200.0, 100.0)]),
        ]);

    let drawing = run("wide-area", &features, RenderOptions::default())?;
    let projection = drawing.projection;

    let sw = projection.project(at(0.0, 0.0));
    let ne = projection.project(at(400.0, 100.0));
    let (w, h) = (ne.x - sw.x, sw.y - ne.y);

    ensure!((w / h - 4.0).abs() < 0.01, "{w} x {h}");
    // Width bound, centred vertically
    ensure!((sw.x - 10.0).abs() < 0.001 && (ne.x - 287.0).abs() < 0.001);
    ensure!(((ne.y - 10.0) - (200.0 - sw.y)).abs() < 0.01);

    Ok(())
}
