pub mod geojson_input;
pub mod svg_output;
