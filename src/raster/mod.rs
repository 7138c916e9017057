/// SVG rasterization.
pub mod svg;
