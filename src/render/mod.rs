//! Chart rendering.

pub mod style;
pub mod svg;

pub use style::PlotStyle;
pub use svg::render_svg_chart;
