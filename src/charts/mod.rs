//! Charts module - Chart definitions and rendering

mod plotter;
mod renderer;
mod spec;

pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};
pub use spec::{
    build_chart_set, chart_specs, delta_charts, dop_charts, ChartData, ChartKind, ChartSpec,
    Units, DELTA_CSV_HEADER, DOP_CSV_HEADER,
};
