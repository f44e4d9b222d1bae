//! Charts module - Chart rendering

mod hexbin;
mod plotter;
mod renderer;

pub use hexbin::{HexBin, HexBinner};
pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};
