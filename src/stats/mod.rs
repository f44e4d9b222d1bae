//! Stats module - summary statistics for dashboard views

mod calculator;

pub use calculator::{HourlySummary, StatsCalculator};
