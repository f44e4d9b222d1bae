//! Dashboard Views
//! Computes every view of the dashboard from one cleaned table snapshot.

use crate::charts::{HexBin, HexBinner};
use crate::config::DensitySettings;
use crate::data::{
    AffectedCategory, CollisionTable, GeoPoint, HourlyView, StreetInjuries, ViewError,
    ViewProcessor, MINUTES_PER_HOUR,
};
use crate::stats::{HourlySummary, StatsCalculator};
use serde::Serialize;
use tracing::debug;

/// Densest hexagons listed in a report.
const REPORTED_BINS: usize = 10;

/// User-selected parameters, one per view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewParams {
    pub min_injured: u32,
    pub hour: u32,
    pub category: AffectedCategory,
}

/// Initial camera for the 3D density layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
}

/// All derived views for one parameter set.
#[derive(Debug, Clone)]
pub struct DashboardViews {
    pub params: ViewParams,
    pub injury_points: Vec<GeoPoint>,
    pub hourly: HourlyView,
    pub histogram: [u32; MINUTES_PER_HOUR],
    pub summary: HourlySummary,
    /// `None` when the selected hour has no collisions.
    pub view_state: Option<ViewState>,
    pub binner: Option<HexBinner>,
    pub density_bins: Vec<HexBin>,
    pub top_streets: Vec<StreetInjuries>,
}

impl DashboardViews {
    /// Recompute every view from `table`. The table is only read.
    pub fn compute(
        table: &CollisionTable,
        params: ViewParams,
        density: &DensitySettings,
    ) -> Result<Self, ViewError> {
        let injury_points = ViewProcessor::injury_points(table, params.min_injured);
        let hourly = ViewProcessor::hourly(table, params.hour)?;
        let histogram = hourly.minute_histogram();
        let summary = StatsCalculator::hourly_summary(&hourly);

        let view_state = summary.midpoint.map(|mid| ViewState {
            latitude: mid.latitude,
            longitude: mid.longitude,
            zoom: density.zoom,
            pitch: density.pitch,
        });
        let binner = summary.midpoint.map(|mid| density.binner(mid.latitude));
        let density_bins = binner
            .map(|b| b.bin(&hourly.points()))
            .unwrap_or_default();

        let top_streets = ViewProcessor::top_streets(table, params.category);

        debug!(
            min_injured = params.min_injured,
            hour = params.hour,
            category = %params.category,
            points = injury_points.len(),
            hourly = hourly.len(),
            bins = density_bins.len(),
            "recomputed dashboard views"
        );

        Ok(Self {
            params,
            injury_points,
            hourly,
            histogram,
            summary,
            view_state,
            binner,
            density_bins,
            top_streets,
        })
    }

    pub fn report(&self, table: &CollisionTable) -> DashboardReport {
        DashboardReport {
            rows: table.len(),
            columns: table.column_names(),
            params: self.params,
            injury_map_points: self.injury_points.len(),
            hour_window: self.hourly.window_label(),
            hourly: self.summary.clone(),
            minute_histogram: self.histogram.to_vec(),
            view_state: self.view_state,
            densest_bins: self
                .density_bins
                .iter()
                .take(REPORTED_BINS)
                .cloned()
                .collect(),
            top_streets: self.top_streets.clone(),
        }
    }
}

/// JSON-friendly summary of the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub rows: usize,
    pub columns: Vec<String>,
    pub params: ViewParams,
    pub injury_map_points: usize,
    pub hour_window: String,
    pub hourly: HourlySummary,
    pub minute_histogram: Vec<u32>,
    pub view_state: Option<ViewState>,
    pub densest_bins: Vec<HexBin>,
    pub top_streets: Vec<StreetInjuries>,
}
