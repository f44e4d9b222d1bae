//! View Processor Module
//! Read-only projections of the cleaned collision table, one per dashboard view.

use crate::data::record::{AffectedCategory, CollisionRecord, CollisionTable, GeoPoint};
use chrono::Timelike;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Upper bound of the minimum-injuries slider.
pub const MAX_INJURY_FILTER: u32 = 19;

/// Number of rows in the top-streets listing.
pub const TOP_STREETS_LIMIT: usize = 5;

/// Buckets in the per-minute histogram.
pub const MINUTES_PER_HOUR: usize = 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ViewError {
    #[error("Hour must be between 0 and 23, got {0}")]
    InvalidHour(u32),
}

/// Records of the cleaned table that fall within one hour of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyView {
    pub hour: u32,
    pub records: Vec<CollisionRecord>,
}

impl HourlyView {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn points(&self) -> Vec<GeoPoint> {
        self.records.iter().map(CollisionRecord::position).collect()
    }

    /// Collision count for each minute of the hour.
    pub fn minute_histogram(&self) -> [u32; MINUTES_PER_HOUR] {
        let mut buckets = [0u32; MINUTES_PER_HOUR];
        for record in &self.records {
            buckets[record.timestamp.minute() as usize] += 1;
        }
        buckets
    }

    /// "Collisions between 8:00 and 9:00" style caption.
    pub fn window_label(&self) -> String {
        hour_window_label(self.hour)
    }
}

/// One row of the top-streets listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreetInjuries {
    pub on_street_name: String,
    pub injured: u32,
}

/// Declarative filters over the cleaned table. Every method borrows the table
/// and returns a new owned value.
pub struct ViewProcessor;

impl ViewProcessor {
    /// Coordinates of collisions with at least `min_injured` injured persons.
    pub fn injury_points(table: &CollisionTable, min_injured: u32) -> Vec<GeoPoint> {
        table
            .records()
            .iter()
            .filter(|r| r.injured_persons >= min_injured)
            .map(CollisionRecord::position)
            .collect()
    }

    /// Collisions whose timestamp falls in `hour`.
    pub fn hourly(table: &CollisionTable, hour: u32) -> Result<HourlyView, ViewError> {
        if hour > 23 {
            return Err(ViewError::InvalidHour(hour));
        }

        let records: Vec<CollisionRecord> = table
            .records()
            .iter()
            .filter(|r| r.timestamp.hour() == hour)
            .cloned()
            .collect();
        debug!(hour, rows = records.len(), "hourly view");

        Ok(HourlyView { hour, records })
    }

    /// The streets with the highest non-zero injury count for `category`.
    ///
    /// Sorted descending by count; equal counts keep table order. Rows without
    /// a street name are skipped.
    pub fn top_streets(table: &CollisionTable, category: AffectedCategory) -> Vec<StreetInjuries> {
        let mut rows: Vec<StreetInjuries> = table
            .records()
            .iter()
            .filter_map(|r| {
                let injured = category.count(r);
                let street = r.on_street_name.as_ref()?;
                (injured >= 1).then(|| StreetInjuries {
                    on_street_name: street.clone(),
                    injured,
                })
            })
            .collect();

        // sort_by is stable
        rows.sort_by(|a, b| b.injured.cmp(&a.injured));
        rows.truncate(TOP_STREETS_LIMIT);
        rows
    }
}

/// Caption for an hour window; wraps 23:00 to 0:00.
pub fn hour_window_label(hour: u32) -> String {
    format!("Collisions between {}:00 and {}:00", hour, (hour + 1) % 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::prelude::DataFrame;

    fn record(hour: u32, minute: u32, persons: u32, street: Option<&str>) -> CollisionRecord {
        CollisionRecord {
            timestamp: NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
            latitude: 40.7 + f64::from(minute) * 0.001,
            longitude: -73.9,
            injured_persons: persons,
            injured_pedestrians: persons,
            injured_cyclists: 0,
            injured_motorists: persons / 2,
            on_street_name: street.map(str::to_string),
        }
    }

    fn table(records: Vec<CollisionRecord>) -> CollisionTable {
        CollisionTable::new(DataFrame::empty(), records)
    }

    fn sample_table() -> CollisionTable {
        table(vec![
            record(8, 0, 0, Some("BROADWAY")),
            record(8, 15, 2, Some("5 AVENUE")),
            record(8, 15, 19, None),
            record(9, 30, 1, Some("BROADWAY")),
            record(8, 59, 3, Some("ATLANTIC AVENUE")),
            record(23, 5, 2, Some("CANAL STREET")),
            record(0, 0, 4, Some("HOUSTON STREET")),
            record(12, 0, 2, Some("WATER STREET")),
        ])
    }

    #[test]
    fn test_injury_points_zero_returns_all() {
        let t = sample_table();
        assert_eq!(ViewProcessor::injury_points(&t, 0).len(), t.len());
    }

    #[test]
    fn test_injury_points_threshold() {
        let t = sample_table();
        let points = ViewProcessor::injury_points(&t, MAX_INJURY_FILTER);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].latitude, t.records()[2].latitude);

        assert_eq!(ViewProcessor::injury_points(&t, 3).len(), 3);
    }

    #[test]
    fn test_hourly_filters_by_hour() {
        let t = sample_table();
        let view = ViewProcessor::hourly(&t, 8).unwrap();

        assert_eq!(view.len(), 4);
        assert!(view.records.iter().all(|r| r.timestamp.hour() == 8));
    }

    #[test]
    fn test_minute_histogram_sums_to_row_count() {
        let t = sample_table();
        let view = ViewProcessor::hourly(&t, 8).unwrap();
        let hist = view.minute_histogram();

        assert_eq!(hist.iter().sum::<u32>() as usize, view.len());
        assert_eq!(hist[0], 1);
        assert_eq!(hist[15], 2);
        assert_eq!(hist[59], 1);
    }

    #[test]
    fn test_hourly_empty_is_not_an_error() {
        let t = sample_table();
        let view = ViewProcessor::hourly(&t, 3).unwrap();

        assert!(view.is_empty());
        assert!(view.minute_histogram().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_hourly_rejects_out_of_range() {
        let t = sample_table();
        assert_eq!(
            ViewProcessor::hourly(&t, 24).unwrap_err(),
            ViewError::InvalidHour(24)
        );
    }

    #[test]
    fn test_views_leave_table_untouched() {
        let t = sample_table();
        let before = t.records().to_vec();

        let _ = ViewProcessor::hourly(&t, 8).unwrap();
        let _ = ViewProcessor::injury_points(&t, 5);
        let streets = ViewProcessor::top_streets(&t, AffectedCategory::Pedestrians);

        assert_eq!(t.records(), before.as_slice());
        assert_eq!(streets.len(), TOP_STREETS_LIMIT);
    }

    #[test]
    fn test_top_streets_pedestrians() {
        let t = sample_table();
        let rows = ViewProcessor::top_streets(&t, AffectedCategory::Pedestrians);

        assert!(rows.len() <= TOP_STREETS_LIMIT);
        assert!(rows.iter().all(|r| r.injured >= 1));
        assert!(rows.windows(2).all(|w| w[0].injured >= w[1].injured));
        let names: Vec<&str> = rows.iter().map(|r| r.on_street_name.as_str()).collect();
        // 19 has no street; ties at 2 keep table order
        assert_eq!(
            names,
            vec![
                "HOUSTON STREET",
                "ATLANTIC AVENUE",
                "5 AVENUE",
                "CANAL STREET",
                "WATER STREET"
            ]
        );
    }

    #[test]
    fn test_top_streets_excludes_zero_counts() {
        let t = sample_table();
        let rows = ViewProcessor::top_streets(&t, AffectedCategory::Cyclists);
        assert!(rows.is_empty());

        let rows = ViewProcessor::top_streets(&t, AffectedCategory::Motorists);
        // persons / 2: 5 AVENUE=1, ATLANTIC=1, CANAL=1, HOUSTON=2, WATER=1
        assert_eq!(rows[0].on_street_name, "HOUSTON STREET");
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_hour_window_label_wraps() {
        assert_eq!(hour_window_label(8), "Collisions between 8:00 and 9:00");
        assert_eq!(hour_window_label(23), "Collisions between 23:00 and 0:00");
    }
}
