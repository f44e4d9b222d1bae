//! Statistics Calculator Module
//! Summary statistics over view outputs, guarded for empty inputs.

use crate::data::{GeoPoint, HourlyView};
use serde::Serialize;
use statrs::statistics::Statistics;

/// Summary of one hourly view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySummary {
    pub hour: u32,
    pub count: usize,
    /// Average position of the hour's collisions; `None` when there are none.
    pub midpoint: Option<GeoPoint>,
    pub mean_injured: Option<f64>,
    pub max_injured: u32,
    /// Busiest minute of the hour (earliest on ties).
    pub peak_minute: Option<usize>,
}

/// Handles statistical calculations for the dashboard views.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Mean latitude/longitude of a set of points.
    pub fn midpoint(points: &[GeoPoint]) -> Option<GeoPoint> {
        if points.is_empty() {
            return None;
        }

        let latitude = points.iter().map(|p| p.latitude).mean();
        let longitude = points.iter().map(|p| p.longitude).mean();
        Some(GeoPoint {
            latitude,
            longitude,
        })
    }

    /// Mean of a set of counts, `None` for an empty input.
    pub fn mean_count(values: &[u32]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().map(|&v| f64::from(v)).mean())
    }

    pub fn hourly_summary(view: &HourlyView) -> HourlySummary {
        let injured: Vec<u32> = view.records.iter().map(|r| r.injured_persons).collect();
        let histogram = view.minute_histogram();
        let peak_minute = histogram
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .fold(None, |best: Option<(usize, u32)>, (minute, &count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((minute, count)),
            })
            .map(|(minute, _)| minute);

        HourlySummary {
            hour: view.hour,
            count: view.len(),
            midpoint: Self::midpoint(&view.points()),
            mean_injured: Self::mean_count(&injured),
            max_injured: injured.iter().copied().fold(0, u32::max),
            peak_minute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CollisionRecord;
    use chrono::NaiveDate;

    fn record(minute: u32, lat: f64, lon: f64, injured: u32) -> CollisionRecord {
        CollisionRecord {
            timestamp: NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(8, minute, 0)
                .unwrap(),
            latitude: lat,
            longitude: lon,
            injured_persons: injured,
            injured_pedestrians: 0,
            injured_cyclists: 0,
            injured_motorists: injured,
            on_street_name: None,
        }
    }

    #[test]
    fn test_midpoint_empty_is_none() {
        assert_eq!(StatsCalculator::midpoint(&[]), None);
        assert_eq!(StatsCalculator::mean_count(&[]), None);
    }

    #[test]
    fn test_midpoint_averages() {
        let points = [
            GeoPoint {
                latitude: 40.0,
                longitude: -74.0,
            },
            GeoPoint {
                latitude: 41.0,
                longitude: -73.0,
            },
        ];
        let mid = StatsCalculator::midpoint(&points).unwrap();
        assert!((mid.latitude - 40.5).abs() < 1e-12);
        assert!((mid.longitude + 73.5).abs() < 1e-12);
    }

    #[test]
    fn test_hourly_summary() {
        let view = HourlyView {
            hour: 8,
            records: vec![
                record(5, 40.0, -74.0, 1),
                record(30, 40.2, -74.2, 4),
                record(30, 40.4, -74.4, 1),
            ],
        };

        let summary = StatsCalculator::hourly_summary(&view);

        assert_eq!(summary.count, 3);
        assert_eq!(summary.max_injured, 4);
        assert_eq!(summary.peak_minute, Some(30));
        assert!((summary.mean_injured.unwrap() - 2.0).abs() < 1e-12);
        assert!((summary.midpoint.unwrap().latitude - 40.2).abs() < 1e-9);
    }

    #[test]
    fn test_hourly_summary_empty() {
        let view = HourlyView {
            hour: 4,
            records: Vec::new(),
        };

        let summary = StatsCalculator::hourly_summary(&view);

        assert_eq!(summary.count, 0);
        assert_eq!(summary.midpoint, None);
        assert_eq!(summary.mean_injured, None);
        assert_eq!(summary.peak_minute, None);
        assert_eq!(summary.max_injured, 0);
    }
}
