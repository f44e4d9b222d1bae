//! Collision Record Types
//! Typed rows of the cleaned collision table.

use chrono::NaiveDateTime;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;

/// Name of the combined timestamp column in the cleaned frame.
pub const TIMESTAMP_COLUMN: &str = "date/time";

/// Raw column names after lowercasing.
pub mod columns {
    pub const CRASH_DATE: &str = "crash_date";
    pub const CRASH_TIME: &str = "crash_time";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const INJURED_PERSONS: &str = "injured_persons";
    pub const INJURED_PEDESTRIANS: &str = "injured_pedestrians";
    pub const INJURED_CYCLISTS: &str = "injured_cyclists";
    pub const INJURED_MOTORISTS: &str = "injured_motorists";
    pub const ON_STREET_NAME: &str = "on_street_name";
}

/// One row of the cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionRecord {
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub injured_persons: u32,
    pub injured_pedestrians: u32,
    pub injured_cyclists: u32,
    pub injured_motorists: u32,
    pub on_street_name: Option<String>,
}

impl CollisionRecord {
    pub fn position(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A latitude/longitude pair handed to the map widgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Category of affected person used by the top-streets view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AffectedCategory {
    #[default]
    Pedestrians,
    Cyclists,
    Motorists,
}

impl AffectedCategory {
    pub const ALL: [AffectedCategory; 3] = [
        AffectedCategory::Pedestrians,
        AffectedCategory::Cyclists,
        AffectedCategory::Motorists,
    ];

    /// Injury count of this category on a record.
    pub fn count(self, record: &CollisionRecord) -> u32 {
        match self {
            AffectedCategory::Pedestrians => record.injured_pedestrians,
            AffectedCategory::Cyclists => record.injured_cyclists,
            AffectedCategory::Motorists => record.injured_motorists,
        }
    }

    /// Column backing this category in the cleaned frame.
    pub fn column(self) -> &'static str {
        match self {
            AffectedCategory::Pedestrians => columns::INJURED_PEDESTRIANS,
            AffectedCategory::Cyclists => columns::INJURED_CYCLISTS,
            AffectedCategory::Motorists => columns::INJURED_MOTORISTS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AffectedCategory::Pedestrians => "Pedestrians",
            AffectedCategory::Cyclists => "Cyclists",
            AffectedCategory::Motorists => "Motorists",
        }
    }
}

impl fmt::Display for AffectedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for AffectedCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pedestrians" | "pedestrian" => Ok(AffectedCategory::Pedestrians),
            "cyclists" | "cyclist" => Ok(AffectedCategory::Cyclists),
            "motorists" | "motorist" => Ok(AffectedCategory::Motorists),
            _ => Err(format!("unknown affected category: {s}")),
        }
    }
}

/// The cleaned table: coordinate-complete, lower-cased, one combined timestamp.
///
/// Immutable once built. `frame` keeps every pass-through column for the raw
/// listing; `records` is the typed projection the views read.
#[derive(Debug, Clone)]
pub struct CollisionTable {
    frame: DataFrame,
    records: Vec<CollisionRecord>,
}

impl CollisionTable {
    pub(crate) fn new(frame: DataFrame, records: Vec<CollisionRecord>) -> Self {
        Self { frame, records }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn records(&self) -> &[CollisionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names of the cleaned frame.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl PartialEq for CollisionTable {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records && self.frame.equals_missing(&other.frame)
    }
}
