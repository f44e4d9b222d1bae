//! Data module - collision loading, caching and view projections

mod cache;
mod loader;
mod processor;
mod record;

pub use cache::{TableCache, DEFAULT_CACHE_CAPACITY};
pub use loader::{parse_timestamp, DataLoader, LoaderError, DEFAULT_NROWS};
pub use processor::{
    hour_window_label, HourlyView, StreetInjuries, ViewError, ViewProcessor, MAX_INJURY_FILTER,
    MINUTES_PER_HOUR, TOP_STREETS_LIMIT,
};
pub use record::{
    columns, AffectedCategory, CollisionRecord, CollisionTable, GeoPoint, TIMESTAMP_COLUMN,
};
