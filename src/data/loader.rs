//! Collision Data Loader Module
//! Reads a bounded number of rows from a CSV (or zipped CSV) source and builds
//! the cleaned collision table using Polars.

use crate::data::record::{columns, CollisionRecord, CollisionTable, TIMESTAMP_COLUMN};
use ::zip::result::ZipError;
use ::zip::ZipArchive;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Default number of rows read from the source.
pub const DEFAULT_NROWS: usize = 100_000;

/// Rows sampled by Polars to infer column types.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Zero-based data row in the source, kept through filtering for error reports.
const SOURCE_ROW_COLUMN: &str = "__source_row";

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const TIME_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"];

/// Columns that must be present after lowercasing.
const REQUIRED_COLUMNS: [&str; 9] = [
    columns::CRASH_DATE,
    columns::CRASH_TIME,
    columns::LATITUDE,
    columns::LONGITUDE,
    columns::INJURED_PERSONS,
    columns::INJURED_PEDESTRIANS,
    columns::INJURED_CYCLISTS,
    columns::INJURED_MOTORISTS,
    columns::ON_STREET_NAME,
];

/// Load failures. Row numbers count data rows from 0, header excluded.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Row count must be positive")]
    InvalidRowCount,
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to open archive: {0}")]
    Archive(#[from] ZipError),
    #[error("No CSV file found in archive {}", .0.display())]
    NoCsvEntry(PathBuf),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid {column} at row {row}: {value:?}")]
    InvalidCoordinate {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Invalid date/time at row {row}: date={date:?} time={time:?}")]
    InvalidTimestamp {
        row: usize,
        date: String,
        time: String,
    },
}

/// Loads and cleans the collision dataset.
#[derive(Debug, Clone)]
pub struct DataLoader {
    path: PathBuf,
    nrows: usize,
}

impl DataLoader {
    pub fn new(path: impl Into<PathBuf>, nrows: usize) -> Self {
        Self {
            path: path.into(),
            nrows,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Load the source and produce the cleaned table.
    pub fn load(&self) -> Result<CollisionTable, LoaderError> {
        Self::load_data(&self.path, self.nrows)
    }

    /// Read at most `nrows` rows from `path`, drop rows without coordinates,
    /// lowercase column names and merge the crash date/time into `date/time`.
    ///
    /// A coordinate that is present but not numeric, or a date/time that
    /// cannot be parsed, fails the whole load.
    pub fn load_data(path: &Path, nrows: usize) -> Result<CollisionTable, LoaderError> {
        if nrows == 0 {
            return Err(LoaderError::InvalidRowCount);
        }
        let start = Instant::now();

        let bytes = Self::read_source(path, nrows)?;
        let mut frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_n_rows(Some(nrows))
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        let raw_rows = frame.height();

        let lowered: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|name| name.to_lowercase())
            .collect();
        frame.set_column_names(lowered)?;

        for name in REQUIRED_COLUMNS {
            if frame.get_column_index(name).is_none() {
                return Err(LoaderError::MissingColumn(name.to_string()));
            }
        }

        for name in [columns::LATITUDE, columns::LONGITUDE] {
            let parsed = Self::parse_coordinates(&frame, name)?;
            frame.with_column(parsed)?;
        }

        let frame = frame
            .with_row_index(SOURCE_ROW_COLUMN.into(), None)?
            .lazy()
            .filter(
                col(columns::LATITUDE)
                    .is_not_null()
                    .and(col(columns::LONGITUDE).is_not_null()),
            )
            .collect()?;
        debug!(
            raw_rows,
            kept_rows = frame.height(),
            "dropped rows without coordinates"
        );

        let timestamps = Self::combine_timestamps(&frame)?;
        let stamp_column = Column::new(TIMESTAMP_COLUMN.into(), timestamps.as_slice());

        let mut frame = frame
            .drop(SOURCE_ROW_COLUMN)?
            .drop(columns::CRASH_DATE)?
            .drop(columns::CRASH_TIME)?;
        frame.with_column(stamp_column)?;

        let records = Self::extract_records(&frame, timestamps)?;

        info!(
            path = %path.display(),
            rows = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded collision table"
        );

        Ok(CollisionTable::new(frame, records))
    }

    /// Read the header and at most `nrows` records, from the file itself or
    /// from the first `.csv` entry of a zip.
    fn read_source(path: &Path, nrows: usize) -> Result<Vec<u8>, LoaderError> {
        let io_err = |source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let is_zip = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        let file = File::open(path).map_err(io_err)?;
        if !is_zip {
            return read_csv_prefix(BufReader::new(file), nrows).map_err(io_err);
        }

        let mut archive = ZipArchive::new(file)?;
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            if !entry.name().to_lowercase().ends_with(".csv") {
                continue;
            }
            debug!(entry = entry.name(), "reading csv entry from archive");
            return read_csv_prefix(BufReader::new(entry), nrows).map_err(io_err);
        }

        Err(LoaderError::NoCsvEntry(path.to_path_buf()))
    }

    /// Cast a coordinate column to `f64`. Empty cells stay null; any other
    /// value that does not parse is an error.
    fn parse_coordinates(frame: &DataFrame, name: &str) -> Result<Column, LoaderError> {
        let raw = frame.column(name)?;
        let parsed = raw.cast(&DataType::Float64)?;
        if parsed.null_count() == raw.null_count() {
            return Ok(parsed);
        }

        let text = raw.cast(&DataType::String)?;
        let bad = text
            .str()?
            .into_iter()
            .zip(parsed.f64()?)
            .enumerate()
            .find_map(|(row, pair)| match pair {
                (Some(value), None) => Some((row, value.to_string())),
                _ => None,
            });
        match bad {
            Some((row, value)) => Err(LoaderError::InvalidCoordinate {
                row,
                column: name.to_string(),
                value,
            }),
            None => Ok(parsed),
        }
    }

    /// Parse the date and time columns row by row into combined timestamps.
    fn combine_timestamps(frame: &DataFrame) -> Result<Vec<NaiveDateTime>, LoaderError> {
        let dates = frame.column(columns::CRASH_DATE)?.cast(&DataType::String)?;
        let times = frame.column(columns::CRASH_TIME)?.cast(&DataType::String)?;
        let source_rows = frame.column(SOURCE_ROW_COLUMN)?.cast(&DataType::UInt64)?;
        let rows: Vec<(Option<&str>, Option<&str>, usize)> = dates
            .str()?
            .into_iter()
            .zip(times.str()?)
            .zip(source_rows.u64()?.into_no_null_iter())
            .map(|((date, time), row)| (date, time, row as usize))
            .collect();

        rows.par_iter()
            .map(|&(date, time, row)| {
                date.zip(time)
                    .and_then(|(d, t)| parse_timestamp(d, t))
                    .ok_or_else(|| LoaderError::InvalidTimestamp {
                        row,
                        date: date.unwrap_or_default().to_string(),
                        time: time.unwrap_or_default().to_string(),
                    })
            })
            .collect()
    }

    fn extract_records(
        frame: &DataFrame,
        timestamps: Vec<NaiveDateTime>,
    ) -> Result<Vec<CollisionRecord>, LoaderError> {
        let latitudes = frame.column(columns::LATITUDE)?.f64()?;
        let longitudes = frame.column(columns::LONGITUDE)?.f64()?;
        let persons = Self::count_column(frame, columns::INJURED_PERSONS)?;
        let pedestrians = Self::count_column(frame, columns::INJURED_PEDESTRIANS)?;
        let cyclists = Self::count_column(frame, columns::INJURED_CYCLISTS)?;
        let motorists = Self::count_column(frame, columns::INJURED_MOTORISTS)?;
        let streets = frame
            .column(columns::ON_STREET_NAME)?
            .cast(&DataType::String)?;
        let streets: Vec<Option<String>> = streets
            .str()?
            .into_iter()
            .map(|s| {
                s.map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect();

        let records = timestamps
            .into_iter()
            .zip(latitudes.into_no_null_iter())
            .zip(longitudes.into_no_null_iter())
            .zip(streets)
            .enumerate()
            .map(
                |(i, (((timestamp, latitude), longitude), on_street_name))| CollisionRecord {
                    timestamp,
                    latitude,
                    longitude,
                    injured_persons: persons[i],
                    injured_pedestrians: pedestrians[i],
                    injured_cyclists: cyclists[i],
                    injured_motorists: motorists[i],
                    on_street_name,
                },
            )
            .collect();

        Ok(records)
    }

    /// Read an injury-count column; missing or negative cells count as zero.
    fn count_column(frame: &DataFrame, name: &str) -> Result<Vec<u32>, LoaderError> {
        let values = frame.column(name)?.cast(&DataType::Int64)?;
        Ok(values
            .i64()?
            .into_iter()
            .map(|v| v.and_then(|v| u32::try_from(v).ok()).unwrap_or(0))
            .collect())
    }
}

/// Combine a raw date field and a raw time field into one timestamp.
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    let time = time.trim();

    let day = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(date, DATE_TIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })?;
    let clock = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())?;

    Some(day.and_time(clock))
}

/// Copy the header line and the next `nrows` records from `reader`, leaving
/// the rest of the source unread. A quoted field may span lines; blank lines
/// are not counted as records.
fn read_csv_prefix<R: BufRead>(mut reader: R, nrows: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut records = 0;
    let mut in_quotes = false;

    while records <= nrows {
        let start = out.len();
        if reader.read_until(b'\n', &mut out)? == 0 {
            break;
        }
        let line = &out[start..];
        if line.iter().filter(|&&b| b == b'"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
        if !in_quotes && !line.trim_ascii().is_empty() {
            records += 1;
        }
    }

    Ok(out)
}
