//! Taxi GPS trajectory ingestion and pre-filtering.
//!
//! Input is the fleet CSV export with at least the columns
//! `LICENSEPLATENO, GPS_TIME, EFF, CAR_STAT1, LONGITUDE, LATITUDE`.
//! Files ending in `.gz` are decompressed on the fly.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use tracing::{error, info};

use crate::error::DataError;
use crate::geo::GeoPoint;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

/// Occupancy status reported by the taximeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleStatus {
    /// Code 4.
    Vacant,
    /// Code 5.
    Occupied,
    Other(i64),
}

impl From<i64> for VehicleStatus {
    fn from(code: i64) -> Self {
        match code {
            4 => VehicleStatus::Vacant,
            5 => VehicleStatus::Occupied,
            other => VehicleStatus::Other(other),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "LICENSEPLATENO")]
    vehicle_id: String,
    #[serde(rename = "GPS_TIME")]
    gps_time: String,
    // Exports round-tripped through dataframes write these as `1.0`, `5.0`.
    #[serde(rename = "EFF")]
    eff: f64,
    #[serde(rename = "CAR_STAT1")]
    status: f64,
    #[serde(rename = "LONGITUDE")]
    lon: f64,
    #[serde(rename = "LATITUDE")]
    lat: f64,
}

/// One GPS ping.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub vehicle_id: String,
    pub timestamp: NaiveDateTime,
    pub status: VehicleStatus,
    pub location: GeoPoint,
    /// `EFF == 1` in the export.
    pub valid: bool,
}

impl VehicleRecord {
    pub fn new(
        vehicle_id: &str,
        timestamp: NaiveDateTime,
        status: VehicleStatus,
        location: GeoPoint,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            timestamp,
            status,
            location,
            valid: true,
        }
    }
}

impl TryFrom<RawRecord> for VehicleRecord {
    type Error = DataError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: parse_timestamp(&raw.gps_time)?,
            location: GeoPoint::checked(raw.lon, raw.lat)?,
            status: VehicleStatus::from(integer_code("CAR_STAT1", raw.status)?),
            valid: integer_code("EFF", raw.eff)? == 1,
            vehicle_id: raw.vehicle_id,
        })
    }
}

fn integer_code(column: &'static str, value: f64) -> Result<i64, DataError> {
    if value.is_finite() && value.fract() == 0.0 {
        Ok(value as i64)
    } else {
        Err(DataError::NonIntegerCode { column, value })
    }
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DataError> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| DataError::MalformedTimestamp {
            raw: raw.to_string(),
        })
}

/// Records read from one trajectory file.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<VehicleRecord>,
    /// Rows that could not be decoded; each was logged.
    pub skipped: usize,
}

/// Reads trajectory rows from any CSV source.
///
/// A row that fails to decode is logged with its line number and skipped;
/// it never aborts the read.
pub fn read_records<R: Read>(reader: R) -> LoadedRecords {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut loaded = LoadedRecords::default();

    for result in rdr.deserialize::<RawRecord>() {
        let decoded = result
            .map_err(anyhow::Error::from)
            .and_then(|raw| Ok(VehicleRecord::try_from(raw)?));

        match decoded {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                error!(error = %e, "Skipping unreadable GPS record");
                loaded.skipped += 1;
            }
        }
    }

    loaded
}

/// Opens `path` (plain or `.gz`) and reads every trajectory row.
#[tracing::instrument]
pub fn load_records(path: &str) -> Result<LoadedRecords> {
    let file = File::open(path).with_context(|| format!("Failed to open trajectory file '{path}'"))?;

    let reader: Box<dyn Read> = if path.ends_with(".gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let loaded = read_records(reader);
    info!(
        records = loaded.records.len(),
        skipped = loaded.skipped,
        "Trajectory file loaded"
    );
    Ok(loaded)
}

/// Clock-time window, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let t = timestamp.time();
        self.start <= t && t <= self.end
    }
}

/// Keeps valid records whose time of day falls inside `window`.
pub fn filter_records(records: Vec<VehicleRecord>, window: &TimeWindow) -> Vec<VehicleRecord> {
    records
        .into_iter()
        .filter(|r| r.valid && window.contains(&r.timestamp))
        .collect()
}
