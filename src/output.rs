//! Output formatting and persistence for report tables.
//!
//! Tables are written as CSV (list columns joined with `|`) and whole
//! reports as pretty JSON for the plotting step.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::bus::aggregate::{ConnectivityRow, DirectTripRow, NamedStop};

const LIST_SEPARATOR: &str = "|";

/// Logs any value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs any value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `rows` to a CSV file at `path`, replacing any existing file.
///
/// The header row is written even when `rows` is empty.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV table");

    let file = File::create(path)
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Serializes `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    debug!(path = %path.display(), "Writing JSON report");

    let file = File::create(path)
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;

    Ok(())
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(LIST_SEPARATOR)
}

fn join_names(stops: &[NamedStop]) -> String {
    join(stops.iter().map(|s| s.name.as_str()))
}

fn join_coords(stops: &[NamedStop], coord: fn(&NamedStop) -> f64) -> String {
    stops
        .iter()
        .map(|s| coord(s).to_string())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// CSV shape of a [`ConnectivityRow`].
#[derive(Debug, Serialize)]
pub struct ConnectivityCsvRow {
    pub station: String,
    pub line: String,
    pub stop_names: String,
    pub longitudes: String,
    pub latitudes: String,
}

impl From<&ConnectivityRow> for ConnectivityCsvRow {
    fn from(row: &ConnectivityRow) -> Self {
        Self {
            station: row.station.clone(),
            line: row.line.clone(),
            stop_names: join_names(&row.stops),
            longitudes: join_coords(&row.stops, |s| s.lon),
            latitudes: join_coords(&row.stops, |s| s.lat),
        }
    }
}

/// CSV shape of a [`DirectTripRow`].
#[derive(Debug, Serialize)]
pub struct DirectTripCsvRow {
    pub origin: String,
    pub destination: String,
    pub line: String,
    pub boarding_stops: String,
    pub boarding_longitudes: String,
    pub boarding_latitudes: String,
    pub alighting_stops: String,
    pub alighting_longitudes: String,
    pub alighting_latitudes: String,
}

impl From<&DirectTripRow> for DirectTripCsvRow {
    fn from(row: &DirectTripRow) -> Self {
        Self {
            origin: row.origin.clone(),
            destination: row.destination.clone(),
            line: row.line.clone(),
            boarding_stops: join_names(&row.boarding),
            boarding_longitudes: join_coords(&row.boarding, |s| s.lon),
            boarding_latitudes: join_coords(&row.boarding, |s| s.lat),
            alighting_stops: join_names(&row.alighting),
            alighting_longitudes: join_coords(&row.alighting, |s| s.lon),
            alighting_latitudes: join_coords(&row.alighting, |s| s.lat),
        }
    }
}
