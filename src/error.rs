//! Data-quality errors.
//!
//! These are raised for records whose geometry cannot be trusted. Callers
//! log them and drop the offending record or station pair; they are never
//! corrected in place.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Non-finite coordinate ({lon}, {lat})")]
    NonFiniteCoordinate { lon: f64, lat: f64 },

    #[error("Malformed location {raw:?}, expected \"lon,lat\"")]
    MalformedLocation { raw: String },

    #[error("Itinerary {index} is missing required fields: {reason}")]
    MalformedItinerary { index: usize, reason: String },

    #[error("Column {column} holds non-integer code {value}")]
    NonIntegerCode { column: &'static str, value: f64 },

    #[error("Unrecognised timestamp {raw:?}")]
    MalformedTimestamp { raw: String },

    #[error("Duplicate station {name:?}")]
    DuplicateStation { name: String },

    #[error("No coordinate recorded for stop {stop:?} on line {line:?}")]
    MissingStopCoordinate { line: String, stop: String },
}
