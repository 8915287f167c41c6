//! Flattening routing-API itineraries into per-stop records.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::DataError;
use crate::geo::GeoPoint;
use crate::routing::{ApiStop, BusLine, TransitRoute};

/// How a rider uses a stop on a bus-line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopRole {
    Boarding,
    Via,
    Alighting,
}

/// One stop mention, tagged with the station pair and line it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStop {
    pub origin: String,
    pub destination: String,
    pub line: String,
    pub role: StopRole,
    pub stop_name: String,
    pub location: GeoPoint,
}

impl RouteStop {
    fn dedup_key(&self) -> (&str, &str, &str, StopRole, &str, (u64, u64)) {
        (
            self.origin.as_str(),
            self.destination.as_str(),
            self.line.as_str(),
            self.role,
            self.stop_name.as_str(),
            self.location.bits(),
        )
    }
}

/// Emits the stop records of the first `max_itineraries` itineraries of `route`.
///
/// Each bus line yields its boarding stop, its via stops in API order, then
/// its alighting stop.
///
/// # Errors
///
/// Fails on the first kept itinerary missing a required field, or the first
/// stop whose location string cannot be parsed. The caller drops the whole
/// pair in that case rather than keep partial output.
pub fn stops_from_route(
    origin: &str,
    destination: &str,
    route: &TransitRoute,
    max_itineraries: usize,
) -> Result<Vec<RouteStop>, DataError> {
    let mut stops = Vec::new();

    let itineraries = route.itineraries(max_itineraries)?;
    let lines = itineraries
        .iter()
        .flat_map(|transit| transit.segments.iter())
        .filter_map(|segment| segment.bus.as_ref())
        .flat_map(|bus| bus.buslines.iter());

    for line in lines {
        push_line(&mut stops, origin, destination, line)?;
    }

    Ok(stops)
}

fn push_line(
    stops: &mut Vec<RouteStop>,
    origin: &str,
    destination: &str,
    line: &BusLine,
) -> Result<(), DataError> {
    let record = |role: StopRole, stop: &ApiStop| -> Result<RouteStop, DataError> {
        Ok(RouteStop {
            origin: origin.to_string(),
            destination: destination.to_string(),
            line: line.name.clone(),
            role,
            stop_name: stop.name.clone(),
            location: GeoPoint::parse_location(&stop.location)?,
        })
    };

    stops.push(record(StopRole::Boarding, &line.departure_stop)?);
    for via in &line.via_stops {
        stops.push(record(StopRole::Via, via)?);
    }
    stops.push(record(StopRole::Alighting, &line.arrival_stop)?);

    Ok(())
}

/// Drops exact duplicates (same pair, line, role, stop and coordinates),
/// keeping the first occurrence and the original order.
pub fn dedup_stops(stops: Vec<RouteStop>) -> Vec<RouteStop> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::new();
        stops.iter().map(|stop| seen.insert(stop.dedup_key())).collect()
    };

    stops
        .into_iter()
        .zip(keep)
        .filter_map(|(stop, keep)| keep.then_some(stop))
        .collect()
}
