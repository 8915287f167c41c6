//! Grouping stop records into the metro-connectivity and direct-trip tables.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::bus::records::{RouteStop, StopRole};
use crate::error::DataError;
use crate::geo::GeoPoint;
use crate::proximity::within_radius;
use crate::stations::StationSet;

/// A stop name with its resolved coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedStop {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

impl NamedStop {
    fn new(name: &str, location: GeoPoint) -> Self {
        Self {
            name: name.to_string(),
            lon: location.lon,
            lat: location.lat,
        }
    }
}

/// Bus stops of one line reachable on foot from one metro station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityRow {
    pub station: String,
    pub line: String,
    pub stops: Vec<NamedStop>,
}

/// Where riders board and alight a line when travelling between two stations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectTripRow {
    pub origin: String,
    pub destination: String,
    pub line: String,
    pub boarding: Vec<NamedStop>,
    pub alighting: Vec<NamedStop>,
}

/// `false` for lines whose name carries the metro marker.
pub fn is_bus_line(line: &str, metro_marker: &str) -> bool {
    metro_marker.is_empty() || !line.contains(metro_marker)
}

/// Groups values by key, keeping keys in order of first appearance.
struct OrderedGroups<K, V> {
    index: HashMap<K, usize>,
    groups: Vec<(K, Vec<V>)>,
}

impl<K: Eq + Hash + Clone, V> OrderedGroups<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn group_mut(&mut self, key: K) -> &mut Vec<V> {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.groups.push((key.clone(), Vec::new()));
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx].1
    }

    fn into_groups(self) -> Vec<(K, Vec<V>)> {
        self.groups
    }
}

/// Coordinates of each `(line, stop name)`, taken from the first record that
/// mentions it.
///
/// If the same name appears under a line with different coordinates (for
/// example on opposite sides of a road), later coordinates are ignored.
pub struct StopLookup {
    coords: HashMap<(String, String), GeoPoint>,
}

impl StopLookup {
    pub fn build(stops: &[RouteStop]) -> Self {
        let mut coords = HashMap::new();
        for stop in stops {
            coords
                .entry((stop.line.clone(), stop.stop_name.clone()))
                .or_insert(stop.location);
        }
        Self { coords }
    }

    pub fn get(&self, line: &str, stop: &str) -> Option<GeoPoint> {
        self.coords
            .get(&(line.to_string(), stop.to_string()))
            .copied()
    }

    pub fn resolve(&self, line: &str, stop: &str) -> Result<NamedStop, DataError> {
        self.get(line, stop)
            .map(|location| NamedStop::new(stop, location))
            .ok_or_else(|| DataError::MissingStopCoordinate {
                line: line.to_string(),
                stop: stop.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// For every station, the bus lines with a stop within `radius_km` and the
/// distinct stops (name and coordinates) of each such line.
///
/// Rows follow station declaration order, then first appearance of the line.
pub fn metro_connectivity(
    stations: &StationSet,
    stops: &[RouteStop],
    radius_km: f64,
    metro_marker: &str,
) -> Result<Vec<ConnectivityRow>, DataError> {
    let mut rows = Vec::new();

    for station in stations.iter() {
        let near = within_radius(&station.location(), stops, radius_km, |s| s.location)?;

        let mut by_line: OrderedGroups<&str, &RouteStop> = OrderedGroups::new();
        for stop in near.into_iter().filter(|s| is_bus_line(&s.line, metro_marker)) {
            by_line.group_mut(stop.line.as_str()).push(stop);
        }

        for (line, members) in by_line.into_groups() {
            let mut seen = HashSet::new();
            let stops = members
                .into_iter()
                .filter(|s| seen.insert((s.stop_name.as_str(), s.location.bits())))
                .map(|s| NamedStop::new(&s.stop_name, s.location))
                .collect();

            rows.push(ConnectivityRow {
                station: station.name.clone(),
                line: line.to_string(),
                stops,
            });
        }
    }

    Ok(rows)
}

/// One row per `(origin, destination, line)` with the distinct boarding and
/// alighting stop names in order of first appearance.
///
/// Coordinates come from a [`StopLookup`] over all of `stops`, so a name is
/// always reported at its first-seen position on that line.
pub fn direct_trips(
    stops: &[RouteStop],
    metro_marker: &str,
) -> Result<Vec<DirectTripRow>, DataError> {
    let lookup = StopLookup::build(stops);

    let mut by_trip: OrderedGroups<(&str, &str, &str), &RouteStop> = OrderedGroups::new();
    for stop in stops
        .iter()
        .filter(|s| s.role != StopRole::Via && is_bus_line(&s.line, metro_marker))
    {
        by_trip
            .group_mut((
                stop.origin.as_str(),
                stop.destination.as_str(),
                stop.line.as_str(),
            ))
            .push(stop);
    }

    let mut rows = Vec::new();
    for ((origin, destination, line), members) in by_trip.into_groups() {
        let boarding = unique_names(&members, StopRole::Boarding)
            .into_iter()
            .map(|name| lookup.resolve(line, name))
            .collect::<Result<Vec<_>, _>>()?;
        let alighting = unique_names(&members, StopRole::Alighting)
            .into_iter()
            .map(|name| lookup.resolve(line, name))
            .collect::<Result<Vec<_>, _>>()?;

        rows.push(DirectTripRow {
            origin: origin.to_string(),
            destination: destination.to_string(),
            line: line.to_string(),
            boarding,
            alighting,
        });
    }

    Ok(rows)
}

fn unique_names<'a>(members: &[&'a RouteStop], role: StopRole) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|s| s.role == role)
        .map(|s| s.stop_name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::Station;

    fn stop(
        pair: (&str, &str),
        line: &str,
        role: StopRole,
        name: &str,
        lon: f64,
        lat: f64,
    ) -> RouteStop {
        RouteStop {
            origin: pair.0.to_string(),
            destination: pair.1.to_string(),
            line: line.to_string(),
            role,
            stop_name: name.to_string(),
            location: GeoPoint::new(lon, lat),
        }
    }

    #[test]
    fn test_is_bus_line() {
        assert!(is_bus_line("21路", "地铁"));
        assert!(!is_bus_line("地铁2号线", "地铁"));
        assert!(is_bus_line("地铁2号线", ""));
    }

    #[test]
    fn test_direct_trip_lists_and_coordinates() {
        let pair = ("小寨", "大雁塔");
        let stops = vec![
            stop(pair, "21路", StopRole::Boarding, "A", 108.9420, 34.2250),
            stop(pair, "21路", StopRole::Via, "V", 108.9500, 34.2250),
            stop(pair, "21路", StopRole::Alighting, "C", 108.9590, 34.2250),
            stop(pair, "21路", StopRole::Boarding, "B", 108.9425, 34.2240),
            stop(pair, "21路", StopRole::Alighting, "C", 108.9590, 34.2250),
            stop(pair, "21路", StopRole::Boarding, "A", 108.9420, 34.2250),
        ];

        let rows = direct_trips(&stops, "地铁").unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.line, "21路");
        let boarding: Vec<_> = row.boarding.iter().map(|s| s.name.as_str()).collect();
        let alighting: Vec<_> = row.alighting.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(boarding, vec!["A", "B"]);
        assert_eq!(alighting, vec!["C"]);
        assert_eq!(row.boarding[1], NamedStop::new("B", GeoPoint::new(108.9425, 34.2240)));
        assert_eq!(row.alighting[0].lon, 108.9590);
    }

    #[test]
    fn test_lookup_first_seen_wins() {
        let stops = vec![
            stop(("a", "b"), "21路", StopRole::Boarding, "A", 108.9420, 34.2250),
            stop(("c", "d"), "21路", StopRole::Boarding, "A", 108.9430, 34.2260),
            stop(("c", "d"), "22路", StopRole::Boarding, "A", 108.9440, 34.2270),
        ];

        let lookup = StopLookup::build(&stops);
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("21路", "A"), Some(GeoPoint::new(108.9420, 34.2250)));
        assert_eq!(lookup.get("22路", "A"), Some(GeoPoint::new(108.9440, 34.2270)));

        // The second pair reports the first pair's coordinates for "A".
        let rows = direct_trips(&stops, "地铁").unwrap();
        assert_eq!(rows[1].boarding[0].lon, 108.9420);
    }

    #[test]
    fn test_lookup_missing_stop() {
        let lookup = StopLookup::build(&[]);
        assert!(lookup.is_empty());
        assert!(matches!(
            lookup.resolve("21路", "A"),
            Err(DataError::MissingStopCoordinate { .. })
        ));
    }

    #[test]
    fn test_metro_lines_excluded() {
        let pair = ("小寨", "大雁塔");
        let stops = vec![
            stop(pair, "地铁3号线", StopRole::Boarding, "小寨", 108.94223, 34.22446),
            stop(pair, "地铁3号线", StopRole::Alighting, "大雁塔", 108.95925, 34.22470),
        ];
        let stations = StationSet::new(vec![Station::new("小寨", 108.94223, 34.2244603)]).unwrap();

        assert!(direct_trips(&stops, "地铁").unwrap().is_empty());
        assert!(metro_connectivity(&stations, &stops, 0.3, "地铁").unwrap().is_empty());
    }

    #[test]
    fn test_connectivity_groups_by_station_and_line() {
        let stations = StationSet::new(vec![
            Station::new("小寨", 108.94223, 34.2244603),
            Station::new("大雁塔", 108.959249, 34.2246971),
        ])
        .unwrap();
        let pair = ("小寨", "大雁塔");
        let stops = vec![
            stop(pair, "21路", StopRole::Boarding, "小寨东", 108.9435, 34.2245),
            stop(pair, "21路", StopRole::Via, "小寨东", 108.9435, 34.2245),
            stop(pair, "21路", StopRole::Alighting, "大雁塔西", 108.9580, 34.2247),
            stop(pair, "400路", StopRole::Boarding, "小寨北", 108.9422, 34.2260),
            stop(pair, "400路", StopRole::Alighting, "远处", 108.9700, 34.2400),
        ];

        let rows = metro_connectivity(&stations, &stops, 0.3, "地铁").unwrap();
        let keys: Vec<_> = rows.iter().map(|r| (r.station.as_str(), r.line.as_str())).collect();
        assert_eq!(keys, vec![("小寨", "21路"), ("小寨", "400路"), ("大雁塔", "21路")]);

        // Same stop seen as boarding and via is listed once.
        assert_eq!(rows[0].stops.len(), 1);
        assert_eq!(rows[0].stops[0].name, "小寨东");
        assert_eq!(rows[2].stops[0].name, "大雁塔西");
    }
}
