use anyhow::Result;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::bus::aggregate::{ConnectivityRow, DirectTripRow, direct_trips, metro_connectivity};
use crate::bus::records::{RouteStop, dedup_stops, stops_from_route};
use crate::config::Settings;
use crate::routing::RoutingApi;
use crate::stations::StationSet;
use crate::summary::{BusStationSummary, build_bus_summaries};

/// Per-pair outcome counts of one collection run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CollectionStats {
    pub pairs: usize,
    pub with_data: usize,
    /// Non-success status from the API.
    pub no_data: usize,
    /// Transport, timeout or decoding failure.
    pub failed: usize,
    /// Response contained a stop with an unusable location.
    pub malformed: usize,
}

/// Everything the bus pipeline produces.
#[derive(Debug, Serialize)]
pub struct BusReport {
    pub stats: CollectionStats,
    pub connectivity: Vec<ConnectivityRow>,
    pub direct_trips: Vec<DirectTripRow>,
    pub stations: Vec<BusStationSummary>,
}

/// Queries every station pair once and returns the deduplicated stop records.
///
/// Pairs are visited in declaration order with `settings.request_delay()`
/// between consecutive requests. A pair whose request fails, whose status is
/// not successful, or whose body holds a malformed stop contributes nothing;
/// the run continues with the next pair.
#[tracing::instrument(skip_all, fields(stations = stations.len()))]
pub async fn collect_route_stops<A>(
    api: &A,
    stations: &StationSet,
    settings: &Settings,
) -> (Vec<RouteStop>, CollectionStats)
where
    A: RoutingApi + ?Sized,
{
    let mut stats = CollectionStats::default();
    let mut stops = Vec::new();

    for (origin, destination) in stations.pairs() {
        if stats.pairs > 0 && !settings.request_delay().is_zero() {
            tokio::time::sleep(settings.request_delay()).await;
        }
        stats.pairs += 1;

        let route = match api
            .transit_plans(&origin.location(), &destination.location())
            .await
        {
            Ok(Some(route)) => route,
            Ok(None) => {
                debug!(
                    origin = %origin.name,
                    destination = %destination.name,
                    "No itinerary for pair"
                );
                stats.no_data += 1;
                continue;
            }
            Err(e) => {
                warn!(
                    origin = %origin.name,
                    destination = %destination.name,
                    error = %e,
                    "Routing request failed, skipping pair"
                );
                stats.failed += 1;
                continue;
            }
        };

        match stops_from_route(&origin.name, &destination.name, &route, settings.max_itineraries) {
            Ok(pair_stops) => {
                debug!(
                    origin = %origin.name,
                    destination = %destination.name,
                    records = pair_stops.len(),
                    "Pair processed"
                );
                stats.with_data += 1;
                stops.extend(pair_stops);
            }
            Err(e) => {
                error!(
                    origin = %origin.name,
                    destination = %destination.name,
                    error = %e,
                    "Malformed itinerary in routing response, dropping pair"
                );
                stats.malformed += 1;
            }
        }
    }

    let total = stops.len();
    let stops = dedup_stops(stops);
    info!(
        pairs = stats.pairs,
        with_data = stats.with_data,
        no_data = stats.no_data,
        failed = stats.failed,
        malformed = stats.malformed,
        records = stops.len(),
        duplicates = total - stops.len(),
        "Stop collection finished"
    );

    (stops, stats)
}

/// Builds the connectivity and direct-trip tables from collected stops.
pub fn build_bus_report(
    stations: &StationSet,
    stops: &[RouteStop],
    stats: CollectionStats,
    settings: &Settings,
) -> Result<BusReport> {
    let connectivity =
        metro_connectivity(stations, stops, settings.bus_radius_km, &settings.metro_marker)?;
    let direct_trips = direct_trips(stops, &settings.metro_marker)?;
    let summaries = build_bus_summaries(stations, &connectivity);

    info!(
        connectivity_rows = connectivity.len(),
        direct_trip_rows = direct_trips.len(),
        "Bus tables built"
    );

    Ok(BusReport {
        stats,
        connectivity,
        direct_trips,
        stations: summaries,
    })
}

/// Runs the whole bus pipeline against `api`.
pub async fn run_bus_pipeline<A>(
    api: &A,
    stations: &StationSet,
    settings: &Settings,
) -> Result<BusReport>
where
    A: RoutingApi + ?Sized,
{
    let (stops, stats) = collect_route_stops(api, stations, settings).await;
    build_bus_report(stations, &stops, stats, settings)
}
