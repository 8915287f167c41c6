use anyhow::Result;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::DataError;
use crate::geo::GeoPoint;
use crate::proximity::within_radius;
use crate::stations::{Station, StationSet};
use crate::summary::{StationActivity, TaxiInputStats, TaxiReport, build_taxi_report};
use crate::taxi::cluster::{ClusterParams, Clustering, cluster_points};
use crate::taxi::events::{TripEvent, TripEvents, extract_events};
use crate::taxi::trajectory::{filter_records, load_records};

impl From<&Settings> for ClusterParams {
    fn from(settings: &Settings) -> Self {
        Self {
            epsilon_deg: settings.cluster_epsilon_deg,
            min_samples: settings.cluster_min_samples,
            min_points: settings.min_cluster_points,
        }
    }
}

fn near_and_clustered(
    station: &Station,
    events: &[TripEvent],
    radius_km: f64,
    params: &ClusterParams,
) -> Result<(usize, Clustering), DataError> {
    let near: Vec<GeoPoint> = within_radius(&station.location(), events, radius_km, |e| e.location)?
        .into_iter()
        .map(|e| e.location)
        .collect();

    if near.len() < params.min_points {
        debug!(
            station = %station.name,
            points = near.len(),
            "Too few events to cluster"
        );
    }

    Ok((near.len(), cluster_points(&near, params)))
}

/// Filters events around every station and clusters each station's pickups
/// and dropoffs separately.
///
/// Each station scans the full event lists, so the cost grows with
/// stations × events.
#[tracing::instrument(skip_all, fields(
    stations = stations.len(),
    pickups = events.pickups.len(),
    dropoffs = events.dropoffs.len(),
))]
pub fn analyze_stations<'a>(
    stations: &'a StationSet,
    events: &TripEvents,
    settings: &Settings,
) -> Result<Vec<StationActivity<'a>>, DataError> {
    let params = ClusterParams::from(settings);
    let mut activities = Vec::with_capacity(stations.len());

    for station in stations.iter() {
        let (pickups, pickup_clusters) =
            near_and_clustered(station, &events.pickups, settings.taxi_radius_km, &params)?;
        let (dropoffs, dropoff_clusters) =
            near_and_clustered(station, &events.dropoffs, settings.taxi_radius_km, &params)?;

        debug!(
            station = %station.name,
            pickups,
            dropoffs,
            pickup_clusters = pickup_clusters.len(),
            dropoff_clusters = dropoff_clusters.len(),
            "Station analysed"
        );

        activities.push(StationActivity {
            station,
            pickups,
            dropoffs,
            pickup_clusters,
            dropoff_clusters,
        });
    }

    Ok(activities)
}

/// Loads a trajectory file and produces the per-station taxi report.
#[tracing::instrument(skip(stations, settings))]
pub fn run_taxi_pipeline(
    path: &str,
    stations: &StationSet,
    settings: &Settings,
) -> Result<TaxiReport> {
    let loaded = load_records(path)?;
    let records_loaded = loaded.records.len();

    let records = filter_records(loaded.records, &settings.time_window());
    let events = extract_events(&records);
    info!(
        records_in_window = records.len(),
        pickups = events.pickups.len(),
        dropoffs = events.dropoffs.len(),
        "Trip events extracted"
    );

    let activities = analyze_stations(stations, &events, settings)?;

    let input = TaxiInputStats {
        records_loaded,
        records_skipped: loaded.skipped,
        records_in_window: records.len(),
        pickups: events.pickups.len(),
        dropoffs: events.dropoffs.len(),
    };

    Ok(build_taxi_report(&activities, input))
}
