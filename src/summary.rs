//! Per-station report rows handed to printing and plotting.
//!
//! Every builder here emits rows in station declaration order so repeated
//! runs produce identical tables.

use serde::Serialize;

use crate::bus::aggregate::{ConnectivityRow, NamedStop};
use crate::stations::{Station, StationSet};
use crate::taxi::cluster::Clustering;

/// Taxi activity around one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station: String,
    pub lon: f64,
    pub lat: f64,
    pub pickups: usize,
    pub dropoffs: usize,
    pub pickup_clusters: usize,
    pub dropoff_clusters: usize,
}

impl StationSummary {
    pub fn total_clusters(&self) -> usize {
        self.pickup_clusters + self.dropoff_clusters
    }

    /// Scatter marker area used by the station activity plot.
    pub fn marker_size(&self) -> usize {
        (self.pickups + self.dropoffs) * 2
    }
}

/// Flat row consumed by the external plotting step: station position sized
/// by event count and coloured by cluster count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotRow {
    pub station: String,
    pub lon: f64,
    pub lat: f64,
    pub pickups: usize,
    pub dropoffs: usize,
    pub pickup_clusters: usize,
    pub dropoff_clusters: usize,
    pub total_clusters: usize,
    pub marker_size: usize,
}

impl From<&StationSummary> for PlotRow {
    fn from(s: &StationSummary) -> Self {
        Self {
            station: s.station.clone(),
            lon: s.lon,
            lat: s.lat,
            pickups: s.pickups,
            dropoffs: s.dropoffs,
            pickup_clusters: s.pickup_clusters,
            dropoff_clusters: s.dropoff_clusters,
            total_clusters: s.total_clusters(),
            marker_size: s.marker_size(),
        }
    }
}

/// Centre of one pickup or dropoff zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterCenter {
    pub station: String,
    pub lon: f64,
    pub lat: f64,
    pub size: usize,
}

/// Counts carried through from ingestion and event extraction.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TaxiInputStats {
    pub records_loaded: usize,
    pub records_skipped: usize,
    pub records_in_window: usize,
    pub pickups: usize,
    pub dropoffs: usize,
}

/// Proximity and clustering results for one station.
#[derive(Debug)]
pub struct StationActivity<'a> {
    pub station: &'a Station,
    pub pickups: usize,
    pub dropoffs: usize,
    pub pickup_clusters: Clustering,
    pub dropoff_clusters: Clustering,
}

#[derive(Debug, Default, Serialize)]
pub struct TaxiReport {
    pub input: TaxiInputStats,
    pub summaries: Vec<StationSummary>,
    pub pickup_centers: Vec<ClusterCenter>,
    pub dropoff_centers: Vec<ClusterCenter>,
}

impl TaxiReport {
    pub fn plot_rows(&self) -> Vec<PlotRow> {
        self.summaries.iter().map(PlotRow::from).collect()
    }
}

fn centers<'a>(
    station: &'a Station,
    clustering: &'a Clustering,
) -> impl Iterator<Item = ClusterCenter> + 'a {
    clustering.clusters.iter().map(move |c| ClusterCenter {
        station: station.name.clone(),
        lon: c.centroid.lon,
        lat: c.centroid.lat,
        size: c.size,
    })
}

/// Folds per-station activity into the taxi report, keeping input order.
pub fn build_taxi_report(
    activities: &[StationActivity<'_>],
    input: TaxiInputStats,
) -> TaxiReport {
    let mut report = TaxiReport {
        input,
        ..Default::default()
    };

    for a in activities {
        report.summaries.push(StationSummary {
            station: a.station.name.clone(),
            lon: a.station.lon,
            lat: a.station.lat,
            pickups: a.pickups,
            dropoffs: a.dropoffs,
            pickup_clusters: a.pickup_clusters.len(),
            dropoff_clusters: a.dropoff_clusters.len(),
        });
        report
            .pickup_centers
            .extend(centers(a.station, &a.pickup_clusters));
        report
            .dropoff_centers
            .extend(centers(a.station, &a.dropoff_clusters));
    }

    report
}

/// A bus line reachable from a station, with its nearby stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectableLine {
    pub line: String,
    pub stops: Vec<NamedStop>,
}

/// Bus connectivity of one station; `lines` is empty when nothing is in range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusStationSummary {
    pub station: String,
    pub lines: Vec<ConnectableLine>,
}

/// One summary per station, including stations without any connectable line.
pub fn build_bus_summaries(
    stations: &StationSet,
    connectivity: &[ConnectivityRow],
) -> Vec<BusStationSummary> {
    stations
        .iter()
        .map(|station| BusStationSummary {
            station: station.name.clone(),
            lines: connectivity
                .iter()
                .filter(|row| row.station == station.name)
                .map(|row| ConnectableLine {
                    line: row.line.clone(),
                    stops: row.stops.clone(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::taxi::cluster::{ClusterParams, cluster_points};

    fn dense(lon: f64, lat: f64) -> Vec<GeoPoint> {
        (0..12)
            .map(|i| {
                GeoPoint::new(
                    lon + (i % 4) as f64 * 0.0001,
                    lat + (i / 4) as f64 * 0.0001,
                )
            })
            .collect()
    }

    #[test]
    fn test_taxi_report_keeps_station_order() {
        let stations = StationSet::xian();
        let params = ClusterParams::default();
        let activities: Vec<_> = stations
            .iter()
            .take(3)
            .enumerate()
            .map(|(i, station)| {
                let near = if i == 0 {
                    Vec::new()
                } else {
                    dense(station.lon, station.lat)
                };
                StationActivity {
                    station,
                    pickups: near.len(),
                    dropoffs: 1,
                    pickup_clusters: cluster_points(&near, &params),
                    dropoff_clusters: cluster_points(&[], &params),
                }
            })
            .collect();

        let report = build_taxi_report(&activities, TaxiInputStats::default());
        let names: Vec<_> = report.summaries.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(names, vec!["边家村", "西北工业大学", "科技路"]);

        assert_eq!(report.summaries[0].pickup_clusters, 0);
        assert_eq!(report.summaries[1].pickup_clusters, 1);
        assert_eq!(report.pickup_centers.len(), 2);
        assert_eq!(report.pickup_centers[0].station, "西北工业大学");
        assert_eq!(report.pickup_centers[0].size, 12);
        assert!(report.dropoff_centers.is_empty());
    }

    #[test]
    fn test_plot_row() {
        let summary = StationSummary {
            station: "小寨".to_string(),
            lon: 108.94223,
            lat: 34.2244603,
            pickups: 30,
            dropoffs: 12,
            pickup_clusters: 2,
            dropoff_clusters: 1,
        };
        let row = PlotRow::from(&summary);
        assert_eq!(row.total_clusters, 3);
        assert_eq!(row.marker_size, 84);
    }

    #[test]
    fn test_bus_summaries_include_unconnected_stations() {
        let stations = StationSet::xian();
        let connectivity = vec![ConnectivityRow {
            station: "小寨".to_string(),
            line: "21路".to_string(),
            stops: vec![],
        }];

        let summaries = build_bus_summaries(&stations, &connectivity);
        assert_eq!(summaries.len(), stations.len());

        let xiaozhai = summaries.iter().find(|s| s.station == "小寨").unwrap();
        assert_eq!(xiaozhai.lines.len(), 1);
        assert!(summaries[0].lines.is_empty());
    }
}
