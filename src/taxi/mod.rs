//! Taxi pipeline: GPS pings to pickup/dropoff zones per station.

pub mod cluster;
pub mod events;
pub mod pipeline;
pub mod trajectory;

pub use cluster::{Cluster, ClusterParams, Clustering, PointLabel, cluster_points, dbscan};
pub use events::{EventKind, TripEvent, TripEvents, extract_events};
pub use pipeline::{analyze_stations, run_taxi_pipeline};
pub use trajectory::{TimeWindow, VehicleRecord, VehicleStatus, filter_records, load_records};
