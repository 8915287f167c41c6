//! Bus pipeline: station-pair itineraries to connectivity tables.
//!
//! [`pipeline::collect_route_stops`] queries the routing API for every
//! station pair, [`records`] flattens responses into stop records and
//! [`aggregate`] groups them into the per-station and per-pair tables.

pub mod aggregate;
pub mod pipeline;
pub mod records;

pub use aggregate::{ConnectivityRow, DirectTripRow, NamedStop, StopLookup};
pub use pipeline::{
    BusReport, CollectionStats, build_bus_report, collect_route_stops, run_bus_pipeline,
};
pub use records::{RouteStop, StopRole};
