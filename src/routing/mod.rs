//! Transit routing API: the trait the bus pipeline depends on and the Amap
//! implementation behind it.

pub mod amap;
pub mod types;

pub use amap::{AmapClient, AmapConfig};
pub use types::{ApiStop, BusLeg, BusLine, Segment, Transit, TransitResponse, TransitRoute};

use anyhow::Result;

use crate::geo::GeoPoint;

/// Abstraction over a transit itinerary provider.
#[async_trait::async_trait]
pub trait RoutingApi: Send + Sync {
    /// Returns the itineraries between two points.
    ///
    /// `Ok(None)` means the provider answered without a usable result (a
    /// non-success status); transport and decoding failures are `Err`.
    async fn transit_plans(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<Option<TransitRoute>>;
}
