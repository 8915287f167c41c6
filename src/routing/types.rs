//! Response body of the Amap v5 `direction/transit/integrated` endpoint.
//!
//! Only the fields the bus pipeline reads are modelled; everything else in
//! the body is ignored by serde.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Value of `status` on a successful response.
pub const STATUS_OK: &str = "1";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitResponse {
    pub status: String,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub route: Option<TransitRoute>,
}

impl TransitResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Candidate itineraries, kept undecoded until [`TransitRoute::itineraries`]
/// picks the ones that are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitRoute {
    #[serde(default)]
    pub transits: Vec<serde_json::Value>,
}

impl TransitRoute {
    pub fn from_transits(transits: &[Transit]) -> serde_json::Result<Self> {
        Ok(Self {
            transits: transits
                .iter()
                .map(serde_json::to_value)
                .collect::<serde_json::Result<_>>()?,
        })
    }

    /// Decodes the first `limit` itineraries; the rest are never inspected.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MalformedItinerary`] for the first kept itinerary
    /// that lacks a required field.
    pub fn itineraries(&self, limit: usize) -> Result<Vec<Transit>, DataError> {
        self.transits
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, raw)| {
                Transit::deserialize(raw).map_err(|e| DataError::MalformedItinerary {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

/// One candidate itinerary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transit {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// A leg of an itinerary; walking-only legs have no `bus`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub bus: Option<BusLeg>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusLeg {
    #[serde(default)]
    pub buslines: Vec<BusLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusLine {
    pub name: String,
    pub departure_stop: ApiStop,
    pub arrival_stop: ApiStop,
    #[serde(default)]
    pub via_stops: Vec<ApiStop>,
}

/// A stop as reported by the API; `location` is a `"lon,lat"` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStop {
    pub name: String,
    pub location: String,
}
