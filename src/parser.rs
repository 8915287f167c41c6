//! JSON parser for routing-API responses.

use anyhow::Result;

use crate::routing::TransitResponse;

/// Decodes a transit routing response from raw bytes.
///
/// # Errors
///
/// Returns an error if the body is not JSON or lacks `status`. Itineraries
/// are checked later by [`TransitRoute::itineraries`](crate::routing::TransitRoute::itineraries).
pub fn parse_transit_response(bytes: &[u8]) -> Result<TransitResponse> {
    Ok(serde_json::from_slice(bytes)?)
}
