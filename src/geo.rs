//! Geographic primitives: WGS84 points and haversine distance.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A longitude/latitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Builds a point, rejecting NaN and infinite components.
    pub fn checked(lon: f64, lat: f64) -> Result<Self, DataError> {
        let p = Self { lon, lat };
        p.ensure_finite()?;
        Ok(p)
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    fn ensure_finite(&self) -> Result<(), DataError> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(DataError::NonFiniteCoordinate {
                lon: self.lon,
                lat: self.lat,
            })
        }
    }

    /// Parses the `"lon,lat"` location strings returned by the routing API.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MalformedLocation`] if the string does not hold
    /// exactly two numbers, and [`DataError::NonFiniteCoordinate`] if either
    /// number is NaN or infinite.
    pub fn parse_location(raw: &str) -> Result<Self, DataError> {
        let malformed = || DataError::MalformedLocation {
            raw: raw.to_string(),
        };

        let mut parts = raw.split(',');
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };

        let lon: f64 = lon.trim().parse().map_err(|_| malformed())?;
        let lat: f64 = lat.trim().parse().map_err(|_| malformed())?;

        Self::checked(lon, lat)
    }

    /// Formats the point the way the routing API expects it (6 decimals).
    pub fn to_query_param(&self) -> String {
        format!("{:.6},{:.6}", self.lon, self.lat)
    }

    /// Key usable for exact-match deduplication of coordinates.
    pub(crate) fn bits(&self) -> (u64, u64) {
        (self.lon.to_bits(), self.lat.to_bits())
    }
}

/// Great-circle distance between two points in kilometres.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_KM`],
/// without ellipsoid correction.
///
/// # Errors
///
/// Returns [`DataError::NonFiniteCoordinate`] if either point has a NaN or
/// infinite component.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> Result<f64, DataError> {
    a.ensure_finite()?;
    b.ensure_finite()?;

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push h marginally above 1 for antipodal points.
    Ok(2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin())
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    values.sum::<f64>() / n as f64
}

/// Unweighted mean longitude and latitude of `points`; `None` when empty.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    Some(GeoPoint::new(
        mean(points.iter().map(|p| p.lon)),
        mean(points.iter().map(|p| p.lat)),
    ))
}
