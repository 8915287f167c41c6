//! Radius filtering around a reference point.

use crate::error::DataError;
use crate::geo::{GeoPoint, haversine_km};

/// Returns the candidates whose haversine distance to `reference` is at most
/// `radius_km` (inclusive), in input order.
///
/// This is a linear scan. Callers run it once per station, so the total cost
/// is O(stations × candidates).
///
/// # Errors
///
/// Propagates [`DataError::NonFiniteCoordinate`] from the first candidate
/// whose location is not finite.
pub fn within_radius<'a, T, F>(
    reference: &GeoPoint,
    candidates: &'a [T],
    radius_km: f64,
    locate: F,
) -> Result<Vec<&'a T>, DataError>
where
    F: Fn(&T) -> GeoPoint,
{
    let mut near = Vec::new();
    for candidate in candidates {
        if haversine_km(reference, &locate(candidate))? <= radius_km {
            near.push(candidate);
        }
    }
    Ok(near)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ~0.0009 degrees of latitude is ~100 m.
    const STEP: f64 = 0.0009;

    fn ring(center: GeoPoint) -> Vec<GeoPoint> {
        (0..10)
            .map(|i| GeoPoint::new(center.lon, center.lat + STEP * i as f64))
            .collect()
    }

    #[test]
    fn test_never_returns_points_beyond_radius() {
        let center = GeoPoint::new(108.94223, 34.22446);
        let points = ring(center);

        for radius in [0.0, 0.05, 0.3, 0.35, 0.75, 2.0] {
            let near = within_radius(&center, &points, radius, |p| *p).unwrap();
            for p in near {
                assert!(haversine_km(&center, p).unwrap() <= radius);
            }
        }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let center = GeoPoint::new(108.94223, 34.22446);
        let edge = GeoPoint::new(108.94223, 34.23);
        let radius = haversine_km(&center, &edge).unwrap();

        let edges = [edge];
        let near = within_radius(&center, &edges, radius, |p| *p).unwrap();
        assert_eq!(near.len(), 1);
    }

    #[test]
    fn test_keeps_input_order() {
        let center = GeoPoint::new(108.94223, 34.22446);
        let points = ring(center);

        let near = within_radius(&center, &points, 0.35, |p| *p).unwrap();
        assert_eq!(near.len(), 4);
        assert!(near.windows(2).all(|w| w[0].lat < w[1].lat));
    }

    #[test]
    fn test_non_finite_candidate_propagates() {
        let center = GeoPoint::new(108.94223, 34.22446);
        let points = vec![center, GeoPoint::new(f64::NAN, 34.2)];

        assert!(within_radius(&center, &points, 1.0, |p| *p).is_err());
    }
}
