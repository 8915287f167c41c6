//! Pickup/dropoff detection from occupancy status transitions.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::geo::GeoPoint;
use crate::taxi::trajectory::{VehicleRecord, VehicleStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Pickup,
    Dropoff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEvent {
    pub vehicle_id: String,
    pub timestamp: NaiveDateTime,
    pub location: GeoPoint,
    pub kind: EventKind,
}

#[derive(Debug, Default, Clone)]
pub struct TripEvents {
    pub pickups: Vec<TripEvent>,
    pub dropoffs: Vec<TripEvent>,
}

/// Status tracker for a single vehicle.
#[derive(Debug, Default)]
struct VehicleState {
    last: Option<VehicleStatus>,
}

impl VehicleState {
    fn observe(&mut self, status: VehicleStatus) -> Option<EventKind> {
        let event = match (self.last, status) {
            (Some(VehicleStatus::Vacant), VehicleStatus::Occupied) => Some(EventKind::Pickup),
            (Some(VehicleStatus::Occupied), VehicleStatus::Vacant) => Some(EventKind::Dropoff),
            _ => None,
        };
        self.last = Some(status);
        event
    }
}

/// Detects pickups (vacant to occupied) and dropoffs (occupied to vacant).
///
/// Records are grouped by vehicle and each group is stable-sorted by
/// timestamp. Every record is compared with the one immediately before it
/// for the same vehicle, so a vehicle's first record never produces an event.
/// Callers are expected to apply validity and time-window filters first.
pub fn extract_events(records: &[VehicleRecord]) -> TripEvents {
    let mut by_vehicle: BTreeMap<&str, Vec<&VehicleRecord>> = BTreeMap::new();
    for record in records {
        by_vehicle.entry(record.vehicle_id.as_str()).or_default().push(record);
    }

    let mut events = TripEvents::default();

    for (_, mut sequence) in by_vehicle {
        sequence.sort_by_key(|r| r.timestamp);

        let mut state = VehicleState::default();
        for record in sequence {
            let Some(kind) = state.observe(record.status) else {
                continue;
            };

            let event = TripEvent {
                vehicle_id: record.vehicle_id.clone(),
                timestamp: record.timestamp,
                location: record.location,
                kind,
            };
            match kind {
                EventKind::Pickup => events.pickups.push(event),
                EventKind::Dropoff => events.dropoffs.push(event),
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 2, 7)
            .unwrap()
            .and_hms_opt(8, minute, 0)
            .unwrap()
    }

    fn record(vehicle: &str, minute: u32, code: i64) -> VehicleRecord {
        VehicleRecord::new(
            vehicle,
            at(minute),
            VehicleStatus::from(code),
            GeoPoint::new(108.94 + minute as f64 * 0.001, 34.22),
        )
    }

    #[test]
    fn test_alternating_statuses() {
        let records: Vec<_> = [4, 5, 4, 5]
            .iter()
            .enumerate()
            .map(|(i, &code)| record("v1", i as u32, code))
            .collect();

        let events = extract_events(&records);

        assert_eq!(events.pickups.len(), 2);
        assert_eq!(events.dropoffs.len(), 1);
        assert_eq!(events.pickups[0].timestamp, at(1));
        assert_eq!(events.pickups[1].timestamp, at(3));
        assert_eq!(events.dropoffs[0].timestamp, at(2));
        assert_eq!(events.pickups[0].location, records[1].location);
    }

    #[test]
    fn test_first_record_never_emits() {
        let events = extract_events(&[record("v1", 0, 5)]);
        assert!(events.pickups.is_empty());
        assert!(events.dropoffs.is_empty());
    }

    #[test]
    fn test_no_transition_yields_nothing() {
        let records = vec![record("v1", 0, 5), record("v1", 1, 5), record("v1", 2, 5)];
        let events = extract_events(&records);
        assert!(events.pickups.is_empty());
        assert!(events.dropoffs.is_empty());
    }

    #[test]
    fn test_sorts_by_timestamp_within_vehicle() {
        let records = vec![record("v1", 5, 5), record("v1", 1, 4)];
        let events = extract_events(&records);

        assert_eq!(events.pickups.len(), 1);
        assert_eq!(events.pickups[0].timestamp, at(5));
    }

    #[test]
    fn test_state_resets_between_vehicles() {
        // v1 ends vacant and v2 starts occupied: no pickup across vehicles.
        let records = vec![record("v1", 0, 5), record("v1", 1, 4), record("v2", 2, 5)];
        let events = extract_events(&records);

        assert!(events.pickups.is_empty());
        assert_eq!(events.dropoffs.len(), 1);
        assert_eq!(events.dropoffs[0].vehicle_id, "v1");
    }

    #[test]
    fn test_other_status_breaks_transition() {
        let records = vec![record("v1", 0, 4), record("v1", 1, 2), record("v1", 2, 5)];
        let events = extract_events(&records);
        assert!(events.pickups.is_empty());
    }
}
