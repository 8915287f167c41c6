//! Tunable analysis settings.
//!
//! Defaults reproduce the Xi'an study. Any subset can be overridden from a
//! JSON file:
//! ```json
//! {
//!   "taxi_radius_km": 0.4,
//!   "cluster_epsilon_deg": 0.002,
//!   "window_start": "17:00:00",
//!   "window_end": "19:00:00"
//! }
//! ```

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::taxi::trajectory::TimeWindow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Radius for matching bus stops to a metro station.
    pub bus_radius_km: f64,
    /// Radius for matching taxi events to a metro station.
    pub taxi_radius_km: f64,
    /// DBSCAN neighbourhood radius, in decimal degrees.
    pub cluster_epsilon_deg: f64,
    /// DBSCAN core-point threshold (the point itself included).
    pub cluster_min_samples: usize,
    /// Below this many nearby events a station is not clustered at all.
    pub min_cluster_points: usize,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    /// Itineraries kept per station pair.
    pub max_itineraries: usize,
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Lines whose name contains this marker are metro lines, not buses.
    pub metro_marker: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bus_radius_km: 0.3,
            taxi_radius_km: 0.35,
            cluster_epsilon_deg: 0.0016,
            cluster_min_samples: 5,
            min_cluster_points: 10,
            window_start: NaiveTime::from_hms_opt(7, 30, 0).unwrap_or_default(),
            window_end: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            max_itineraries: 2,
            request_delay_ms: 300,
            request_timeout_secs: 10,
            metro_marker: "地铁".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file at `path`; absent fields keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file '{path}'"))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file '{path}'"))?;
        Ok(settings)
    }

    /// Loads from `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::new(self.window_start, self.window_end)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.bus_radius_km, 0.3);
        assert_eq!(s.taxi_radius_km, 0.35);
        assert_eq!(s.cluster_epsilon_deg, 0.0016);
        assert_eq!(s.cluster_min_samples, 5);
        assert_eq!(s.min_cluster_points, 10);
        assert_eq!(s.window_start, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(s.window_end, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(s.request_delay(), Duration::from_millis(300));
        assert_eq!(s.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let path = temp_path("metro_feeder_test_settings.json");
        fs::write(
            &path,
            r#"{ "taxi_radius_km": 0.5, "window_start": "17:00:00" }"#,
        )
        .unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.taxi_radius_km, 0.5);
        assert_eq!(s.window_start, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(s.bus_radius_km, 0.3);
        assert_eq!(s.metro_marker, "地铁");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let path = temp_path("metro_feeder_test_settings_bad.json");
        fs::write(&path, r#"{ "taxi_radius": 0.5 }"#).unwrap();

        assert!(Settings::load(&path).is_err());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_or_default_without_path() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
