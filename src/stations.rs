//! Metro station reference table.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;

use crate::error::DataError;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    #[serde(rename = "longitude")]
    pub lon: f64,
    #[serde(rename = "latitude")]
    pub lat: f64,
}

impl Station {
    pub fn new(name: &str, lon: f64, lat: f64) -> Self {
        Self {
            name: name.to_string(),
            lon,
            lat,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lon, self.lat)
    }
}

/// Xi'an metro stations (lines 2/3/4/5 around Xiaozhai), in declaration order.
const XIAN_STATIONS: &[(&str, f64, f64)] = &[
    ("边家村", 108.9188388, 34.2428542),
    ("西北工业大学", 108.9053867, 34.2424700),
    ("科技路", 108.8996871, 34.2330316),
    ("太白南路", 108.9127987, 34.2270507),
    ("吉祥村", 108.9287192, 34.2240962),
    ("小寨", 108.9422300, 34.2244603),
    ("大雁塔", 108.9592490, 34.2246971),
    ("北池头", 108.9724294, 34.2253066),
    ("青龙寺", 108.9892709, 34.2323446),
    ("雁翔路北口", 108.9844441, 34.2398929),
    ("太乙路", 108.9690737, 34.2428266),
    ("建筑科技大学·李家村", 108.9588813, 34.2427607),
    ("西安科技大学", 108.9590442, 34.2349959),
    ("文艺路", 108.9507584, 34.2427786),
    ("南稍门", 108.9422300, 34.2427600),
    ("体育场", 108.9421891, 34.2341032),
    ("省人民医院·黄雁村", 108.9284088, 34.2428324),
];

/// An ordered set of uniquely named stations with finite coordinates.
#[derive(Debug, Clone)]
pub struct StationSet {
    stations: Vec<Station>,
}

impl StationSet {
    /// Validates and wraps `stations`, keeping their order.
    pub fn new(stations: Vec<Station>) -> Result<Self, DataError> {
        let mut seen = HashSet::new();
        for station in &stations {
            GeoPoint::checked(station.lon, station.lat)?;
            if !seen.insert(station.name.as_str()) {
                return Err(DataError::DuplicateStation {
                    name: station.name.clone(),
                });
            }
        }
        Ok(Self { stations })
    }

    pub fn xian() -> Self {
        Self {
            stations: XIAN_STATIONS
                .iter()
                .map(|&(name, lon, lat)| Station::new(name, lon, lat))
                .collect(),
        }
    }

    /// Reads a `name,longitude,latitude` CSV table.
    pub fn from_csv(path: &str) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open stations file '{path}'"))?;
        let mut rdr = csv::Reader::from_reader(file);

        let mut stations = Vec::new();
        for result in rdr.deserialize() {
            let station: Station = result.with_context(|| format!("Bad row in '{path}'"))?;
            stations.push(station);
        }

        Ok(Self::new(stations)?)
    }

    /// Loads from `path` when given, otherwise the built-in Xi'an table.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_csv(path),
            None => Ok(Self::xian()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.name == name)
    }

    /// Every unordered pair `(a, b)` with `a` declared before `b`.
    pub fn pairs(&self) -> impl Iterator<Item = (&Station, &Station)> {
        self.stations.iter().enumerate().flat_map(move |(i, a)| {
            self.stations[i + 1..].iter().map(move |b| (a, b))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_xian_table_is_valid() {
        let set = StationSet::xian();
        assert_eq!(set.len(), 17);
        assert!(StationSet::new(set.iter().cloned().collect()).is_ok());
        assert_eq!(set.iter().next().unwrap().name, "边家村");
    }

    #[test]
    fn test_pairs_count_and_order() {
        let set = StationSet::xian();
        let pairs: Vec<_> = set.pairs().collect();
        assert_eq!(pairs.len(), 17 * 16 / 2);
        assert_eq!(pairs[0].0.name, "边家村");
        assert_eq!(pairs[0].1.name, "西北工业大学");
        assert_eq!(pairs.last().unwrap().0.name, "体育场");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = StationSet::new(vec![
            Station::new("小寨", 108.94, 34.22),
            Station::new("小寨", 108.95, 34.23),
        ]);
        assert_eq!(
            result.unwrap_err(),
            DataError::DuplicateStation {
                name: "小寨".to_string()
            }
        );
    }

    #[test]
    fn test_non_finite_station_rejected() {
        let result = StationSet::new(vec![Station::new("x", f64::NAN, 34.0)]);
        assert!(matches!(
            result,
            Err(DataError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn test_from_csv() {
        let path = format!("{}/metro_feeder_test_stations.csv", env::temp_dir().display());
        fs::write(
            &path,
            "name,longitude,latitude\n小寨,108.94223,34.2244603\n大雁塔,108.959249,34.2246971\n",
        )
        .unwrap();

        let set = StationSet::from_csv(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("大雁塔").unwrap().lon, 108.959249);

        fs::remove_file(&path).unwrap();
    }
}
