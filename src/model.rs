use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric station identifier as it appears in the Hubway exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single ride from one dock to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: u64,
    pub origin: StationId,
    pub destination: StationId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Static identity of a dock.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Known stations, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: BTreeMap<StationId, Station>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a station, replacing any earlier entry with the same id so the
    /// last row in the file wins. Returns the replaced entry.
    pub fn insert(&mut self, station: Station) -> Option<Station> {
        self.stations.insert(station.id, station)
    }

    pub fn ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.stations.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Display name for reports, falling back to the bare id.
    pub fn name_or_id(&self, id: StationId) -> String {
        match self.stations.get(&id) {
            Some(station) => station.name.clone(),
            None => id.to_string(),
        }
    }
}

impl FromIterator<Station> for StationRegistry {
    fn from_iter<I: IntoIterator<Item = Station>>(iter: I) -> Self {
        let mut registry = StationRegistry::new();
        for station in iter {
            registry.insert(station);
        }
        registry
    }
}
