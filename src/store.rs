use crate::model::StationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running counters for one station.
///
/// `usage` is the net number of bikes that left the dock since the last
/// restock and `capacity` is the highest value `usage` has reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StationState {
    pub trend: f64,
    pub capacity: i64,
    pub usage: i64,
}

/// Per-station counters for a single run. Stations are fixed at
/// construction; updates for ids outside that set are ignored.
#[derive(Debug, Clone, Default)]
pub struct TrendStore {
    states: BTreeMap<StationId, StationState>,
}

impl TrendStore {
    pub fn new<I: IntoIterator<Item = StationId>>(ids: I) -> Self {
        let states = ids
            .into_iter()
            .map(|id| (id, StationState::default()))
            .collect();
        Self { states }
    }

    /// Clears the outstanding bike count at every station. Trend and
    /// capacity are left as they are.
    pub fn restock(&mut self) {
        for state in self.states.values_mut() {
            state.usage = 0;
        }
    }

    /// Multiplies every station's trend by `rate`.
    pub fn decay(&mut self, rate: f64) {
        for state in self.states.values_mut() {
            state.trend *= rate;
        }
    }

    /// A bike left `id`. Returns false when the station is unknown.
    pub fn check_out(&mut self, id: StationId) -> bool {
        match self.states.get_mut(&id) {
            Some(state) => {
                state.usage += 1;
                if state.usage > state.capacity {
                    state.capacity = state.usage;
                }
                true
            }
            None => false,
        }
    }

    /// A bike was returned to `id`.
    pub fn check_in(&mut self, id: StationId) -> bool {
        match self.states.get_mut(&id) {
            Some(state) => {
                state.usage -= 1;
                true
            }
            None => false,
        }
    }

    pub fn bump_trend(&mut self, id: StationId) -> bool {
        match self.states.get_mut(&id) {
            Some(state) => {
                state.trend += 1.0;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: StationId) -> Option<&StationState> {
        self.states.get(&id)
    }

    pub fn states(&self) -> &BTreeMap<StationId, StationState> {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}
