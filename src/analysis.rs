//! Whole-dataset station reports that do not need frames.

use crate::model::{StationId, StationRegistry, Trip};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Highest number of bikes each station had out at once between restocks.
///
/// Restocks are anchored at the Unix epoch: once a trip starts more than
/// `reset_period` after the previous restock, every known station is zeroed
/// and that trip's start becomes the new restock time. The trip itself is
/// still counted. Only stations seen as a known origin are reported.
pub fn peak_capacity(
    trips: &[Trip],
    registry: &StationRegistry,
    reset_period: Duration,
) -> BTreeMap<StationId, i64> {
    let mut bikes: BTreeMap<StationId, i64> = registry.ids().map(|id| (id, 0)).collect();
    let mut peaks = BTreeMap::new();
    let mut previous_reset: NaiveDateTime = DateTime::<Utc>::UNIX_EPOCH.naive_utc();

    for trip in trips {
        let due = previous_reset.checked_add_signed(reset_period);
        if due.is_some_and(|due| trip.start > due) {
            bikes.values_mut().for_each(|count| *count = 0);
            previous_reset = trip.start;
        }
        if let Some(count) = bikes.get_mut(&trip.destination) {
            *count -= 1;
        }
        if let Some(count) = bikes.get_mut(&trip.origin) {
            *count += 1;
            let peak = peaks.entry(trip.origin).or_insert(*count);
            if *peak < *count {
                *peak = *count;
            }
        }
    }
    peaks
}

/// Highest trend score each origin station reached.
///
/// Before every trip all scores seen so far are multiplied by `decay`; the
/// trip then adds one to its origin. Stations are not filtered against a
/// registry.
pub fn peak_trending(trips: &[Trip], decay: f64) -> BTreeMap<StationId, f64> {
    let mut trends: BTreeMap<StationId, f64> = BTreeMap::new();
    let mut peaks: BTreeMap<StationId, f64> = BTreeMap::new();

    for trip in trips {
        trends.values_mut().for_each(|trend| *trend *= decay);
        let trend = trends.entry(trip.origin).or_insert(0.0);
        *trend += 1.0;
        let peak = peaks.entry(trip.origin).or_insert(0.0);
        if *trend > *peak {
            *peak = *trend;
        }
    }
    peaks
}

/// Writes one `capacity,name` line per station in ascending id order.
pub fn write_capacity_report<W: Write>(
    out: &mut W,
    capacity: &BTreeMap<StationId, i64>,
    registry: &StationRegistry,
) -> io::Result<()> {
    for (&station, bikes) in capacity {
        writeln!(out, "{},{}", bikes, registry.name_or_id(station))?;
    }
    Ok(())
}

/// Sorts a report by descending value, ties broken by station id.
pub fn ranked<V: PartialOrd + Copy>(report: &BTreeMap<StationId, V>) -> Vec<(StationId, V)> {
    let mut rows: Vec<(StationId, V)> = report.iter().map(|(&id, &v)| (id, v)).collect();
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    rows
}
