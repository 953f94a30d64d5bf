//! Reads the Hubway station and trip exports into typed records.
//!
//! Rows are validated one by one: anything with a missing column, a
//! non-numeric id or an unreadable timestamp is dropped and counted instead
//! of aborting the load.

use crate::model::{Station, StationId, StationRegistry, Trip};
use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed reading csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rejection {
    Shape,
    BadId,
    BadStation,
    BadTimestamp,
    BadCoordinate,
    EndsBeforeStart,
}

/// Accepted records plus the rows dropped, in total and per reason.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub rejected: usize,
    pub by_reason: BTreeMap<Rejection, usize>,
}

#[derive(Debug, Deserialize)]
struct TripRow {
    id: String,
    start_date: String,
    strt_statn: String,
    end_date: String,
    end_statn: String,
}

#[derive(Debug, Deserialize)]
struct StationRow {
    id: String,
    name: String,
    lat: String,
    lng: String,
}

/// Parses the timestamp layouts found across the Hubway exports.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.naive_utc()))
}

fn parse_station_id(raw: &str) -> Option<StationId> {
    raw.trim().parse().ok().map(StationId)
}

impl TryFrom<TripRow> for Trip {
    type Error = Rejection;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        let id = row.id.trim().parse().map_err(|_| Rejection::BadId)?;
        let origin = parse_station_id(&row.strt_statn).ok_or(Rejection::BadStation)?;
        let destination = parse_station_id(&row.end_statn).ok_or(Rejection::BadStation)?;
        let start = parse_timestamp(&row.start_date).ok_or(Rejection::BadTimestamp)?;
        let end = parse_timestamp(&row.end_date).ok_or(Rejection::BadTimestamp)?;
        if end < start {
            return Err(Rejection::EndsBeforeStart);
        }
        Ok(Trip {
            id,
            origin,
            destination,
            start,
            end,
        })
    }
}

impl TryFrom<StationRow> for Station {
    type Error = Rejection;

    fn try_from(row: StationRow) -> Result<Self, Self::Error> {
        let id = parse_station_id(&row.id).ok_or(Rejection::BadId)?;
        let latitude = row.lat.trim().parse().map_err(|_| Rejection::BadCoordinate)?;
        let longitude = row.lng.trim().parse().map_err(|_| Rejection::BadCoordinate)?;
        Ok(Station {
            id,
            name: row.name,
            latitude,
            longitude,
        })
    }
}

/// Deserialises every row of `reader` through `R` into `T`, dropping rows
/// that fail either step. Only I/O failures abort.
fn read_rows<R, T, S>(reader: S, kind: &'static str) -> Result<Loaded<T>, LoadError>
where
    R: for<'de> Deserialize<'de>,
    T: TryFrom<R, Error = Rejection>,
    S: Read,
{
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();
    let mut rejected = 0;
    let mut by_reason = BTreeMap::new();

    for (index, result) in rdr.deserialize::<R>().enumerate() {
        let record = match result {
            Ok(row) => T::try_from(row),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                debug!(kind, row = index + 1, error = %err, "unreadable row");
                Err(Rejection::Shape)
            }
        };
        match record {
            Ok(record) => records.push(record),
            Err(reason) => {
                debug!(kind, row = index + 1, ?reason, "dropping row");
                rejected += 1;
                *by_reason.entry(reason).or_insert(0) += 1;
            }
        }
    }
    Ok(Loaded {
        records,
        rejected,
        by_reason,
    })
}

/// Reads trips and sorts them by start time. Trips starting at the same
/// instant keep their file order.
pub fn read_trips<S: Read>(reader: S) -> Result<Loaded<Trip>, LoadError> {
    let mut loaded = read_rows::<TripRow, Trip, S>(reader, "trip")?;
    loaded.records.par_sort_by_key(|trip| trip.start);
    info!(accepted = loaded.records.len(), rejected = loaded.rejected, "trips loaded");
    Ok(loaded)
}

pub fn read_stations<S: Read>(reader: S) -> Result<Loaded<Station>, LoadError> {
    let loaded = read_rows::<StationRow, Station, S>(reader, "station")?;
    info!(accepted = loaded.records.len(), rejected = loaded.rejected, "stations loaded");
    Ok(loaded)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_trips(path: &Path) -> Result<Loaded<Trip>, LoadError> {
    read_trips(open(path)?)
}

/// Loads the station export straight into a registry.
pub fn load_registry(path: &Path) -> Result<StationRegistry, LoadError> {
    let loaded = read_stations(open(path)?)?;
    Ok(loaded.records.into_iter().collect())
}
