//! Line format shared by the timelapse writer and the playback side.
//!
//! Each frame is one line: the frame time in epoch milliseconds, a comma,
//! then a JSON object keyed by station id in ascending order:
//!
//! ```text
//! 1311847200000,{"3":{"trend":0.5,"capacity":1,"usage":0},"4":{...}}
//! ```
//!
//! With [`FrameFormat::WithStationId`] every entry also carries a leading
//! `"id"` field.

use crate::model::StationId;
use crate::sink::{SinkError, Snapshot, SnapshotSink};
use crate::store::StationState;
use chrono::DateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameFormat {
    #[default]
    Compact,
    WithStationId,
}

#[derive(Serialize)]
struct IdentifiedState {
    id: StationId,
    trend: f64,
    capacity: i64,
    usage: i64,
}

/// Writes frames as lines to any `Write`.
pub struct FrameWriter<W: Write> {
    out: W,
    format: FrameFormat,
    lines: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(out: W, format: FrameFormat) -> Self {
        Self { out, format, lines: 0 }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> Result<W, SinkError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> SnapshotSink for FrameWriter<W> {
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        write!(self.out, "{},", snapshot.epoch_millis())?;
        match self.format {
            FrameFormat::Compact => serde_json::to_writer(&mut self.out, &snapshot.stations)?,
            FrameFormat::WithStationId => {
                let entries: BTreeMap<StationId, IdentifiedState> = snapshot
                    .stations
                    .iter()
                    .map(|(&id, state)| {
                        let entry = IdentifiedState {
                            id,
                            trend: state.trend,
                            capacity: state.capacity,
                            usage: state.usage,
                        };
                        (id, entry)
                    })
                    .collect();
                serde_json::to_writer(&mut self.out, &entries)?
            }
        }
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum FrameParseError {
    #[error("frame line has no ',' separator")]
    MissingSeparator,
    #[error("invalid frame time '{0}'")]
    BadTime(String),
    #[error("invalid station map: {0}")]
    BadStations(#[from] serde_json::Error),
}

/// Reader side of the frame format.
pub struct FrameLine;

impl FrameLine {
    /// Parses one line (with or without its trailing newline). Both the
    /// compact and the id-carrying variants are accepted.
    pub fn parse(line: &str) -> Result<Snapshot, FrameParseError> {
        let (millis, json) = line
            .trim_end()
            .split_once(',')
            .ok_or(FrameParseError::MissingSeparator)?;
        let frame_time = millis
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .map(|t| t.naive_utc())
            .ok_or_else(|| FrameParseError::BadTime(millis.to_string()))?;
        let stations: BTreeMap<StationId, StationState> = serde_json::from_str(json)?;
        Ok(Snapshot { frame_time, stations })
    }
}
