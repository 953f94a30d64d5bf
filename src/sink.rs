use crate::model::StationId;
use crate::store::StationState;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::io;
use thiserror::Error;

/// State of every station at one frame boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub frame_time: NaiveDateTime,
    pub stations: BTreeMap<StationId, StationState>,
}

impl Snapshot {
    /// Frame time as milliseconds since the Unix epoch, wall clock read as UTC.
    pub fn epoch_millis(&self) -> i64 {
        self.frame_time.and_utc().timestamp_millis()
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write frame: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for emitted frames. Appends are never retried.
pub trait SnapshotSink {
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SinkError>;
}

impl SnapshotSink for Vec<Snapshot> {
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        self.push(snapshot.clone());
        Ok(())
    }
}
