//! Resamples a time-ordered trip stream into evenly spaced frames.
//!
//! Three clocks are interleaved here: trip start times, the frame cadence
//! and the restock cadence. Both cadences are anchored on the first trip.
//! For every trip, in order:
//!
//! 1. if it starts after the restock boundary, every station's usage is
//!    cleared and the boundary moves to `trip.start + reset_period`. The
//!    trip's own usage change is skipped in that case;
//! 2. otherwise the destination loses a bike and the origin gains one,
//!    raising its capacity if needed;
//! 3. every frame boundary the trip has passed is emitted, decaying all
//!    trends once per frame before the snapshot is taken;
//! 4. the origin's trend goes up by one.
//!
//! Boundaries compare with strict `>`: a trip starting exactly on a
//! boundary does not cross it. A boundary beyond the representable date
//! range is never crossed. Nothing is flushed once input runs out.

use crate::config::TimelapseConfig;
use crate::model::{StationRegistry, Trip};
use crate::sink::{SinkError, Snapshot, SnapshotSink};
use crate::store::TrendStore;
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{info, trace};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("trip {trip} starts at {start}, before the previous trip at {previous}")]
    OutOfOrder {
        trip: u64,
        start: NaiveDateTime,
        previous: NaiveDateTime,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Counters describing a finished (or in-progress) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub trips: u64,
    pub frames: u64,
    pub restocks: u64,
}

/// Upcoming boundaries. `None` lies past the end of the calendar and is
/// never crossed.
#[derive(Debug, Clone, Copy)]
struct Boundaries {
    next_reset: Option<NaiveDateTime>,
    next_frame: Option<NaiveDateTime>,
    last_start: NaiveDateTime,
}

fn crossed(start: NaiveDateTime, boundary: Option<NaiveDateTime>) -> bool {
    boundary.is_some_and(|boundary| start > boundary)
}

impl Boundaries {
    fn anchored(first: NaiveDateTime, config: &TimelapseConfig) -> Self {
        Self {
            next_reset: first.checked_add_signed(config.reset_period),
            next_frame: first.checked_add_signed(config.frame_interval),
            last_start: first,
        }
    }
}

/// One timelapse run. Owns its station counters for its whole lifetime.
#[derive(Debug, Clone)]
pub struct Timelapse {
    config: TimelapseConfig,
    store: TrendStore,
    boundaries: Option<Boundaries>,
    summary: RunSummary,
}

impl Timelapse {
    /// Starts a run with zeroed counters for every registered station.
    pub fn new(registry: &StationRegistry, config: TimelapseConfig) -> Self {
        Self {
            config,
            store: TrendStore::new(registry.ids()),
            boundaries: None,
            summary: RunSummary::default(),
        }
    }

    pub fn store(&self) -> &TrendStore {
        &self.store
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Feeds one trip. Trips must arrive in non-decreasing start order.
    pub fn push<S>(&mut self, trip: &Trip, sink: &mut S) -> Result<(), EngineError>
    where
        S: SnapshotSink + ?Sized,
    {
        let start = trip.start;
        let mut bounds = match self.boundaries {
            Some(bounds) if start < bounds.last_start => {
                return Err(EngineError::OutOfOrder {
                    trip: trip.id,
                    start,
                    previous: bounds.last_start,
                });
            }
            Some(bounds) => bounds,
            None => Boundaries::anchored(start, &self.config),
        };
        bounds.last_start = start;

        if crossed(start, bounds.next_reset) {
            self.store.restock();
            bounds.next_reset = start.checked_add_signed(self.config.reset_period);
            self.summary.restocks += 1;
            trace!(at = %start, next = ?bounds.next_reset, "restocked");
        } else {
            self.store.check_in(trip.destination);
            self.store.check_out(trip.origin);
        }

        while let Some(frame_time) = bounds.next_frame.filter(|&boundary| start > boundary) {
            self.store.decay(self.config.decay_rate);
            let snapshot = Snapshot {
                frame_time,
                stations: self.store.states().clone(),
            };
            if let Err(err) = sink.append(&snapshot) {
                self.boundaries = Some(bounds);
                return Err(err.into());
            }
            self.summary.frames += 1;
            trace!(frame = %frame_time, "frame emitted");
            bounds.next_frame = frame_time.checked_add_signed(self.config.frame_interval);
        }

        self.store.bump_trend(trip.origin);
        self.boundaries = Some(bounds);
        self.summary.trips += 1;
        Ok(())
    }

    /// Pushes every trip in order and reports what was produced.
    pub fn run<S>(&mut self, trips: &[Trip], sink: &mut S) -> Result<RunSummary, EngineError>
    where
        S: SnapshotSink + ?Sized,
    {
        for trip in trips {
            self.push(trip, sink)?;
        }
        info!(
            trips = self.summary.trips,
            frames = self.summary.frames,
            restocks = self.summary.restocks,
            "timelapse finished"
        );
        Ok(self.summary)
    }
}
