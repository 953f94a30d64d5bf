//! Turns Hubway trip exports into a per-station timelapse: a decaying
//! trend signal plus usage and capacity counters, sampled at a fixed
//! cadence and restocked periodically.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod frame;
pub mod loader;
pub mod model;
pub mod sink;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, TimelapseConfig};
pub use engine::{EngineError, RunSummary, Timelapse};
pub use frame::{FrameFormat, FrameLine, FrameParseError, FrameWriter};
pub use loader::{LoadError, Loaded};
pub use model::{Station, StationId, StationRegistry, Trip};
pub use sink::{SinkError, Snapshot, SnapshotSink};
pub use store::{StationState, TrendStore};
