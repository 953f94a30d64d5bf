use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_FRAME_SECONDS: f64 = 3600.0;
pub const DEFAULT_RESET_DAYS: f64 = 1.0;
pub const DEFAULT_DECAY_RATE: f64 = 0.99995;

const MILLIS_PER_SECOND: f64 = 1_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive, finite number (got {value})")]
    NonPositivePeriod { name: &'static str, value: f64 },
    #[error("{name} of {value} is shorter than one millisecond")]
    SubMillisecondPeriod { name: &'static str, value: f64 },
    #[error("{name} of {value} does not fit in a time span")]
    PeriodOverflow { name: &'static str, value: f64 },
    #[error("decay rate must lie within [0, 1] (got {0})")]
    DecayOutOfRange(f64),
}

/// Cadences driving a timelapse run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelapseConfig {
    /// Wall-clock spacing between emitted frames.
    pub frame_interval: Duration,
    /// How long after the last restock the next one becomes due.
    pub reset_period: Duration,
    /// Factor applied to every trend once per frame.
    pub decay_rate: f64,
}

impl TimelapseConfig {
    /// Builds a config from the units the command line speaks: seconds per
    /// frame, days between restocks, and a dimensionless decay rate.
    pub fn from_units(frame_seconds: f64, reset_days: f64, decay_rate: f64) -> Result<Self, ConfigError> {
        let frame_interval = span("frame interval", frame_seconds, MILLIS_PER_SECOND)?;
        let reset_period = span("reset period", reset_days, MILLIS_PER_DAY)?;
        if !decay_rate.is_finite() || !(0.0..=1.0).contains(&decay_rate) {
            return Err(ConfigError::DecayOutOfRange(decay_rate));
        }
        Ok(Self {
            frame_interval,
            reset_period,
            decay_rate,
        })
    }
}

impl Default for TimelapseConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::milliseconds((DEFAULT_FRAME_SECONDS * MILLIS_PER_SECOND) as i64),
            reset_period: Duration::milliseconds((DEFAULT_RESET_DAYS * MILLIS_PER_DAY) as i64),
            decay_rate: DEFAULT_DECAY_RATE,
        }
    }
}

/// Converts `value` units of `millis_per_unit` into a millisecond span.
pub(crate) fn span(name: &'static str, value: f64, millis_per_unit: f64) -> Result<Duration, ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NonPositivePeriod { name, value });
    }
    let millis = (value * millis_per_unit).round();
    if millis < 1.0 {
        return Err(ConfigError::SubMillisecondPeriod { name, value });
    }
    if millis > i64::MAX as f64 {
        return Err(ConfigError::PeriodOverflow { name, value });
    }
    Duration::try_milliseconds(millis as i64).ok_or(ConfigError::PeriodOverflow { name, value })
}

/// Days expressed as a span, for callers outside the engine.
pub fn days(value: f64) -> Result<Duration, ConfigError> {
    span("reset period", value, MILLIS_PER_DAY)
}
