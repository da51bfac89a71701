use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::reminders::Reminder;

/// Schedules above this many notifications are still built but logged.
pub const LARGE_SCHEDULE: u32 = 10_000;

static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid integer pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleField {
    Duration,
    Interval,
}

impl fmt::Display for ScheduleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleField::Duration => f.write_str("duration"),
            ScheduleField::Interval => f.write_str("interval"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("{field} must be a whole number of minutes, got {raw:?}")]
    NotANumber { field: ScheduleField, raw: String },
    #[error("{field} must be greater than zero")]
    NotPositive { field: ScheduleField },
    #[error("interval of {interval} minutes exceeds the {duration} minute duration")]
    IntervalExceedsDuration { interval: u32, duration: u32 },
    #[error("reminder window falls outside the supported date range")]
    OutOfRange,
}

impl ScheduleError {
    /// The form field a correction belongs to. Window-level faults point at the interval.
    pub fn field(&self) -> ScheduleField {
        match self {
            ScheduleError::NotANumber { field, .. } | ScheduleError::NotPositive { field } => {
                *field
            }
            ScheduleError::OutOfRange => ScheduleField::Duration,
            ScheduleError::IntervalExceedsDuration { .. } => ScheduleField::Interval,
        }
    }
}

/// A validated (duration, interval) pair, both in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    duration: u32,
    interval: u32,
}

impl Schedule {
    pub fn new(duration: u32, interval: u32) -> Result<Self, ScheduleError> {
        if duration == 0 {
            return Err(ScheduleError::NotPositive {
                field: ScheduleField::Duration,
            });
        }
        if interval == 0 {
            return Err(ScheduleError::NotPositive {
                field: ScheduleField::Interval,
            });
        }
        if interval > duration {
            return Err(ScheduleError::IntervalExceedsDuration { interval, duration });
        }
        let count = duration / interval;
        if count > LARGE_SCHEDULE {
            tracing::warn!(count, duration, interval, "scheduling an unusually large reminder");
        }
        Ok(Self { duration, interval })
    }

    /// Validates raw form input. Duration is checked before interval.
    pub fn parse(duration: &str, interval: &str) -> Result<Self, ScheduleError> {
        let duration = parse_minutes(duration, ScheduleField::Duration)?;
        let interval = parse_minutes(interval, ScheduleField::Interval)?;
        Self::new(duration, interval)
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn count(&self) -> u32 {
        self.duration / self.interval
    }

    pub fn fire_times(&self, start: OffsetDateTime) -> Result<Vec<OffsetDateTime>, ScheduleError> {
        window_end(start, self.duration).ok_or(ScheduleError::OutOfRange)?;
        (0..self.count())
            .map(|i| {
                let offset = Duration::minutes(i64::from(i) * i64::from(self.interval));
                start.checked_add(offset).ok_or(ScheduleError::OutOfRange)
            })
            .collect()
    }
}

pub fn compute_fire_times(
    start: OffsetDateTime,
    duration_minutes: u32,
    interval_minutes: u32,
) -> Result<Vec<OffsetDateTime>, ScheduleError> {
    Schedule::new(duration_minutes, interval_minutes)?.fire_times(start)
}

/// End of the half-open window `[start, start + duration)`.
pub fn window_end(start: OffsetDateTime, duration_minutes: u32) -> Option<OffsetDateTime> {
    start.checked_add(Duration::minutes(i64::from(duration_minutes)))
}

/// Reminders whose window is still open at `now`, in their original order.
pub fn active_reminders<'a>(now: OffsetDateTime, reminders: &'a [Reminder]) -> Vec<&'a Reminder> {
    reminders
        .iter()
        .filter(|reminder| reminder.is_active_at(now))
        .collect()
}

/// Reads the leading whole number, ignoring anything after it ("30min", "30.5" are 30).
fn parse_minutes(raw: &str, field: ScheduleField) -> Result<u32, ScheduleError> {
    let not_a_number = || ScheduleError::NotANumber {
        field,
        raw: raw.to_string(),
    };
    let value: i64 = LEADING_INTEGER
        .captures(raw)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(not_a_number)?;
    if value <= 0 {
        return Err(ScheduleError::NotPositive { field });
    }
    u32::try_from(value).map_err(|_| not_a_number())
}
