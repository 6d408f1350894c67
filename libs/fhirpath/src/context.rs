//! Evaluation context: the iteration scope and the evaluation clock.

use chrono::{Timelike, Utc};

use crate::temporal::{Date, DatePrecision, DateTime, DateTimePrecision, Time, TimePrecision};
use crate::value::{Collection, Value};

/// The `$this` / `$index` / `$total` frame for the current iteration.
///
/// Scopes are immutable: higher-order functions build a fresh scope per
/// element and pass it down, so nested `select(where(...))` cannot clobber
/// an outer frame.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub this: Option<Value>,
    pub index: Option<i32>,
    pub total: Option<Collection>,
}

impl Scope {
    /// Scope for one element of an iteration.
    pub fn iteration(&self, this: Value, index: usize) -> Scope {
        Scope {
            this: Some(this),
            index: i32::try_from(index).ok(),
            total: self.total.clone(),
        }
    }

    /// Scope for one `aggregate` step, carrying the accumulator.
    pub fn aggregate_step(&self, this: Value, index: usize, total: Collection) -> Scope {
        Scope {
            this: Some(this),
            index: i32::try_from(index).ok(),
            total: Some(total),
        }
    }
}

/// Timestamp captured once per evaluation so that `now()`, `today()` and
/// `timeOfDay()` agree with each other for the whole expression.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    pub now: DateTime,
    pub today: Date,
    pub time_of_day: Time,
}

impl Clock {
    pub fn capture() -> Self {
        let utc = Utc::now();
        // Millisecond precision; finer resolution only produces spurious
        // differences between repeated evaluations.
        let utc = utc
            .with_nanosecond(utc.timestamp_subsec_millis() * 1_000_000)
            .unwrap_or(utc);
        Self {
            now: DateTime::new(utc, DateTimePrecision::Millisecond, Some(0)),
            today: Date::new(utc.date_naive(), DatePrecision::Day),
            time_of_day: Time::new(utc.time(), TimePrecision::Millisecond),
        }
    }
}
