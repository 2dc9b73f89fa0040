pub mod container;
pub mod normaliser;
pub mod segment;

pub use container::TimephasedContainer;
pub use normaliser::{Normalise, Normaliser};
pub use segment::{segment_cost, segment_work};

use crate::duration::{Duration, TimeUnit, TimeUnitDefaults};
use crate::time_range::{DateTimeRange, end_date};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The quantity carried by a timephased segment: work or cost.
pub trait TimephasedAmount: Copy + Debug + PartialEq + Send + Sync {
    fn value(&self) -> f64;

    /// Same kind of amount, with a new magnitude.
    fn with_value(&self, value: f64) -> Self;

    /// Magnitude in a unit comparable across segments.
    fn comparable(&self, _defaults: &TimeUnitDefaults) -> f64 {
        self.value()
    }

    fn is_zero(&self) -> bool {
        crate::duration::approx_eq(self.value(), 0.0)
    }
}

impl TimephasedAmount for Duration {
    fn value(&self) -> f64 {
        self.duration
    }

    fn with_value(&self, value: f64) -> Self {
        Duration::new(value, self.units)
    }

    fn comparable(&self, defaults: &TimeUnitDefaults) -> f64 {
        self.as_minutes(defaults)
    }
}

impl TimephasedAmount for f64 {
    fn value(&self) -> f64 {
        *self
    }

    fn with_value(&self, value: f64) -> Self {
        value
    }
}

/// A segment of work or cost spread over `[start, finish)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimephasedItem<A> {
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    pub total_amount: A,
    pub amount_per_day: A,
    #[serde(default)]
    pub modified: bool,
}

pub type TimephasedWork = TimephasedItem<Duration>;
pub type TimephasedCost = TimephasedItem<f64>;

impl<A: TimephasedAmount> TimephasedItem<A> {
    pub fn new(start: NaiveDateTime, finish: NaiveDateTime, total_amount: A, amount_per_day: A) -> Self {
        Self {
            start,
            finish,
            total_amount,
            amount_per_day,
            modified: false,
        }
    }

    pub fn range(&self) -> DateTimeRange {
        DateTimeRange::new(self.start, self.finish)
    }

    /// True when the segment lies within one calendar day; a finish at
    /// midnight belongs to the day before.
    pub fn is_single_day(&self) -> bool {
        self.start.date() == end_date(self.finish)
    }

    /// Copy with the per-day and total amounts multiplied independently.
    pub fn scaled(&self, per_day_factor: f64, total_factor: f64) -> Self {
        Self {
            total_amount: self
                .total_amount
                .with_value(self.total_amount.value() * total_factor),
            amount_per_day: self
                .amount_per_day
                .with_value(self.amount_per_day.value() * per_day_factor),
            ..*self
        }
    }
}

impl TimephasedWork {
    pub fn convert_units(&self, units: TimeUnit, defaults: &TimeUnitDefaults) -> Self {
        Self {
            total_amount: self.total_amount.convert_units(units, defaults),
            amount_per_day: self.amount_per_day.convert_units(units, defaults),
            ..*self
        }
    }
}

/// Something with a start and finish, such as the assignment owning a
/// timephased container.
pub trait TimePeriodEntity {
    fn start(&self) -> Option<NaiveDateTime>;
    fn finish(&self) -> Option<NaiveDateTime>;
}

impl TimePeriodEntity for DateTimeRange {
    fn start(&self) -> Option<NaiveDateTime> {
        Some(self.start)
    }

    fn finish(&self) -> Option<NaiveDateTime> {
        Some(self.end)
    }
}
