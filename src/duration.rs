use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute tolerance used whenever two amounts of work or cost are
/// compared for equality.
pub const EQUALITY_EPSILON: f64 = 0.01;

pub fn approx_eq(a: f64, b: f64) -> bool {
    approx_eq_within(a, b, EQUALITY_EPSILON)
}

pub fn approx_eq_within(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    ElapsedMinutes,
    ElapsedHours,
    ElapsedDays,
    ElapsedWeeks,
}

impl TimeUnit {
    pub fn is_elapsed(self) -> bool {
        matches!(
            self,
            TimeUnit::ElapsedMinutes
                | TimeUnit::ElapsedHours
                | TimeUnit::ElapsedDays
                | TimeUnit::ElapsedWeeks
        )
    }

    /// Number of minutes represented by one of this unit.
    pub fn minutes(self, defaults: &TimeUnitDefaults) -> f64 {
        match self {
            TimeUnit::Minutes | TimeUnit::ElapsedMinutes => 1.0,
            TimeUnit::Hours | TimeUnit::ElapsedHours => 60.0,
            TimeUnit::Days => f64::from(defaults.minutes_per_day),
            TimeUnit::Weeks => f64::from(defaults.minutes_per_week),
            TimeUnit::Months => {
                f64::from(defaults.minutes_per_day) * f64::from(defaults.days_per_month)
            }
            TimeUnit::ElapsedDays => 24.0 * 60.0,
            TimeUnit::ElapsedWeeks => 7.0 * 24.0 * 60.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "mo",
            TimeUnit::ElapsedMinutes => "em",
            TimeUnit::ElapsedHours => "eh",
            TimeUnit::ElapsedDays => "ed",
            TimeUnit::ElapsedWeeks => "ew",
        }
    }
}

/// Working time assumed by non-elapsed day, week and month units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeUnitDefaults {
    pub minutes_per_day: u32,
    pub minutes_per_week: u32,
    pub days_per_month: u32,
}

impl Default for TimeUnitDefaults {
    fn default() -> Self {
        Self {
            minutes_per_day: 480,
            minutes_per_week: 2400,
            days_per_month: 20,
        }
    }
}

impl TimeUnitDefaults {
    pub fn validate(&self) -> Result<(), String> {
        if self.minutes_per_day == 0 || self.minutes_per_day > 24 * 60 {
            return Err(format!(
                "minutes_per_day must be between 1 and 1440 (got {})",
                self.minutes_per_day
            ));
        }
        if self.minutes_per_week < self.minutes_per_day {
            return Err(format!(
                "minutes_per_week {} is less than minutes_per_day {}",
                self.minutes_per_week, self.minutes_per_day
            ));
        }
        if self.days_per_month == 0 {
            return Err("days_per_month must be positive".to_string());
        }
        Ok(())
    }
}

/// An amount of time expressed in a particular unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    pub duration: f64,
    pub units: TimeUnit,
}

impl Duration {
    pub const fn new(duration: f64, units: TimeUnit) -> Self {
        Self { duration, units }
    }

    pub const fn zero(units: TimeUnit) -> Self {
        Self::new(0.0, units)
    }

    pub const fn minutes(duration: f64) -> Self {
        Self::new(duration, TimeUnit::Minutes)
    }

    pub const fn hours(duration: f64) -> Self {
        Self::new(duration, TimeUnit::Hours)
    }

    pub fn is_zero(&self) -> bool {
        approx_eq(self.duration, 0.0)
    }

    pub fn convert_units(self, target: TimeUnit, defaults: &TimeUnitDefaults) -> Duration {
        if self.units == target {
            return self;
        }
        let target_minutes = target.minutes(defaults);
        if target_minutes == 0.0 {
            return Duration::zero(target);
        }
        Duration::new(
            self.duration * self.units.minutes(defaults) / target_minutes,
            target,
        )
    }

    pub fn as_minutes(self, defaults: &TimeUnitDefaults) -> f64 {
        self.convert_units(TimeUnit::Minutes, defaults).duration
    }

    /// Adds `other`, expressing the result in this duration's units.
    pub fn plus(self, other: Duration, defaults: &TimeUnitDefaults) -> Duration {
        let other = other.convert_units(self.units, defaults);
        Duration::new(self.duration + other.duration, self.units)
    }

    pub fn scale(self, factor: f64) -> Duration {
        Duration::new(self.duration * factor, self.units)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.duration, self.units.as_str())
    }
}
