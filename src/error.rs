use crate::calendar::CalendarId;
use chrono::{NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Errors raised while building or re-wiring a calendar hierarchy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("no calendar with id {0}")]
    UnknownCalendar(CalendarId),

    #[error("calendar {0} cannot be its own parent")]
    SelfParent(CalendarId),

    #[error("making calendar {0} derived would create a cycle")]
    CyclicDerivation(CalendarId),

    #[error("calendar {id} is nested {depth} levels deep")]
    HierarchyTooDeep { id: CalendarId, depth: usize },

    #[error("working hours {start}-{end} are empty or reversed")]
    InvalidHours { start: NaiveTime, end: NaiveTime },
}

/// Errors raised by the timescale bucketing utilities when the caller
/// supplies ranges or segments that are not ordered and disjoint.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimephasedError {
    #[error("range start {start} must be before range end {end}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("ranges must be non-overlapping and in order: range at {0} overlaps its predecessor")]
    RangesOutOfOrder(NaiveDateTime),

    #[error("item start {start} must be before item finish {finish}")]
    InvalidItem {
        start: NaiveDateTime,
        finish: NaiveDateTime,
    },

    #[error("items must be non-overlapping and in order: item at {0} overlaps its predecessor")]
    ItemsOutOfOrder(NaiveDateTime),

    #[error("timephased work is expressed in more than one unit")]
    MixedUnits,
}

/// Errors raised while reading or writing engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid time unit defaults: {0}")]
    InvalidDefaults(String),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

pub type CalendarResult<T> = Result<T, CalendarError>;
pub type TimephasedResult<T> = Result<T, TimephasedError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
