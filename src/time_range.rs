use crate::error::{CalendarError, CalendarResult};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A range end of 00:00 stands for the end of the day (24:00).
pub const MIDNIGHT: NaiveTime = NaiveTime::MIN;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Working hours within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> CalendarResult<Self> {
        if end != MIDNIGHT && end <= start {
            return Err(CalendarError::InvalidHours { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from whole hours; `end == 24` maps to midnight.
    pub fn from_hours(start: u32, end: u32) -> CalendarResult<Self> {
        let to_time = |hour: u32| {
            if hour == 24 {
                Some(MIDNIGHT)
            } else {
                NaiveTime::from_hms_opt(hour, 0, 0)
            }
        };
        match (to_time(start), to_time(end)) {
            (Some(s), Some(e)) => Self::new(s, e),
            _ => Err(CalendarError::InvalidHours {
                start: MIDNIGHT,
                end: MIDNIGHT,
            }),
        }
    }

    /// Whole-hour range that is known to be well formed.
    pub(crate) fn working_hours(start: i64, end: i64) -> Self {
        Self {
            start: MIDNIGHT + TimeDelta::hours(start),
            end: MIDNIGHT + TimeDelta::hours(end),
        }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn ends_at_midnight(&self) -> bool {
        self.end == MIDNIGHT
    }

    pub fn millis(&self) -> i64 {
        millis_between(self.start, self.end)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && (self.ends_at_midnight() || time < self.end)
    }

    /// Intersection with another range on the same day.
    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = min_end_time(self.end, other.end);
        if end == MIDNIGHT || start < end {
            Some(TimeRange { start, end })
        } else {
            None
        }
    }
}

/// Orders two range end times, treating midnight as the end of the day.
pub fn compare_end_times(a: NaiveTime, b: NaiveTime) -> Ordering {
    match (a == MIDNIGHT, b == MIDNIGHT) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(&b),
    }
}

pub fn min_end_time(a: NaiveTime, b: NaiveTime) -> NaiveTime {
    if compare_end_times(a, b) == Ordering::Greater {
        b
    } else {
        a
    }
}

fn millis_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1000 + i64::from(time.nanosecond() / 1_000_000)
}

/// Milliseconds from `start` to `end`, where an `end` of midnight means 24:00.
pub fn millis_between(start: NaiveTime, end: NaiveTime) -> i64 {
    let end = if end == MIDNIGHT {
        MILLIS_PER_DAY
    } else {
        millis_of_day(end)
    };
    end - millis_of_day(start)
}

/// Overlap in milliseconds of `[start1, end1]` and `[start2, end2]`.
pub(crate) fn overlap_millis(
    start1: NaiveTime,
    end1: NaiveTime,
    start2: NaiveTime,
    end2: NaiveTime,
) -> i64 {
    let start = start1.max(start2);
    let end = min_end_time(end1, end2);
    if end == MIDNIGHT || start < end {
        millis_between(start, end).max(0)
    } else {
        0
    }
}

/// 08:00-12:00 and 13:00-17:00.
pub fn default_working_hours() -> Vec<TimeRange> {
    vec![TimeRange::working_hours(8, 12), TimeRange::working_hours(13, 17)]
}

pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(MIDNIGHT)
}

pub fn set_time(date_time: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    date_time.date().and_time(time)
}

/// Places a range end time on `date`; midnight rolls over to the next day.
pub fn set_end_time(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    if time == MIDNIGHT {
        date.checked_add_days(Days::new(1))
            .unwrap_or(date)
            .and_time(MIDNIGHT)
    } else {
        date.and_time(time)
    }
}

/// The calendar date an end instant belongs to; 00:00 belongs to the
/// previous day.
pub fn end_date(finish: NaiveDateTime) -> NaiveDate {
    if finish.time() == MIDNIGHT {
        finish.date().pred_opt().unwrap_or(finish.date())
    } else {
        finish.date()
    }
}

/// A span between two local date-times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateTimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn overlaps(&self, other: &DateTimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn intersection(&self, other: &DateTimeRange) -> Option<DateTimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(DateTimeRange { start, end })
    }
}
