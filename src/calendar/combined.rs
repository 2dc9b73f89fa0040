use super::working_time::WorkingTime;
use crate::duration::TimeUnitDefaults;
use crate::time_range::TimeRange;
use chrono::{NaiveDate, NaiveTime, Weekday};

/// Working time shared by two calendars: a moment is working only when it
/// is working in both.
#[derive(Debug, Clone, Copy)]
pub struct CombinedCalendar<A, B> {
    first: A,
    second: B,
}

impl<A: WorkingTime, B: WorkingTime> CombinedCalendar<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

/// Intersection of two range lists, each sorted by start and free of
/// overlaps. The result keeps that order.
pub fn intersect_ranges(first: &[TimeRange], second: &[TimeRange]) -> Vec<TimeRange> {
    let mut result = Vec::new();
    for a in first {
        for b in second {
            if ends_by(a, b.start()) {
                break;
            }
            if ends_by(b, a.start()) {
                continue;
            }
            result.extend(a.intersect(b));
        }
    }
    result
}

/// A range running to midnight never ends by `time`.
fn ends_by(range: &TimeRange, time: NaiveTime) -> bool {
    !range.ends_at_midnight() && range.end() <= time
}

impl<A: WorkingTime, B: WorkingTime> WorkingTime for CombinedCalendar<A, B> {
    fn ranges(&self, date: NaiveDate) -> Vec<TimeRange> {
        intersect_ranges(&self.first.ranges(date), &self.second.ranges(date))
    }

    fn ranges_for_day(&self, day: Weekday) -> Vec<TimeRange> {
        intersect_ranges(&self.first.ranges_for_day(day), &self.second.ranges_for_day(day))
    }

    fn time_unit_defaults(&self) -> TimeUnitDefaults {
        self.first.time_unit_defaults()
    }
}
