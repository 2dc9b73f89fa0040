use crate::duration::{Duration, TimeUnit, TimeUnitDefaults};
use crate::time_range::{MIDNIGHT, TimeRange, day_start, overlap_millis, set_end_time};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use log::warn;

/// How far the next/previous working time searches are allowed to walk
/// across non-working days before giving up.
pub const MAX_NONWORKING_DAYS: usize = 1000;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Working-time queries over anything that can report the hours worked on
/// a given date.
pub trait WorkingTime {
    /// Resolved working hours on `date`, ordered by start.
    fn ranges(&self, date: NaiveDate) -> Vec<TimeRange>;

    /// Resolved weekly hours for `day`, ignoring exceptions and working weeks.
    fn ranges_for_day(&self, day: Weekday) -> Vec<TimeRange>;

    fn time_unit_defaults(&self) -> TimeUnitDefaults {
        TimeUnitDefaults::default()
    }

    fn is_working_date(&self, date: NaiveDate) -> bool {
        !self.ranges(date).is_empty()
    }

    fn start_time(&self, date: NaiveDate) -> Option<NaiveTime> {
        self.ranges(date).first().map(TimeRange::start)
    }

    /// End of the last range on `date`; midnight means end of day.
    fn finish_time(&self, date: NaiveDate) -> Option<NaiveTime> {
        self.ranges(date).last().map(TimeRange::end)
    }

    fn work_on_date(&self, date: NaiveDate, units: TimeUnit) -> Duration {
        let millis = total_millis(&self.ranges(date));
        millis_to_duration(millis, units, &self.time_unit_defaults())
    }

    fn work_on_day(&self, day: Weekday, units: TimeUnit) -> Duration {
        let millis = total_millis(&self.ranges_for_day(day));
        millis_to_duration(millis, units, &self.time_unit_defaults())
    }

    /// Working time between two instants. Reversed arguments give the
    /// negated amount.
    fn work(&self, start: NaiveDateTime, finish: NaiveDateTime, units: TimeUnit) -> Duration {
        let (start, finish, negate) = if start > finish {
            (finish, start, true)
        } else {
            (start, finish, false)
        };

        let mut total = 0;
        if start.date() == finish.date() {
            total = millis_between(&self.ranges(start.date()), start.time(), finish.time());
        } else {
            let last_day = day_start(finish.date());
            let mut current = start;
            while current < last_day && !self.is_working_date(current.date()) {
                current += TimeDelta::days(1);
            }

            if current < last_day {
                let from = if current == start { start.time() } else { MIDNIGHT };
                total += millis_after(&self.ranges(current.date()), from);
                current += TimeDelta::days(1);
                while current < last_day {
                    total += total_millis(&self.ranges(current.date()));
                    current += TimeDelta::days(1);
                }
            }

            total += millis_between(&self.ranges(finish.date()), MIDNIGHT, finish.time());
        }

        if negate {
            total = -total;
        }
        millis_to_duration(total, units, &self.time_unit_defaults())
    }

    /// Earliest instant at or after `date_time` that falls in working time.
    fn next_work_start(&self, date_time: NaiveDateTime) -> NaiveDateTime {
        let date = date_time.date();
        let time = date_time.time();
        let same_day = self
            .ranges(date)
            .into_iter()
            .find(|range| range.ends_at_midnight() || time < range.end());
        if let Some(range) = same_day {
            return date.and_time(time.max(range.start()));
        }

        let mut current = date;
        for _ in 0..MAX_NONWORKING_DAYS {
            let Some(next) = current.succ_opt() else {
                break;
            };
            current = next;
            if let Some(start) = self.start_time(current) {
                return current.and_time(start);
            }
        }
        warn!("no working time found within {MAX_NONWORKING_DAYS} days after {date_time}");
        date_time
    }

    /// End of the latest working range that has finished by `date_time`.
    fn previous_work_finish(&self, date_time: NaiveDateTime) -> NaiveDateTime {
        let date = date_time.date();
        let time = date_time.time();
        let same_day = self
            .ranges(date)
            .into_iter()
            .rev()
            .find(|range| !range.ends_at_midnight() && time >= range.end());
        if let Some(range) = same_day {
            return date.and_time(range.end());
        }

        let mut current = date;
        for _ in 0..MAX_NONWORKING_DAYS {
            let Some(previous) = current.pred_opt() else {
                break;
            };
            current = previous;
            if let Some(finish) = self.finish_time(current) {
                return set_end_time(current, finish);
            }
        }
        warn!("no working time found within {MAX_NONWORKING_DAYS} days before {date_time}");
        date_time
    }

    /// Working dates from `start` to `finish` inclusive.
    fn working_days_between(&self, start: NaiveDate, finish: NaiveDate) -> u32 {
        let count = start
            .iter_days()
            .take_while(|date| *date <= finish)
            .filter(|date| self.is_working_date(*date))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

pub(crate) fn millis_to_duration(
    millis: i64,
    units: TimeUnit,
    defaults: &TimeUnitDefaults,
) -> Duration {
    Duration::minutes(millis as f64 / MILLIS_PER_MINUTE).convert_units(units, defaults)
}

pub(crate) fn total_millis(ranges: &[TimeRange]) -> i64 {
    ranges.iter().map(TimeRange::millis).sum()
}

fn millis_after(ranges: &[TimeRange], from: NaiveTime) -> i64 {
    ranges
        .iter()
        .map(|range| overlap_millis(range.start(), range.end(), from, range.end()))
        .sum()
}

fn millis_between(ranges: &[TimeRange], start: NaiveTime, end: NaiveTime) -> i64 {
    if start == end {
        return 0;
    }
    ranges
        .iter()
        .map(|range| overlap_millis(range.start(), range.end(), start, end))
        .sum()
}

impl<T: WorkingTime + ?Sized> WorkingTime for &T {
    fn ranges(&self, date: NaiveDate) -> Vec<TimeRange> {
        (**self).ranges(date)
    }

    fn ranges_for_day(&self, day: Weekday) -> Vec<TimeRange> {
        (**self).ranges_for_day(day)
    }

    fn time_unit_defaults(&self) -> TimeUnitDefaults {
        (**self).time_unit_defaults()
    }
}
