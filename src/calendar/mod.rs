pub mod combined;
pub mod exception;
pub mod helper;
pub mod recurrence;
pub mod set;
pub mod week;
pub mod working_time;

pub use combined::CombinedCalendar;
pub use exception::CalendarException;
pub use recurrence::{RecurrenceType, RecurringData};
pub use set::{CalendarId, CalendarRef, CalendarSet};
pub use week::WorkingWeek;
pub use working_time::WorkingTime;

use crate::duration::TimeUnitDefaults;
use crate::time_range::{TimeRange, default_working_hours};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Name given to calendars built by [`Calendar::standard`].
pub const DEFAULT_BASE_CALENDAR_NAME: &str = "Standard";

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    NonWorking,
    Working,
    /// Defer to the parent calendar.
    #[default]
    Default,
}

/// Per-weekday day types and working hours.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalendarDays {
    day_types: [DayType; 7],
    hours: [Option<Vec<TimeRange>>; 7],
}

fn day_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

impl CalendarDays {
    pub fn day_type(&self, day: Weekday) -> DayType {
        self.day_types[day_index(day)]
    }

    pub fn set_day_type(&mut self, day: Weekday, day_type: DayType) {
        self.day_types[day_index(day)] = day_type;
    }

    pub fn hours(&self, day: Weekday) -> Option<&[TimeRange]> {
        self.hours[day_index(day)].as_deref()
    }

    pub fn set_hours(&mut self, day: Weekday, mut ranges: Vec<TimeRange>) {
        ranges.sort_by_key(TimeRange::start);
        self.hours[day_index(day)] = Some(ranges);
    }

    pub fn clear_hours(&mut self, day: Weekday) {
        self.hours[day_index(day)] = None;
    }

    pub fn add_default_hours(&mut self, day: Weekday) {
        self.set_hours(day, default_working_hours());
    }

    /// Marks `day` working with default hours, or non-working with no hours.
    pub fn set_working_day(&mut self, day: Weekday, working: bool) {
        if working {
            self.set_day_type(day, DayType::Working);
            if self.hours(day).is_none() {
                self.add_default_hours(day);
            }
        } else {
            self.set_day_type(day, DayType::NonWorking);
            self.clear_hours(day);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Calendar {
    unique_id: Option<i32>,
    name: Option<String>,
    parent: Option<CalendarId>,
    days: CalendarDays,
    working_weeks: Vec<WorkingWeek>,
    exceptions: Vec<CalendarException>,
    time_unit_defaults: Option<TimeUnitDefaults>,
    expanded: OnceLock<Vec<CalendarException>>,
}

impl Calendar {
    /// A calendar whose every day defers to its parent.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Monday to Friday, 08:00-12:00 and 13:00-17:00.
    pub fn standard() -> Self {
        let mut calendar = Self::new(DEFAULT_BASE_CALENDAR_NAME);
        for day in WEEKDAYS {
            let working = !matches!(day, Weekday::Sat | Weekday::Sun);
            calendar.days.set_working_day(day, working);
        }
        calendar
    }

    pub fn unique_id(&self) -> Option<i32> {
        self.unique_id
    }

    pub fn set_unique_id(&mut self, unique_id: i32) {
        self.unique_id = Some(unique_id);
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn parent(&self) -> Option<CalendarId> {
        self.parent
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<CalendarId>) {
        self.parent = parent;
    }

    pub fn is_derived(&self) -> bool {
        self.parent.is_some()
    }

    pub fn days(&self) -> &CalendarDays {
        &self.days
    }

    pub fn days_mut(&mut self) -> &mut CalendarDays {
        &mut self.days
    }

    pub fn day_type(&self, day: Weekday) -> DayType {
        self.days.day_type(day)
    }

    pub fn set_day_type(&mut self, day: Weekday, day_type: DayType) {
        self.days.set_day_type(day, day_type);
    }

    pub fn set_working_day(&mut self, day: Weekday, working: bool) {
        self.days.set_working_day(day, working);
    }

    pub fn hours(&self, day: Weekday) -> Option<&[TimeRange]> {
        self.days.hours(day)
    }

    pub fn set_hours(&mut self, day: Weekday, ranges: Vec<TimeRange>) {
        self.days.set_hours(day, ranges);
    }

    pub fn time_unit_defaults(&self) -> Option<TimeUnitDefaults> {
        self.time_unit_defaults
    }

    pub fn set_time_unit_defaults(&mut self, defaults: TimeUnitDefaults) {
        self.time_unit_defaults = Some(defaults);
    }

    pub fn working_weeks(&self) -> &[WorkingWeek] {
        &self.working_weeks
    }

    pub fn add_working_week(&mut self, week: WorkingWeek) {
        self.working_weeks.push(week);
        self.working_weeks.sort_by_key(WorkingWeek::from_date);
    }

    pub fn exceptions(&self) -> &[CalendarException] {
        &self.exceptions
    }

    pub fn add_exception(&mut self, exception: CalendarException) {
        let index = self
            .exceptions
            .partition_point(|e| e.from_date() <= exception.from_date());
        self.exceptions.insert(index, exception);
        self.expanded.take();
    }

    pub fn remove_exception(&mut self, index: usize) -> Option<CalendarException> {
        if index >= self.exceptions.len() {
            return None;
        }
        self.expanded.take();
        Some(self.exceptions.remove(index))
    }

    pub fn clear_exceptions(&mut self) {
        self.exceptions.clear();
        self.expanded.take();
    }

    /// Own exceptions with recurrences expanded to single days, sorted by
    /// date. Non-recurring exceptions win over recurring ones on the same
    /// date; among recurring ones daily beats yearly beats monthly beats
    /// weekly.
    pub fn expanded_exceptions(&self) -> &[CalendarException] {
        self.expanded
            .get_or_init(|| expand_exceptions(&self.exceptions))
    }

    /// Expanded exceptions with the working weeks folded in as weekly
    /// recurrences clipped to `[earliest, latest]`. Own exceptions win over
    /// a working week on the same date.
    pub fn expanded_exceptions_with_working_weeks(
        &self,
        earliest: NaiveDate,
        latest: NaiveDate,
    ) -> Vec<CalendarException> {
        let mut exceptions: Vec<CalendarException> = self
            .working_weeks
            .iter()
            .flat_map(|week| week.to_recurring_exceptions(earliest, latest))
            .collect();
        exceptions.extend(self.exceptions.iter().cloned());
        expand_exceptions(&exceptions)
    }

    /// The own exception covering `date`, if any.
    pub fn exception(&self, date: NaiveDate) -> Option<&CalendarException> {
        let expanded = self.expanded_exceptions();
        expanded
            .binary_search_by(|e| e.compare_to_date(date))
            .ok()
            .map(|index| &expanded[index])
    }

    /// The own working week covering `date`, if any.
    pub fn working_week(&self, date: NaiveDate) -> Option<&WorkingWeek> {
        self.working_weeks.iter().find(|w| w.contains(date))
    }
}

fn expand_exceptions(exceptions: &[CalendarException]) -> Vec<CalendarException> {
    let mut weekly = Vec::new();
    let mut monthly = Vec::new();
    let mut yearly = Vec::new();
    let mut daily = Vec::new();
    let mut non_recurring = Vec::new();

    for exception in exceptions {
        let expanded = exception.expanded();
        match exception.recurring_data() {
            Some(data) if expanded.len() > 1 => match data.recurrence_type {
                RecurrenceType::Weekly => weekly.extend(expanded),
                RecurrenceType::Monthly => monthly.extend(expanded),
                RecurrenceType::Yearly => yearly.extend(expanded),
                RecurrenceType::Daily => daily.extend(expanded),
            },
            _ => non_recurring.extend(expanded),
        }
    }

    let mut by_date: BTreeMap<NaiveDate, CalendarException> = BTreeMap::new();
    for exception in weekly.into_iter().chain(monthly).chain(yearly).chain(daily) {
        by_date.insert(exception.from_date(), exception);
    }
    for exception in &non_recurring {
        by_date.retain(|date, _| !exception.contains_date(*date));
    }

    let mut result: Vec<CalendarException> = by_date.into_values().collect();
    result.extend(non_recurring);
    result.sort_by_key(CalendarException::from_date);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn non_recurring_overrides_recurring_expansion() {
        let mut calendar = Calendar::standard();
        let every_monday =
            RecurringData::weekly(d(2024, 1, 1), vec![Weekday::Mon]).with_occurrences(4);
        calendar.add_exception(CalendarException::recurring(every_monday));
        calendar.add_exception(
            CalendarException::new(d(2024, 1, 8), d(2024, 1, 9))
                .with_hours(vec![TimeRange::working_hours(9, 11)]),
        );

        let expanded = calendar.expanded_exceptions();
        assert_eq!(expanded.len(), 4);
        let hit = calendar.exception(d(2024, 1, 8)).unwrap();
        assert_eq!(hit.to_date(), d(2024, 1, 9));
        assert!(calendar.exception(d(2024, 1, 15)).unwrap().hours().is_empty());
        assert!(calendar.exception(d(2024, 1, 10)).is_none());
    }

    #[test]
    fn mutation_resets_expansion() {
        let mut calendar = Calendar::standard();
        assert!(calendar.expanded_exceptions().is_empty());
        calendar.add_exception(CalendarException::single_day(d(2024, 7, 4)));
        assert_eq!(calendar.expanded_exceptions().len(), 1);
        calendar.clear_exceptions();
        assert!(calendar.exception(d(2024, 7, 4)).is_none());
    }

    #[test]
    fn working_weeks_fold_into_expansion() {
        let mut calendar = Calendar::standard();
        let mut week = WorkingWeek::new(d(2024, 1, 1), d(2024, 1, 14)).with_name("Shutdown");
        week.days_mut().set_working_day(Weekday::Mon, false);
        calendar.add_working_week(week);
        calendar.add_exception(
            CalendarException::single_day(d(2024, 1, 8))
                .with_hours(vec![TimeRange::working_hours(9, 12)]),
        );

        let expanded = calendar.expanded_exceptions_with_working_weeks(d(2024, 1, 1), d(2024, 12, 31));
        let dates: Vec<NaiveDate> = expanded.iter().map(CalendarException::from_date).collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 8)]);
        assert!(!expanded[1].hours().is_empty());
    }
}
