use super::set::{CalendarId, CalendarRef, CalendarSet};
use super::{Calendar, CalendarException, DayType, WEEKDAYS};
use crate::error::CalendarResult;
use log::debug;
use std::borrow::Cow;

/// Copies the exceptions of `source` and all its ancestors into `target`.
///
/// A source exception whose expansion touches a date range `target`
/// already overrides is copied piecewise, skipping the covered pieces;
/// any other exception is copied as is, recurrence included.
pub fn merge_exceptions(target: &mut Calendar, source: CalendarRef<'_>) {
    for calendar in source.chain() {
        merge_exception_list(target, calendar.calendar().exceptions());
    }
}

pub fn merge_exception_list(target: &mut Calendar, source: &[CalendarException]) {
    let existing: Vec<CalendarException> = target.expanded_exceptions().to_vec();
    let covered = |piece: &CalendarException| existing.iter().any(|e| e.contains(piece));

    for exception in source {
        let pieces = exception.expanded();
        if pieces.iter().any(|piece| covered(piece)) {
            for piece in pieces.into_iter().filter(|piece| !covered(piece)) {
                target.add_exception(piece);
            }
        } else {
            target.add_exception(exception.clone());
        }
    }
}

/// A base calendar equivalent to `calendar` with its hierarchy folded in.
/// Non-derived calendars are returned as they are.
pub fn flattened_calendar(calendar: CalendarRef<'_>) -> Cow<'_, Calendar> {
    let source = calendar.calendar();
    if !source.is_derived() {
        return Cow::Borrowed(source);
    }

    let mut flattened = Calendar::default();
    if let Some(name) = source.name() {
        flattened.set_name(name);
    }
    if let Some(unique_id) = source.unique_id() {
        flattened.set_unique_id(unique_id);
    }
    flattened.set_time_unit_defaults(calendar.resolved_time_unit_defaults());

    for day in WEEKDAYS {
        let hours = calendar.hours_for_day(day);
        if hours.is_empty() {
            flattened.set_day_type(day, DayType::NonWorking);
        } else {
            flattened.set_day_type(day, DayType::Working);
            flattened.set_hours(day, hours.to_vec());
        }
    }

    for week in source.working_weeks() {
        flattened.add_working_week(week.clone());
    }

    merge_exceptions(&mut flattened, calendar);
    Cow::Owned(flattened)
}

/// Adds a calendar named after a resource that derives everything from
/// `base`, with a fresh unique ID.
pub fn create_derived_calendar(
    set: &mut CalendarSet,
    base: CalendarId,
    name: &str,
) -> CalendarResult<CalendarId> {
    let mut calendar = Calendar::new(name);
    calendar.set_unique_id(set.next_unique_id());
    let id = set.add_derived(calendar, base)?;
    debug!("created derived calendar {id} for {name} on {base}");
    Ok(id)
}
