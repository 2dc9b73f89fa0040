use crate::calendar::WorkingTime;
use crate::duration::{Duration, TimeUnit, approx_eq};
use crate::time_range::{end_date, set_end_time, set_time};
use crate::timephased::{
    TimePeriodEntity, TimephasedAmount, TimephasedCost, TimephasedItem, TimephasedWork,
};
use chrono::NaiveDateTime;

/// Legacy work normalising: multi-day segments are split into days,
/// fragments of one day are combined, then runs of days carrying the same
/// work are merged.
pub(super) fn normalise_work(
    calendar: &dyn WorkingTime,
    parent: &dyn TimePeriodEntity,
    items: &mut Vec<TimephasedWork>,
) {
    if items.is_empty() {
        return;
    }
    let defaults = calendar.time_unit_defaults();
    let days = split_days(calendar, items.drain(..));
    let days = merge_same_day(calendar, days, |a: Duration, b: Duration| a.plus(b, &defaults));

    let mut result: Vec<TimephasedWork> = Vec::with_capacity(days.len());
    for mut item in days {
        if let Some(previous) = result.last_mut() {
            let total = item.total_amount.as_minutes(&defaults);
            let same_work = approx_eq(previous.amount_per_day.as_minutes(&defaults), total);
            let mergeable = same_work
                && (approx_eq(total, 0.0)
                    || (has_standard_hours(calendar, parent, previous)
                        && has_standard_hours(calendar, parent, &item)));
            if mergeable {
                previous.finish = item.finish;
                previous.total_amount = previous.total_amount.plus(item.total_amount, &defaults);
                previous.amount_per_day = item.total_amount;
                continue;
            }
        }
        item.amount_per_day = item.total_amount;
        result.push(item);
    }

    *items = result
        .iter()
        .map(|item| item.convert_units(TimeUnit::Hours, &defaults))
        .collect();
}

/// Legacy cost normalising; same stages as work, without the standard
/// hours check.
pub(super) fn normalise_cost(calendar: &dyn WorkingTime, items: &mut Vec<TimephasedCost>) {
    if items.is_empty() {
        return;
    }
    let days = split_days(calendar, items.drain(..));
    let days = merge_same_day(calendar, days, |a: f64, b: f64| a + b);

    let mut result: Vec<TimephasedCost> = Vec::with_capacity(days.len());
    for mut item in days {
        if let Some(previous) = result.last_mut() {
            if approx_eq(previous.amount_per_day, item.total_amount) {
                previous.finish = item.finish;
                previous.total_amount += item.total_amount;
                previous.amount_per_day = item.total_amount;
                continue;
            }
        }
        item.amount_per_day = item.total_amount;
        result.push(item);
    }
    *items = result;
}

fn calendar_minutes(calendar: &dyn WorkingTime, start: NaiveDateTime, finish: NaiveDateTime) -> f64 {
    calendar.work(start, finish, TimeUnit::Minutes).duration
}

/// Splits segments spanning several days into one segment per working
/// day, sharing the amount in proportion to each day's working time.
/// A span with no working time left is kept whole.
fn split_days<A: TimephasedAmount>(
    calendar: &dyn WorkingTime,
    items: impl Iterator<Item = TimephasedItem<A>>,
) -> Vec<TimephasedItem<A>> {
    let mut result = Vec::new();
    for mut remainder in items {
        while !remainder.is_single_day() {
            let calendar_work = calendar_minutes(calendar, remainder.start, remainder.finish);
            if calendar_work <= 0.0 {
                break;
            }
            let day = remainder.start.date();
            let day_finish = calendar
                .finish_time(day)
                .map(|time| set_end_time(day, time))
                .filter(|finish| *finish > remainder.start);

            let next_start = calendar.next_work_start(day_finish.unwrap_or(remainder.start));
            if next_start <= remainder.start || next_start >= remainder.finish {
                break;
            }

            let mut split = 0.0;
            if let Some(day_finish) = day_finish {
                let day_work = calendar_minutes(calendar, remainder.start, day_finish);
                split = remainder.total_amount.value() * day_work / calendar_work;
                let amount = remainder.total_amount.with_value(split);
                result.push(TimephasedItem {
                    finish: day_finish,
                    total_amount: amount,
                    amount_per_day: amount,
                    ..remainder
                });
            }
            let left = remainder.total_amount.value() - split;
            remainder.start = next_start;
            remainder.total_amount = remainder.total_amount.with_value(left);
        }
        result.push(remainder);
    }
    result
}

/// Combines segments starting on the same day. A zero segment never
/// displaces a non-zero one. Segments with neither working time nor an
/// amount are dropped.
fn merge_same_day<A: TimephasedAmount>(
    calendar: &dyn WorkingTime,
    items: Vec<TimephasedItem<A>>,
    plus: impl Fn(A, A) -> A,
) -> Vec<TimephasedItem<A>> {
    let mut result: Vec<TimephasedItem<A>> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(previous) = result.last_mut() {
            if previous.start.date() == item.start.date() {
                if item.total_amount.is_zero() {
                    continue;
                }
                if previous.total_amount.is_zero() {
                    *previous = item;
                } else {
                    previous.finish = item.finish;
                    previous.total_amount = plus(previous.total_amount, item.total_amount);
                }
                continue;
            }
        }
        result.push(item);
    }
    result.retain(|item| {
        !(item.total_amount.is_zero()
            && approx_eq(calendar_minutes(calendar, item.start, item.finish), 0.0))
    });
    result
}

/// Starts at the start of a working day (or the owner's start) and
/// finishes at the end of one (or the owner's finish).
fn has_standard_hours(
    calendar: &dyn WorkingTime,
    parent: &dyn TimePeriodEntity,
    item: &TimephasedWork,
) -> bool {
    let standard_start = calendar
        .start_time(item.start.date())
        .map(|time| set_time(item.start, time));
    let start_ok = standard_start == Some(item.start) || parent.start() == Some(item.start);

    let finish_day = end_date(item.finish);
    let standard_finish = calendar
        .finish_time(finish_day)
        .map(|time| set_end_time(finish_day, time));
    let finish_ok = standard_finish == Some(item.finish) || parent.finish() == Some(item.finish);

    start_ok && finish_ok
}
