use super::{TimephasedAmount, TimephasedCost, TimephasedItem, TimephasedWork};
use crate::calendar::WorkingTime;
use crate::duration::{Duration, TimeUnit};
use crate::error::{TimephasedError, TimephasedResult};
use crate::time_range::DateTimeRange;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Spreads timephased work over timescale buckets such as days or weeks.
///
/// Each segment contributes at its hourly rate for the working hours it
/// shares with a bucket; a segment with no working time is spread evenly
/// over elapsed time instead. Buckets no segment touches are `None`.
pub fn segment_work(
    calendar: &dyn WorkingTime,
    ranges: &[DateTimeRange],
    items: &[TimephasedWork],
    units: TimeUnit,
) -> TimephasedResult<Vec<Option<Duration>>> {
    if let Some(first) = items.first() {
        if items.iter().any(|item| item.total_amount.units != first.total_amount.units) {
            return Err(TimephasedError::MixedUnits);
        }
    }
    let defaults = calendar.time_unit_defaults();
    let buckets = segment(calendar, ranges, items, |amount| amount.as_minutes(&defaults))?;
    Ok(buckets
        .into_iter()
        .map(|minutes| minutes.map(|m| Duration::minutes(m).convert_units(units, &defaults)))
        .collect())
}

/// Spreads timephased cost over timescale buckets.
pub fn segment_cost(
    calendar: &dyn WorkingTime,
    ranges: &[DateTimeRange],
    items: &[TimephasedCost],
) -> TimephasedResult<Vec<Option<f64>>> {
    segment(calendar, ranges, items, |amount| *amount)
}

fn segment<A: TimephasedAmount>(
    calendar: &dyn WorkingTime,
    ranges: &[DateTimeRange],
    items: &[TimephasedItem<A>],
    amount_of: impl Fn(&A) -> f64,
) -> TimephasedResult<Vec<Option<f64>>> {
    validate_ranges(ranges)?;
    validate_items(items)?;

    let mut buckets = Vec::with_capacity(ranges.len());
    for range in ranges {
        let mut bucket: Option<f64> = None;
        for item in items {
            let Some(overlap) = range.intersection(&item.range()) else {
                continue;
            };
            let amount = amount_of(&item.total_amount);
            let item_hours = calendar.work(item.start, item.finish, TimeUnit::Hours).duration;
            let share = if item_hours > 0.0 {
                let overlap_hours = calendar.work(overlap.start, overlap.end, TimeUnit::Hours).duration;
                amount / item_hours * overlap_hours
            } else {
                amount / elapsed_hours(&item.range()) * elapsed_hours(&overlap)
            };
            bucket = Some(bucket.unwrap_or(0.0) + share);
        }
        buckets.push(bucket);
    }
    Ok(buckets)
}

fn elapsed_hours(range: &DateTimeRange) -> f64 {
    (range.end - range.start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

fn validate_ranges(ranges: &[DateTimeRange]) -> TimephasedResult<()> {
    let mut previous: Option<&DateTimeRange> = None;
    for range in ranges {
        if !range.is_valid() {
            return Err(TimephasedError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        if previous.is_some_and(|p| p.end > range.start) {
            return Err(TimephasedError::RangesOutOfOrder(range.start));
        }
        previous = Some(range);
    }
    Ok(())
}

fn validate_items<A>(items: &[TimephasedItem<A>]) -> TimephasedResult<()> {
    let mut previous: Option<&TimephasedItem<A>> = None;
    for item in items {
        if item.start >= item.finish {
            return Err(TimephasedError::InvalidItem {
                start: item.start,
                finish: item.finish,
            });
        }
        if previous.is_some_and(|p| p.finish > item.start) {
            return Err(TimephasedError::ItemsOutOfOrder(item.start));
        }
        previous = Some(item);
    }
    Ok(())
}
