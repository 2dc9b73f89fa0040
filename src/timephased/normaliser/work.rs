use crate::calendar::WorkingTime;
use crate::duration::{TimeUnit, approx_eq};
use crate::timephased::TimephasedWork;

/// Merges runs of segments whose work matches the calendar exactly, then
/// moves segment edges off non-working time.
pub(super) fn normalise(calendar: &dyn WorkingTime, items: &mut Vec<TimephasedWork>) {
    if items.is_empty() {
        return;
    }
    let defaults = calendar.time_unit_defaults();

    // (segment, follows the calendar)
    let mut merged: Vec<(TimephasedWork, bool)> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        let calendar_work = calendar
            .work(item.start, item.finish, TimeUnit::Minutes)
            .duration;
        let item_work = item.total_amount.as_minutes(&defaults);
        let standard = approx_eq(calendar_work, item_work);

        if standard && approx_eq(item_work, 0.0) {
            continue;
        }

        if standard {
            if let Some((previous, true)) = merged.last_mut() {
                let previous_work = previous.total_amount.as_minutes(&defaults);
                let combined = calendar
                    .work(previous.start, item.finish, TimeUnit::Minutes)
                    .duration;
                if approx_eq(combined, previous_work + item_work) {
                    previous.finish = item.finish;
                    previous.total_amount = previous.total_amount.plus(item.total_amount, &defaults);
                    previous.amount_per_day = item.amount_per_day;
                    continue;
                }
            }
        }
        merged.push((item, standard));
    }

    let mut result: Vec<TimephasedWork> = merged.into_iter().map(|(item, _)| item).collect();
    for item in &mut result {
        snap_start(calendar, item);
        snap_finish(calendar, item);
    }

    *items = result
        .iter()
        .map(|item| item.convert_units(TimeUnit::Hours, &defaults))
        .collect();
}

/// A start sitting on the end of working time moves to the next working
/// start, provided that is still inside the segment.
fn snap_start(calendar: &dyn WorkingTime, item: &mut TimephasedWork) {
    let next = calendar.next_work_start(item.start);
    if next == item.start || next > item.finish {
        return;
    }
    if calendar.previous_work_finish(item.start) == item.start {
        item.start = next;
    }
}

/// A finish trailing non-working time moves back to the previous working
/// finish when no work is lost.
fn snap_finish(calendar: &dyn WorkingTime, item: &mut TimephasedWork) {
    let previous = calendar.previous_work_finish(item.finish);
    if previous == item.finish || previous < item.start {
        return;
    }
    let full = calendar.work(item.start, item.finish, TimeUnit::Minutes);
    let trimmed = calendar.work(item.start, previous, TimeUnit::Minutes);
    if full.duration == trimmed.duration {
        item.finish = previous;
    }
}
