use crate::calendar::WorkingTime;
use crate::duration::{TimeUnit, approx_eq};
use crate::timephased::TimephasedCost;
use chrono::NaiveDateTime;

fn hours(calendar: &dyn WorkingTime, start: NaiveDateTime, finish: NaiveDateTime) -> f64 {
    calendar.work(start, finish, TimeUnit::Hours).duration
}

/// Cost per working hour; NaN when there is no working time.
fn hourly_rate(cost: f64, hours: f64) -> f64 {
    if hours == 0.0 { f64::NAN } else { cost / hours }
}

/// Merges adjacent segments that share an hourly rate, dropping segments
/// with neither working time nor cost.
pub(super) fn normalise(calendar: &dyn WorkingTime, items: &mut Vec<TimephasedCost>) {
    let mut result: Vec<TimephasedCost> = Vec::with_capacity(items.len());

    for mut item in items.drain(..) {
        let item_hours = hours(calendar, item.start, item.finish);
        if approx_eq(item_hours, 0.0) && approx_eq(item.total_amount, 0.0) {
            continue;
        }
        if item.amount_per_day == 0.0 {
            item.amount_per_day = item.total_amount;
        }
        let rate = hourly_rate(item.total_amount, item_hours);

        if let Some(previous) = result.last_mut() {
            let previous_rate = hourly_rate(
                previous.total_amount,
                hours(calendar, previous.start, previous.finish),
            );
            if approx_eq(previous_rate, rate) {
                let total = previous.total_amount + item.total_amount;
                let combined_rate = hourly_rate(total, hours(calendar, previous.start, item.finish));
                if approx_eq(combined_rate, rate) {
                    previous.finish = item.finish;
                    previous.total_amount = total;
                    previous.amount_per_day = item.amount_per_day;
                    continue;
                }
            }
        }
        result.push(item);
    }
    *items = result;
}
