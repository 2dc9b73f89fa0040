use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use proptest::prelude::*;
use schedule_calendar::calendar::{CalendarRef, CalendarSet};
use schedule_calendar::timephased::Normalise;
use schedule_calendar::{
    Calendar, DateTimeRange, Duration, Normaliser, TimephasedCost, TimephasedItem, TimephasedWork,
    approx_eq,
};

fn dt(y: i32, m: u32, day: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, day)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn work(start: NaiveDateTime, finish: NaiveDateTime, hours: f64) -> TimephasedWork {
    TimephasedItem::new(start, finish, Duration::hours(hours), Duration::hours(hours))
}

fn cost(start: NaiveDateTime, finish: NaiveDateTime, amount: f64) -> TimephasedCost {
    TimephasedItem::new(start, finish, amount, amount)
}

fn standard() -> CalendarSet {
    let mut set = CalendarSet::new();
    set.add(Calendar::standard());
    set
}

fn run_work(
    normaliser: Normaliser,
    calendar: CalendarRef<'_>,
    mut items: Vec<TimephasedWork>,
) -> Vec<TimephasedWork> {
    let parent = DateTimeRange::new(dt(2023, 12, 1, 0), dt(2024, 3, 1, 0));
    normaliser.normalise(&calendar, &parent, &mut items);
    items
}

fn first(set: &CalendarSet) -> CalendarRef<'_> {
    let (id, _) = set.iter().next().unwrap();
    set.calendar(id).unwrap()
}

// 2024-01-01 is a Monday.

#[test]
fn merge_same_work_joins_two_full_days() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), 8.0),
        work(dt(2024, 1, 2, 8), dt(2024, 1, 2, 17), 8.0),
    ];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].start, dt(2024, 1, 1, 8));
    assert_eq!(result[0].finish, dt(2024, 1, 2, 17));
    assert_eq!(result[0].total_amount, Duration::hours(16.0));
    assert_eq!(result[0].amount_per_day, Duration::hours(8.0));

    let again = run_work(Normaliser::MergeSameWork, first(&set), result.clone());
    assert_eq!(again, result);
}

#[test]
fn merge_same_work_keeps_different_rates_apart() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), 8.0),
        work(dt(2024, 1, 2, 8), dt(2024, 1, 2, 12), 4.0),
    ];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);
    assert_eq!(result.len(), 2);
}

#[test]
fn merge_same_work_requires_standard_hours() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 1, 9), dt(2024, 1, 1, 16), 8.0),
        work(dt(2024, 1, 2, 8), dt(2024, 1, 2, 17), 8.0),
    ];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);
    assert_eq!(result.len(), 2);
}

#[test]
fn merge_same_work_joins_zero_rate_segments_anywhere() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 1, 10), dt(2024, 1, 1, 14), 0.0),
        work(dt(2024, 1, 2, 10), dt(2024, 1, 2, 14), 0.0),
    ];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].finish, dt(2024, 1, 2, 14));
    assert!(result[0].total_amount.is_zero());
}

#[test]
fn merge_same_work_drops_idle_time_outside_the_calendar() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 5, 8), dt(2024, 1, 5, 17), 8.0),
        work(dt(2024, 1, 6, 10), dt(2024, 1, 6, 14), 0.0),
        work(dt(2024, 1, 7, 10), dt(2024, 1, 7, 14), 0.0),
        work(dt(2024, 1, 8, 8), dt(2024, 1, 8, 17), 8.0),
    ];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].start, dt(2024, 1, 5, 8));
    assert_eq!(result[0].finish, dt(2024, 1, 8, 17));
    assert_eq!(result[0].total_amount, Duration::hours(16.0));
}

#[test]
fn merge_same_work_compares_totals_not_stored_rates() {
    let set = standard();
    let without_rate = |day: u32, hours: f64| {
        TimephasedItem::new(
            dt(2024, 1, day, 8),
            dt(2024, 1, day, 17),
            Duration::hours(hours),
            Duration::hours(0.0),
        )
    };

    let same = vec![without_rate(1, 8.0), without_rate(2, 8.0)];
    let result = run_work(Normaliser::MergeSameWork, first(&set), same);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].amount_per_day, Duration::hours(8.0));

    let different = vec![without_rate(1, 8.0), without_rate(2, 4.0)];
    let result = run_work(Normaliser::MergeSameWork, first(&set), different);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].amount_per_day, Duration::hours(8.0));
    assert_eq!(result[1].amount_per_day, Duration::hours(4.0));
}

#[test]
fn merge_same_work_splits_multi_day_segments_by_working_time() {
    let set = standard();
    // Monday afternoon through Wednesday: 4h + 8h + 8h of working time
    let items = vec![TimephasedItem::new(
        dt(2024, 1, 1, 13),
        dt(2024, 1, 3, 17),
        Duration::hours(20.0),
        Duration::hours(0.0),
    )];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].start, dt(2024, 1, 1, 13));
    assert_eq!(result[0].finish, dt(2024, 1, 1, 17));
    assert_eq!(result[0].total_amount, Duration::hours(4.0));
    assert_eq!(result[1].start, dt(2024, 1, 2, 8));
    assert_eq!(result[1].finish, dt(2024, 1, 3, 17));
    assert_eq!(result[1].total_amount, Duration::hours(16.0));
    assert_eq!(result[1].amount_per_day, Duration::hours(8.0));
}

#[test]
fn merge_same_work_resplits_merged_days_to_the_same_shape() {
    let set = standard();
    let items = vec![TimephasedItem::new(
        dt(2024, 1, 1, 8),
        dt(2024, 1, 3, 17),
        Duration::hours(24.0),
        Duration::hours(24.0),
    )];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].total_amount, Duration::hours(24.0));
    assert_eq!(result[0].amount_per_day, Duration::hours(8.0));
}

#[test]
fn merge_same_work_combines_fragments_of_one_day() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 1, 8), dt(2024, 1, 1, 12), 4.0),
        work(dt(2024, 1, 1, 13), dt(2024, 1, 1, 17), 4.0),
        work(dt(2024, 1, 2, 8), dt(2024, 1, 2, 17), 8.0),
    ];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].finish, dt(2024, 1, 2, 17));
    assert_eq!(result[0].total_amount, Duration::hours(16.0));
}

#[test]
fn merge_same_work_ignores_idle_fragment_after_work() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 1, 8), dt(2024, 1, 1, 12), 4.0),
        work(dt(2024, 1, 1, 13), dt(2024, 1, 1, 17), 0.0),
    ];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].finish, dt(2024, 1, 1, 12));
    assert_eq!(result[0].total_amount, Duration::hours(4.0));
}

#[test]
fn merge_same_work_output_is_in_hours() {
    let set = standard();
    let items = vec![TimephasedItem::new(
        dt(2024, 1, 1, 8),
        dt(2024, 1, 1, 17),
        Duration::minutes(480.0),
        Duration::minutes(480.0),
    )];
    let result = run_work(Normaliser::MergeSameWork, first(&set), items);
    assert_eq!(result[0].total_amount, Duration::hours(8.0));
}

#[test]
fn new_work_merges_standard_days_across_dropped_weekend() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 5, 8), dt(2024, 1, 5, 17), 8.0),
        work(dt(2024, 1, 6, 0), dt(2024, 1, 8, 0), 0.0),
        work(dt(2024, 1, 8, 8), dt(2024, 1, 8, 17), 8.0),
    ];
    let result = run_work(Normaliser::NewWork, first(&set), items);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].start, dt(2024, 1, 5, 8));
    assert_eq!(result[0].finish, dt(2024, 1, 8, 17));
    assert_eq!(result[0].total_amount, Duration::hours(16.0));
}

#[test]
fn new_work_keeps_non_standard_segments() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), 10.0),
        work(dt(2024, 1, 2, 8), dt(2024, 1, 2, 17), 8.0),
    ];
    let result = run_work(Normaliser::NewWork, first(&set), items);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].total_amount, Duration::hours(10.0));
}

#[test]
fn new_work_snaps_start_to_next_working_time() {
    let set = standard();
    let items = vec![work(dt(2024, 1, 5, 17), dt(2024, 1, 8, 12), 4.0)];
    let result = run_work(Normaliser::NewWork, first(&set), items);
    assert_eq!(result[0].start, dt(2024, 1, 8, 8));
    assert_eq!(result[0].finish, dt(2024, 1, 8, 12));
}

#[test]
fn new_work_snaps_finish_back_when_no_work_is_lost() {
    let set = standard();
    let items = vec![work(dt(2024, 1, 1, 13), dt(2024, 1, 2, 8), 4.0)];
    let result = run_work(Normaliser::NewWork, first(&set), items);
    assert_eq!(result[0].start, dt(2024, 1, 1, 13));
    assert_eq!(result[0].finish, dt(2024, 1, 1, 17));
}

#[test]
fn cost_normaliser_on_work_leaves_data_alone() {
    let set = standard();
    let items = vec![
        work(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), 8.0),
        work(dt(2024, 1, 2, 8), dt(2024, 1, 2, 17), 8.0),
    ];
    let result = run_work(Normaliser::NewCost, first(&set), items.clone());
    assert_eq!(result, items);
    let result = run_work(Normaliser::Null, first(&set), items.clone());
    assert_eq!(result, items);
}

#[test]
fn new_cost_merges_equal_hourly_rates() {
    let set = standard();
    let calendar = first(&set);
    let parent = DateTimeRange::new(dt(2024, 1, 1, 0), dt(2024, 2, 1, 0));
    let mut items = vec![
        cost(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), 800.0),
        cost(dt(2024, 1, 2, 8), dt(2024, 1, 2, 17), 800.0),
        cost(dt(2024, 1, 3, 8), dt(2024, 1, 3, 17), 400.0),
        cost(dt(2024, 1, 6, 8), dt(2024, 1, 6, 17), 0.0),
    ];
    Normaliser::NewCost.normalise(&calendar, &parent, &mut items);

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].finish, dt(2024, 1, 2, 17));
    assert!(approx_eq(items[0].total_amount, 1600.0));
    assert!(approx_eq(items[1].total_amount, 400.0));
}

#[test]
fn new_work_normaliser_on_cost_uses_cost_rules() {
    let set = standard();
    let calendar = first(&set);
    let parent = DateTimeRange::new(dt(2024, 1, 1, 0), dt(2024, 2, 1, 0));
    let mut items = vec![
        cost(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), 800.0),
        cost(dt(2024, 1, 2, 8), dt(2024, 1, 2, 17), 800.0),
    ];
    Normaliser::NewWork.normalise(&calendar, &parent, &mut items);
    assert_eq!(items.len(), 1);
}

#[test]
fn legacy_cost_merge_compares_daily_amounts() {
    let set = standard();
    let calendar = first(&set);
    let parent = DateTimeRange::new(dt(2024, 1, 1, 0), dt(2024, 2, 1, 0));
    let mut items = vec![
        cost(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), 100.0),
        cost(dt(2024, 1, 2, 8), dt(2024, 1, 2, 12), 100.0),
        cost(dt(2024, 1, 3, 8), dt(2024, 1, 3, 17), 50.0),
    ];
    Normaliser::MergeSameWork.normalise(&calendar, &parent, &mut items);
    assert_eq!(items.len(), 2);
    assert!(approx_eq(items[0].total_amount, 200.0));
}

#[test]
fn legacy_cost_merge_compares_totals() {
    let set = standard();
    let calendar = first(&set);
    let parent = DateTimeRange::new(dt(2024, 1, 1, 0), dt(2024, 2, 1, 0));
    let mut items: Vec<TimephasedCost> = [(1, 100.0), (2, 50.0), (3, 300.0)]
        .into_iter()
        .map(|(day, amount)| TimephasedItem::new(dt(2024, 1, day, 8), dt(2024, 1, day, 17), amount, 0.0))
        .collect();
    Normaliser::MergeSameWork.normalise(&calendar, &parent, &mut items);

    assert_eq!(items.len(), 3);
    let totals: Vec<f64> = items.iter().map(|item| item.total_amount).collect();
    assert_eq!(totals, vec![100.0, 50.0, 300.0]);
    assert!(items.iter().all(|item| item.amount_per_day == item.total_amount));
}

#[test]
fn legacy_cost_merge_splits_days_by_working_time() {
    let set = standard();
    let calendar = first(&set);
    let parent = DateTimeRange::new(dt(2024, 1, 1, 0), dt(2024, 2, 1, 0));
    // 4h on Monday afternoon, 8h on Tuesday
    let mut items = vec![TimephasedItem::new(dt(2024, 1, 1, 13), dt(2024, 1, 2, 17), 120.0, 0.0)];
    Normaliser::MergeSameWork.normalise(&calendar, &parent, &mut items);

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].finish, dt(2024, 1, 1, 17));
    assert!(approx_eq(items[0].total_amount, 40.0));
    assert_eq!(items[1].start, dt(2024, 1, 2, 8));
    assert!(approx_eq(items[1].total_amount, 80.0));
}

fn daily_costs(amounts: &[f64]) -> Vec<TimephasedCost> {
    amounts
        .iter()
        .enumerate()
        .map(|(offset, amount)| {
            let day = dt(2024, 1, 1, 8) + TimeDelta::days(offset as i64);
            cost(day, day + TimeDelta::hours(9), *amount)
        })
        .collect()
}

fn run_cost(normaliser: Normaliser, calendar: CalendarRef<'_>, mut items: Vec<TimephasedCost>) -> Vec<TimephasedCost> {
    let parent = DateTimeRange::new(dt(2023, 12, 1, 0), dt(2024, 3, 1, 0));
    normaliser.normalise(&calendar, &parent, &mut items);
    items
}

fn daily_segments(amounts: &[f64]) -> Vec<TimephasedWork> {
    amounts
        .iter()
        .enumerate()
        .map(|(offset, hours)| {
            let day = dt(2024, 1, 1, 8) + TimeDelta::days(offset as i64);
            work(day, day + TimeDelta::hours(9), *hours)
        })
        .collect()
}

fn total_hours(items: &[TimephasedWork]) -> f64 {
    items.iter().map(|item| item.total_amount.duration).sum()
}

proptest! {
    #[test]
    fn prop_normalisers_preserve_work(amounts in prop::collection::vec(prop::sample::select(vec![0.0, 4.0, 8.0]), 1..12)) {
        let set = standard();
        let items = daily_segments(&amounts);
        let expected = total_hours(&items);
        for normaliser in [Normaliser::MergeSameWork, Normaliser::NewWork] {
            let result = run_work(normaliser, first(&set), items.clone());
            prop_assert!(approx_eq(total_hours(&result), expected));
        }
    }

    #[test]
    fn prop_normalisers_are_idempotent(amounts in prop::collection::vec(prop::sample::select(vec![0.0, 4.0, 8.0]), 1..12)) {
        let set = standard();
        for normaliser in [Normaliser::MergeSameWork, Normaliser::NewWork] {
            let once = run_work(normaliser, first(&set), daily_segments(&amounts));
            let twice = run_work(normaliser, first(&set), once.clone());
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn prop_new_cost_is_idempotent(amounts in prop::collection::vec(prop::sample::select(vec![0.0, 400.0, 800.0]), 1..12)) {
        let set = standard();
        let once = run_cost(Normaliser::NewCost, first(&set), daily_costs(&amounts));
        let twice = run_cost(Normaliser::NewCost, first(&set), once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_cost_normalisers_preserve_cost(amounts in prop::collection::vec(prop::sample::select(vec![0.0, 400.0, 800.0]), 1..12)) {
        let set = standard();
        let expected: f64 = amounts.iter().sum();
        for normaliser in [Normaliser::MergeSameWork, Normaliser::NewCost] {
            let result = run_cost(normaliser, first(&set), daily_costs(&amounts));
            let total: f64 = result.iter().map(|item| item.total_amount).sum();
            prop_assert!(approx_eq(total, expected));
        }
    }

    #[test]
    fn prop_new_work_segments_stay_ordered(amounts in prop::collection::vec(prop::sample::select(vec![0.0, 4.0, 8.0]), 1..12)) {
        let set = standard();
        let result = run_work(Normaliser::NewWork, first(&set), daily_segments(&amounts));
        for pair in result.windows(2) {
            prop_assert!(pair[0].finish <= pair[1].start);
        }
        for item in &result {
            prop_assert!(item.start < item.finish);
        }
    }
}
