use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use schedule_calendar::calendar::CalendarRef;
use schedule_calendar::timephased::{segment_cost, segment_work};
use schedule_calendar::{
    Calendar, DateTimeRange, Duration, TimeUnit, TimephasedError, TimephasedItem, TimephasedWork,
    approx_eq,
};

fn dt(y: i32, m: u32, day: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, day)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn days(first: NaiveDateTime, count: i64) -> Vec<DateTimeRange> {
    (0..count)
        .map(|offset| {
            let start = first + TimeDelta::days(offset);
            DateTimeRange::new(start, start + TimeDelta::days(1))
        })
        .collect()
}

fn hours(value: Option<Duration>) -> Option<f64> {
    value.map(|duration| duration.duration)
}

#[test]
fn work_is_spread_over_working_hours() {
    let calendar = Calendar::standard();
    let view = CalendarRef::detached(&calendar);
    let items: Vec<TimephasedWork> = vec![TimephasedItem::new(
        dt(2024, 1, 1, 8),
        dt(2024, 1, 2, 17),
        Duration::hours(16.0),
        Duration::hours(8.0),
    )];

    let buckets = segment_work(&view, &days(dt(2024, 1, 1, 0), 3), &items, TimeUnit::Hours).unwrap();

    assert_eq!(buckets.len(), 3);
    assert!(approx_eq(hours(buckets[0]).unwrap(), 8.0));
    assert!(approx_eq(hours(buckets[1]).unwrap(), 8.0));
    assert_eq!(buckets[2], None);
}

#[test]
fn buckets_convert_to_requested_units() {
    let calendar = Calendar::standard();
    let view = CalendarRef::detached(&calendar);
    let items = vec![TimephasedItem::new(
        dt(2024, 1, 1, 8),
        dt(2024, 1, 1, 12),
        Duration::hours(4.0),
        Duration::hours(4.0),
    )];

    let buckets = segment_work(&view, &days(dt(2024, 1, 1, 0), 1), &items, TimeUnit::Minutes).unwrap();
    let bucket = buckets[0].unwrap();
    assert_eq!(bucket.units, TimeUnit::Minutes);
    assert!(approx_eq(bucket.duration, 240.0));
}

#[test]
fn work_on_non_working_time_is_spread_evenly() {
    let calendar = Calendar::standard();
    let view = CalendarRef::detached(&calendar);
    // Saturday
    let items = vec![TimephasedItem::new(
        dt(2024, 1, 6, 0),
        dt(2024, 1, 7, 0),
        Duration::hours(12.0),
        Duration::hours(12.0),
    )];
    let ranges = [
        DateTimeRange::new(dt(2024, 1, 6, 6), dt(2024, 1, 6, 12)),
        DateTimeRange::new(dt(2024, 1, 6, 12), dt(2024, 1, 6, 18)),
    ];

    let buckets = segment_work(&view, &ranges, &items, TimeUnit::Hours).unwrap();
    assert!(approx_eq(hours(buckets[0]).unwrap(), 3.0));
    assert!(approx_eq(hours(buckets[1]).unwrap(), 3.0));
}

#[test]
fn cost_is_spread_by_working_hours() {
    let calendar = Calendar::standard();
    let view = CalendarRef::detached(&calendar);
    let items = vec![TimephasedItem::new(dt(2024, 1, 1, 8), dt(2024, 1, 2, 17), 800.0, 400.0)];

    let buckets = segment_cost(&view, &days(dt(2024, 1, 1, 0), 2), &items).unwrap();
    assert!(approx_eq(buckets[0].unwrap(), 400.0));
    assert!(approx_eq(buckets[1].unwrap(), 400.0));
}

#[test]
fn reversed_range_is_rejected() {
    let calendar = Calendar::standard();
    let view = CalendarRef::detached(&calendar);
    let ranges = [DateTimeRange::new(dt(2024, 1, 2, 0), dt(2024, 1, 1, 0))];
    let result = segment_cost(&view, &ranges, &[]);
    assert!(matches!(result, Err(TimephasedError::InvalidRange { .. })));
}

#[test]
fn overlapping_ranges_are_rejected() {
    let calendar = Calendar::standard();
    let view = CalendarRef::detached(&calendar);
    let ranges = [
        DateTimeRange::new(dt(2024, 1, 1, 0), dt(2024, 1, 2, 12)),
        DateTimeRange::new(dt(2024, 1, 2, 0), dt(2024, 1, 3, 0)),
    ];
    let result = segment_cost(&view, &ranges, &[]);
    assert_eq!(result, Err(TimephasedError::RangesOutOfOrder(dt(2024, 1, 2, 0))));
}

#[test]
fn bad_items_are_rejected() {
    let calendar = Calendar::standard();
    let view = CalendarRef::detached(&calendar);
    let ranges = days(dt(2024, 1, 1, 0), 2);

    let empty = [TimephasedItem::new(dt(2024, 1, 1, 8), dt(2024, 1, 1, 8), 10.0, 10.0)];
    assert!(matches!(
        segment_cost(&view, &ranges, &empty),
        Err(TimephasedError::InvalidItem { .. })
    ));

    let overlapping = [
        TimephasedItem::new(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), 10.0, 10.0),
        TimephasedItem::new(dt(2024, 1, 1, 12), dt(2024, 1, 2, 17), 10.0, 10.0),
    ];
    assert!(matches!(
        segment_cost(&view, &ranges, &overlapping),
        Err(TimephasedError::ItemsOutOfOrder(_))
    ));
}

#[test]
fn mixed_work_units_are_rejected() {
    let calendar = Calendar::standard();
    let view = CalendarRef::detached(&calendar);
    let items = vec![
        TimephasedItem::new(dt(2024, 1, 1, 8), dt(2024, 1, 1, 17), Duration::hours(8.0), Duration::hours(8.0)),
        TimephasedItem::new(dt(2024, 1, 2, 8), dt(2024, 1, 2, 17), Duration::minutes(480.0), Duration::minutes(480.0)),
    ];
    let result = segment_work(&view, &days(dt(2024, 1, 1, 0), 2), &items, TimeUnit::Hours);
    assert_eq!(result, Err(TimephasedError::MixedUnits));
}
