use crate::calendar::WorkingTime;
use crate::duration::{TimeUnit, approx_eq};
use crate::time_range::DateTimeRange;
use crate::timephased::TimephasedWork;
use chrono::NaiveDateTime;
use log::debug;

pub const DEFAULT_SPLIT_MINIMUM_RANGES: usize = 3;

/// What split derivation decided for a task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplitOutcome {
    /// Working and non-working stretches, when the task is split.
    pub splits: Option<Vec<DateTimeRange>>,
    /// Finish of the last completed segment; absent once the task has
    /// actually finished.
    pub complete_through: Option<NaiveDateTime>,
}

/// Derives a task's splits from an assignment's complete and planned work.
pub struct SplitDerivation<'a> {
    calendar: &'a dyn WorkingTime,
    minimum_ranges: usize,
}

impl<'a> SplitDerivation<'a> {
    pub fn new(calendar: &'a dyn WorkingTime) -> Self {
        Self {
            calendar,
            minimum_ranges: DEFAULT_SPLIT_MINIMUM_RANGES,
        }
    }

    pub fn with_minimum_ranges(mut self, minimum_ranges: usize) -> Self {
        self.minimum_ranges = minimum_ranges;
        self
    }

    pub fn execute(
        &self,
        complete: &[TimephasedWork],
        planned: &[TimephasedWork],
        actual_finish: Option<NaiveDateTime>,
    ) -> SplitOutcome {
        let ranges = self.ranges(complete, planned);
        if ranges.len() < self.minimum_ranges {
            debug!("{} ranges; task is not split", ranges.len());
            return SplitOutcome::default();
        }

        let complete_through = match actual_finish {
            Some(_) => None,
            None => complete.last().map(|item| item.finish),
        };
        debug!("task split into {} ranges", ranges.len());
        SplitOutcome {
            splits: Some(ranges),
            complete_through,
        }
    }

    /// Consecutive segments that both carry work collapse into one range;
    /// a segment without work stays on its own as a gap.
    pub fn ranges(&self, complete: &[TimephasedWork], planned: &[TimephasedWork]) -> Vec<DateTimeRange> {
        let mut ranges = Vec::with_capacity(complete.len() + planned.len() + 1);
        append_segments(&mut ranges, complete, None);

        let mut carried_start = None;
        if let (Some(last), Some(first)) = (complete.last(), planned.first()) {
            if has_work(last) && has_work(first) {
                let between = self
                    .calendar
                    .work(last.finish, first.start, TimeUnit::Minutes);
                if approx_eq(between.duration, 0.0) {
                    carried_start = ranges.pop().map(|range: DateTimeRange| range.start);
                } else {
                    ranges.push(DateTimeRange::new(
                        self.calendar.next_work_start(last.finish),
                        self.calendar.previous_work_finish(first.start),
                    ));
                }
            }
        }

        append_segments(&mut ranges, planned, carried_start);
        ranges
    }
}

fn has_work(item: &TimephasedWork) -> bool {
    !item.total_amount.is_zero()
}

fn append_segments(
    ranges: &mut Vec<DateTimeRange>,
    items: &[TimephasedWork],
    mut carried_start: Option<NaiveDateTime>,
) {
    let mut previous_has_work = false;
    for item in items {
        let work = has_work(item);
        if let Some(start) = carried_start.take() {
            ranges.push(DateTimeRange::new(start, item.finish));
        } else if work && previous_has_work {
            if let Some(last) = ranges.last_mut() {
                last.end = item.finish;
            }
        } else {
            ranges.push(item.range());
        }
        previous_has_work = work;
    }
}
