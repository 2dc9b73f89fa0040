use crate::calculations::splits::SplitOutcome;
use crate::calendar::CalendarId;
use crate::time_range::DateTimeRange;
use crate::timephased::TimePeriodEntity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
    pub actual_start: Option<NaiveDateTime>,
    pub actual_finish: Option<NaiveDateTime>,
    #[serde(default)]
    pub calendar: Option<CalendarId>,
    /// Schedule on the task calendar alone, ignoring resource calendars.
    #[serde(default)]
    pub ignore_resource_calendar: bool,
    #[serde(default)]
    splits: Option<Vec<DateTimeRange>>,
    #[serde(default)]
    complete_through: Option<NaiveDateTime>,
}

impl Task {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            start: None,
            finish: None,
            actual_start: None,
            actual_finish: None,
            calendar: None,
            ignore_resource_calendar: false,
            splits: None,
            complete_through: None,
        }
    }

    pub fn with_dates(mut self, start: NaiveDateTime, finish: NaiveDateTime) -> Self {
        self.start = Some(start);
        self.finish = Some(finish);
        self
    }

    pub fn splits(&self) -> Option<&[DateTimeRange]> {
        self.splits.as_deref()
    }

    pub fn is_split(&self) -> bool {
        self.splits.is_some()
    }

    pub fn complete_through(&self) -> Option<NaiveDateTime> {
        self.complete_through
    }

    pub fn apply_split_outcome(&mut self, outcome: SplitOutcome) {
        self.splits = outcome.splits;
        self.complete_through = outcome.complete_through;
    }

    pub fn clear_splits(&mut self) {
        self.splits = None;
        self.complete_through = None;
    }
}

impl TimePeriodEntity for Task {
    fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    fn finish(&self) -> Option<NaiveDateTime> {
        self.finish
    }
}
