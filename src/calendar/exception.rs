use super::recurrence::RecurringData;
use crate::time_range::TimeRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Overrides a calendar's normal working time for a date range, or for
/// the dates produced by a recurrence rule. No hours means non-working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarException {
    from: NaiveDate,
    to: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recurring: Option<RecurringData>,
    #[serde(default)]
    hours: Vec<TimeRange>,
}

impl CalendarException {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        let (from, to) = if to < from { (to, from) } else { (from, to) };
        Self {
            from,
            to,
            name: None,
            recurring: None,
            hours: Vec::new(),
        }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Spans the first to the last date the rule produces.
    pub fn recurring(data: RecurringData) -> Self {
        let dates = data.dates();
        let from = dates.first().copied().unwrap_or(data.start_date);
        let to = dates.last().copied().unwrap_or(from);
        Self {
            recurring: Some(data),
            ..Self::new(from, to)
        }
    }

    pub fn with_hours(mut self, hours: Vec<TimeRange>) -> Self {
        self.hours = hours;
        self.hours.sort_by_key(TimeRange::start);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn add_hours(&mut self, range: TimeRange) {
        self.hours.push(range);
        self.hours.sort_by_key(TimeRange::start);
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn recurring_data(&self) -> Option<&RecurringData> {
        self.recurring.as_ref()
    }

    pub fn hours(&self) -> &[TimeRange] {
        &self.hours
    }

    pub fn is_working(&self) -> bool {
        !self.hours.is_empty()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// True when `other`'s date span lies entirely inside this one.
    pub fn contains(&self, other: &CalendarException) -> bool {
        self.from <= other.from && self.to >= other.to
    }

    pub(crate) fn compare_to_date(&self, date: NaiveDate) -> Ordering {
        if date < self.from {
            Ordering::Greater
        } else if date > self.to {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }

    /// One non-recurring exception per date the rule produces, or a copy
    /// of this exception when it does not recur.
    pub fn expanded(&self) -> Vec<CalendarException> {
        match &self.recurring {
            None => vec![self.clone()],
            Some(data) => data
                .dates()
                .into_iter()
                .map(|date| CalendarException {
                    from: date,
                    to: date,
                    name: self.name.clone(),
                    recurring: None,
                    hours: self.hours.clone(),
                })
                .collect(),
        }
    }
}
