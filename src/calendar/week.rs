use super::{CalendarDays, CalendarException, DayType, RecurringData, WEEKDAYS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Alternative weekly hours that apply to a calendar over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingWeek {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    from: NaiveDate,
    to: NaiveDate,
    days: CalendarDays,
}

impl WorkingWeek {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        let (from, to) = if to < from { (to, from) } else { (from, to) };
        Self {
            name: None,
            from,
            to,
            days: CalendarDays::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    pub fn days(&self) -> &CalendarDays {
        &self.days
    }

    pub fn days_mut(&mut self) -> &mut CalendarDays {
        &mut self.days
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Re-expresses this week as weekly recurring exceptions, one per
    /// weekday with an explicit day type, clipped to `[earliest, latest]`.
    pub fn to_recurring_exceptions(
        &self,
        earliest: NaiveDate,
        latest: NaiveDate,
    ) -> Vec<CalendarException> {
        let from = self.from.max(earliest);
        let to = self.to.min(latest);
        if from > to {
            return Vec::new();
        }

        WEEKDAYS
            .iter()
            .filter_map(|&day| {
                let hours = match self.days.day_type(day) {
                    DayType::Default => return None,
                    DayType::NonWorking => Vec::new(),
                    DayType::Working => self.days.hours(day).map(<[_]>::to_vec).unwrap_or_default(),
                };
                let data = RecurringData::weekly(from, vec![day]).with_finish_date(to);
                if data.dates().is_empty() {
                    return None;
                }
                Some(CalendarException::recurring(data).with_hours(hours))
            })
            .collect()
    }
}
