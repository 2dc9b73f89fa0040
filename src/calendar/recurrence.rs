use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A rule producing the dates of a recurring calendar exception.
///
/// The series ends at `finish_date` when one is set, otherwise after
/// `occurrences` dates (at least one). Relative monthly and yearly rules
/// pick the `day_number`-th `day_of_week` of the month, where any
/// `day_number` above 4 means the last one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringData {
    pub recurrence_type: RecurrenceType,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub finish_date: Option<NaiveDate>,
    #[serde(default)]
    pub occurrences: Option<u32>,
    #[serde(default)]
    pub frequency: Option<u32>,
    #[serde(default)]
    pub relative: bool,
    #[serde(default)]
    pub weekly_days: Vec<Weekday>,
    #[serde(default)]
    pub day_of_week: Option<Weekday>,
    #[serde(default)]
    pub day_number: Option<u32>,
    #[serde(default)]
    pub month_number: Option<u32>,
}

impl RecurringData {
    fn base(recurrence_type: RecurrenceType, start_date: NaiveDate) -> Self {
        Self {
            recurrence_type,
            start_date,
            finish_date: None,
            occurrences: None,
            frequency: None,
            relative: false,
            weekly_days: Vec::new(),
            day_of_week: None,
            day_number: None,
            month_number: None,
        }
    }

    pub fn daily(start_date: NaiveDate) -> Self {
        Self::base(RecurrenceType::Daily, start_date)
    }

    pub fn weekly(start_date: NaiveDate, days: Vec<Weekday>) -> Self {
        Self {
            weekly_days: days,
            ..Self::base(RecurrenceType::Weekly, start_date)
        }
    }

    pub fn monthly_absolute(start_date: NaiveDate, day_number: u32) -> Self {
        Self {
            day_number: Some(day_number),
            ..Self::base(RecurrenceType::Monthly, start_date)
        }
    }

    pub fn monthly_relative(start_date: NaiveDate, ordinal: u32, day_of_week: Weekday) -> Self {
        Self {
            relative: true,
            day_number: Some(ordinal),
            day_of_week: Some(day_of_week),
            ..Self::base(RecurrenceType::Monthly, start_date)
        }
    }

    pub fn yearly_absolute(start_date: NaiveDate, month_number: u32, day_number: u32) -> Self {
        Self {
            month_number: Some(month_number),
            day_number: Some(day_number),
            ..Self::base(RecurrenceType::Yearly, start_date)
        }
    }

    pub fn yearly_relative(
        start_date: NaiveDate,
        month_number: u32,
        ordinal: u32,
        day_of_week: Weekday,
    ) -> Self {
        Self {
            relative: true,
            month_number: Some(month_number),
            day_number: Some(ordinal),
            day_of_week: Some(day_of_week),
            ..Self::base(RecurrenceType::Yearly, start_date)
        }
    }

    pub fn with_finish_date(mut self, finish_date: NaiveDate) -> Self {
        self.finish_date = Some(finish_date);
        self
    }

    pub fn with_occurrences(mut self, occurrences: u32) -> Self {
        self.occurrences = Some(occurrences);
        self
    }

    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = Some(frequency);
        self
    }

    fn frequency(&self) -> u32 {
        self.frequency.unwrap_or(1).max(1)
    }

    fn more_dates(&self, date: NaiveDate, dates: &[NaiveDate]) -> bool {
        match self.finish_date {
            Some(finish) => date <= finish,
            None => dates.len() < self.occurrences.unwrap_or(1).max(1) as usize,
        }
    }

    /// Every date in the series, in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        match (self.recurrence_type, self.relative) {
            (RecurrenceType::Daily, _) => self.daily_dates(&mut dates),
            (RecurrenceType::Weekly, _) => self.weekly_dates(&mut dates),
            (RecurrenceType::Monthly, false) => self.monthly_absolute_dates(&mut dates),
            (RecurrenceType::Monthly, true) => self.monthly_relative_dates(&mut dates),
            (RecurrenceType::Yearly, false) => self.yearly_absolute_dates(&mut dates),
            (RecurrenceType::Yearly, true) => self.yearly_relative_dates(&mut dates),
        }
        dates
    }

    fn daily_dates(&self, dates: &mut Vec<NaiveDate>) {
        let step = Days::new(u64::from(self.frequency()));
        let mut date = self.start_date;
        while self.more_dates(date, dates) {
            dates.push(date);
            match date.checked_add_days(step) {
                Some(next) => date = next,
                None => break,
            }
        }
    }

    fn weekly_dates(&self, dates: &mut Vec<NaiveDate>) {
        if self.weekly_days.is_empty() {
            return;
        }
        let back = u64::from(self.start_date.weekday().num_days_from_sunday());
        let Some(mut week_start) = self.start_date.checked_sub_days(Days::new(back)) else {
            return;
        };
        let step = Days::new(7 * u64::from(self.frequency()));

        'weeks: while self.more_dates(week_start, dates) {
            for offset in 0..7 {
                let Some(date) = week_start.checked_add_days(Days::new(offset)) else {
                    break 'weeks;
                };
                if !self.weekly_days.contains(&date.weekday()) {
                    continue;
                }
                if !self.more_dates(date, dates) {
                    break 'weeks;
                }
                if date >= self.start_date {
                    dates.push(date);
                }
            }
            match week_start.checked_add_days(step) {
                Some(next) => week_start = next,
                None => break,
            }
        }
    }

    fn monthly_absolute_dates(&self, dates: &mut Vec<NaiveDate>) {
        let day = self.day_number.unwrap_or(1).clamp(1, 31);
        let step = Months::new(self.frequency());
        let mut month = first_of_month(self.start_date);
        if day < self.start_date.day() {
            match month.checked_add_months(Months::new(1)) {
                Some(next) => month = next,
                None => return,
            }
        }
        while self.more_dates(month, dates) {
            let date = clamp_day(month, day);
            if !self.more_dates(date, dates) {
                break;
            }
            dates.push(date);
            match month.checked_add_months(step) {
                Some(next) => month = next,
                None => break,
            }
        }
    }

    fn monthly_relative_dates(&self, dates: &mut Vec<NaiveDate>) {
        let ordinal = self.day_number.unwrap_or(1);
        let weekday = self.day_of_week.unwrap_or(Weekday::Mon);
        let step = Months::new(self.frequency());
        let mut month = first_of_month(self.start_date);
        while self.more_dates(month, dates) {
            let date = relative_date(month, ordinal, weekday);
            if date >= self.start_date {
                if !self.more_dates(date, dates) {
                    break;
                }
                dates.push(date);
            }
            match month.checked_add_months(step) {
                Some(next) => month = next,
                None => break,
            }
        }
    }

    fn yearly_absolute_dates(&self, dates: &mut Vec<NaiveDate>) {
        let Some(mut month) = self.yearly_month(self.start_date.year()) else {
            return;
        };
        let day = self.day_number.unwrap_or(1).clamp(1, 31);
        if clamp_day(month, day) < self.start_date {
            match month.checked_add_months(Months::new(12)) {
                Some(next) => month = next,
                None => return,
            }
        }
        loop {
            let date = clamp_day(month, day);
            if !self.more_dates(date, dates) {
                break;
            }
            dates.push(date);
            match month.checked_add_months(Months::new(12)) {
                Some(next) => month = next,
                None => break,
            }
        }
    }

    fn yearly_relative_dates(&self, dates: &mut Vec<NaiveDate>) {
        let Some(mut month) = self.yearly_month(self.start_date.year()) else {
            return;
        };
        let ordinal = self.day_number.unwrap_or(1);
        let weekday = self.day_of_week.unwrap_or(Weekday::Mon);
        while self.more_dates(month, dates) {
            let date = relative_date(month, ordinal, weekday);
            if date >= self.start_date {
                if !self.more_dates(date, dates) {
                    break;
                }
                dates.push(date);
            }
            match month.checked_add_months(Months::new(12)) {
                Some(next) => month = next,
                None => break,
            }
        }
    }

    fn yearly_month(&self, year: i32) -> Option<NaiveDate> {
        let month = self.month_number.unwrap_or(1).clamp(1, 12);
        NaiveDate::from_ymd_opt(year, month, 1)
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn days_in_month(first: NaiveDate) -> u32 {
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// `day` of the month starting at `first`, clamped to the month's length.
fn clamp_day(first: NaiveDate, day: u32) -> NaiveDate {
    first.with_day(day.min(days_in_month(first))).unwrap_or(first)
}

fn relative_date(first: NaiveDate, ordinal: u32, weekday: Weekday) -> NaiveDate {
    if ordinal > 4 {
        last_weekday(first, weekday)
    } else {
        nth_weekday(first, weekday, ordinal.max(1))
    }
}

/// Find the nth occurrence of a weekday in the month starting at `first`.
fn nth_weekday(first: NaiveDate, weekday: Weekday, n: u32) -> NaiveDate {
    let offset = (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    let days = u64::from(offset + 7 * (n - 1));
    first.checked_add_days(Days::new(days)).unwrap_or(first)
}

/// Find the last occurrence of a weekday in the month starting at `first`.
fn last_weekday(first: NaiveDate, weekday: Weekday) -> NaiveDate {
    let last = clamp_day(first, 31);
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back))).unwrap_or(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekly_skips_days_before_start() {
        // 2024-07-03 is a Wednesday
        let data = RecurringData::weekly(d(2024, 7, 3), vec![Weekday::Mon, Weekday::Thu])
            .with_finish_date(d(2024, 7, 15));
        assert_eq!(data.dates(), vec![d(2024, 7, 4), d(2024, 7, 8), d(2024, 7, 11), d(2024, 7, 15)]);
    }

    #[test]
    fn occurrences_default_to_one() {
        let data = RecurringData::daily(d(2024, 1, 1));
        assert_eq!(data.dates(), vec![d(2024, 1, 1)]);
    }

    #[test]
    fn monthly_absolute_clamps_to_month_length() {
        let data = RecurringData::monthly_absolute(d(2024, 1, 31), 31).with_occurrences(3);
        assert_eq!(data.dates(), vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31)]);
    }

    #[test]
    fn monthly_absolute_starts_next_month_when_day_has_passed() {
        let data = RecurringData::monthly_absolute(d(2024, 1, 20), 5).with_occurrences(2);
        assert_eq!(data.dates(), vec![d(2024, 2, 5), d(2024, 3, 5)]);
    }

    #[test]
    fn relative_rules_pick_nth_or_last_weekday() {
        let second_tuesday =
            RecurringData::monthly_relative(d(2024, 1, 1), 2, Weekday::Tue).with_occurrences(2);
        assert_eq!(second_tuesday.dates(), vec![d(2024, 1, 9), d(2024, 2, 13)]);

        let last_monday_of_may =
            RecurringData::yearly_relative(d(2024, 1, 1), 5, 5, Weekday::Mon).with_occurrences(2);
        assert_eq!(last_monday_of_may.dates(), vec![d(2024, 5, 27), d(2025, 5, 26)]);
    }

    #[test]
    fn yearly_absolute_moves_past_start() {
        let data = RecurringData::yearly_absolute(d(2024, 8, 1), 7, 4).with_finish_date(d(2026, 12, 31));
        assert_eq!(data.dates(), vec![d(2025, 7, 4), d(2026, 7, 4)]);
    }
}
