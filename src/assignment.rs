use crate::calendar::{CalendarId, WorkingTime};
use crate::duration::Duration;
use crate::timephased::{TimePeriodEntity, TimephasedContainer, TimephasedCost, TimephasedWork};
use chrono::NaiveDateTime;

/// Work a resource does on a task, with its timephased breakdown.
#[derive(Debug, Clone, Default)]
pub struct ResourceAssignment {
    pub id: i32,
    pub task_id: i32,
    pub resource_id: Option<i32>,
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
    /// Overrides the resource calendar for this assignment only.
    pub calendar: Option<CalendarId>,
    pub complete_work: TimephasedContainer<Duration>,
    pub planned_work: TimephasedContainer<Duration>,
    pub baseline_work: TimephasedContainer<Duration>,
    pub planned_cost: TimephasedContainer<f64>,
}

/// Start and finish of an assignment, detached from its containers so the
/// containers can be normalised against it.
#[derive(Debug, Clone, Copy)]
struct Period {
    start: Option<NaiveDateTime>,
    finish: Option<NaiveDateTime>,
}

impl TimePeriodEntity for Period {
    fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    fn finish(&self) -> Option<NaiveDateTime> {
        self.finish
    }
}

impl ResourceAssignment {
    pub fn new(id: i32, task_id: i32) -> Self {
        Self {
            id,
            task_id,
            ..Self::default()
        }
    }

    pub fn with_resource(mut self, resource_id: i32) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    pub fn with_dates(mut self, start: NaiveDateTime, finish: NaiveDateTime) -> Self {
        self.start = Some(start);
        self.finish = Some(finish);
        self
    }

    fn period(&self) -> Period {
        Period {
            start: self.start,
            finish: self.finish,
        }
    }

    pub fn timephased_complete_work(&mut self, calendar: &dyn WorkingTime) -> &[TimephasedWork] {
        let period = self.period();
        self.complete_work.data(calendar, &period)
    }

    pub fn timephased_planned_work(&mut self, calendar: &dyn WorkingTime) -> &[TimephasedWork] {
        let period = self.period();
        self.planned_work.data(calendar, &period)
    }

    pub fn timephased_baseline_work(&mut self, calendar: &dyn WorkingTime) -> &[TimephasedWork] {
        let period = self.period();
        self.baseline_work.data(calendar, &period)
    }

    pub fn timephased_planned_cost(&mut self, calendar: &dyn WorkingTime) -> &[TimephasedCost] {
        let period = self.period();
        self.planned_cost.data(calendar, &period)
    }

    /// Normalises every container that is still raw.
    pub fn normalise(&mut self, calendar: &dyn WorkingTime) {
        let period = self.period();
        self.complete_work.normalise(calendar, &period);
        self.planned_work.normalise(calendar, &period);
        self.baseline_work.normalise(calendar, &period);
        self.planned_cost.normalise(calendar, &period);
    }

    pub fn has_timephased_data(&self) -> bool {
        self.complete_work.has_data() || self.planned_work.has_data()
    }
}

impl TimePeriodEntity for ResourceAssignment {
    fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    fn finish(&self) -> Option<NaiveDateTime> {
        self.finish
    }
}
