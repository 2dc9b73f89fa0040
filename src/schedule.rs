use crate::assignment::ResourceAssignment;
use crate::calculations::splits::{SplitDerivation, SplitOutcome};
use crate::calendar::{
    Calendar, CalendarId, CalendarRef, CalendarSet, CombinedCalendar, WorkingTime, helper,
};
use crate::config::EngineConfig;
use crate::duration::TimeUnitDefaults;
use crate::error::CalendarResult;
use crate::resource::Resource;
use crate::task::Task;
use crate::time_range::TimeRange;
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use log::{debug, warn};
use rayon::prelude::*;

/// The calendar an assignment is worked against.
#[derive(Debug, Clone, Copy)]
pub enum EffectiveCalendar<'a> {
    Single(CalendarRef<'a>),
    Combined(CombinedCalendar<CalendarRef<'a>, CalendarRef<'a>>),
}

impl WorkingTime for EffectiveCalendar<'_> {
    fn ranges(&self, date: NaiveDate) -> Vec<TimeRange> {
        match self {
            EffectiveCalendar::Single(calendar) => calendar.ranges(date),
            EffectiveCalendar::Combined(calendar) => calendar.ranges(date),
        }
    }

    fn ranges_for_day(&self, day: Weekday) -> Vec<TimeRange> {
        match self {
            EffectiveCalendar::Single(calendar) => calendar.ranges_for_day(day),
            EffectiveCalendar::Combined(calendar) => calendar.ranges_for_day(day),
        }
    }

    fn time_unit_defaults(&self) -> TimeUnitDefaults {
        match self {
            EffectiveCalendar::Single(calendar) => calendar.time_unit_defaults(),
            EffectiveCalendar::Combined(calendar) => calendar.time_unit_defaults(),
        }
    }
}

/// Calendar the assignment is worked against: the task and resource
/// calendars intersected, unless the task ignores resource calendars or
/// only one of them is known.
fn effective_calendar<'a>(
    calendars: &'a CalendarSet,
    default_calendar: Option<CalendarId>,
    tasks: &[Task],
    resources: &[Resource],
    assignment: &ResourceAssignment,
) -> Option<EffectiveCalendar<'a>> {
    let task = tasks.iter().find(|task| task.id == assignment.task_id);
    let resource = assignment
        .resource_id
        .and_then(|id| resources.iter().find(|resource| resource.id == id));

    let task_calendar = task.and_then(|task| task.calendar);
    let ignore_resource = task.is_some_and(|task| task.ignore_resource_calendar);
    let resource_calendar = match resource {
        _ if ignore_resource => None,
        Some(resource) => assignment
            .calendar
            .or(resource.calendar)
            .or(default_calendar),
        None => assignment.calendar,
    };

    let lookup = |id: CalendarId| calendars.calendar(id);
    match (task_calendar, resource_calendar) {
        (Some(task_id), Some(resource_id)) if task_id != resource_id => {
            let combined = CombinedCalendar::new(lookup(task_id)?, lookup(resource_id)?);
            Some(EffectiveCalendar::Combined(combined))
        }
        (Some(task_id), _) => lookup(task_id).map(EffectiveCalendar::Single),
        (None, Some(resource_id)) => lookup(resource_id).map(EffectiveCalendar::Single),
        (None, None) => default_calendar
            .and_then(lookup)
            .map(EffectiveCalendar::Single),
    }
}

pub struct Schedule {
    config: EngineConfig,
    calendars: CalendarSet,
    default_calendar: Option<CalendarId>,
    tasks: Vec<Task>,
    resources: Vec<Resource>,
    assignments: Vec<ResourceAssignment>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedule {
    /// An empty schedule whose default calendar is [`Calendar::standard`].
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let mut calendars = CalendarSet::new();
        let mut standard = Calendar::standard();
        standard.set_unique_id(1);
        standard.set_time_unit_defaults(config.defaults);
        let default_calendar = calendars.add(standard);
        Self {
            config,
            calendars,
            default_calendar: Some(default_calendar),
            tasks: Vec::new(),
            resources: Vec::new(),
            assignments: Vec::new(),
        }
    }

    pub fn with_calendars(config: EngineConfig, calendars: CalendarSet, default_calendar: Option<CalendarId>) -> Self {
        Self {
            config,
            calendars,
            default_calendar,
            tasks: Vec::new(),
            resources: Vec::new(),
            assignments: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calendars(&self) -> &CalendarSet {
        &self.calendars
    }

    pub fn calendars_mut(&mut self) -> &mut CalendarSet {
        &mut self.calendars
    }

    pub fn default_calendar(&self) -> Option<CalendarId> {
        self.default_calendar
    }

    pub fn set_default_calendar(&mut self, calendar: Option<CalendarId>) {
        self.default_calendar = calendar;
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn task(&self, id: i32) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: i32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn resource(&self, id: i32) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.id == id)
    }

    /// Gives `resource_id` a calendar of its own derived from `base`.
    pub fn create_resource_calendar(&mut self, resource_id: i32, base: CalendarId) -> CalendarResult<Option<CalendarId>> {
        let Some(index) = self.resources.iter().position(|r| r.id == resource_id) else {
            warn!("no resource {resource_id} to create a calendar for");
            return Ok(None);
        };
        let name = self.resources[index].name.clone();
        let id = helper::create_derived_calendar(&mut self.calendars, base, &name)?;
        self.resources[index].calendar = Some(id);
        Ok(Some(id))
    }

    pub fn add_assignment(&mut self, assignment: ResourceAssignment) {
        self.assignments.push(assignment);
    }

    pub fn assignments(&self) -> &[ResourceAssignment] {
        &self.assignments
    }

    pub fn assignments_mut(&mut self) -> &mut [ResourceAssignment] {
        &mut self.assignments
    }

    pub fn effective_calendar(&self, assignment: &ResourceAssignment) -> Option<EffectiveCalendar<'_>> {
        effective_calendar(
            &self.calendars,
            self.default_calendar,
            &self.tasks,
            &self.resources,
            assignment,
        )
    }

    /// Normalises every raw container of every assignment, in parallel.
    pub fn normalise_all(&mut self) {
        let Schedule {
            calendars,
            default_calendar,
            tasks,
            resources,
            assignments,
            ..
        } = self;
        let calendars = &*calendars;
        let default_calendar = *default_calendar;
        let (tasks, resources) = (&*tasks, &*resources);

        assignments.par_iter_mut().for_each(|assignment| {
            match effective_calendar(calendars, default_calendar, tasks, resources, assignment) {
                Some(calendar) => assignment.normalise(&calendar),
                None => warn!("assignment {} has no calendar; left raw", assignment.id),
            }
        });
        debug!("normalised {} assignments", self.assignments.len());
    }

    /// Re-derives the splits of `task_id` from its first assignment with
    /// timephased work. Returns whether the task ended up split.
    pub fn derive_splits(&mut self, task_id: i32) -> bool {
        let Schedule {
            config,
            calendars,
            default_calendar,
            tasks,
            resources,
            assignments,
        } = self;

        let Some(assignment) = assignments
            .iter_mut()
            .find(|a| a.task_id == task_id && a.has_timephased_data())
        else {
            debug!("task {task_id} has no timephased work to split");
            return false;
        };
        let Some(calendar) =
            effective_calendar(calendars, *default_calendar, tasks, resources, assignment)
        else {
            warn!("assignment {} has no calendar; splits not derived", assignment.id);
            return false;
        };

        let complete = assignment.timephased_complete_work(&calendar).to_vec();
        let planned = assignment.timephased_planned_work(&calendar).to_vec();
        let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) else {
            return false;
        };

        let outcome: SplitOutcome = SplitDerivation::new(&calendar)
            .with_minimum_ranges(config.split_minimum_ranges)
            .execute(&complete, &planned, task.actual_finish);
        task.apply_split_outcome(outcome);
        task.is_split()
    }

    /// Complete-through date of a task, moved to the next working start
    /// when the engine is configured that way.
    pub fn complete_through(&self, task_id: i32) -> Option<NaiveDateTime> {
        let task = self.task(task_id)?;
        let complete_through = task.complete_through()?;
        if !self.config.complete_through_is_next_work_start {
            return Some(complete_through);
        }
        let calendar = task
            .calendar
            .or(self.default_calendar)
            .and_then(|id| self.calendars.calendar(id));
        Some(match calendar {
            Some(calendar) => calendar.next_work_start(complete_through),
            None => complete_through,
        })
    }
}
