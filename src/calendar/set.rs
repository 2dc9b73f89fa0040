use super::helper;
use super::working_time::WorkingTime;
use super::{Calendar, CalendarException, DayType, WorkingWeek};
use crate::duration::TimeUnitDefaults;
use crate::error::{CalendarError, CalendarResult};
use crate::time_range::TimeRange;
use chrono::{Datelike, NaiveDate, Weekday};
use log::debug;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::iter;

/// Longest parent chain any lookup will follow.
pub const MAX_HIERARCHY_DEPTH: usize = 32;

/// Index of a calendar inside its [`CalendarSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarId(usize);

impl CalendarId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns every calendar of a schedule. Derived calendars point at their
/// parent by [`CalendarId`].
#[derive(Debug, Clone, Default)]
pub struct CalendarSet {
    calendars: Vec<Calendar>,
}

impl CalendarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, calendar: Calendar) -> CalendarId {
        let id = CalendarId(self.calendars.len());
        self.calendars.push(calendar);
        id
    }

    /// Adds `calendar` as a child of `parent`.
    pub fn add_derived(&mut self, calendar: Calendar, parent: CalendarId) -> CalendarResult<CalendarId> {
        self.ensure_exists(parent)?;
        let id = self.add(calendar);
        self.set_parent(id, Some(parent))?;
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    pub fn get(&self, id: CalendarId) -> Option<&Calendar> {
        self.calendars.get(id.0)
    }

    pub fn get_mut(&mut self, id: CalendarId) -> Option<&mut Calendar> {
        self.calendars.get_mut(id.0)
    }

    pub fn calendar(&self, id: CalendarId) -> Option<CalendarRef<'_>> {
        self.get(id).map(|calendar| CalendarRef {
            set: Some(self),
            id: Some(id),
            calendar,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (CalendarId, &Calendar)> {
        self.calendars
            .iter()
            .enumerate()
            .map(|(index, calendar)| (CalendarId(index), calendar))
    }

    pub fn find_by_unique_id(&self, unique_id: i32) -> Option<CalendarId> {
        self.iter()
            .find(|(_, calendar)| calendar.unique_id() == Some(unique_id))
            .map(|(id, _)| id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<CalendarId> {
        self.iter()
            .find(|(_, calendar)| calendar.name() == Some(name))
            .map(|(id, _)| id)
    }

    /// One more than the largest unique ID in use.
    pub fn next_unique_id(&self) -> i32 {
        self.calendars
            .iter()
            .filter_map(Calendar::unique_id)
            .max()
            .map_or(1, |max| max + 1)
    }

    fn ensure_exists(&self, id: CalendarId) -> CalendarResult<()> {
        if id.0 < self.calendars.len() {
            Ok(())
        } else {
            Err(CalendarError::UnknownCalendar(id))
        }
    }

    /// Makes `child` derive from `parent`, or a base calendar for `None`.
    /// Links that would form a cycle or an over-deep chain are rejected.
    pub fn set_parent(&mut self, child: CalendarId, parent: Option<CalendarId>) -> CalendarResult<()> {
        self.ensure_exists(child)?;
        if let Some(parent) = parent {
            self.ensure_exists(parent)?;
            if parent == child {
                return Err(CalendarError::SelfParent(child));
            }
            let mut depth = 1;
            let mut current = Some(parent);
            while let Some(id) = current {
                if id == child {
                    return Err(CalendarError::CyclicDerivation(child));
                }
                depth += 1;
                if depth > MAX_HIERARCHY_DEPTH {
                    return Err(CalendarError::HierarchyTooDeep { id: child, depth });
                }
                current = self.calendars[id.0].parent();
            }
            debug!("calendar {child} now derives from {parent}");
        }
        self.calendars[child.0].set_parent_link(parent);
        Ok(())
    }

    /// Calendars whose parent is `id`.
    pub fn derived_calendars(&self, id: CalendarId) -> Vec<CalendarId> {
        self.iter()
            .filter(|(_, calendar)| calendar.parent() == Some(id))
            .map(|(child, _)| child)
            .collect()
    }

    /// Checks that every parent link resolves and that the derivation
    /// graph is acyclic and within the depth limit.
    pub fn validate_hierarchy(&self) -> CalendarResult<()> {
        let mut graph: DiGraph<CalendarId, ()> = DiGraph::with_capacity(self.len(), self.len());
        let nodes: Vec<NodeIndex> = self.iter().map(|(id, _)| graph.add_node(id)).collect();

        for (id, calendar) in self.iter() {
            if let Some(parent) = calendar.parent() {
                self.ensure_exists(parent)?;
                graph.add_edge(nodes[parent.0], nodes[id.0], ());
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| CalendarError::CyclicDerivation(graph[cycle.node_id()]))?;

        let mut depths = vec![1usize; self.len()];
        for node in order {
            let id = graph[node];
            if let Some(parent) = self.calendars[id.0].parent() {
                depths[id.0] = depths[parent.0] + 1;
            }
            if depths[id.0] > MAX_HIERARCHY_DEPTH {
                return Err(CalendarError::HierarchyTooDeep {
                    id,
                    depth: depths[id.0],
                });
            }
        }
        Ok(())
    }

    /// Copies `source`'s exceptions, and those of its ancestors, into
    /// `target` without disturbing dates `target` already overrides.
    pub fn merge_exceptions(&mut self, target: CalendarId, source: CalendarId) -> CalendarResult<()> {
        self.ensure_exists(target)?;
        let source = self
            .calendar(source)
            .ok_or(CalendarError::UnknownCalendar(source))?;
        let lists: Vec<Vec<CalendarException>> = source
            .chain()
            .map(|calendar| calendar.calendar().exceptions().to_vec())
            .collect();
        let target = &mut self.calendars[target.0];
        for list in &lists {
            helper::merge_exception_list(target, list);
        }
        Ok(())
    }
}

/// A calendar viewed together with the set that resolves its parents.
#[derive(Debug, Clone, Copy)]
pub struct CalendarRef<'a> {
    set: Option<&'a CalendarSet>,
    id: Option<CalendarId>,
    calendar: &'a Calendar,
}

impl<'a> CalendarRef<'a> {
    /// Views a calendar outside any set; parent links are ignored.
    pub fn detached(calendar: &'a Calendar) -> Self {
        Self {
            set: None,
            id: None,
            calendar,
        }
    }

    pub fn id(&self) -> Option<CalendarId> {
        self.id
    }

    pub fn calendar(&self) -> &'a Calendar {
        self.calendar
    }

    pub fn parent(&self) -> Option<CalendarRef<'a>> {
        let set = self.set?;
        set.calendar(self.calendar.parent()?)
    }

    /// This calendar followed by its ancestors, nearest first.
    pub fn chain(self) -> impl Iterator<Item = CalendarRef<'a>> {
        iter::successors(Some(self), CalendarRef::parent).take(MAX_HIERARCHY_DEPTH)
    }

    /// The nearest exception covering `date`, searching up the hierarchy.
    pub fn exception(&self, date: NaiveDate) -> Option<&'a CalendarException> {
        self.chain().find_map(|calendar| calendar.calendar.exception(date))
    }

    /// The nearest working week covering `date`, searching up the hierarchy.
    pub fn working_week(&self, date: NaiveDate) -> Option<&'a WorkingWeek> {
        self.chain()
            .find_map(|calendar| calendar.calendar.working_week(date))
    }

    /// Resolved day type; a root calendar treats Saturday and Sunday as
    /// non-working when nothing more specific is set.
    pub fn resolved_day_type(&self, day: Weekday) -> DayType {
        for calendar in self.chain() {
            match calendar.calendar.day_type(day) {
                DayType::Default => continue,
                resolved => return resolved,
            }
        }
        match day {
            Weekday::Sat | Weekday::Sun => DayType::NonWorking,
            _ => DayType::Working,
        }
    }

    pub fn hours_for_day(&self, day: Weekday) -> &'a [TimeRange] {
        for calendar in self.chain() {
            let days = calendar.calendar.days();
            match days.day_type(day) {
                DayType::NonWorking => return &[],
                DayType::Working => return days.hours(day).unwrap_or(&[]),
                DayType::Default => continue,
            }
        }
        &[]
    }

    /// Working hours on `date`: an exception wins, then a working week,
    /// then the weekly pattern.
    pub fn hours_for_date(&self, date: NaiveDate) -> &'a [TimeRange] {
        if let Some(exception) = self.exception(date) {
            return exception.hours();
        }
        let day = date.weekday();
        let days = match self.working_week(date) {
            Some(week) => week.days(),
            None => self.calendar.days(),
        };
        match days.day_type(day) {
            DayType::NonWorking => &[],
            DayType::Working => days.hours(day).unwrap_or(&[]),
            DayType::Default => self
                .parent()
                .map(|parent| parent.hours_for_day(day))
                .unwrap_or(&[]),
        }
    }

    pub fn resolved_time_unit_defaults(&self) -> TimeUnitDefaults {
        self.chain()
            .find_map(|calendar| calendar.calendar.time_unit_defaults())
            .unwrap_or_default()
    }

    /// A standalone copy with the hierarchy folded in, or this calendar
    /// itself when it is not derived.
    pub fn flattened(&self) -> Cow<'a, Calendar> {
        helper::flattened_calendar(*self)
    }
}

impl WorkingTime for CalendarRef<'_> {
    fn ranges(&self, date: NaiveDate) -> Vec<TimeRange> {
        self.hours_for_date(date).to_vec()
    }

    fn ranges_for_day(&self, day: Weekday) -> Vec<TimeRange> {
        self.hours_for_day(day).to_vec()
    }

    fn time_unit_defaults(&self) -> TimeUnitDefaults {
        self.resolved_time_unit_defaults()
    }
}
