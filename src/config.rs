use crate::calendar::{Calendar, CalendarDays, CalendarException, CalendarSet, WorkingWeek};
use crate::duration::TimeUnitDefaults;
use crate::error::{ConfigError, ConfigResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub defaults: TimeUnitDefaults,
    /// Report "complete through" as the next working start after the last
    /// completed segment rather than that segment's finish.
    pub complete_through_is_next_work_start: bool,
    /// Fewest derived ranges for which a task counts as split.
    pub split_minimum_ranges: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            defaults: TimeUnitDefaults::default(),
            complete_through_is_next_work_start: false,
            split_minimum_ranges: 3,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.defaults.validate().map_err(ConfigError::InvalidDefaults)?;
        if self.split_minimum_ranges < 2 {
            return Err(ConfigError::InvalidDefaults(format!(
                "split_minimum_ranges must be at least 2 (got {})",
                self.split_minimum_ranges
            )));
        }
        Ok(())
    }

    pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let file = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Serialisable snapshot of one calendar. Parents are referenced by
/// unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub unique_id: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_unique_id: Option<i32>,
    #[serde(default)]
    pub days: CalendarDays,
    #[serde(default)]
    pub working_weeks: Vec<WorkingWeek>,
    #[serde(default)]
    pub exceptions: Vec<CalendarException>,
    #[serde(default)]
    pub time_unit_defaults: Option<TimeUnitDefaults>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalendarSetConfig {
    pub calendars: Vec<CalendarConfig>,
}

impl CalendarConfig {
    fn into_calendar(self) -> ConfigResult<Calendar> {
        let mut calendar = Calendar::default();
        if let Some(unique_id) = self.unique_id {
            calendar.set_unique_id(unique_id);
        }
        if let Some(name) = self.name {
            calendar.set_name(name);
        }
        if let Some(defaults) = self.time_unit_defaults {
            defaults.validate().map_err(ConfigError::InvalidDefaults)?;
            calendar.set_time_unit_defaults(defaults);
        }
        *calendar.days_mut() = self.days;
        for week in self.working_weeks {
            calendar.add_working_week(week);
        }
        for exception in self.exceptions {
            calendar.add_exception(exception);
        }
        Ok(calendar)
    }
}

impl CalendarSet {
    /// Rebuilds a set from its snapshot. A parent unique ID that matches no
    /// calendar is logged and the calendar is left as a base calendar.
    pub fn from_config(config: &CalendarSetConfig) -> ConfigResult<Self> {
        let mut set = CalendarSet::new();
        let mut links = Vec::with_capacity(config.calendars.len());
        for entry in &config.calendars {
            let id = set.add(entry.clone().into_calendar()?);
            links.push((id, entry.parent_unique_id));
        }

        for (id, parent_unique_id) in links {
            let Some(parent_unique_id) = parent_unique_id else {
                continue;
            };
            match set.find_by_unique_id(parent_unique_id) {
                Some(parent) => set.set_parent(id, Some(parent))?,
                None => warn!("calendar {id} refers to unknown parent {parent_unique_id}"),
            }
        }
        Ok(set)
    }

    /// Calendars without a unique ID are given one so that parent links
    /// survive the round trip.
    pub fn to_config(&self) -> CalendarSetConfig {
        let mut next_unique_id = self.next_unique_id();
        let unique_ids: Vec<i32> = self
            .iter()
            .map(|(_, calendar)| {
                calendar.unique_id().unwrap_or_else(|| {
                    let assigned = next_unique_id;
                    next_unique_id += 1;
                    assigned
                })
            })
            .collect();

        let calendars = self
            .iter()
            .map(|(id, calendar)| CalendarConfig {
                unique_id: Some(unique_ids[id.index()]),
                name: calendar.name().map(str::to_string),
                parent_unique_id: calendar.parent().map(|parent| unique_ids[parent.index()]),
                days: calendar.days().clone(),
                working_weeks: calendar.working_weeks().to_vec(),
                exceptions: calendar.exceptions().to_vec(),
                time_unit_defaults: calendar.time_unit_defaults(),
            })
            .collect();
        CalendarSetConfig { calendars }
    }
}

pub fn save_calendars_to_json<P: AsRef<Path>>(set: &CalendarSet, path: P) -> ConfigResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &set.to_config())?;
    Ok(())
}

pub fn load_calendars_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<CalendarSet> {
    let file = File::open(path)?;
    let config: CalendarSetConfig = serde_json::from_reader(file)?;
    CalendarSet::from_config(&config)
}
