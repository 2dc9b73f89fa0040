pub mod assignment;
pub mod calculations;
pub mod calendar;
pub mod config;
pub mod duration;
pub mod error;
pub mod resource;
pub mod schedule;
pub mod task;
pub mod time_range;
pub mod timephased;

pub use assignment::ResourceAssignment;
pub use calculations::{SplitDerivation, SplitOutcome};
pub use calendar::{
    Calendar, CalendarDays, CalendarException, CalendarId, CalendarRef, CalendarSet,
    CombinedCalendar, DayType, RecurrenceType, RecurringData, WorkingTime, WorkingWeek,
};
pub use config::{CalendarConfig, CalendarSetConfig, EngineConfig};
pub use duration::{Duration, TimeUnit, TimeUnitDefaults, approx_eq};
pub use error::{CalendarError, ConfigError, TimephasedError};
pub use resource::Resource;
pub use schedule::{EffectiveCalendar, Schedule};
pub use task::Task;
pub use time_range::{DateTimeRange, MIDNIGHT, TimeRange};
pub use timephased::{
    Normaliser, TimePeriodEntity, TimephasedContainer, TimephasedCost, TimephasedItem,
    TimephasedWork,
};
