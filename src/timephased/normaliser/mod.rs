mod cost;
mod merge_same;
mod work;

use super::{TimePeriodEntity, TimephasedCost, TimephasedItem, TimephasedWork};
use crate::calendar::WorkingTime;
use crate::duration::Duration;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Strategy for reshaping raw timephased segments into their canonical
/// form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normaliser {
    /// Split segments into days, then merge runs of days with equal
    /// amounts (legacy files).
    MergeSameWork,
    /// Merge standard segments and snap their edges to working time.
    NewWork,
    /// Merge adjacent cost segments with equal hourly rates.
    NewCost,
    #[default]
    Null,
}

/// Normalises segments of one amount kind in place.
pub trait Normalise<A> {
    fn normalise(
        &self,
        calendar: &dyn WorkingTime,
        parent: &dyn TimePeriodEntity,
        items: &mut Vec<TimephasedItem<A>>,
    );
}

impl Normalise<Duration> for Normaliser {
    fn normalise(
        &self,
        calendar: &dyn WorkingTime,
        parent: &dyn TimePeriodEntity,
        items: &mut Vec<TimephasedWork>,
    ) {
        let before = items.len();
        match self {
            Normaliser::MergeSameWork => merge_same::normalise_work(calendar, parent, items),
            Normaliser::NewWork => work::normalise(calendar, items),
            Normaliser::NewCost => {
                warn!("cost normaliser applied to work segments; leaving them unchanged");
            }
            Normaliser::Null => {}
        }
        debug!("{self:?} normalised {before} work segments into {}", items.len());
    }
}

impl Normalise<f64> for Normaliser {
    fn normalise(
        &self,
        calendar: &dyn WorkingTime,
        _parent: &dyn TimePeriodEntity,
        items: &mut Vec<TimephasedCost>,
    ) {
        let before = items.len();
        match self {
            Normaliser::MergeSameWork => merge_same::normalise_cost(calendar, items),
            Normaliser::NewWork | Normaliser::NewCost => cost::normalise(calendar, items),
            Normaliser::Null => {}
        }
        debug!("{self:?} normalised {before} cost segments into {}", items.len());
    }
}
