use super::normaliser::{Normalise, Normaliser};
use super::{TimePeriodEntity, TimephasedAmount, TimephasedItem};
use crate::calendar::WorkingTime;
use std::mem;

#[derive(Debug, Clone, PartialEq)]
enum State<A> {
    Raw(Vec<TimephasedItem<A>>),
    Normalised(Vec<TimephasedItem<A>>),
}

impl<A> State<A> {
    fn items(&self) -> &[TimephasedItem<A>] {
        match self {
            State::Raw(items) | State::Normalised(items) => items,
        }
    }
}

/// Timephased segments as read from a source, normalised the first time
/// they are asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct TimephasedContainer<A> {
    state: State<A>,
    normaliser: Normaliser,
}

impl<A> Default for TimephasedContainer<A> {
    fn default() -> Self {
        Self {
            state: State::Normalised(Vec::new()),
            normaliser: Normaliser::Null,
        }
    }
}

impl<A: TimephasedAmount> TimephasedContainer<A>
where
    Normaliser: Normalise<A>,
{
    pub fn raw(items: Vec<TimephasedItem<A>>, normaliser: Normaliser) -> Self {
        Self {
            state: State::Raw(items),
            normaliser,
        }
    }

    /// Segments that are already canonical.
    pub fn normalised(items: Vec<TimephasedItem<A>>) -> Self {
        Self {
            state: State::Normalised(items),
            normaliser: Normaliser::Null,
        }
    }

    pub fn normaliser(&self) -> Normaliser {
        self.normaliser
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.state, State::Raw(_))
    }

    pub fn has_data(&self) -> bool {
        !self.state.items().is_empty()
    }

    /// Segments in their current state, without normalising.
    pub fn peek(&self) -> &[TimephasedItem<A>] {
        self.state.items()
    }

    /// Normalised segments; the first call runs the normaliser against
    /// `calendar` and the owning `parent`.
    pub fn data(
        &mut self,
        calendar: &dyn WorkingTime,
        parent: &dyn TimePeriodEntity,
    ) -> &[TimephasedItem<A>] {
        self.normalise(calendar, parent);
        self.state.items()
    }

    pub fn normalise(&mut self, calendar: &dyn WorkingTime, parent: &dyn TimePeriodEntity) {
        if !self.is_raw() {
            return;
        }
        self.state = match mem::replace(&mut self.state, State::Normalised(Vec::new())) {
            State::Raw(mut items) => {
                self.normaliser.normalise(calendar, parent, &mut items);
                State::Normalised(items)
            }
            normalised => normalised,
        };
    }

    /// A new container holding scaled copies of the segments, in the same
    /// state and with the same normaliser.
    pub fn apply_factor(&self, per_day_factor: f64, total_factor: f64) -> Self {
        let scale = |items: &[TimephasedItem<A>]| -> Vec<TimephasedItem<A>> {
            items
                .iter()
                .map(|item| item.scaled(per_day_factor, total_factor))
                .collect()
        };
        let state = match &self.state {
            State::Raw(items) => State::Raw(scale(items)),
            State::Normalised(items) => State::Normalised(scale(items)),
        };
        Self {
            state,
            normaliser: self.normaliser,
        }
    }
}
