//! Discrete-event calendar
//!
//! Events are kept in a `BTreeMap` keyed by `(time, sequence)`. The sequence number
//! grows with every insertion, so events with equal times come out in insertion
//! order and the whole run is deterministic.

use super::entity::EntityKey;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Which optional phases an event runs besides `update` and `time_advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventKind {
    /// Run `input` only
    Input,
    /// Run `output` only
    Output,
    /// Run both `input` and `output`
    #[default]
    All,
    /// Run neither
    None,
}

/// Pending activation of one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Activation time (s)
    pub time: f64,
    /// Entity to activate
    pub entity: EntityKey,
    /// Call `input` before `update`
    pub input: bool,
    /// Call `output` after `time_advance`
    pub output: bool,
}

impl Event {
    /// Event running all four phases.
    pub fn new(entity: EntityKey, time: f64) -> Self {
        Self::with_kind(entity, time, EventKind::All)
    }

    pub fn with_kind(entity: EntityKey, time: f64, kind: EventKind) -> Self {
        let (input, output) = match kind {
            EventKind::Input => (true, false),
            EventKind::Output => (false, true),
            EventKind::All => (true, true),
            EventKind::None => (false, false),
        };
        Self {
            time,
            entity,
            input,
            output,
        }
    }
}

/// Total order on event times.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EventTime(f64);

impl Eq for EventTime {}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Time-ordered queue of pending events
#[derive(Debug, Default, Clone)]
pub struct EventSchedule {
    events: BTreeMap<(EventTime, u64), Event>,
    next_sequence: u64,
}

impl EventSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event`. Events at `+inf` (inert entities) or NaN are dropped.
    ///
    /// Returns whether the event was queued.
    pub fn insert(&mut self, event: Event) -> bool {
        if event.time.is_nan() || event.time == f64::INFINITY {
            return false;
        }
        self.push(event);
        true
    }

    /// Queues the first event of a newly created entity. Negative times are
    /// rejected in addition to the cases [`EventSchedule::insert`] drops.
    pub fn insert_before(&mut self, event: Event) -> bool {
        if event.time < 0.0 {
            return false;
        }
        self.insert(event)
    }

    fn push(&mut self, event: Event) {
        let key = (EventTime(event.time), self.next_sequence);
        self.next_sequence += 1;
        self.events.insert(key, event);
    }

    /// Removes and returns the earliest event.
    pub fn pop_upcoming(&mut self) -> Option<Event> {
        self.events.pop_first().map(|(_, event)| event)
    }

    /// Earliest event without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.events.values().next()
    }

    /// Removes every event bound to `entity` and returns how many were removed.
    pub fn drop_entity_events(&mut self, entity: EntityKey) -> usize {
        let before = self.events.len();
        self.events.retain(|_, event| event.entity != entity);
        before - self.events.len()
    }

    /// Time of the earliest pending event, `-inf` when empty.
    pub fn time(&self) -> f64 {
        self.events
            .first_key_value()
            .map_or(f64::NEG_INFINITY, |((time, _), _)| time.0)
    }

    pub fn contains(&self, entity: EntityKey) -> bool {
        self.events.values().any(|event| event.entity == entity)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending events in activation order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.values()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
