//! Tracking of remote input events on the authoritative server
//!
//! This module keeps every remote event the server has received while it can
//! still influence the simulation:
//! - Events are kept in chronological order, with arrival order breaking ties
//! - Events stay tracked while younger than the retention window
//! - Per-actor bookkeeping records when each actor was last heard from
//!
//! The log is what the replay engine reads when a late event forces the
//! server to recompute part of its history.

use shared::{age, ActorId, Event, Timestamp};
use std::collections::HashMap;

/// Bookkeeping for one actor whose events reached the server
#[derive(Debug, Clone, PartialEq)]
pub struct ActorRecord {
    /// Server time at which the last event of this actor arrived
    pub last_seen: Timestamp,
    /// Latest event timestamp received from this actor
    pub latest_event: Timestamp,
    /// Total number of events received from this actor
    pub received: u64,
}

/// Chronologically ordered remote events within the retention window
///
/// Events arriving out of order are inserted at their place in time, so
/// readers always see them sorted. Events sharing a timestamp keep the order
/// in which they arrived, which makes replay deterministic.
#[derive(Debug, Clone)]
pub struct EventLog {
    /// Tracked events sorted by time
    events: Vec<Event>,
    /// Age at which an event stops being tracked
    retention: u64,
    /// Per-actor arrival bookkeeping
    actors: HashMap<ActorId, ActorRecord>,
}

impl EventLog {
    /// Creates an empty log retaining events for `retention` milliseconds
    pub fn new(retention: u64) -> Self {
        Self {
            events: Vec::new(),
            retention,
            actors: HashMap::new(),
        }
    }

    /// Adds events that arrived at server time `now`
    ///
    /// Updates each sender's bookkeeping and keeps the log sorted by event
    /// time. The sort is stable, so equal timestamps stay in arrival order.
    pub fn add(&mut self, events: Vec<Event>, now: Timestamp) {
        for event in &events {
            let record = self.actors.entry(event.actor).or_insert(ActorRecord {
                last_seen: now,
                latest_event: event.time,
                received: 0,
            });
            record.last_seen = now;
            record.latest_event = record.latest_event.max(event.time);
            record.received += 1;
        }

        self.events.extend(events);
        // Sort by time to handle out-of-order delivery
        self.events.sort_by_key(|e| e.time);
    }

    /// Gets all events still young enough to be replayed
    pub fn current(&self, now: Timestamp) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.is_current(now, self.retention))
            .cloned()
            .collect()
    }

    /// Gets the events whose time falls inside the tick starting at `from`
    pub fn in_window(&self, from: Timestamp, dt: u64) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.time >= from && e.time < from + dt)
            .cloned()
            .collect()
    }

    /// Stops tracking events that have aged out of the retention window
    ///
    /// Returns the number of events discarded.
    pub fn prune(&mut self, now: Timestamp) -> usize {
        let retention = self.retention;
        let before = self.events.len();
        self.events.retain(|e| age(now, e.time) < retention);
        before - self.events.len()
    }

    /// Gets the arrival bookkeeping of one actor
    pub fn actor(&self, actor: ActorId) -> Option<&ActorRecord> {
        self.actors.get(&actor)
    }

    /// Iterates over every actor heard from, in ascending id order
    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &ActorRecord)> {
        let mut actors: Vec<(ActorId, &ActorRecord)> =
            self.actors.iter().map(|(id, record)| (*id, record)).collect();
        actors.sort_by_key(|(id, _)| *id);
        actors.into_iter()
    }

    /// Returns the number of tracked events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are tracked
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}
