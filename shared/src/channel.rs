//! Simulated one-way transport with randomized delay.
//!
//! Deliveries are held in a min-heap keyed by release time on a virtual
//! clock. Nothing is dropped; only delay is modeled, and a later send may be
//! released before an earlier one.

use crate::Timestamp;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Scheduled<T> {
    fire_at: Timestamp,
    sequence: u64,
    payload: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.sequence == other.sequence
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Priority queue of payloads keyed by virtual fire time.
///
/// Payloads with equal fire times come out in the order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<T> {
    queue: BinaryHeap<Scheduled<T>>,
    next_sequence: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_sequence: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: Timestamp, payload: T) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(Scheduled {
            fire_at,
            sequence,
            payload,
        });
    }

    /// Fire time of the earliest pending payload.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.queue.peek().map(|s| s.fire_at)
    }

    /// Removes the earliest payload if it is due at `now`.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(Timestamp, T)> {
        match self.queue.peek() {
            Some(next) if next.fire_at <= now => self.queue.pop().map(|s| (s.fire_at, s.payload)),
            _ => None,
        }
    }

    /// Removes every payload due at `now`, earliest first.
    pub fn drain_due(&mut self, now: Timestamp) -> Vec<T> {
        let mut due = Vec::new();
        while let Some((_, payload)) = self.pop_due(now) {
            due.push(payload);
        }
        due
    }

    /// Drops everything still pending and returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let pending = self.queue.len();
        self.queue.clear();
        pending
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Randomized one-way delay around a base latency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyModel {
    /// Base latency in milliseconds.
    pub base: u64,
    /// Jitter fraction in `[0, 1]`.
    pub sway: f64,
}

impl LatencyModel {
    pub fn new(base: u64, sway: f64) -> Self {
        Self {
            base,
            sway: sway.clamp(0.0, 1.0),
        }
    }

    /// Delay for a uniform draw `u` in `[0, 1)`.
    ///
    /// Ranges over `[base * (1 - sway), base * (1 + sway))`.
    pub fn delay(&self, u: f64) -> u64 {
        let base = self.base as f64;
        let delay = base * (1.0 - self.sway) + base * self.sway * 2.0 * u;
        delay.round().max(0.0) as u64
    }
}

/// Variable-delay, fire-and-forget transport from one role to another.
///
/// Payloads are taken by value, so whatever the sender does afterwards
/// cannot change what is delivered.
#[derive(Debug)]
pub struct LatencyChannel<T> {
    model: LatencyModel,
    in_flight: Scheduler<T>,
    rng: StdRng,
    sent: u64,
    delivered: u64,
}

impl<T> LatencyChannel<T> {
    pub fn new(model: LatencyModel, seed: u64) -> Self {
        Self {
            model,
            in_flight: Scheduler::new(),
            rng: StdRng::seed_from_u64(seed),
            sent: 0,
            delivered: 0,
        }
    }

    /// Schedules `payload` for delivery and returns its release time.
    pub fn send(&mut self, payload: T, now: Timestamp) -> Timestamp {
        let delay = self.model.delay(self.rng.gen::<f64>());
        let release = now + delay;
        self.in_flight.schedule(release, payload);
        self.sent += 1;
        release
    }

    /// Takes every payload whose release time has come, earliest first.
    pub fn deliver_due(&mut self, now: Timestamp) -> Vec<T> {
        let due = self.in_flight.drain_due(now);
        self.delivered += due.len() as u64;
        due
    }

    pub fn next_due(&self) -> Option<Timestamp> {
        self.in_flight.next_due()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Clock value a sender stamps events with: its expected arrival time
    /// at the receiver.
    pub fn synced_now(&self, now: Timestamp) -> Timestamp {
        now + self.model.base
    }

    /// Drops every pending delivery.
    pub fn cancel_pending(&mut self) -> usize {
        self.in_flight.clear()
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}
