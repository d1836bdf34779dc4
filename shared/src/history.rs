//! Bounded, regular time series of simulation snapshots.

use crate::{age, State, Timestamp};
use std::sync::Arc;

/// Time-ordered snapshots, one per tick, retained for a rolling window.
///
/// Entries are shared `Arc<State>` values. The history only grows by
/// appending; replay builds a replacement history from a retained prefix
/// instead of editing entries.
#[derive(Debug, Clone)]
pub struct StateHistory {
    entries: Vec<Arc<State>>,
    retention: u64,
    dt: u64,
}

impl StateHistory {
    pub fn new(retention: u64, dt: u64) -> Self {
        Self {
            entries: Vec::new(),
            retention,
            dt,
        }
    }

    /// History filled with a regular series of copies of `initial`, ending at
    /// `initial.time` and covering as much of the retention window as the
    /// timestamp allows.
    pub fn seeded(initial: State, retention: u64, dt: u64) -> Self {
        let mut history = Self::new(retention, dt);
        if dt == 0 {
            history.push(initial);
            return history;
        }

        let count = (retention / dt).max(1);
        let end = initial.time;
        for k in (0..count).rev() {
            let offset = k * dt;
            if offset > end {
                continue;
            }
            let mut state = initial.clone();
            state.time = end - offset;
            history.push(state);
        }
        history
    }

    pub fn retention(&self) -> u64 {
        self.retention
    }

    pub fn dt(&self) -> u64 {
        self.dt
    }

    pub fn push(&mut self, state: State) {
        self.push_shared(Arc::new(state));
    }

    pub fn push_shared(&mut self, state: Arc<State>) {
        debug_assert!(
            self.entries.last().map_or(true, |last| last.time < state.time),
            "history must stay strictly ordered by time"
        );
        self.entries.push(state);
    }

    /// Drops every entry whose age has reached the retention window.
    pub fn prune(&mut self, now: Timestamp) -> usize {
        let retention = self.retention;
        let before = self.entries.len();
        self.entries.retain(|s| age(now, s.time) < retention);
        before - self.entries.len()
    }

    pub fn latest(&self) -> Option<&Arc<State>> {
        self.entries.last()
    }

    /// Last entry strictly older than `time`.
    pub fn latest_before(&self, time: Timestamp) -> Option<&Arc<State>> {
        self.entries.iter().rev().find(|s| s.time < time)
    }

    /// Replacement history holding only the entries older than `time`.
    pub fn truncated_before(&self, time: Timestamp) -> StateHistory {
        StateHistory {
            entries: self
                .entries
                .iter()
                .filter(|s| s.time < time)
                .cloned()
                .collect(),
            retention: self.retention,
            dt: self.dt,
        }
    }

    /// Replaces the latest entry with a corrected copy.
    ///
    /// Snapshots already handed out keep their old value.
    pub fn amend_latest<F>(&mut self, amend: F) -> bool
    where
        F: FnOnce(&mut State),
    {
        match self.entries.last_mut() {
            Some(latest) => {
                let mut corrected = State::clone(latest);
                amend(&mut corrected);
                corrected.time = latest.time;
                *latest = Arc::new(corrected);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<State>> {
        self.entries.iter()
    }

    pub fn get(&self, time: Timestamp) -> Option<&Arc<State>> {
        self.entries.iter().find(|s| s.time == time)
    }

    /// True when adjacent entries are exactly one tick apart.
    pub fn is_regular(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[1].time == pair[0].time + self.dt)
    }
}
