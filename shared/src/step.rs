//! Deterministic simulation step shared by server and client.

use crate::{Event, State, Timestamp};

/// Displacement of an entity with one active direction per tick.
///
/// Applied once per step regardless of `dt`; the tick size is fixed.
pub const STEP_DISPLACEMENT: f64 = 1.0;

/// Advances `state` by one tick.
///
/// Every event whose actor matches an entity is applied to that entity's
/// input in ascending `time` order (equal times keep slice order), then the
/// entity moves according to its latched input. Events for unknown actors
/// are ignored.
pub fn step(state: &State, events: &[Event], dt: u64, at: Option<Timestamp>) -> State {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|e| e.time);

    let mut next = state.clone();
    next.time = at.unwrap_or(state.time + dt);

    for entity in &mut next.entities {
        for event in ordered.iter().filter(|e| e.actor == entity.actor) {
            entity.input.apply(event.kind, event.value);
        }
        entity.position += entity.input.direction() * STEP_DISPLACEMENT;
    }

    next
}

/// Events falling inside the step window that starts at `from`.
pub fn events_in_window(events: &[Event], from: Timestamp, dt: u64) -> Vec<Event> {
    events
        .iter()
        .filter(|e| e.time >= from && e.time < from + dt)
        .cloned()
        .collect()
}

/// Steps forward from `start` until the produced state reaches `until`.
///
/// Each step only sees the events whose time falls in
/// `[state.time, state.time + dt)`. Returns the produced states, excluding
/// `start` itself.
pub fn fast_forward(start: &State, events: &[Event], until: Timestamp, dt: u64) -> Vec<State> {
    let mut produced = Vec::new();
    if dt == 0 {
        return produced;
    }

    let mut state = start.clone();
    while state.time < until {
        let window = events_in_window(events, state.time, dt);
        state = step(&state, &window, dt, None);
        produced.push(state.clone());
    }

    produced
}
